//! Neutral-pose gate: thumb tip and index tip held together.
//!
//! All swipe detection is gated on this signal.  The check is a pure
//! function of the latest frame: no smoothing, no hold time.

use tracing::debug;

use crate::hand_tracking::{HandJoint, JointFrame};

/// Configuration for the neutral-pose gate.
#[derive(Debug, Clone, PartialEq)]
pub struct NeutralConfig {
    /// Maximum thumb-tip to index-tip distance (meters), inclusive.
    pub threshold_m: f64,
}

impl Default for NeutralConfig {
    fn default() -> Self {
        Self { threshold_m: 0.01 }
    }
}

/// Latest neutral reading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NeutralState {
    pub neutral: bool,
    /// Last measured thumb-index distance; kept while the hand is untracked.
    pub distance: f64,
}

/// Derives the neutral signal from the thumb-index pinch distance.
#[derive(Debug, Clone, Default)]
pub struct NeutralPositionDetector {
    pub config: NeutralConfig,
    state: NeutralState,
}

impl NeutralPositionDetector {
    pub fn new(config: NeutralConfig) -> Self {
        Self {
            config,
            state: NeutralState::default(),
        }
    }

    /// Recompute from the latest frame.  Returns true if `neutral` changed.
    pub fn update(&mut self, frame: Option<&JointFrame>) -> bool {
        let was_neutral = self.state.neutral;
        match frame {
            Some(frame) => {
                let distance = frame.joint_distance(HandJoint::ThumbTip, HandJoint::IndexTip);
                self.state.distance = distance;
                self.state.neutral = distance <= self.config.threshold_m;
            }
            None => self.state.neutral = false,
        }

        let changed = was_neutral != self.state.neutral;
        if changed {
            debug!(
                "Neutral {} (distance={:.4}m)",
                if self.state.neutral { "entered" } else { "left" },
                self.state.distance,
            );
        }
        changed
    }

    pub fn state(&self) -> NeutralState {
        self.state
    }

    pub fn is_neutral(&self) -> bool {
        self.state.neutral
    }

    pub fn distance(&self) -> f64 {
        self.state.distance
    }

    pub fn reset(&mut self) {
        self.state = NeutralState::default();
    }
}
