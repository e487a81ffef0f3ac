//! Directional swipe detection from middle-fingertip translation.
//!
//! Each detector keeps one displacement window anchored at a start sample.
//! The window accumulates along the dominant axis only, locks onto the
//! first classified direction, and is re-anchored on fire, on reversal and
//! on a change of dominant axis.  Hand loss and a failed neutral gate clear
//! it completely.  Firing goes through the shared `GestureLock`, so all
//! detectors of one dispatcher share a single trigger budget.

use tracing::debug;

use crate::error::GestureError;
use crate::gesture_lock::GestureLockHandle;
use crate::hand_tracking::{HandJoint, JointFrame, Vec3};

/// Joint whose translation is tracked.
pub const TRACKED_JOINT: HandJoint = HandJoint::MiddleTip;

// ── Direction ──────────────────────────────────────────────

/// Direction of a swipe gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Movement axis a direction belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Left, Self::Right, Self::Up, Self::Down];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Up => "up",
            Self::Down => "down",
        }
    }

    pub fn parse(s: &str) -> Result<Self, GestureError> {
        match s.trim_start_matches(':') {
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            _ => Err(GestureError::UnknownDirection(s.to_string())),
        }
    }

    pub fn axis(&self) -> Axis {
        match self {
            Self::Left | Self::Right => Axis::Horizontal,
            Self::Up | Self::Down => Axis::Vertical,
        }
    }

    /// Direction implied by a signed per-tick delta on `axis`.
    /// Zero yields nothing.
    fn from_delta(axis: Axis, delta: f64) -> Option<Self> {
        match axis {
            Axis::Horizontal if delta < 0.0 => Some(Self::Left),
            Axis::Horizontal if delta > 0.0 => Some(Self::Right),
            Axis::Vertical if delta > 0.0 => Some(Self::Up),
            Axis::Vertical if delta < 0.0 => Some(Self::Down),
            _ => None,
        }
    }
}

impl Axis {
    fn component(&self, v: &Vec3) -> f64 {
        match self {
            Self::Horizontal => v.x,
            Self::Vertical => v.y,
        }
    }
}

// ── Events ─────────────────────────────────────────────────

/// A fired swipe.  Handed to the callback and returned from the tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeEvent {
    pub direction: Direction,
    /// Tick time the swipe fired at (seconds).
    pub time: f64,
}

impl SwipeEvent {
    /// Format as an event s-expression.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:type :event :event :swipe :direction :{} :time {:.3})",
            self.direction.as_str(),
            self.time,
        )
    }
}

// ── Config ─────────────────────────────────────────────────

/// Distance and time budgets for a swipe window.
#[derive(Debug, Clone, PartialEq)]
pub struct SwipeConfig {
    /// Minimum horizontal displacement (meters) from the window anchor.
    pub horizontal_threshold_m: f64,
    /// Minimum vertical displacement (meters) from the window anchor.
    pub vertical_threshold_m: f64,
    /// Maximum window age (seconds) for a horizontal swipe.
    pub horizontal_time_threshold_s: f64,
    /// Maximum window age (seconds) for a vertical swipe.
    pub vertical_time_threshold_s: f64,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            horizontal_threshold_m: 0.07,
            vertical_threshold_m: 0.05,
            horizontal_time_threshold_s: 0.7,
            vertical_time_threshold_s: 0.5,
        }
    }
}

impl SwipeConfig {
    /// (distance, time) budget for an axis.
    pub fn budget(&self, axis: Axis) -> (f64, f64) {
        match axis {
            Axis::Horizontal => (self.horizontal_threshold_m, self.horizontal_time_threshold_s),
            Axis::Vertical => (self.vertical_threshold_m, self.vertical_time_threshold_s),
        }
    }
}

// ── Track state ────────────────────────────────────────────

/// Everything a detector remembers between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SwipeTrackState {
    pub previous_position: Option<Vec3>,
    pub previous_time: Option<f64>,
    pub window_start_position: Option<Vec3>,
    pub window_start_time: Option<f64>,
    pub locked_direction: Option<Direction>,
}

impl SwipeTrackState {
    /// Whether every field is unset.
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Move the window anchor to `position` and unlock the direction.
    fn anchor(&mut self, position: Vec3, now: f64) {
        self.window_start_position = Some(position);
        self.window_start_time = Some(now);
        self.locked_direction = None;
    }
}

// ── Callbacks ──────────────────────────────────────────────

pub type SwipeCallback = Box<dyn FnMut(SwipeEvent)>;

/// Per-direction callbacks.  A direction without a callback never fires.
#[derive(Default)]
pub struct SwipeCallbacks {
    on_left: Option<SwipeCallback>,
    on_right: Option<SwipeCallback>,
    on_up: Option<SwipeCallback>,
    on_down: Option<SwipeCallback>,
}

impl SwipeCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_left(self, f: impl FnMut(SwipeEvent) + 'static) -> Self {
        self.on(Direction::Left, f)
    }

    pub fn on_right(self, f: impl FnMut(SwipeEvent) + 'static) -> Self {
        self.on(Direction::Right, f)
    }

    pub fn on_up(self, f: impl FnMut(SwipeEvent) + 'static) -> Self {
        self.on(Direction::Up, f)
    }

    pub fn on_down(self, f: impl FnMut(SwipeEvent) + 'static) -> Self {
        self.on(Direction::Down, f)
    }

    /// Register (or replace) the callback for `direction`.
    pub fn on(mut self, direction: Direction, f: impl FnMut(SwipeEvent) + 'static) -> Self {
        *self.slot_mut(direction) = Some(Box::new(f));
        self
    }

    /// Same callback for every direction.
    pub fn all(f: impl FnMut(SwipeEvent) + Clone + 'static) -> Self {
        Direction::ALL
            .iter()
            .fold(Self::new(), |callbacks, &d| callbacks.on(d, f.clone()))
    }

    pub fn has(&self, direction: Direction) -> bool {
        match direction {
            Direction::Left => self.on_left.is_some(),
            Direction::Right => self.on_right.is_some(),
            Direction::Up => self.on_up.is_some(),
            Direction::Down => self.on_down.is_some(),
        }
    }

    fn slot_mut(&mut self, direction: Direction) -> &mut Option<SwipeCallback> {
        match direction {
            Direction::Left => &mut self.on_left,
            Direction::Right => &mut self.on_right,
            Direction::Up => &mut self.on_up,
            Direction::Down => &mut self.on_down,
        }
    }

    fn invoke(&mut self, event: SwipeEvent) {
        if let Some(callback) = self.slot_mut(event.direction) {
            callback(event);
        }
    }
}

impl std::fmt::Debug for SwipeCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SwipeCallbacks")
            .field("left", &self.on_left.is_some())
            .field("right", &self.on_right.is_some())
            .field("up", &self.on_up.is_some())
            .field("down", &self.on_down.is_some())
            .finish()
    }
}

// ── Detector ───────────────────────────────────────────────

/// Which directions a detector classifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorMode {
    /// All four directions with dominant-axis arbitration.
    Unified,
    /// One direction on its own axis; the other axis is ignored and an
    /// opposite delta re-anchors the window.
    Single(Direction),
}

impl DetectorMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unified => "unified",
            Self::Single(d) => d.as_str(),
        }
    }
}

/// Swipe state machine for one tracked joint.
#[derive(Debug)]
pub struct DirectionalSwipeDetector {
    pub config: SwipeConfig,
    mode: DetectorMode,
    state: SwipeTrackState,
    callbacks: SwipeCallbacks,
    lock: GestureLockHandle,
}

impl DirectionalSwipeDetector {
    /// Detectors are only built by `GestureDispatcher`, which hands every
    /// one of them the same lock.
    pub(crate) fn new(
        config: SwipeConfig,
        mode: DetectorMode,
        callbacks: SwipeCallbacks,
        lock: GestureLockHandle,
    ) -> Self {
        Self {
            config,
            mode,
            state: SwipeTrackState::default(),
            callbacks,
            lock,
        }
    }

    pub fn mode(&self) -> DetectorMode {
        self.mode
    }

    pub fn state(&self) -> &SwipeTrackState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state.reset();
    }

    /// Process one tick.  Returns the swipe fired this tick, if any.
    pub fn update(
        &mut self,
        frame: Option<&JointFrame>,
        now: f64,
        neutral: bool,
    ) -> Option<SwipeEvent> {
        let frame = match frame {
            Some(frame) if neutral => frame,
            _ => {
                self.state.reset();
                return None;
            }
        };

        let position = frame.position(TRACKED_JOINT);
        if !position.is_finite() {
            debug!("Non-finite {} at {:.3}s, treating hand as untracked", TRACKED_JOINT.as_str(), now);
            self.state.reset();
            return None;
        }
        if self.state.window_start_position.is_none() {
            self.state.anchor(position, now);
        }

        let mut fired = None;
        if let (Some(prev), Some(_)) = (self.state.previous_position, self.state.previous_time) {
            let dx = position.x - prev.x;
            let dy = position.y - prev.y;
            if let Some(candidate) = self.classify(dx, dy) {
                fired = self.track(candidate, position, now);
            }
        }

        self.state.previous_position = Some(position);
        self.state.previous_time = Some(now);
        fired
    }

    /// Direction suggested by this tick's delta.
    fn classify(&self, dx: f64, dy: f64) -> Option<Direction> {
        match self.mode {
            DetectorMode::Unified => {
                if dx.abs() > dy.abs() {
                    Direction::from_delta(Axis::Horizontal, dx)
                } else if dy.abs() > dx.abs() {
                    Direction::from_delta(Axis::Vertical, dy)
                } else {
                    // Tie: ambiguous, skip classification.
                    None
                }
            }
            DetectorMode::Single(bound) => {
                let delta = match bound.axis() {
                    Axis::Horizontal => dx,
                    Axis::Vertical => dy,
                };
                Direction::from_delta(bound.axis(), delta)
            }
        }
    }

    /// Extend, re-anchor or fire the window for a classified delta.
    fn track(&mut self, candidate: Direction, position: Vec3, now: f64) -> Option<SwipeEvent> {
        let reversed = match self.mode {
            DetectorMode::Unified => {
                matches!(self.state.locked_direction, Some(locked) if locked != candidate)
            }
            DetectorMode::Single(bound) => candidate != bound,
        };
        if reversed {
            debug!(
                "Swipe window re-anchored at {:.3}s ({:?} -> {:?})",
                now,
                self.state.locked_direction,
                candidate,
            );
            self.state.anchor(position, now);
            return None;
        }

        self.state.locked_direction = Some(candidate);

        let (Some(start), Some(start_time)) =
            (self.state.window_start_position, self.state.window_start_time)
        else {
            return None;
        };

        let axis = candidate.axis();
        let (threshold, time_threshold) = self.config.budget(axis);
        let total_distance = (axis.component(&position) - axis.component(&start)).abs();
        let total_time = now - start_time;

        if !(total_distance >= threshold && total_time <= time_threshold) {
            return None;
        }
        if !self.callbacks.has(candidate) {
            return None;
        }
        if !self.lock.try_trigger(now) {
            // Keep the window so the displacement still counts once unblocked.
            debug!(
                "Swipe {} suppressed by gesture lock ({:.3}s remaining)",
                candidate.as_str(),
                self.lock.remaining_block_time(now),
            );
            return None;
        }

        let event = SwipeEvent {
            direction: candidate,
            time: now,
        };
        debug!(
            "Swipe detected: {} at {:.3}s, distance={:.3}m over {:.3}s",
            candidate.as_str(),
            now,
            total_distance,
            total_time,
        );
        self.callbacks.invoke(event);
        self.state.anchor(position, now);
        Some(event)
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self) -> String {
        let locked = self
            .state
            .locked_direction
            .map(|d| format!(":{}", d.as_str()))
            .unwrap_or_else(|| "nil".to_string());
        let window_age = match (self.state.window_start_time, self.state.previous_time) {
            (Some(start), Some(last)) => format!("{:.3}", last - start),
            _ => "nil".to_string(),
        };
        format!(
            "(:mode :{} :tracking {} :locked {} :window-age {})",
            self.mode.as_str(),
            if self.state.is_idle() { "nil" } else { "t" },
            locked,
            window_age,
        )
    }
}

// ── Tests ──────────────────────────────────────────────────
