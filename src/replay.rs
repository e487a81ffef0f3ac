//! Recorded pose traces as a `PoseSource`.
//!
//! One s-expression per line; blank lines and `;` comments are skipped:
//!
//! ```text
//! (:time 0.1 :joints ((thumb-tip 0 0 0) (index-tip 0.005 0 0) (middle-tip 0.1 0 0)))
//! (:time 0.2 :untracked t)
//! ```
//!
//! Joints not listed sit at the origin.

use std::collections::VecDeque;

use lexpr::Value;
use tracing::debug;

use crate::error::GestureError;
use crate::hand_tracking::{HandJoint, JointFrame, PoseSource, Vec3};
use crate::sexp;

/// One recorded tick.  `frame` is `None` while the hand was untracked.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSample {
    pub time: f64,
    pub frame: Option<JointFrame>,
}

/// Replays parsed samples in order.
#[derive(Debug, Clone, Default)]
pub struct TracePoseSource {
    samples: VecDeque<TraceSample>,
}

impl TracePoseSource {
    pub fn new(samples: Vec<TraceSample>) -> Self {
        Self {
            samples: samples.into(),
        }
    }

    /// Parse a whole trace.  Fails on the first malformed line.
    pub fn parse(text: &str) -> Result<Self, GestureError> {
        let mut samples = Vec::new();
        for (lineno, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let sample = parse_line(line)
                .map_err(|e| GestureError::Sexp(format!("line {}: {}", lineno + 1, e)))?;
            samples.push(sample);
        }
        debug!("Parsed pose trace: {} samples", samples.len());
        Ok(Self::new(samples))
    }

    /// Timestamp of the sample `latest_frame` will return next.
    pub fn next_time(&self) -> Option<f64> {
        self.samples.front().map(|s| s.time)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl PoseSource for TracePoseSource {
    /// Consumes the next sample.
    fn latest_frame(&mut self) -> Option<JointFrame> {
        self.samples.pop_front().and_then(|s| s.frame)
    }
}

fn parse_line(line: &str) -> Result<TraceSample, GestureError> {
    let value = sexp::parse(line)?;
    let time = sexp::get_float(&value, "time")
        .ok_or_else(|| GestureError::Sexp("missing :time".to_string()))?;

    if sexp::get_bool(&value, "untracked").unwrap_or(false) {
        return Ok(TraceSample { time, frame: None });
    }

    let mut frame = JointFrame::new();
    if let Some(joints) = sexp::get_value(&value, "joints") {
        for entry in sexp::list_items(joints) {
            let (joint, position) = parse_joint_entry(entry)?;
            frame.set_position(joint, position);
        }
    }
    Ok(TraceSample {
        time,
        frame: Some(frame),
    })
}

/// `(name x y z)`
fn parse_joint_entry(entry: &Value) -> Result<(HandJoint, Vec3), GestureError> {
    let items = sexp::list_items(entry);
    if items.len() != 4 {
        return Err(GestureError::Sexp(format!(
            "joint entry needs (name x y z), got {}",
            entry
        )));
    }
    let name = sexp::atom_to_string(items[0])
        .ok_or_else(|| GestureError::Sexp(format!("bad joint name in {}", entry)))?;
    let joint = HandJoint::parse(&name)?;
    let coord = |i: usize| {
        sexp::as_f64(items[i])
            .ok_or_else(|| GestureError::Sexp(format!("non-numeric coordinate in {}", entry)))
    };
    Ok((joint, Vec3::new(coord(1)?, coord(2)?, coord(3)?)))
}
