//! Hand joint data structures and the pose source boundary.
//!
//! Models the 25 joints of a tracked hand (wrist plus four bones per
//! finger, three for the thumb).  Only positions are consumed; orientation
//! and radius stay with the device layer that produces the frames.

use std::ops::Sub;

use crate::error::GestureError;

// ── Vector ─────────────────────────────────────────────────

/// Position in meters (x, y, z).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Euclidean length.
    pub fn length(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Vec3) -> f64 {
        (*other - *self).length()
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

// ── Joint definitions ──────────────────────────────────────

/// The 25 hand joints, in frame order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandJoint {
    Wrist,
    ThumbMetacarpal,
    ThumbPhalanxProximal,
    ThumbPhalanxDistal,
    ThumbTip,
    IndexMetacarpal,
    IndexPhalanxProximal,
    IndexPhalanxIntermediate,
    IndexPhalanxDistal,
    IndexTip,
    MiddleMetacarpal,
    MiddlePhalanxProximal,
    MiddlePhalanxIntermediate,
    MiddlePhalanxDistal,
    MiddleTip,
    RingMetacarpal,
    RingPhalanxProximal,
    RingPhalanxIntermediate,
    RingPhalanxDistal,
    RingTip,
    PinkyMetacarpal,
    PinkyPhalanxProximal,
    PinkyPhalanxIntermediate,
    PinkyPhalanxDistal,
    PinkyTip,
}

/// Total number of joints per hand.
pub const JOINT_COUNT: usize = 25;

/// All joints in order, matching `HandJoint::index`.
pub const ALL_JOINTS: [HandJoint; JOINT_COUNT] = [
    HandJoint::Wrist,
    HandJoint::ThumbMetacarpal,
    HandJoint::ThumbPhalanxProximal,
    HandJoint::ThumbPhalanxDistal,
    HandJoint::ThumbTip,
    HandJoint::IndexMetacarpal,
    HandJoint::IndexPhalanxProximal,
    HandJoint::IndexPhalanxIntermediate,
    HandJoint::IndexPhalanxDistal,
    HandJoint::IndexTip,
    HandJoint::MiddleMetacarpal,
    HandJoint::MiddlePhalanxProximal,
    HandJoint::MiddlePhalanxIntermediate,
    HandJoint::MiddlePhalanxDistal,
    HandJoint::MiddleTip,
    HandJoint::RingMetacarpal,
    HandJoint::RingPhalanxProximal,
    HandJoint::RingPhalanxIntermediate,
    HandJoint::RingPhalanxDistal,
    HandJoint::RingTip,
    HandJoint::PinkyMetacarpal,
    HandJoint::PinkyPhalanxProximal,
    HandJoint::PinkyPhalanxIntermediate,
    HandJoint::PinkyPhalanxDistal,
    HandJoint::PinkyTip,
];

impl HandJoint {
    /// Convert joint enum to array index (0-24).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Joint name as used in pose traces and status output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbMetacarpal => "thumb-metacarpal",
            Self::ThumbPhalanxProximal => "thumb-phalanx-proximal",
            Self::ThumbPhalanxDistal => "thumb-phalanx-distal",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMetacarpal => "index-finger-metacarpal",
            Self::IndexPhalanxProximal => "index-finger-phalanx-proximal",
            Self::IndexPhalanxIntermediate => "index-finger-phalanx-intermediate",
            Self::IndexPhalanxDistal => "index-finger-phalanx-distal",
            Self::IndexTip => "index-finger-tip",
            Self::MiddleMetacarpal => "middle-finger-metacarpal",
            Self::MiddlePhalanxProximal => "middle-finger-phalanx-proximal",
            Self::MiddlePhalanxIntermediate => "middle-finger-phalanx-intermediate",
            Self::MiddlePhalanxDistal => "middle-finger-phalanx-distal",
            Self::MiddleTip => "middle-finger-tip",
            Self::RingMetacarpal => "ring-finger-metacarpal",
            Self::RingPhalanxProximal => "ring-finger-phalanx-proximal",
            Self::RingPhalanxIntermediate => "ring-finger-phalanx-intermediate",
            Self::RingPhalanxDistal => "ring-finger-phalanx-distal",
            Self::RingTip => "ring-finger-tip",
            Self::PinkyMetacarpal => "pinky-finger-metacarpal",
            Self::PinkyPhalanxProximal => "pinky-finger-phalanx-proximal",
            Self::PinkyPhalanxIntermediate => "pinky-finger-phalanx-intermediate",
            Self::PinkyPhalanxDistal => "pinky-finger-phalanx-distal",
            Self::PinkyTip => "pinky-finger-tip",
        }
    }

    /// Parse a joint name.  Accepts the short aliases `index-tip`,
    /// `middle-tip`, `ring-tip` and `pinky-tip` as well.
    pub fn parse(name: &str) -> Result<Self, GestureError> {
        match name {
            "index-tip" => return Ok(Self::IndexTip),
            "middle-tip" => return Ok(Self::MiddleTip),
            "ring-tip" => return Ok(Self::RingTip),
            "pinky-tip" => return Ok(Self::PinkyTip),
            _ => {}
        }
        ALL_JOINTS
            .iter()
            .copied()
            .find(|j| j.as_str() == name)
            .ok_or_else(|| GestureError::UnknownJoint(name.to_string()))
    }
}

// ── Joint frame ────────────────────────────────────────────

/// One snapshot of every joint position of the tracked hand.
#[derive(Debug, Clone, PartialEq)]
pub struct JointFrame {
    positions: [Vec3; JOINT_COUNT],
}

impl Default for JointFrame {
    fn default() -> Self {
        Self {
            positions: [Vec3::ZERO; JOINT_COUNT],
        }
    }
}

impl JointFrame {
    /// A frame with every joint at the origin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style joint placement.
    pub fn with_joint(mut self, joint: HandJoint, position: Vec3) -> Self {
        self.set_position(joint, position);
        self
    }

    pub fn set_position(&mut self, joint: HandJoint, position: Vec3) {
        self.positions[joint.index()] = position;
    }

    pub fn position(&self, joint: HandJoint) -> Vec3 {
        self.positions[joint.index()]
    }

    /// Euclidean distance between two joints (in meters).
    pub fn joint_distance(&self, a: HandJoint, b: HandJoint) -> f64 {
        self.position(a).distance(&self.position(b))
    }
}

// ── Pose source ────────────────────────────────────────────

/// Supplies the latest hand pose once per tick.
///
/// `None` means the hand is currently untracked.
pub trait PoseSource {
    fn latest_frame(&mut self) -> Option<JointFrame>;
}

impl<F> PoseSource for F
where
    F: FnMut() -> Option<JointFrame>,
{
    fn latest_frame(&mut self) -> Option<JointFrame> {
        self()
    }
}

// ── Tests ──────────────────────────────────────────────────
