//! Directional swipe recognition from tracked hand-joint poses.
//!
//! Provides:
//! - `hand_tracking`: joint names, `JointFrame` snapshots and the `PoseSource` boundary
//! - `neutral`: thumb/index pinch gate that enables swipe detection
//! - `gesture_lock`: shared cooldown so only one gesture fires at a time
//! - `swipe`: per-axis window state machine producing left/right/up/down events
//! - `dispatcher`: per-frame composition of the above around a single lock
//! - `replay`: recorded pose traces as a `PoseSource`

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gesture_lock;
pub mod hand_tracking;
pub mod neutral;
pub mod replay;
pub mod sexp;
pub mod swipe;

pub use config::Config;
pub use dispatcher::{DetectorId, GestureDispatcher};
pub use error::GestureError;
pub use gesture_lock::{GestureLock, GestureLockConfig, GestureLockHandle};
pub use hand_tracking::{HandJoint, JointFrame, PoseSource, Vec3};
pub use neutral::{NeutralConfig, NeutralPositionDetector, NeutralState};
pub use swipe::{
    DetectorMode, Direction, DirectionalSwipeDetector, SwipeCallbacks, SwipeConfig, SwipeEvent,
    SwipeTrackState,
};
