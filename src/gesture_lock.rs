//! Cross-gesture cooldown lock.
//!
//! One lock is shared by every swipe detector of a dispatcher; a successful
//! trigger blocks all of them for `block_duration_s`.  The handle is an
//! `Rc` with `Cell` state, so it is single-threaded by construction.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

/// Configuration for the cooldown lock.
#[derive(Debug, Clone, PartialEq)]
pub struct GestureLockConfig {
    /// Seconds after a trigger during which no other gesture may fire.
    pub block_duration_s: f64,
}

impl GestureLockConfig {
    /// Cooldown used with single-direction detectors.
    pub fn legacy() -> Self {
        Self {
            block_duration_s: 1.0,
        }
    }
}

impl Default for GestureLockConfig {
    fn default() -> Self {
        Self {
            block_duration_s: 0.2,
        }
    }
}

/// Shared handle to the lock.  Clone it to give a detector access.
pub type GestureLockHandle = Rc<GestureLock>;

#[derive(Debug)]
pub struct GestureLock {
    is_blocked: Cell<bool>,
    last_trigger_time: Cell<f64>,
    block_duration: Cell<f64>,
}

impl GestureLock {
    pub fn new(config: &GestureLockConfig) -> Self {
        Self {
            is_blocked: Cell::new(false),
            last_trigger_time: Cell::new(0.0),
            block_duration: Cell::new(config.block_duration_s),
        }
    }

    /// Create a lock already wrapped in a shareable handle.
    pub fn shared(config: &GestureLockConfig) -> GestureLockHandle {
        Rc::new(Self::new(config))
    }

    /// Release the block once the cooldown has elapsed.
    /// Must run once per tick before any detector calls `try_trigger`.
    pub fn advance(&self, now: f64) {
        if self.is_blocked.get() && now - self.last_trigger_time.get() >= self.block_duration.get() {
            self.is_blocked.set(false);
            debug!("Gesture lock released at {:.3}s", now);
        }
    }

    /// Claim the lock.  Returns false, with no side effect, while blocked.
    pub fn try_trigger(&self, now: f64) -> bool {
        if self.is_blocked.get() {
            return false;
        }
        self.is_blocked.set(true);
        self.last_trigger_time.set(now);
        true
    }

    pub fn is_blocked(&self) -> bool {
        self.is_blocked.get()
    }

    pub fn last_trigger_time(&self) -> f64 {
        self.last_trigger_time.get()
    }

    pub fn block_duration(&self) -> f64 {
        self.block_duration.get()
    }

    /// Change the cooldown.  Takes effect on the next `advance`.
    pub fn set_block_duration(&self, seconds: f64) {
        self.block_duration.set(seconds);
    }

    /// Seconds until the lock releases, 0 when not blocked.
    pub fn remaining_block_time(&self, now: f64) -> f64 {
        if !self.is_blocked.get() {
            return 0.0;
        }
        (self.block_duration.get() - (now - self.last_trigger_time.get())).max(0.0)
    }

    pub fn reset(&self) {
        self.is_blocked.set(false);
        self.last_trigger_time.set(0.0);
    }

    /// Generate s-expression for status output.
    pub fn status_sexp(&self, now: f64) -> String {
        format!(
            "(:blocked {} :remaining {:.3} :block-duration {:.3})",
            if self.is_blocked() { "t" } else { "nil" },
            self.remaining_block_time(now),
            self.block_duration(),
        )
    }
}
