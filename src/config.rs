//! Aggregate configuration and its s-expression form.
//!
//! Every key is optional; missing keys keep their defaults:
//!
//! ```text
//! (:neutral-threshold 0.01
//!  :horizontal-threshold 0.07 :horizontal-time-threshold 0.7
//!  :vertical-threshold 0.05 :vertical-time-threshold 0.5
//!  :block-duration 0.2)
//! ```

use lexpr::Value;
use tracing::debug;

use crate::error::GestureError;
use crate::gesture_lock::GestureLockConfig;
use crate::neutral::NeutralConfig;
use crate::sexp;
use crate::swipe::SwipeConfig;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub neutral: NeutralConfig,
    pub swipe: SwipeConfig,
    pub lock: GestureLockConfig,
}

impl Config {
    /// Defaults for single-direction detectors: same thresholds, 1s cooldown.
    pub fn legacy() -> Self {
        Self {
            lock: GestureLockConfig::legacy(),
            ..Self::default()
        }
    }

    /// Parse a config plist on top of the defaults.
    pub fn from_sexp(raw: &str) -> Result<Self, GestureError> {
        let mut config = Self::default();
        config.apply_sexp(&sexp::parse(raw)?)?;
        Ok(config)
    }

    /// Override any keys present in `value`, then validate.
    pub fn apply_sexp(&mut self, value: &Value) -> Result<(), GestureError> {
        if let Some(v) = sexp::get_float(value, "neutral-threshold") {
            self.neutral.threshold_m = v;
        }
        if let Some(v) = sexp::get_float(value, "horizontal-threshold") {
            self.swipe.horizontal_threshold_m = v;
        }
        if let Some(v) = sexp::get_float(value, "vertical-threshold") {
            self.swipe.vertical_threshold_m = v;
        }
        if let Some(v) = sexp::get_float(value, "horizontal-time-threshold") {
            self.swipe.horizontal_time_threshold_s = v;
        }
        if let Some(v) = sexp::get_float(value, "vertical-time-threshold") {
            self.swipe.vertical_time_threshold_s = v;
        }
        if let Some(v) = sexp::get_float(value, "block-duration") {
            self.lock.block_duration_s = v;
        }
        self.validate()?;
        debug!("Config applied: {}", self.config_sexp());
        Ok(())
    }

    /// Thresholds and durations must be finite and positive.
    pub fn validate(&self) -> Result<(), GestureError> {
        let fields = [
            ("neutral-threshold", self.neutral.threshold_m),
            ("horizontal-threshold", self.swipe.horizontal_threshold_m),
            ("vertical-threshold", self.swipe.vertical_threshold_m),
            ("horizontal-time-threshold", self.swipe.horizontal_time_threshold_s),
            ("vertical-time-threshold", self.swipe.vertical_time_threshold_s),
            ("block-duration", self.lock.block_duration_s),
        ];
        for (key, value) in fields {
            if !value.is_finite() {
                return Err(GestureError::InvalidConfig {
                    key,
                    value,
                    reason: "must be finite",
                });
            }
            if value <= 0.0 {
                return Err(GestureError::InvalidConfig {
                    key,
                    value,
                    reason: "must be positive",
                });
            }
        }
        Ok(())
    }

    /// Generate s-expression for the active configuration.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:neutral-threshold {} :horizontal-threshold {} :horizontal-time-threshold {} :vertical-threshold {} :vertical-time-threshold {} :block-duration {})",
            self.neutral.threshold_m,
            self.swipe.horizontal_threshold_m,
            self.swipe.horizontal_time_threshold_s,
            self.swipe.vertical_threshold_m,
            self.swipe.vertical_time_threshold_s,
            self.lock.block_duration_s,
        )
    }
}
