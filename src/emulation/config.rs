//! Emulator settings.

use super::{EmulationError, MAX_BLUR_KERNEL};
use serde::{Deserialize, Serialize};

/// Default event threshold on raw 8-bit intensity differences.
pub const DEFAULT_THETA: f64 = 20.0;

/// Default snapping distance of the structural diff rounding filter.
pub const DEFAULT_ROUNDING_THRESHOLD: u8 = 50;

/// Settings shared by every emulator operation.
///
/// `theta` is compared against raw intensity differences in linear
/// mode and against differences of natural logarithms in log mode, so
/// log mode wants a much smaller value (around 0.1 to 0.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    /// Event threshold. Must be finite and positive.
    pub theta: f64,
    /// Emit OFF events at all. When false, decreases are ignored.
    pub record_off_events: bool,
    /// Report OFF events with the ON label.
    pub register_off_as_on: bool,
    /// Difference log intensities instead of raw intensities.
    pub use_log_diff: bool,
    /// Odd box-filter size applied to both frames before differencing.
    pub blur_kernel: Option<u32>,
    /// Distance from black/white within which structural diff values snap.
    pub rounding_threshold: u8,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            theta: DEFAULT_THETA,
            record_off_events: true,
            register_off_as_on: false,
            use_log_diff: false,
            blur_kernel: None,
            rounding_threshold: DEFAULT_ROUNDING_THRESHOLD,
        }
    }
}

impl EmulatorConfig {
    /// Creates a default configuration with the given threshold.
    pub fn with_theta(theta: f64) -> Self {
        Self {
            theta,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), EmulationError> {
        if !self.theta.is_finite() || self.theta <= 0.0 {
            return Err(EmulationError::InvalidThreshold(self.theta));
        }
        if let Some(k) = self.blur_kernel {
            if k == 0 || k % 2 == 0 || k > MAX_BLUR_KERNEL {
                return Err(EmulationError::InvalidKernelSize(k));
            }
        }
        Ok(())
    }
}
