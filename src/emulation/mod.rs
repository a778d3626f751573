//! Event camera emulation.
//!
//! Turns a pair of frames into a per-pixel polarity map:
//!
//! ```text
//! (current, previous) → [blur] → difference → threshold → EventMap → visualize
//!                     └──────────── structural_diff ──────────────→ GrayImage
//! ```
//!
//! Every operation is a pure function of its inputs. [`Emulator`] holds
//! only validated settings, so one instance can be shared across
//! threads and used on independent frame pairs concurrently.

mod blur;
mod config;
mod difference;
mod event_map;
mod ssim;
mod stream;
mod threshold;
mod visualize;

pub use blur::{box_blur, MAX_BLUR_KERNEL};
pub use config::{EmulatorConfig, DEFAULT_ROUNDING_THRESHOLD, DEFAULT_THETA};
pub use difference::{
    check_shapes, linear_difference, log_difference, log_luminance_difference, DifferenceMap,
    LOG_OFFSET,
};
pub use event_map::{EventCounts, EventMap, Polarity};
pub use ssim::{round_extremes, similarity_map, structural_diff, WINDOW_SIZE};
pub use stream::EventStream;
pub use threshold::{ChannelPolicy, Thresholder};
pub use visualize::{visualize, BACKGROUND_COLOR, OFF_COLOR, ON_COLOR};

use crate::capture::{ChannelOrder, Frame, Shape};
use image::GrayImage;
use std::borrow::Cow;
use thiserror::Error;

/// Errors raised by emulator operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmulationError {
    /// The two frames differ in width, height or channel count.
    #[error("frame shape mismatch: current {current}, previous {previous}")]
    ShapeMismatch {
        /// Shape of the current frame.
        current: Shape,
        /// Shape of the previous frame.
        previous: Shape,
    },

    /// Theta is not a finite positive number.
    #[error("invalid threshold {0} (must be finite and > 0)")]
    InvalidThreshold(f64),

    /// The frames' channel count does not fit the requested policy.
    #[error("unsupported channel count {0} (expected 1 or 3)")]
    UnsupportedChannelCount(u8),

    /// A frame's buffer length disagrees with its dimensions.
    #[error("pixel buffer holds {actual} bytes, dimensions require {expected}")]
    BufferSizeMismatch {
        /// Length implied by width, height and channels.
        expected: usize,
        /// Length of the buffer.
        actual: usize,
    },

    /// The blur kernel is even, zero or too large.
    #[error("invalid blur kernel size {0} (must be odd, 1..=255)")]
    InvalidKernelSize(u32),

    /// The frame cannot hold one similarity window.
    #[error("frame {width}x{height} is smaller than the {window}x{window} similarity window")]
    FrameTooSmall {
        /// Frame width.
        width: u32,
        /// Frame height.
        height: u32,
        /// Window side length.
        window: u32,
    },
}

/// Stateless event camera emulator.
#[derive(Debug, Clone, Copy)]
pub struct Emulator {
    config: EmulatorConfig,
}

impl Emulator {
    /// Creates an emulator after validating `config`.
    pub fn new(config: EmulatorConfig) -> Result<Self, EmulationError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active settings.
    pub fn config(&self) -> &EmulatorConfig {
        &self.config
    }

    /// Classifies a frame pair with the policy implied by its channel
    /// count: grayscale for 1 channel, all-channels-agree for 3.
    pub fn difference_and_classify(
        &self,
        current: &Frame,
        previous: &Frame,
    ) -> Result<EventMap, EmulationError> {
        check_shapes(current, previous)?;
        let policy = ChannelPolicy::for_channels(current.channels())?;
        self.classify_with_policy(current, previous, policy)
    }

    /// Classifies a 3-channel frame pair, firing when any channel crosses
    /// the threshold.
    pub fn classify_any_channel(
        &self,
        current: &Frame,
        previous: &Frame,
    ) -> Result<EventMap, EmulationError> {
        self.classify_with_policy(current, previous, ChannelPolicy::AnyChannel)
    }

    /// Classifies a frame pair with an explicit channel policy.
    pub fn classify_with_policy(
        &self,
        current: &Frame,
        previous: &Frame,
        policy: ChannelPolicy,
    ) -> Result<EventMap, EmulationError> {
        check_shapes(current, previous)?;
        if current.channels() != policy.channels() {
            return Err(EmulationError::UnsupportedChannelCount(current.channels()));
        }

        let (current, previous) = self.prefilter(current, previous);
        let thresholder = Thresholder::from_config(&self.config)?;

        let map = if self.config.use_log_diff {
            thresholder.classify(&log_difference(&current, &previous)?, policy)?
        } else {
            thresholder.classify(&linear_difference(&current, &previous)?, policy)?
        };

        tracing::trace!(
            sequence = current.sequence(),
            ?policy,
            counts = ?map.counts(),
            "Frame pair classified"
        );
        Ok(map)
    }

    /// Converts two colour frames to grayscale and classifies them.
    pub fn grayscale_events(
        &self,
        current: &Frame,
        previous: &Frame,
        order: ChannelOrder,
    ) -> Result<EventMap, EmulationError> {
        check_shapes(current, previous)?;
        let current = current.to_grayscale(order);
        let previous = previous.to_grayscale(order);
        self.classify_with_policy(&current, &previous, ChannelPolicy::Grayscale)
    }

    /// Classifies log luminance changes of two 3-channel frames.
    ///
    /// Uses the configured theta against `ln(L_cur) - ln(L_prev)`;
    /// values around 0.25 are typical. Blur and log mode settings do
    /// not apply.
    pub fn classify_log_luminance(
        &self,
        current: &Frame,
        previous: &Frame,
        order: ChannelOrder,
    ) -> Result<EventMap, EmulationError> {
        let diff = log_luminance_difference(current, previous, order)?;
        Thresholder::from_config(&self.config)?.classify(&diff, ChannelPolicy::Grayscale)
    }

    /// Computes the rounded structural diff image with the configured
    /// rounding threshold.
    pub fn structural_diff(
        &self,
        current: &Frame,
        previous: &Frame,
    ) -> Result<GrayImage, EmulationError> {
        structural_diff(current, previous, self.config.rounding_threshold)
    }

    fn prefilter<'a>(
        &self,
        current: &'a Frame,
        previous: &'a Frame,
    ) -> (Cow<'a, Frame>, Cow<'a, Frame>) {
        match self.config.blur_kernel {
            Some(k) if k > 1 => (
                Cow::Owned(box_blur(current, k)),
                Cow::Owned(box_blur(previous, k)),
            ),
            _ => (Cow::Borrowed(current), Cow::Borrowed(previous)),
        }
    }
}

impl Default for Emulator {
    fn default() -> Self {
        Self {
            config: EmulatorConfig::default(),
        }
    }
}
