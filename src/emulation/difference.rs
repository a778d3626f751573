//! Signed frame differencing.
//!
//! Samples are widened before subtraction so that decreases stay
//! negative instead of wrapping around.

use super::EmulationError;
use crate::capture::{ChannelOrder, Frame};
use std::slice::ChunksExact;

/// Added to every sample before taking its logarithm.
///
/// Keeps near-black pixels from producing huge log differences.
pub const LOG_OFFSET: f64 = 10.0;

/// BT.601 luminance weights for red, green and blue.
const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Per-sample difference `current - previous`, laid out like the frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DifferenceMap<T> {
    values: Vec<T>,
    width: u32,
    height: u32,
    channels: u8,
}

impl<T: Copy> DifferenceMap<T> {
    fn new(values: Vec<T>, width: u32, height: u32, channels: u8) -> Self {
        Self {
            values,
            width,
            height,
            channels,
        }
    }

    /// Returns all difference values.
    #[inline]
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the differences stored per pixel.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Iterates over the per-pixel groups of channel differences.
    pub fn pixels(&self) -> ChunksExact<'_, T> {
        self.values.chunks_exact(self.channels.max(1) as usize)
    }
}

/// Fails unless both frames are well formed and share one shape.
pub fn check_shapes(current: &Frame, previous: &Frame) -> Result<(), EmulationError> {
    for frame in [current, previous] {
        if !frame.is_valid() {
            return Err(EmulationError::BufferSizeMismatch {
                expected: frame.expected_len(),
                actual: frame.pixels().len(),
            });
        }
    }
    if current.shape() != previous.shape() {
        return Err(EmulationError::ShapeMismatch {
            current: current.shape(),
            previous: previous.shape(),
        });
    }
    Ok(())
}

/// Raw intensity difference.
pub fn linear_difference(
    current: &Frame,
    previous: &Frame,
) -> Result<DifferenceMap<i16>, EmulationError> {
    check_shapes(current, previous)?;

    let values = current
        .pixels()
        .iter()
        .zip(previous.pixels())
        .map(|(&c, &p)| i16::from(c) - i16::from(p))
        .collect();

    Ok(DifferenceMap::new(
        values,
        current.width(),
        current.height(),
        current.channels(),
    ))
}

/// Log intensity difference, `ln(c + 10) - ln(p + 10)`.
pub fn log_difference(
    current: &Frame,
    previous: &Frame,
) -> Result<DifferenceMap<f64>, EmulationError> {
    check_shapes(current, previous)?;

    let values = current
        .pixels()
        .iter()
        .zip(previous.pixels())
        .map(|(&c, &p)| (f64::from(c) + LOG_OFFSET).ln() - (f64::from(p) + LOG_OFFSET).ln())
        .collect();

    Ok(DifferenceMap::new(
        values,
        current.width(),
        current.height(),
        current.channels(),
    ))
}

/// Difference of log luminance for 3-channel frames.
///
/// No offset is applied: black pixels have luminance 0 and a log of
/// negative infinity, so a pixel that turns black (or stops being
/// black) always differs by an infinite amount, while a pixel black in
/// both frames yields NaN.
pub fn log_luminance_difference(
    current: &Frame,
    previous: &Frame,
    order: ChannelOrder,
) -> Result<DifferenceMap<f64>, EmulationError> {
    check_shapes(current, previous)?;
    if current.channels() != 3 {
        return Err(EmulationError::UnsupportedChannelCount(current.channels()));
    }

    let offsets = order.rgb_offsets();
    let log_luma = |px: &[u8]| -> f64 {
        offsets
            .iter()
            .zip(LUMA_WEIGHTS)
            .map(|(&i, w)| f64::from(px[i]) * w)
            .sum::<f64>()
            .ln()
    };

    let values = current
        .pixels()
        .chunks_exact(3)
        .zip(previous.pixels().chunks_exact(3))
        .map(|(c, p)| log_luma(c) - log_luma(p))
        .collect();

    Ok(DifferenceMap::new(
        values,
        current.width(),
        current.height(),
        1,
    ))
}
