//! Frame type representing a captured image with metadata.

use std::fmt;

/// Sample order of a 3-channel frame.
///
/// The emulator itself is order-agnostic; order only matters when
/// channels are weighted (grayscale and luminance conversion).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelOrder {
    /// Red, green, blue.
    Rgb,
    /// Blue, green, red (the usual order of camera drivers).
    #[default]
    Bgr,
}

impl ChannelOrder {
    /// Returns the byte offsets of the red, green and blue samples.
    #[inline]
    pub fn rgb_offsets(self) -> [usize; 3] {
        match self {
            ChannelOrder::Rgb => [0, 1, 2],
            ChannelOrder::Bgr => [2, 1, 0],
        }
    }
}

/// Height, width and channel count of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Samples per pixel.
    pub channels: u8,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// A single captured frame.
///
/// Pixels are stored row-major and interleaved: sample `c` of pixel
/// `(x, y)` lives at `(y * width + x) * channels + c`.
#[derive(Clone)]
pub struct Frame {
    /// Raw pixel data.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Samples per pixel (1 for grayscale, 3 for colour).
    channels: u8,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, channels: u8, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            channels,
            sequence,
        }
    }

    /// Creates a frame with every sample set to `value`.
    pub fn filled(width: u32, height: u32, channels: u8, value: u8) -> Self {
        let len = (width as usize) * (height as usize) * (channels as usize);
        Self::new(vec![value; len], width, height, channels, 0)
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the number of samples per pixel.
    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Returns width, height and channel count together.
    #[inline]
    pub fn shape(&self) -> Shape {
        Shape {
            width: self.width,
            height: self.height,
            channels: self.channels,
        }
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Returns the expected buffer length for the declared dimensions.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.expected_len()
    }

    /// Converts a 3-channel frame to single-channel luma.
    ///
    /// Uses the fixed-point BT.601 weights common to imaging toolkits.
    /// Frames that are not 3-channel are returned unchanged.
    pub fn to_grayscale(&self, order: ChannelOrder) -> Frame {
        if self.channels != 3 {
            return self.clone();
        }

        let [r, g, b] = order.rgb_offsets();
        let pixels = self
            .pixels
            .chunks_exact(3)
            .map(|px| {
                let y = px[r] as u32 * 4899 + px[g] as u32 * 9617 + px[b] as u32 * 1868 + 8192;
                (y >> 14) as u8
            })
            .collect();

        Frame {
            pixels,
            width: self.width,
            height: self.height,
            channels: 1,
            sequence: self.sequence,
        }
    }

    /// Reorders a 3-channel frame so that samples are red, green, blue.
    pub fn to_rgb(&self, order: ChannelOrder) -> Frame {
        if self.channels != 3 || order == ChannelOrder::Rgb {
            return self.clone();
        }

        let mut out = self.clone();
        for px in out.pixels.chunks_exact_mut(3) {
            px.swap(0, 2);
        }
        out
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("channels", &self.channels)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 640 * 480 * 3];
        let frame = Frame::new(pixels, 640, 480, 3, 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 640 * 480]; // Missing two channels
        let frame = Frame::new(pixels, 640, 480, 3, 1);

        assert!(!frame.is_valid());
    }

    #[test]
    fn test_shape_display() {
        let frame = Frame::filled(4, 2, 3, 0);
        assert_eq!(frame.shape().to_string(), "4x2x3");
    }

    #[test]
    fn test_grayscale_weights() {
        // Pure red, green and blue in BGR order
        let pixels = vec![0, 0, 255, 0, 255, 0, 255, 0, 0];
        let frame = Frame::new(pixels, 3, 1, 3, 0);
        let gray = frame.to_grayscale(ChannelOrder::Bgr);

        assert_eq!(gray.channels(), 1);
        assert_eq!(gray.pixels(), &[76, 150, 29]);
    }

    #[test]
    fn test_grayscale_of_white_is_white() {
        let frame = Frame::filled(2, 2, 3, 255);
        let gray = frame.to_grayscale(ChannelOrder::Rgb);
        assert!(gray.pixels().iter().all(|&v| v == 255));
    }

    #[test]
    fn test_to_rgb_swaps_bgr() {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, 3, 0);
        let rgb = frame.to_rgb(ChannelOrder::Bgr);
        assert_eq!(rgb.pixels(), &[3, 2, 1, 6, 5, 4]);

        let same = frame.to_rgb(ChannelOrder::Rgb);
        assert_eq!(same.pixels(), frame.pixels());
    }
}
