//! Frame source abstraction.
//!
//! The emulator only consumes frames; where they come from is decided
//! here. A synthetic source drives tests and demos, and an image
//! sequence source replays a directory of still images.

use super::{CaptureConfig, ChannelOrder, Frame};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while acquiring frames.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The source location does not exist.
    #[error("frame source not found: {0}")]
    NotFound(String),
    /// The source exists but could not be opened.
    #[error("failed to open frame source: {0}")]
    OpenFailed(String),
    /// The capture configuration was rejected.
    #[error("failed to configure frame source: {0}")]
    ConfigFailed(String),
    /// A single frame could not be produced.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// `capture` was called before `open`.
    #[error("frame source not initialized")]
    NotInitialized,
    /// No frames are left.
    #[error("end of stream")]
    EndOfStream,
}

/// Trait for frame source implementations.
///
/// A source must keep height, width and channel count constant for
/// the lifetime of one `open` call.
pub trait FrameSource {
    /// Opens and initializes the source with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), SourceError>;

    /// Captures the next frame.
    fn capture(&mut self) -> Result<Frame, SourceError>;

    /// Checks if the source is currently open.
    fn is_open(&self) -> bool;

    /// Closes the source and releases resources.
    fn close(&mut self);
}

/// Side length of the moving square drawn by [`SyntheticSource`].
const SQUARE_SIZE: u32 = 8;

/// Deterministic source rendering a bright square sliding over a
/// horizontal gradient.
#[derive(Debug, Default)]
pub struct SyntheticSource {
    config: Option<CaptureConfig>,
    sequence: u64,
}

impl SyntheticSource {
    /// Creates a closed synthetic source.
    pub fn new() -> Self {
        Self::default()
    }

    fn render(config: &CaptureConfig, sequence: u64) -> Vec<u8> {
        let channels = config.channels() as usize;
        let (width, height) = (config.width, config.height);
        let square_x = ((sequence * 2) % u64::from(width.max(1))) as u32;
        let square_y = height.saturating_sub(SQUARE_SIZE) / 2;

        let mut pixels = Vec::with_capacity((width * height) as usize * channels);
        for y in 0..height {
            for x in 0..width {
                let inside = x >= square_x
                    && x < square_x + SQUARE_SIZE
                    && y >= square_y
                    && y < square_y + SQUARE_SIZE;
                let value = if inside {
                    250
                } else {
                    (x * 200 / width.max(1)) as u8
                };
                pixels.extend(std::iter::repeat(value).take(channels));
            }
        }
        pixels
    }
}

impl FrameSource for SyntheticSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), SourceError> {
        config
            .validate()
            .map_err(|e| SourceError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        self.sequence = 0;
        tracing::info!(?config, "Synthetic source opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, SourceError> {
        let config = self.config.as_ref().ok_or(SourceError::NotInitialized)?;
        let pixels = Self::render(config, self.sequence);

        self.sequence += 1;
        Ok(Frame::new(
            pixels,
            config.width,
            config.height,
            config.channels(),
            self.sequence,
        ))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("Synthetic source closed");
    }
}

/// Replays the images of a directory in lexicographic file name order.
///
/// Images are converted to the configured channel layout. Every image
/// must share the dimensions of the first one.
#[derive(Debug)]
pub struct ImageSequenceSource {
    dir: PathBuf,
    files: Vec<PathBuf>,
    next: usize,
    grayscale: bool,
    order: ChannelOrder,
    opened: bool,
    sequence: u64,
}

/// File extensions recognised as frames.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

impl ImageSequenceSource {
    /// Creates a closed source reading images from `dir`.
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            files: Vec::new(),
            next: 0,
            grayscale: false,
            order: ChannelOrder::Bgr,
            opened: false,
            sequence: 0,
        }
    }

    /// Returns the number of frames found when the source was opened.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Returns true if the directory held no images.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn decode(&self, path: &Path) -> Result<Frame, SourceError> {
        let img = image::open(path)
            .map_err(|e| SourceError::CaptureFailed(format!("{}: {}", path.display(), e)))?;

        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        let mut pixels = rgb.into_raw();
        let sequence = self.sequence + 1;

        if self.grayscale {
            let frame = Frame::new(pixels, width, height, 3, sequence);
            return Ok(frame.to_grayscale(ChannelOrder::Rgb));
        }
        if self.order == ChannelOrder::Bgr {
            for px in pixels.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
        }
        Ok(Frame::new(pixels, width, height, 3, sequence))
    }
}

impl FrameSource for ImageSequenceSource {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), SourceError> {
        if !self.dir.is_dir() {
            return Err(SourceError::NotFound(self.dir.display().to_string()));
        }

        let entries = std::fs::read_dir(&self.dir)
            .map_err(|e| SourceError::OpenFailed(format!("{}: {}", self.dir.display(), e)))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                    .unwrap_or(false)
            })
            .collect();
        files.sort();

        if files.is_empty() {
            return Err(SourceError::OpenFailed(format!(
                "no images in {}",
                self.dir.display()
            )));
        }

        self.files = files;
        self.next = 0;
        self.sequence = 0;
        self.grayscale = config.grayscale;
        self.order = config.channel_order;
        self.opened = true;

        tracing::info!(
            dir = %self.dir.display(),
            frames = self.files.len(),
            "Image sequence opened"
        );
        Ok(())
    }

    fn capture(&mut self) -> Result<Frame, SourceError> {
        if !self.opened {
            return Err(SourceError::NotInitialized);
        }
        let path = self
            .files
            .get(self.next)
            .cloned()
            .ok_or(SourceError::EndOfStream)?;

        // Advance first so an undecodable file is skipped, not retried.
        self.next += 1;
        let frame = self.decode(&path)?;
        self.sequence += 1;
        Ok(frame)
    }

    fn is_open(&self) -> bool {
        self.opened
    }

    fn close(&mut self) {
        self.opened = false;
        self.files.clear();
        tracing::info!("Image sequence closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_source_lifecycle() {
        let mut source = SyntheticSource::new();
        let config = CaptureConfig::with_dimensions(32, 16);

        assert!(!source.is_open());

        source.open(&config).unwrap();
        assert!(source.is_open());

        let frame = source.capture().unwrap();
        assert!(frame.is_valid());
        assert_eq!(frame.channels(), 3);
        assert_eq!(frame.sequence(), 1);

        let frame2 = source.capture().unwrap();
        assert_eq!(frame2.sequence(), 2);
        assert_ne!(frame.pixels(), frame2.pixels());

        source.close();
        assert!(!source.is_open());
    }

    #[test]
    fn test_synthetic_grayscale() {
        let mut source = SyntheticSource::new();
        let mut config = CaptureConfig::with_dimensions(16, 16);
        config.grayscale = true;
        source.open(&config).unwrap();

        let frame = source.capture().unwrap();
        assert_eq!(frame.channels(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_capture_without_open() {
        let mut source = SyntheticSource::new();
        assert!(matches!(source.capture(), Err(SourceError::NotInitialized)));
    }

    #[test]
    fn test_missing_directory() {
        let mut source = ImageSequenceSource::new("/nonexistent/event-emulation-frames");
        assert!(matches!(
            source.open(&CaptureConfig::default()),
            Err(SourceError::NotFound(_))
        ));
    }

    #[test]
    fn test_image_sequence_replays_in_order() {
        let dir = std::env::temp_dir().join(format!("event-emulation-seq-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        for (name, value) in [("b.png", 200u8), ("a.png", 100u8)] {
            let img = image::RgbImage::from_pixel(4, 3, image::Rgb([value, 0, 0]));
            img.save(dir.join(name)).unwrap();
        }
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();

        let mut source = ImageSequenceSource::new(&dir);
        source.open(&CaptureConfig::default()).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.capture().unwrap();
        assert_eq!((first.width(), first.height(), first.channels()), (4, 3, 3));
        // BGR order puts red last
        assert_eq!(&first.pixels()[..3], &[0, 0, 100]);

        let second = source.capture().unwrap();
        assert_eq!(&second.pixels()[..3], &[0, 0, 200]);
        assert_eq!(second.sequence(), 2);

        assert!(matches!(source.capture(), Err(SourceError::EndOfStream)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_image_sequence_grayscale_matches_frame_conversion() {
        let dir = std::env::temp_dir().join(format!("event-emulation-gray-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        image::RgbImage::from_pixel(2, 2, image::Rgb([100, 0, 0]))
            .save(dir.join("a.png"))
            .unwrap();

        let mut config = CaptureConfig::default();
        config.grayscale = true;
        let mut source = ImageSequenceSource::new(&dir);
        source.open(&config).unwrap();

        let frame = source.capture().unwrap();
        assert_eq!(frame.channels(), 1);
        // BT.601 luma of pure red 100
        assert_eq!(frame.pixels(), &[30, 30, 30, 30]);

        let colour = Frame::new(vec![100, 0, 0].repeat(4), 2, 2, 3, 1);
        assert_eq!(
            frame.pixels(),
            colour.to_grayscale(ChannelOrder::Rgb).pixels()
        );

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
