//! Frame source and application configuration.
//!
//! Every section of the file format falls back to its defaults, so an
//! empty TOML file is a valid configuration.

use super::ChannelOrder;
use crate::emulation::{EmulationError, EmulatorConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for frame capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Produce single-channel frames.
    pub grayscale: bool,
    /// Sample order of 3-channel frames.
    pub channel_order: ChannelOrder,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            grayscale: false,
            channel_order: ChannelOrder::Bgr,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Returns the channel count frames will carry.
    pub fn channels(&self) -> u8 {
        if self.grayscale {
            1
        } else {
            3
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// The emulator section failed validation.
    #[error("invalid emulator settings: {0}")]
    Emulator(#[from] EmulationError),
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[capture]` section.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// `[emulator]` section.
    #[serde(default)]
    pub emulator: EmulatorConfig,
    /// `[output]` section.
    #[serde(default)]
    pub output: OutputConfig,
}

/// What the CLI renders for each frame pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Red/blue on white visualization of the event map.
    #[default]
    Visual,
    /// Raw 0/1/2 label map as a grayscale image.
    Labels,
    /// Rounded structural-similarity diff image.
    Ssim,
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Run until interrupted (true) or process a fixed number of frames (false).
    pub continuous: bool,
    /// Number of frames to process if not continuous.
    pub frame_count: u32,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
    /// Rendering mode.
    pub mode: OutputMode,
    /// Directory receiving one PNG per processed frame pair.
    pub save_dir: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            continuous: false,
            frame_count: 100,
            metrics_port: 9090,
            mode: OutputMode::Visual,
            save_dir: None,
        }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        self.emulator.validate()?;
        Ok(())
    }
}
