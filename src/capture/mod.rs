//! Frame input and configuration.
//!
//! This module provides the frame type consumed by the emulator, the
//! sources that supply frames, and the configuration file format.
//! Sources are collaborators of the emulator, not part of it.

mod config;
mod frame;
mod source;

pub use config::{CaptureConfig, ConfigError, FileConfig, OutputConfig, OutputMode};
pub use frame::{ChannelOrder, Frame, Shape};
pub use source::{FrameSource, ImageSequenceSource, SourceError, SyntheticSource};
