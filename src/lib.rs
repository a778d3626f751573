//! Event Camera Emulation Library
//!
//! Emulates the output of an event camera (a sensor reporting per-pixel
//! brightness changes instead of full frames) from conventional video
//! frames. Two consecutive frames are differenced and thresholded into
//! a compact map of ON (brighter), OFF (darker) and no-change labels.
//!
//! # Architecture
//!
//! ```text
//! capture → emulation (difference → threshold → event map) → visualize
//!                ↓
//!           analysis → metrics
//! ```
//!
//! # Design Principles
//!
//! - **Stateless core**: [`Emulator`] is a pure function of a frame pair
//! - **Fail fast**: mismatched shapes and bad thresholds are errors, never
//!   silently cropped or clamped
//! - **Synchronous approximation**: no timestamps, noise model or
//!   asynchronous event stream, one event map per frame pair
//!
//! # Example
//!
//! ```no_run
//! use event_emulation::{
//!     capture::{CaptureConfig, FrameSource, SyntheticSource},
//!     emulation::{visualize, Emulator, EmulatorConfig, EventStream},
//! };
//!
//! let mut source = SyntheticSource::new();
//! source.open(&CaptureConfig::with_dimensions(64, 48)).unwrap();
//!
//! let emulator = Emulator::new(EmulatorConfig::with_theta(30.0)).unwrap();
//! let mut stream = EventStream::new(emulator);
//!
//! for _ in 0..10 {
//!     let frame = source.capture().unwrap();
//!     if let Some(events) = stream.process(&frame).unwrap() {
//!         let counts = events.counts();
//!         println!("on={} off={}", counts.on, counts.off);
//!         let _image = visualize(&events);
//!     }
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod analysis;
pub mod capture;
pub mod emulation;
pub mod metrics;

// Re-export commonly used types at crate root
pub use analysis::StreamStatistics;
pub use capture::{
    CaptureConfig, ChannelOrder, FileConfig, Frame, FrameSource, ImageSequenceSource,
    SyntheticSource,
};
pub use emulation::{
    visualize, ChannelPolicy, EmulationError, Emulator, EmulatorConfig, EventCounts, EventMap,
    EventStream, Polarity,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
