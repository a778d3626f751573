//! Prometheus metrics exporter for event emulation.
//!
//! # Metrics Exposed
//!
//! - `event_emulation_frames_processed_total` - Frame pairs classified
//! - `event_emulation_frames_failed_total` - Frames rejected by the emulator
//! - `event_emulation_last_sequence` - Sequence number of the latest frame
//! - `event_emulation_on_events_total` - ON events emitted
//! - `event_emulation_off_events_total` - OFF events emitted
//! - `event_emulation_event_density` - Event density of the latest frame
//!
//! With the `metrics` feature the registry is served over HTTP at
//! `/metrics`, next to a `/health` endpoint reporting the stream state.
//!
//! # Example
//!
//! ```no_run
//! use event_emulation::metrics::{MetricsRegistry, MetricsSnapshot};
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//!
//! let snapshot = MetricsSnapshot {
//!     frames_processed: 100,
//!     frames_failed: 0,
//!     on_events: 5120,
//!     off_events: 4870,
//!     event_density: 0.03,
//!     last_sequence: 101,
//!     last_frame_failed: false,
//! };
//!
//! registry.update(&snapshot);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, MetricsState, ServerError, StreamHealth};
