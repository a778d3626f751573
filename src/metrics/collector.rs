//! Metrics collection and registry.

use crate::analysis::StreamStatistics;
use prometheus::{Encoder, Gauge, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registration or encoding failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of stream state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Frame pairs classified.
    pub frames_processed: u64,
    /// Frames rejected by the emulator.
    pub frames_failed: u64,
    /// ON events emitted so far.
    pub on_events: u64,
    /// OFF events emitted so far.
    pub off_events: u64,
    /// Event density of the latest frame.
    pub event_density: f64,
    /// Sequence number of the latest frame.
    pub last_sequence: u64,
    /// Whether the latest frame failed.
    pub last_frame_failed: bool,
}

impl MetricsSnapshot {
    /// Creates a snapshot from running stream statistics.
    pub fn from_statistics(stats: &StreamStatistics) -> Self {
        Self {
            frames_processed: stats.frames_processed,
            frames_failed: stats.frames_failed,
            on_events: stats.total_on,
            off_events: stats.total_off,
            event_density: stats.last_density,
            last_sequence: stats.last_sequence,
            last_frame_failed: stats.last_frame_failed,
        }
    }
}

/// Prometheus metrics registry for event emulation.
pub struct MetricsRegistry {
    registry: Registry,

    // Frame metrics
    frames_processed: IntCounter,
    frames_failed: IntCounter,
    last_sequence: IntGauge,

    // Event metrics
    on_events: IntCounter,
    off_events: IntCounter,
    event_density: Gauge,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all emulation metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let frames_processed = IntCounter::new(
            "event_emulation_frames_processed_total",
            "Total number of frame pairs classified",
        )?;
        let frames_failed = IntCounter::new(
            "event_emulation_frames_failed_total",
            "Total number of frames rejected by the emulator",
        )?;
        let last_sequence = IntGauge::new(
            "event_emulation_last_sequence",
            "Sequence number of the most recent frame",
        )?;

        let on_events = IntCounter::new(
            "event_emulation_on_events_total",
            "Total number of ON events emitted",
        )?;
        let off_events = IntCounter::new(
            "event_emulation_off_events_total",
            "Total number of OFF events emitted",
        )?;
        let event_density = Gauge::new(
            "event_emulation_event_density",
            "Fraction of pixels carrying an event in the latest frame",
        )?;

        registry.register(Box::new(frames_processed.clone()))?;
        registry.register(Box::new(frames_failed.clone()))?;
        registry.register(Box::new(last_sequence.clone()))?;
        registry.register(Box::new(on_events.clone()))?;
        registry.register(Box::new(off_events.clone()))?;
        registry.register(Box::new(event_density.clone()))?;

        Ok(Self {
            registry,
            frames_processed,
            frames_failed,
            last_sequence,
            on_events,
            off_events,
            event_density,
        })
    }

    /// Updates all metrics from a snapshot of stream state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        // Counters only move forward, so increment by the difference
        advance(&self.frames_processed, snapshot.frames_processed);
        advance(&self.frames_failed, snapshot.frames_failed);
        advance(&self.on_events, snapshot.on_events);
        advance(&self.off_events, snapshot.off_events);

        self.last_sequence.set(snapshot.last_sequence as i64);
        self.event_density.set(snapshot.event_density);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, target: u64) {
    let current = counter.get();
    if target > current {
        counter.inc_by(target - current);
    }
}
