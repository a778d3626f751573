//! Running statistics over a stream of event maps.

use crate::emulation::EventCounts;

/// Totals accumulated over every processed frame pair.
#[derive(Debug, Clone, Default)]
pub struct StreamStatistics {
    /// Frame pairs successfully classified.
    pub frames_processed: u64,
    /// Frames that failed classification.
    pub frames_failed: u64,
    /// ON events across all frames.
    pub total_on: u64,
    /// OFF events across all frames.
    pub total_off: u64,
    /// Event density of the most recent frame.
    pub last_density: f64,
    /// Highest event density seen.
    pub peak_density: f64,
    /// Sequence number of the most recent frame.
    pub last_sequence: u64,
    /// Whether the most recent frame failed.
    pub last_frame_failed: bool,
    density_sum: f64,
}

impl StreamStatistics {
    /// Creates empty statistics.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the counts of one classified frame.
    pub fn record(&mut self, sequence: u64, counts: &EventCounts) {
        let density = counts.density();

        self.frames_processed += 1;
        self.total_on += counts.on as u64;
        self.total_off += counts.off as u64;
        self.last_density = density;
        self.peak_density = self.peak_density.max(density);
        self.last_sequence = sequence;
        self.last_frame_failed = false;
        self.density_sum += density;

        tracing::trace!(
            sequence,
            on = counts.on,
            off = counts.off,
            density,
            "Frame statistics recorded"
        );
    }

    /// Records a frame pair compared without producing events, as in
    /// structural diff mode. Densities are left untouched.
    pub fn record_comparison(&mut self, sequence: u64) {
        self.frames_processed += 1;
        self.last_sequence = sequence;
        self.last_frame_failed = false;
    }

    /// Records a frame that could not be classified.
    pub fn record_failure(&mut self, sequence: u64) {
        self.frames_failed += 1;
        self.last_sequence = sequence;
        self.last_frame_failed = true;
    }

    /// Mean event density over processed frames.
    pub fn mean_density(&self) -> f64 {
        if self.frames_processed == 0 {
            return 0.0;
        }
        self.density_sum / self.frames_processed as f64
    }

    /// Total events of either polarity.
    pub fn total_events(&self) -> u64 {
        self.total_on + self.total_off
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_empty() {
        let stats = StreamStatistics::new();
        assert_eq!(stats.frames_processed, 0);
        assert_eq!(stats.mean_density(), 0.0);
    }

    #[test]
    fn test_accumulates_counts() {
        let mut stats = StreamStatistics::new();

        stats.record(1, &EventCounts { on: 3, off: 1, none: 4 });
        stats.record(2, &EventCounts { on: 0, off: 0, none: 8 });

        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.total_on, 3);
        assert_eq!(stats.total_off, 1);
        assert_eq!(stats.total_events(), 4);
        assert_eq!(stats.last_density, 0.0);
        assert!((stats.peak_density - 0.5).abs() < f64::EPSILON);
        assert!((stats.mean_density() - 0.25).abs() < f64::EPSILON);
        assert_eq!(stats.last_sequence, 2);
    }

    #[test]
    fn test_failures_counted_separately() {
        let mut stats = StreamStatistics::new();
        stats.record_failure(7);

        assert_eq!(stats.frames_failed, 1);
        assert_eq!(stats.frames_processed, 0);
        assert_eq!(stats.last_sequence, 7);
        assert!(stats.last_frame_failed);

        stats.record(8, &EventCounts { on: 1, off: 0, none: 3 });
        assert!(!stats.last_frame_failed);
    }

    #[test]
    fn test_comparisons_count_as_processed() {
        let mut stats = StreamStatistics::new();
        stats.record_failure(1);
        stats.record_comparison(2);
        stats.record_comparison(3);

        assert_eq!(stats.frames_processed, 2);
        assert_eq!(stats.frames_failed, 1);
        assert_eq!(stats.last_sequence, 3);
        assert!(!stats.last_frame_failed);
        assert_eq!(stats.total_events(), 0);
        assert_eq!(stats.mean_density(), 0.0);
    }
}
