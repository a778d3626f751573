//! Polarity classification of difference maps.
//!
//! One thresholder serves every channel layout; the policy only decides
//! how the per-channel comparisons of a pixel are combined.

use super::{DifferenceMap, EmulationError, EmulatorConfig, EventMap, Polarity};

/// How the channels of one pixel are combined into a single decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelPolicy {
    /// Single-channel input, compared directly.
    Grayscale,
    /// 3-channel input; every channel must cross the threshold.
    AllChannels,
    /// 3-channel input; one channel crossing the threshold is enough.
    AnyChannel,
}

impl ChannelPolicy {
    /// Selects the default policy for a channel count.
    pub fn for_channels(channels: u8) -> Result<Self, EmulationError> {
        match channels {
            1 => Ok(ChannelPolicy::Grayscale),
            3 => Ok(ChannelPolicy::AllChannels),
            n => Err(EmulationError::UnsupportedChannelCount(n)),
        }
    }

    /// Returns the channel count this policy is defined for.
    pub fn channels(self) -> u8 {
        match self {
            ChannelPolicy::Grayscale => 1,
            ChannelPolicy::AllChannels | ChannelPolicy::AnyChannel => 3,
        }
    }

    fn triggers<T>(self, pixel: &[T], crosses: impl Fn(f64) -> bool) -> bool
    where
        T: Copy + Into<f64>,
    {
        match self {
            ChannelPolicy::Grayscale => pixel.first().is_some_and(|&d| crosses(d.into())),
            ChannelPolicy::AllChannels => pixel.iter().all(|&d| crosses(d.into())),
            ChannelPolicy::AnyChannel => pixel.iter().any(|&d| crosses(d.into())),
        }
    }
}

/// Threshold settings applied to a difference map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholder {
    theta: f64,
    record_off_events: bool,
    register_off_as_on: bool,
}

impl Thresholder {
    /// Creates a thresholder, rejecting non-finite or non-positive `theta`.
    pub fn new(
        theta: f64,
        record_off_events: bool,
        register_off_as_on: bool,
    ) -> Result<Self, EmulationError> {
        if !theta.is_finite() || theta <= 0.0 {
            return Err(EmulationError::InvalidThreshold(theta));
        }
        Ok(Self {
            theta,
            record_off_events,
            register_off_as_on,
        })
    }

    /// Builds a thresholder from emulator settings.
    pub fn from_config(config: &EmulatorConfig) -> Result<Self, EmulationError> {
        Self::new(
            config.theta,
            config.record_off_events,
            config.register_off_as_on,
        )
    }

    /// Returns the event threshold.
    #[inline]
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Labels a single pixel.
    ///
    /// ON is tested first and wins; OFF is only considered when OFF
    /// events are recorded.
    pub fn label<T>(&self, pixel: &[T], policy: ChannelPolicy) -> Polarity
    where
        T: Copy + Into<f64>,
    {
        let theta = self.theta;
        if policy.triggers(pixel, |d| d > theta) {
            Polarity::On
        } else if self.record_off_events && policy.triggers(pixel, |d| d < -theta) {
            if self.register_off_as_on {
                Polarity::On
            } else {
                Polarity::Off
            }
        } else {
            Polarity::None
        }
    }

    /// Labels every pixel of a difference map.
    pub fn classify<T>(
        &self,
        diff: &DifferenceMap<T>,
        policy: ChannelPolicy,
    ) -> Result<EventMap, EmulationError>
    where
        T: Copy + Into<f64>,
    {
        if diff.channels() != policy.channels() {
            return Err(EmulationError::UnsupportedChannelCount(diff.channels()));
        }

        let labels = diff.pixels().map(|px| self.label(px, policy)).collect();
        Ok(EventMap::from_labels(labels, diff.width(), diff.height()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholder(record_off: bool, off_as_on: bool) -> Thresholder {
        Thresholder::new(20.0, record_off, off_as_on).unwrap()
    }

    #[test]
    fn test_policy_for_channels() {
        assert_eq!(ChannelPolicy::for_channels(1).unwrap(), ChannelPolicy::Grayscale);
        assert_eq!(ChannelPolicy::for_channels(3).unwrap(), ChannelPolicy::AllChannels);
        assert!(matches!(
            ChannelPolicy::for_channels(4),
            Err(EmulationError::UnsupportedChannelCount(4))
        ));
    }

    #[test]
    fn test_grayscale_labels() {
        let t = thresholder(true, false);
        assert_eq!(t.label(&[30i16], ChannelPolicy::Grayscale), Polarity::On);
        assert_eq!(t.label(&[-30i16], ChannelPolicy::Grayscale), Polarity::Off);
        assert_eq!(t.label(&[20i16], ChannelPolicy::Grayscale), Polarity::None);
        assert_eq!(t.label(&[-20i16], ChannelPolicy::Grayscale), Polarity::None);
    }

    #[test]
    fn test_all_channels_requires_agreement() {
        let t = thresholder(true, false);
        assert_eq!(t.label(&[25i16, 30, 21], ChannelPolicy::AllChannels), Polarity::On);
        assert_eq!(t.label(&[25i16, 30, 5], ChannelPolicy::AllChannels), Polarity::None);
        assert_eq!(t.label(&[-25i16, -30, -21], ChannelPolicy::AllChannels), Polarity::Off);
    }

    #[test]
    fn test_any_channel_triggers() {
        let t = thresholder(true, false);
        assert_eq!(t.label(&[0i16, 30, 0], ChannelPolicy::AnyChannel), Polarity::On);
        assert_eq!(t.label(&[0i16, -30, 0], ChannelPolicy::AnyChannel), Polarity::Off);
        assert_eq!(t.label(&[1i16, 2, 3], ChannelPolicy::AnyChannel), Polarity::None);
    }

    #[test]
    fn test_on_takes_precedence_over_off() {
        let t = thresholder(true, false);
        assert_eq!(t.label(&[40i16, 0, -40], ChannelPolicy::AnyChannel), Polarity::On);
    }

    #[test]
    fn test_off_suppressed() {
        let t = thresholder(false, false);
        assert_eq!(t.label(&[-90i16], ChannelPolicy::Grayscale), Polarity::None);
        assert_eq!(t.label(&[90i16], ChannelPolicy::Grayscale), Polarity::On);
    }

    #[test]
    fn test_off_collapsed_to_on() {
        let t = thresholder(true, true);
        assert_eq!(t.label(&[-90i16], ChannelPolicy::Grayscale), Polarity::On);
        assert_eq!(t.label(&[0i16], ChannelPolicy::Grayscale), Polarity::None);
    }

    #[test]
    fn test_nan_is_never_an_event() {
        let t = Thresholder::new(0.25, true, false).unwrap();
        assert_eq!(t.label(&[f64::NAN], ChannelPolicy::Grayscale), Polarity::None);
        assert_eq!(t.label(&[f64::NEG_INFINITY], ChannelPolicy::Grayscale), Polarity::Off);
    }

    #[test]
    fn test_invalid_theta() {
        assert!(matches!(
            Thresholder::new(0.0, true, false),
            Err(EmulationError::InvalidThreshold(_))
        ));
        assert!(Thresholder::new(f64::NAN, true, false).is_err());
    }
}
