//! Frame-by-frame event emulation.
//!
//! Pairs every incoming frame with the one before it. The emulator
//! itself stays stateless; only the stream remembers a frame.

use super::{ChannelPolicy, EmulationError, Emulator, EventMap};
use crate::capture::Frame;

/// Feeds consecutive frames through an [`Emulator`].
#[derive(Debug)]
pub struct EventStream {
    emulator: Emulator,
    /// Overrides the policy chosen from the channel count.
    policy: Option<ChannelPolicy>,
    /// Previous frame for differencing.
    previous: Option<Frame>,
}

impl EventStream {
    /// Creates a stream choosing the policy from each frame's channel count.
    pub fn new(emulator: Emulator) -> Self {
        Self {
            emulator,
            policy: None,
            previous: None,
        }
    }

    /// Creates a stream that always classifies with `policy`.
    pub fn with_policy(emulator: Emulator, policy: ChannelPolicy) -> Self {
        Self {
            policy: Some(policy),
            ..Self::new(emulator)
        }
    }

    /// Returns the wrapped emulator.
    pub fn emulator(&self) -> &Emulator {
        &self.emulator
    }

    /// Computes the event map of `frame` against the previous frame.
    ///
    /// Returns `Ok(None)` on the first frame. The frame is remembered
    /// even when classification fails, so a stream whose shape changed
    /// recovers on the next frame.
    pub fn process(&mut self, frame: &Frame) -> Result<Option<EventMap>, EmulationError> {
        let result = match self.previous.as_ref() {
            Some(previous) => {
                let map = match self.policy {
                    Some(policy) => self.emulator.classify_with_policy(frame, previous, policy),
                    None => self.emulator.difference_and_classify(frame, previous),
                };
                map.map(Some)
            }
            None => Ok(None),
        };

        self.previous = Some(frame.clone());
        result
    }

    /// Forgets the stored frame.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Returns true if ready to produce output.
    pub fn is_primed(&self) -> bool {
        self.previous.is_some()
    }
}
