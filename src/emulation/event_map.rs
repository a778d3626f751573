//! Compact per-pixel event labels.

use image::GrayImage;

/// Polarity of the brightness change at one pixel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Polarity {
    /// No change beyond the threshold.
    #[default]
    None = 0,
    /// Brightness increased.
    On = 1,
    /// Brightness decreased.
    Off = 2,
}

impl Polarity {
    /// Returns the label byte.
    #[inline]
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decodes a label byte. Returns `None` for bytes outside 0..=2.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Polarity::None),
            1 => Some(Polarity::On),
            2 => Some(Polarity::Off),
            _ => None,
        }
    }

    /// Returns true for `On` and `Off`.
    #[inline]
    pub fn is_event(self) -> bool {
        self != Polarity::None
    }
}

/// Label totals of one event map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventCounts {
    /// Pixels labelled `On`.
    pub on: usize,
    /// Pixels labelled `Off`.
    pub off: usize,
    /// Pixels without an event.
    pub none: usize,
}

impl EventCounts {
    /// Returns the number of labelled pixels.
    #[inline]
    pub fn total(&self) -> usize {
        self.on + self.off + self.none
    }

    /// Returns the number of `On` and `Off` labels.
    #[inline]
    pub fn events(&self) -> usize {
        self.on + self.off
    }

    /// Fraction of pixels carrying an event, in [0, 1].
    pub fn density(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.events() as f64 / total as f64,
        }
    }
}

/// Single-channel grid of polarity labels, one per pixel.
///
/// Built fresh for every frame pair and never updated in place.
#[derive(Clone, PartialEq, Eq)]
pub struct EventMap {
    labels: Vec<Polarity>,
    width: u32,
    height: u32,
}

impl EventMap {
    /// Packs row-major labels into a map.
    ///
    /// Callers guarantee `labels.len() == width * height`.
    pub(crate) fn from_labels(labels: Vec<Polarity>, width: u32, height: u32) -> Self {
        debug_assert_eq!(labels.len(), (width as usize) * (height as usize));
        Self {
            labels,
            width,
            height,
        }
    }

    /// Decodes a compact label buffer.
    ///
    /// Returns `None` if the length disagrees with the dimensions or a
    /// byte is not a valid label.
    pub fn from_bytes(bytes: &[u8], width: u32, height: u32) -> Option<Self> {
        if bytes.len() != (width as usize) * (height as usize) {
            return None;
        }
        let labels = bytes
            .iter()
            .map(|&b| Polarity::from_u8(b))
            .collect::<Option<Vec<_>>>()?;
        Some(Self::from_labels(labels, width, height))
    }

    /// Returns a map of the given size with every label `None`.
    pub fn empty(width: u32, height: u32) -> Self {
        Self::from_labels(
            vec![Polarity::None; (width as usize) * (height as usize)],
            width,
            height,
        )
    }

    /// Returns the width in pixels.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the height in pixels.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns all labels in row-major order.
    #[inline]
    pub fn labels(&self) -> &[Polarity] {
        &self.labels
    }

    /// Returns the label at `(x, y)`, or `None` outside the map.
    pub fn get(&self, x: u32, y: u32) -> Option<Polarity> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.labels
            .get((y as usize) * (self.width as usize) + x as usize)
            .copied()
    }

    /// Returns the compact encoding: 0 = none, 1 = on, 2 = off.
    pub fn as_bytes(&self) -> Vec<u8> {
        self.labels.iter().map(|p| p.as_u8()).collect()
    }

    /// Counts each label.
    pub fn counts(&self) -> EventCounts {
        self.labels
            .iter()
            .fold(EventCounts::default(), |mut acc, label| {
                match label {
                    Polarity::None => acc.none += 1,
                    Polarity::On => acc.on += 1,
                    Polarity::Off => acc.off += 1,
                }
                acc
            })
    }

    /// Returns the label bytes as a grayscale image.
    ///
    /// Values stay 0/1/2, so the image looks black when displayed.
    pub fn to_label_image(&self) -> GrayImage {
        GrayImage::from_fn(self.width, self.height, |x, y| {
            image::Luma([self.get(x, y).unwrap_or_default().as_u8()])
        })
    }
}

impl std::fmt::Debug for EventMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = self.counts();
        f.debug_struct("EventMap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("on", &counts.on)
            .field("off", &counts.off)
            .finish()
    }
}
