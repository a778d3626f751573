//! Display rendering of event maps.

use super::{EventMap, Polarity};
use image::{Rgb, RgbImage};

/// Colour of pixels without an event.
pub const BACKGROUND_COLOR: Rgb<u8> = Rgb([255, 255, 255]);
/// Colour of ON events.
pub const ON_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
/// Colour of OFF events.
pub const OFF_COLOR: Rgb<u8> = Rgb([0, 0, 255]);

/// Renders an event map as red ON and blue OFF events on white.
pub fn visualize(map: &EventMap) -> RgbImage {
    let mut img = RgbImage::from_pixel(map.width(), map.height(), BACKGROUND_COLOR);
    for (pixel, label) in img.pixels_mut().zip(map.labels()) {
        match label {
            Polarity::On => *pixel = ON_COLOR,
            Polarity::Off => *pixel = OFF_COLOR,
            Polarity::None => {}
        }
    }
    img
}
