//! Structural-similarity difference images.
//!
//! An alternative to thresholded differencing that yields a continuous
//! grayscale image instead of polarity labels. Dark pixels mark
//! structural change, bright pixels mark similarity.

use super::{difference::check_shapes, EmulationError};
use crate::capture::Frame;
use image::{GrayImage, Luma};

/// Side length of the square statistics window.
pub const WINDOW_SIZE: u32 = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

/// Scipy-style `reflect` border: `dcba|abcd|dcba`.
///
/// Only valid for overhangs no larger than `n`.
#[inline]
fn reflect(i: isize, n: usize) -> usize {
    let n = n as isize;
    if i < 0 {
        (-i - 1) as usize
    } else if i >= n {
        (2 * n - 1 - i) as usize
    } else {
        i as usize
    }
}

/// Mean over a `WINDOW_SIZE` square around every sample.
fn uniform_filter(plane: &[f64], width: usize, height: usize) -> Vec<f64> {
    let radius = (WINDOW_SIZE / 2) as isize;
    let norm = f64::from(WINDOW_SIZE);

    let mut rows = vec![0.0; plane.len()];
    for y in 0..height {
        let row = &plane[y * width..(y + 1) * width];
        for x in 0..width {
            let sum: f64 = (-radius..=radius)
                .map(|dx| row[reflect(x as isize + dx, width)])
                .sum();
            rows[y * width + x] = sum / norm;
        }
    }

    let mut out = vec![0.0; plane.len()];
    for y in 0..height {
        for x in 0..width {
            let sum: f64 = (-radius..=radius)
                .map(|dy| rows[reflect(y as isize + dy, height) * width + x])
                .sum();
            out[y * width + x] = sum / norm;
        }
    }
    out
}

/// Per-pixel SSIM of two single-channel planes.
fn plane_similarity(x: &[f64], y: &[f64], width: usize, height: usize) -> Vec<f64> {
    let np = f64::from(WINDOW_SIZE * WINDOW_SIZE);
    let cov_norm = np / (np - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let product = |a: &[f64], b: &[f64]| -> Vec<f64> {
        a.iter().zip(b).map(|(p, q)| p * q).collect()
    };

    let ux = uniform_filter(x, width, height);
    let uy = uniform_filter(y, width, height);
    let uxx = uniform_filter(&product(x, x), width, height);
    let uyy = uniform_filter(&product(y, y), width, height);
    let uxy = uniform_filter(&product(x, y), width, height);

    (0..x.len())
        .map(|i| {
            let vx = cov_norm * (uxx[i] - ux[i] * ux[i]);
            let vy = cov_norm * (uyy[i] - uy[i] * uy[i]);
            let vxy = cov_norm * (uxy[i] - ux[i] * uy[i]);

            let a1 = 2.0 * ux[i] * uy[i] + c1;
            let a2 = 2.0 * vxy + c2;
            let b1 = ux[i] * ux[i] + uy[i] * uy[i] + c1;
            let b2 = vx + vy + c2;
            (a1 * a2) / (b1 * b2)
        })
        .collect()
}

/// Computes the raw similarity map, one value in [-1, 1] per pixel.
///
/// Multi-channel frames are compared channel by channel and the
/// per-channel maps averaged.
pub fn similarity_map(current: &Frame, previous: &Frame) -> Result<Vec<f64>, EmulationError> {
    check_shapes(current, previous)?;
    if current.width() < WINDOW_SIZE || current.height() < WINDOW_SIZE {
        return Err(EmulationError::FrameTooSmall {
            width: current.width(),
            height: current.height(),
            window: WINDOW_SIZE,
        });
    }

    let width = current.width() as usize;
    let height = current.height() as usize;
    let channels = current.channels() as usize;
    if channels == 0 {
        return Err(EmulationError::UnsupportedChannelCount(0));
    }

    let plane = |frame: &Frame, c: usize| -> Vec<f64> {
        frame
            .pixels()
            .iter()
            .skip(c)
            .step_by(channels)
            .map(|&v| f64::from(v))
            .collect()
    };

    let mut mean = vec![0.0; width * height];
    for c in 0..channels {
        let s = plane_similarity(&plane(current, c), &plane(previous, c), width, height);
        for (m, v) in mean.iter_mut().zip(s) {
            *m += v;
        }
    }
    let count = channels as f64;
    for m in &mut mean {
        *m /= count;
    }
    Ok(mean)
}

/// Snaps near-white values to 255 and near-black values to 0.
#[inline]
pub fn round_extremes(value: u8, rounding_threshold: u8) -> u8 {
    if value > 255 - rounding_threshold {
        255
    } else if value < rounding_threshold {
        0
    } else {
        value
    }
}

/// Computes a grayscale structural diff image.
///
/// Similarity values are clamped to [0, 1], scaled to [0, 255]
/// (truncating), then passed through [`round_extremes`].
pub fn structural_diff(
    current: &Frame,
    previous: &Frame,
    rounding_threshold: u8,
) -> Result<GrayImage, EmulationError> {
    let map = similarity_map(current, previous)?;
    let width = current.width();

    let mut img = GrayImage::new(width, current.height());
    for (i, s) in map.into_iter().enumerate() {
        let scaled = (s.clamp(0.0, 1.0) * 255.0) as u8;
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        img.put_pixel(x, y, Luma([round_extremes(scaled, rounding_threshold)]));
    }
    Ok(img)
}
