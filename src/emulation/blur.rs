//! Box pre-filter.
//!
//! Averaging each frame before differencing suppresses single-pixel
//! flicker at the cost of spatial detail.

use crate::capture::Frame;

/// Largest accepted kernel side length.
pub const MAX_BLUR_KERNEL: u32 = 255;

/// Maps an out-of-range index back into `0..n`, mirroring about the
/// edge samples without repeating them (`gfedcb|abcdefgh|gfedcba`).
fn reflect_101(i: isize, n: usize) -> usize {
    if n == 1 {
        return 0;
    }
    let n = n as isize;
    let period = 2 * (n - 1);
    let mut i = i.rem_euclid(period);
    if i >= n {
        i = period - i;
    }
    i as usize
}

/// Applies a `kernel x kernel` mean filter to every channel.
///
/// Results are rounded to the nearest integer. `kernel` must be odd;
/// a kernel of 1 returns the frame unchanged and kernels above
/// [`MAX_BLUR_KERNEL`] are clamped to it.
pub fn box_blur(frame: &Frame, kernel: u32) -> Frame {
    if kernel <= 1 {
        return frame.clone();
    }
    let kernel = kernel.min(MAX_BLUR_KERNEL);

    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let channels = frame.channels() as usize;
    let radius = (kernel / 2) as isize;
    let src = frame.pixels();

    // Horizontal pass keeps running sums unnormalized.
    let mut rows = vec![0u64; src.len()];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let sum: u64 = (-radius..=radius)
                    .map(|dx| {
                        let sx = reflect_101(x as isize + dx, width);
                        u64::from(src[(y * width + sx) * channels + c])
                    })
                    .sum();
                rows[(y * width + x) * channels + c] = sum;
            }
        }
    }

    let area = u64::from(kernel) * u64::from(kernel);
    let mut out = vec![0u8; src.len()];
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let sum: u64 = (-radius..=radius)
                    .map(|dy| {
                        let sy = reflect_101(y as isize + dy, height);
                        rows[(sy * width + x) * channels + c]
                    })
                    .sum();
                out[(y * width + x) * channels + c] = ((sum + area / 2) / area) as u8;
            }
        }
    }

    Frame::new(
        out,
        frame.width(),
        frame.height(),
        frame.channels(),
        frame.sequence(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_101() {
        assert_eq!(reflect_101(-1, 5), 1);
        assert_eq!(reflect_101(-2, 5), 2);
        assert_eq!(reflect_101(5, 5), 3);
        assert_eq!(reflect_101(6, 5), 2);
        assert_eq!(reflect_101(3, 5), 3);
        assert_eq!(reflect_101(-3, 1), 0);
        assert_eq!(reflect_101(-2, 2), 0);
    }

    #[test]
    fn test_constant_frame_unchanged() {
        let frame = Frame::filled(6, 4, 3, 77);
        let blurred = box_blur(&frame, 5);
        assert_eq!(blurred.pixels(), frame.pixels());
    }

    #[test]
    fn test_impulse_spreads() {
        let mut pixels = vec![0u8; 25];
        pixels[12] = 225;
        let frame = Frame::new(pixels, 5, 5, 1, 0);

        let blurred = box_blur(&frame, 3);
        // 225 / 9 = 25 across the 3x3 neighbourhood of the centre
        assert_eq!(blurred.pixels()[12], 25);
        assert_eq!(blurred.pixels()[6], 25);
        assert_eq!(blurred.pixels()[0], 0);
    }

    #[test]
    fn test_kernel_one_is_identity() {
        let frame = Frame::new((0..16).collect(), 4, 4, 1, 0);
        assert_eq!(box_blur(&frame, 1).pixels(), frame.pixels());
    }

    #[test]
    fn test_oversized_kernel_clamped() {
        let frame = Frame::filled(2, 2, 1, 255);
        let blurred = box_blur(&frame, 4111);
        assert_eq!(blurred.pixels(), frame.pixels());

        let frame = Frame::filled(3, 2, 3, 200);
        assert_eq!(box_blur(&frame, u32::MAX).pixels(), frame.pixels());
    }
}
