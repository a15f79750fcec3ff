//! Separable convolution over the colour channels of a [`FrameBuffer`].
//!
//! Borders use reflect-101 (`dcb|abcd|cba`), the usual default for image
//! filters. Alpha is never convolved.

use rayon::prelude::*;

use crate::color::round_u8;
use crate::pipeline::FrameBuffer;

/// Widest useful kernel for `frame`. Under reflect-101 a wider window only
/// revisits the same samples, so callers clamp their size to this.
pub fn kernel_limit(frame: &FrameBuffer) -> usize {
    let extent = frame.width.max(frame.height) as usize;
    extent.saturating_mul(2).saturating_sub(1).max(1)
}

/// Normalized box kernel of `size` taps.
pub fn box_kernel(size: usize) -> Vec<f32> {
    let size = size.max(1);
    vec![1.0 / size as f32; size]
}

/// Normalized 1-D Gaussian kernel. A non-positive `sigma` is derived from the
/// size as `0.3 * ((size - 1) * 0.5 - 1) + 0.8`.
pub fn gaussian_kernel(size: usize, sigma: f64) -> Vec<f32> {
    let size = size.max(1);
    let sigma = if sigma > 0.0 {
        sigma
    } else {
        0.3 * ((size as f64 - 1.0) * 0.5 - 1.0) + 0.8
    };
    let center = (size as f64 - 1.0) / 2.0;
    let weights: Vec<f64> = (0..size)
        .map(|i| {
            let d = i as f64 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| (w / sum) as f32).collect()
}

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

/// Convolve the RGB channels with `kernel` horizontally then vertically.
/// Returns interleaved RGB samples, three per pixel, unrounded.
pub fn convolve_rgb(frame: &FrameBuffer, kernel: &[f32]) -> Vec<f32> {
    let w = frame.width as usize;
    let h = frame.height as usize;
    if w == 0 || h == 0 {
        return Vec::new();
    }
    let radius = (kernel.len() / 2) as isize;
    let src = &frame.data;

    let mut horizontal = vec![0f32; w * h * 3];
    horizontal
        .par_chunks_exact_mut(w * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let mut acc = [0f32; 3];
                for (k, &weight) in kernel.iter().enumerate() {
                    let sx = reflect_101(x as isize + k as isize - radius, w);
                    let p = (y * w + sx) * 4;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += weight * src[p + c] as f32;
                    }
                }
                row[x * 3..x * 3 + 3].copy_from_slice(&acc);
            }
        });

    let mut out = vec![0f32; w * h * 3];
    out.par_chunks_exact_mut(w * 3)
        .enumerate()
        .for_each(|(y, row)| {
            for x in 0..w {
                let mut acc = [0f32; 3];
                for (k, &weight) in kernel.iter().enumerate() {
                    let sy = reflect_101(y as isize + k as isize - radius, h);
                    let p = (sy * w + x) * 3;
                    for (c, sum) in acc.iter_mut().enumerate() {
                        *sum += weight * horizontal[p + c];
                    }
                }
                row[x * 3..x * 3 + 3].copy_from_slice(&acc);
            }
        });
    out
}

/// Blur the colour channels with `kernel`, rounding back to bytes. Alpha is
/// copied from `frame`.
pub fn blur_frame(frame: &FrameBuffer, kernel: &[f32]) -> FrameBuffer {
    let blurred = convolve_rgb(frame, kernel);
    let mut output = frame.clone();
    for (pixel, rgb) in output.data.chunks_exact_mut(4).zip(blurred.chunks_exact(3)) {
        pixel[0] = round_u8(rgb[0]);
        pixel[1] = round_u8(rgb[1]);
        pixel[2] = round_u8(rgb[2]);
    }
    output
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
        assert_eq!(reflect_101(-7, 1), 0);
    }

    #[test]
    fn test_kernels_are_normalized() {
        let sum: f32 = box_kernel(5).iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        let g = gaussian_kernel(5, 1.0);
        let sum: f32 = g.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(g[2] > g[1] && g[1] > g[0]);
        assert!((g[0] - g[4]).abs() < 1e-7);
    }

    #[test]
    fn test_gaussian_sigma_from_size() {
        let derived = gaussian_kernel(7, 0.0);
        let explicit = gaussian_kernel(7, 0.3 * ((7.0 - 1.0) * 0.5 - 1.0) + 0.8);
        assert_eq!(derived, explicit);
    }

    #[test]
    fn test_blur_of_flat_frame_is_flat() {
        let fb = FrameBuffer::from_rgba_vec(3, 3, [40, 80, 120, 200].repeat(9));
        let out = blur_frame(&fb, &box_kernel(3));
        assert_eq!(out.data, fb.data);
    }

    #[test]
    fn test_box_blur_spreads_single_pixel() {
        let mut fb = FrameBuffer::from_rgba_vec(3, 3, [0, 0, 0, 255].repeat(9));
        fb.pixel_mut(1, 1).copy_from_slice(&[90, 90, 90, 255]);
        let out = blur_frame(&fb, &box_kernel(3));
        assert_eq!(out.pixel(1, 1), &[10, 10, 10, 255]);
        // Reflected borders see the centre twice per axis.
        assert_eq!(out.pixel(1, 0), &[20, 20, 20, 255]);
        assert_eq!(out.pixel(0, 0), &[40, 40, 40, 255]);
    }

    #[test]
    fn test_kernel_limit_is_odd_and_follows_extent() {
        assert_eq!(kernel_limit(&FrameBuffer::new(2, 2)), 3);
        assert_eq!(kernel_limit(&FrameBuffer::new(7, 3)), 13);
        assert_eq!(kernel_limit(&FrameBuffer::new(0, 0)), 1);
    }

    #[test]
    fn test_empty_frame() {
        let fb = FrameBuffer::new(0, 4);
        assert!(convolve_rgb(&fb, &box_kernel(3)).is_empty());
    }
}
