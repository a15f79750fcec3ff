//! Built-in pixel transforms.
//!
//! Every transform works on 8-bit RGBA and leaves alpha untouched. Strengths
//! are the raw numbers from the filter spec; tonal adjustments read them as
//! percentages or channel steps, spatial filters as kernel sizes.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use rayon::prelude::*;

use crate::color::{self, Hsv, HUE_PERIOD, round_u8};
use crate::convolve::{blur_frame, box_kernel, gaussian_kernel, kernel_limit};
use crate::error::{CoreError, Result};
use crate::pipeline::{FrameBuffer, PixelTransform, TransformContext};
use crate::spec::CropRect;

/// Pixels whose blurred value is this close to the original are left alone
/// by [`Sharpen`].
pub const SHARPEN_THRESHOLD: f32 = 10.0;

/// Apply `f` to every pixel, row-parallel.
fn map_pixels<F>(mut input: FrameBuffer, f: F) -> FrameBuffer
where
    F: Fn(&mut [u8]) + Send + Sync,
{
    let row_bytes = input.width as usize * 4;
    if row_bytes == 0 || input.data.is_empty() {
        return input;
    }
    // Row-based parallelism to avoid rayon micro-task overhead
    input.data.par_chunks_exact_mut(row_bytes).for_each(|row| {
        for pixel in row.chunks_exact_mut(4) {
            f(pixel);
        }
    });
    input
}

fn map_hsv<F>(input: FrameBuffer, f: F) -> FrameBuffer
where
    F: Fn(Hsv) -> Hsv + Send + Sync,
{
    map_pixels(input, |pixel| {
        let hsv = f(color::rgb_to_hsv(pixel[0], pixel[1], pixel[2]));
        pixel[..3].copy_from_slice(&color::hsv_to_rgb(hsv));
    })
}

/// Percent strength mapped to `[0, 1]`.
fn intensity(strength: f64) -> f64 {
    (strength / 100.0).clamp(0.0, 1.0)
}

/// Smallest odd number at least `n`.
fn odd(n: usize) -> usize {
    if n % 2 == 0 { n + 1 } else { n }
}

// =============================================================================
// Tonal adjustments
// =============================================================================

/// Adds the strength to the HSV value channel.
pub struct Brightness;

impl PixelTransform for Brightness {
    fn process(&self, input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        let shift = strength as f32;
        map_hsv(input, |hsv| Hsv {
            v: (hsv.v + shift).clamp(0.0, 255.0),
            ..hsv
        })
    }

    fn is_identity(&self, strength: f64) -> bool {
        strength == 0.0
    }
}

/// Scales the Lab chroma channels about neutral by `1 + strength/100`.
pub struct Contrast;

impl PixelTransform for Contrast {
    fn process(&self, input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        let scale = 1.0 + strength as f32 / 100.0;
        // 8-bit Lab stores chroma offset by 128; clamp to that range.
        let stretch = |c: f32| (c * scale).clamp(-128.0, 127.0);
        map_pixels(input, |pixel| {
            let lab = color::rgb_to_lab(pixel[0], pixel[1], pixel[2]);
            let adjusted = color::Lab {
                a: stretch(lab.a),
                b: stretch(lab.b),
                ..lab
            };
            pixel[..3].copy_from_slice(&color::lab_to_rgb(adjusted));
        })
    }

    fn is_identity(&self, strength: f64) -> bool {
        strength == 0.0
    }
}

/// Scales HSV saturation by `1 + strength/100`.
pub struct Saturation;

impl PixelTransform for Saturation {
    fn process(&self, input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        let scale = 1.0 + strength as f32 / 100.0;
        map_hsv(input, |hsv| Hsv {
            s: (hsv.s * scale).clamp(0.0, 255.0),
            ..hsv
        })
    }

    fn is_identity(&self, strength: f64) -> bool {
        strength == 0.0
    }
}

/// Rotates hue by `strength` steps of the 180-step wheel.
pub struct Hue;

impl PixelTransform for Hue {
    fn process(&self, input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        let shift = strength as f32;
        map_hsv(input, |hsv| Hsv {
            h: (hsv.h + shift).rem_euclid(HUE_PERIOD),
            ..hsv
        })
    }

    fn is_identity(&self, strength: f64) -> bool {
        (strength as f32).rem_euclid(HUE_PERIOD) == 0.0
    }
}

// =============================================================================
// Stylistic filters
// =============================================================================

/// Converts each pixel to luminance, preserving alpha.
pub struct Grayscale;

impl PixelTransform for Grayscale {
    fn process(&self, input: FrameBuffer, _strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        map_pixels(input, |pixel| {
            let l = round_u8(color::luma(pixel[0], pixel[1], pixel[2]));
            pixel[0] = l;
            pixel[1] = l;
            pixel[2] = l;
        })
    }
}

/// Tints luminance towards a warm brown.
pub struct Sepia;

impl PixelTransform for Sepia {
    fn process(&self, input: FrameBuffer, _strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        map_pixels(input, |pixel| {
            let gray = round_u8(color::luma(pixel[0], pixel[1], pixel[2])) as f32 / 255.0;
            pixel[0] = (255.0 * gray) as u8;
            pixel[1] = (204.0 * gray) as u8;
            pixel[2] = (153.0 * gray) as u8;
        })
    }
}

/// Boosts blue by half and halves red.
pub struct Cool;

impl PixelTransform for Cool {
    fn process(&self, input: FrameBuffer, _strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        map_pixels(input, |pixel| {
            pixel[0] = (pixel[0] as f32 * 0.5) as u8;
            pixel[2] = (pixel[2] as f32 * 1.5).min(255.0) as u8;
        })
    }
}

/// Boosts red by half and halves blue.
pub struct Warm;

impl PixelTransform for Warm {
    fn process(&self, input: FrameBuffer, _strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        map_pixels(input, |pixel| {
            pixel[0] = (pixel[0] as f32 * 1.5).min(255.0) as u8;
            pixel[2] = (pixel[2] as f32 * 0.5) as u8;
        })
    }
}

/// Darkens towards the edges with a Gaussian falloff sized to the image.
pub struct Vignette;

impl Vignette {
    /// Per-axis falloff, peak-normalized to 1.
    fn profile(len: u32, sigma: f64) -> Vec<f64> {
        let center = (len as f64 - 1.0) / 2.0;
        let weights: Vec<f64> = (0..len)
            .map(|i| {
                let d = i as f64 - center;
                (-(d * d) / (2.0 * sigma * sigma)).exp()
            })
            .collect();
        let peak = weights.iter().cloned().fold(f64::MIN_POSITIVE, f64::max);
        weights.into_iter().map(|w| w / peak).collect()
    }
}

impl PixelTransform for Vignette {
    fn process(&self, mut input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        let intensity = intensity(strength);
        let (w, h) = (input.width, input.height);
        if w == 0 || h == 0 {
            return input;
        }
        let sigma_x = (w as f64 * (0.5 - 0.4 * intensity)).max(f64::MIN_POSITIVE);
        let sigma_y = (h as f64 * (0.5 - 0.4 * intensity)).max(f64::MIN_POSITIVE);
        let gx = Self::profile(w, sigma_x);
        let gy = Self::profile(h, sigma_y);

        let row_bytes = w as usize * 4;
        input
            .data
            .par_chunks_exact_mut(row_bytes)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                    let mask = 1.0 - intensity * (1.0 - gx[x] * gy[y]);
                    for c in &mut pixel[..3] {
                        *c = (*c as f64 * mask) as u8;
                    }
                }
            });
        input
    }

    fn is_identity(&self, strength: f64) -> bool {
        intensity(strength) == 0.0
    }
}

/// Adds a blurred copy of the image on top of itself.
pub struct Glow;

impl PixelTransform for Glow {
    fn process(&self, mut input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        if strength <= 0.0 || input.data.is_empty() {
            return input;
        }
        let intensity = intensity(strength);
        let span = (input.width + input.height) as f64 / 400.0 * (5.0 + 20.0 * intensity);
        let size = odd(span.max(3.0) as usize).min(kernel_limit(&input));
        let blurred = blur_frame(&input, &gaussian_kernel(size, 0.0));

        let weight = (0.5 * intensity) as f32;
        for (pixel, glow) in input
            .data
            .chunks_exact_mut(4)
            .zip(blurred.data.chunks_exact(4))
        {
            for c in 0..3 {
                pixel[c] = round_u8(pixel[c] as f32 + weight * glow[c] as f32);
            }
        }
        input
    }

    fn is_identity(&self, strength: f64) -> bool {
        strength <= 0.0
    }
}

/// Adds uniform integer noise in `[-strength, strength]` per colour channel.
///
/// The generator is seeded from the context and pixels are visited in a fixed
/// order, so the noise pattern is reproducible.
pub struct Grain;

impl Grain {
    fn amplitude(strength: f64) -> i16 {
        strength.abs().trunc().min(255.0) as i16
    }
}

impl PixelTransform for Grain {
    fn process(&self, mut input: FrameBuffer, strength: f64, ctx: &TransformContext) -> FrameBuffer {
        let amplitude = Self::amplitude(strength);
        if amplitude == 0 {
            return input;
        }
        let mut rng = Pcg32::seed_from_u64(ctx.grain_seed);
        for pixel in input.data.chunks_exact_mut(4) {
            for c in &mut pixel[..3] {
                let noise: i16 = rng.gen_range(-amplitude..=amplitude);
                *c = (*c as i16 + noise).clamp(0, 255) as u8;
            }
        }
        input
    }

    fn is_identity(&self, strength: f64) -> bool {
        Self::amplitude(strength) == 0
    }
}

/// Box blur with an odd kernel of `max(1, strength)` taps, clamped to the
/// frame's [`kernel_limit`].
pub struct Blur;

impl Blur {
    fn kernel_size(strength: f64) -> usize {
        odd(strength.trunc().max(1.0) as usize)
    }
}

impl PixelTransform for Blur {
    fn process(&self, input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        let size = Self::kernel_size(strength).min(kernel_limit(&input));
        if size == 1 || input.data.is_empty() {
            return input;
        }
        blur_frame(&input, &box_kernel(size))
    }

    fn is_identity(&self, strength: f64) -> bool {
        Self::kernel_size(strength) == 1
    }
}

/// Unsharp mask against a 5x5 Gaussian (sigma 1) with low-contrast suppression.
pub struct Sharpen;

impl PixelTransform for Sharpen {
    fn process(&self, mut input: FrameBuffer, strength: f64, _ctx: &TransformContext) -> FrameBuffer {
        if input.data.is_empty() {
            return input;
        }
        let blurred = blur_frame(&input, &gaussian_kernel(5, 1.0));
        let amount = strength as f32;
        for (pixel, soft) in input
            .data
            .chunks_exact_mut(4)
            .zip(blurred.data.chunks_exact(4))
        {
            for c in 0..3 {
                let original = pixel[c] as f32;
                let smooth = soft[c] as f32;
                if (original - smooth).abs() < SHARPEN_THRESHOLD {
                    continue;
                }
                pixel[c] = round_u8((amount + 1.0) * original - amount * smooth);
            }
        }
        input
    }

    fn is_identity(&self, strength: f64) -> bool {
        strength == 0.0
    }
}

// =============================================================================
// Crop
// =============================================================================

/// Extract `rect` from `frame`. Fails when the rectangle is empty or reaches
/// past the image.
pub fn crop(frame: &FrameBuffer, rect: CropRect) -> Result<FrameBuffer> {
    let out_of_bounds = || CoreError::CropOutOfBounds {
        x: rect.x,
        y: rect.y,
        width: rect.width,
        height: rect.height,
        image_width: frame.width,
        image_height: frame.height,
    };
    if rect.x < 0 || rect.y < 0 || rect.width <= 0 || rect.height <= 0 {
        return Err(out_of_bounds());
    }
    let right = rect.x.checked_add(rect.width).ok_or_else(out_of_bounds)?;
    let bottom = rect.y.checked_add(rect.height).ok_or_else(out_of_bounds)?;
    if right > frame.width as i64 || bottom > frame.height as i64 {
        return Err(out_of_bounds());
    }

    let (x, y) = (rect.x as usize, rect.y as usize);
    let (w, h) = (rect.width as usize, rect.height as usize);
    let src_stride = frame.width as usize * 4;
    let mut data = Vec::with_capacity(w * h * 4);
    for row in y..y + h {
        let start = row * src_stride + x * 4;
        data.extend_from_slice(&frame.data[start..start + w * 4]);
    }
    Ok(FrameBuffer::from_rgba_vec(w as u32, h as u32, data))
}
