//! Colour-space conversions for 8-bit RGB.
//!
//! HSV follows the 8-bit convention used by most image tooling: hue on a
//! 180-step wheel (two degrees per step), saturation and value in `[0, 255]`.
//! Lab is CIE L*a*b* against a D65 white point from gamma-encoded sRGB, with
//! `a` and `b` centred on zero (add 128 for the 8-bit encoding).

/// Period of the 8-bit hue wheel.
pub const HUE_PERIOD: f32 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsv {
    pub h: f32,
    pub s: f32,
    pub v: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lab {
    pub l: f32,
    pub a: f32,
    pub b: f32,
}

/// Round and saturate to a byte.
pub fn round_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> Hsv {
    let (r, g, b) = (r as f32, g as f32, b as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let mut h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    if h < 0.0 {
        h += 360.0;
    }

    Hsv { h: h / 2.0, s, v: max }
}

pub fn hsv_to_rgb(hsv: Hsv) -> [u8; 3] {
    let h = (hsv.h * 2.0).rem_euclid(360.0) / 60.0;
    let s = (hsv.s / 255.0).clamp(0.0, 1.0);
    let v = hsv.v.clamp(0.0, 255.0);

    let c = v * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };

    [round_u8(r + m), round_u8(g + m), round_u8(b + m)]
}

const WHITE_X: f32 = 0.950456;
const WHITE_Z: f32 = 1.088754;
const EPSILON: f32 = 0.008856;
const KAPPA: f32 = 903.3;

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.003_130_8 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    let cube = t * t * t;
    if cube > EPSILON {
        cube
    } else {
        (t - 16.0 / 116.0) / 7.787
    }
}

pub fn rgb_to_lab(r: u8, g: u8, b: u8) -> Lab {
    let r = srgb_to_linear(r as f32 / 255.0);
    let g = srgb_to_linear(g as f32 / 255.0);
    let b = srgb_to_linear(b as f32 / 255.0);

    let x = (0.412_453 * r + 0.357_580 * g + 0.180_423 * b) / WHITE_X;
    let y = 0.212_671 * r + 0.715_160 * g + 0.072_169 * b;
    let z = (0.019_334 * r + 0.119_193 * g + 0.950_227 * b) / WHITE_Z;

    let l = if y > EPSILON {
        116.0 * y.cbrt() - 16.0
    } else {
        KAPPA * y
    };
    let (fx, fy, fz) = (lab_f(x), lab_f(y), lab_f(z));

    Lab {
        l,
        a: 500.0 * (fx - fy),
        b: 200.0 * (fy - fz),
    }
}

pub fn lab_to_rgb(lab: Lab) -> [u8; 3] {
    let y = if lab.l > KAPPA * EPSILON {
        ((lab.l + 16.0) / 116.0).powi(3)
    } else {
        lab.l / KAPPA
    };
    let fy = lab_f(y);
    let x = lab_f_inv(fy + lab.a / 500.0) * WHITE_X;
    let z = lab_f_inv(fy - lab.b / 200.0) * WHITE_Z;

    let r = 3.240_479 * x - 1.537_150 * y - 0.498_535 * z;
    let g = -0.969_256 * x + 1.875_991 * y + 0.041_556 * z;
    let b = 0.055_648 * x - 0.204_043 * y + 1.057_311 * z;

    let encode = |c: f32| round_u8(linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0);
    [encode(r), encode(g), encode(b)]
}

/// Rec.601 luma, the weighting used for grayscale and sepia.
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hsv_primaries() {
        let red = rgb_to_hsv(255, 0, 0);
        assert_eq!((red.h, red.s, red.v), (0.0, 255.0, 255.0));
        let green = rgb_to_hsv(0, 255, 0);
        assert_eq!(green.h, 60.0);
        let blue = rgb_to_hsv(0, 0, 255);
        assert_eq!(blue.h, 120.0);
    }

    #[test]
    fn test_hsv_gray_has_no_saturation() {
        let gray = rgb_to_hsv(90, 90, 90);
        assert_eq!(gray.s, 0.0);
        assert_eq!(gray.v, 90.0);
    }

    #[test]
    fn test_hsv_roundtrip() {
        for rgb in [[12, 200, 77], [255, 255, 255], [0, 0, 0], [130, 40, 220]] {
            let hsv = rgb_to_hsv(rgb[0], rgb[1], rgb[2]);
            assert_eq!(hsv_to_rgb(hsv), rgb);
        }
    }

    #[test]
    fn test_hue_wraps_past_period() {
        let hsv = Hsv {
            h: 190.0,
            s: 255.0,
            v: 255.0,
        };
        // 190 steps == 10 steps == 20 degrees: still in the red-yellow sector.
        let [r, g, b] = hsv_to_rgb(hsv);
        assert_eq!(r, 255);
        assert!(g > 0 && g < 255);
        assert_eq!(b, 0);
    }

    #[test]
    fn test_lab_white_and_black() {
        let white = rgb_to_lab(255, 255, 255);
        assert!((white.l - 100.0).abs() < 0.1);
        assert!(white.a.abs() < 0.5 && white.b.abs() < 0.5);
        let black = rgb_to_lab(0, 0, 0);
        assert!(black.l.abs() < 0.1);
    }

    #[test]
    fn test_lab_roundtrip_within_one_step() {
        for rgb in [[200u8, 30, 60], [15, 140, 90], [240, 240, 10], [64, 64, 200]] {
            let lab = rgb_to_lab(rgb[0], rgb[1], rgb[2]);
            let back = lab_to_rgb(lab);
            for c in 0..3 {
                assert!(
                    (back[c] as i32 - rgb[c] as i32).abs() <= 1,
                    "{rgb:?} -> {back:?}"
                );
            }
        }
    }

    #[test]
    fn test_luma_weights() {
        assert_eq!(luma(255, 0, 0).round(), 76.0);
        assert_eq!(luma(0, 255, 0).round(), 150.0);
    }
}
