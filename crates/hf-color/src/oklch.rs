// SPDX-License-Identifier: MIT
//
// OKLCH conversion for perceptual lightness adjustment.
//
// Contrast is judged in WCAG relative luminance, but when a foreground has
// to move we move it along OKLCH lightness: equal steps there look like equal
// steps to a reader, and hue and chroma stay put.
//
// Pipeline: ColorValue (8-bit sRGB) ↔ sRGB ↔ Linear sRGB ↔ Oklab ↔ OKLCH
//
// Oklab: https://bottosson.github.io/posts/oklab/

#![allow(clippy::many_single_char_names)]

use crate::color::{ColorValue, to_u8};

// ─── Oklch ───────────────────────────────────────────────────────────────────

/// A color in OKLCH space. Alpha is carried through untouched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oklch {
    /// Lightness, 0.0 is black and 1.0 is white.
    pub l: f32,
    /// Chroma: 0.0 (gray) to ~0.37.
    pub c: f32,
    /// Hue angle in degrees, 0.0 to 360.0.
    pub h: f32,
    /// Alpha digits of the source color, if any.
    pub alpha: Option<u8>,
}

impl Oklch {
    /// Convert an 8-bit sRGB color to OKLCH.
    #[must_use]
    pub fn from_color(color: ColorValue) -> Self {
        let (r, g, b) = color.to_unit_rgb();
        #[allow(clippy::cast_possible_truncation)]
        let [l, c, h] = srgb_to_oklch([r as f32, g as f32, b as f32]);
        Self {
            l,
            c,
            h,
            alpha: color.alpha,
        }
    }

    /// Convert back to 8-bit sRGB, reducing chroma first if the color falls
    /// outside the sRGB gamut.
    #[must_use]
    pub fn to_color(self) -> ColorValue {
        let [r, g, b] = self.to_gamut().srgb().map(channel);
        ColorValue {
            r,
            g,
            b,
            alpha: self.alpha,
        }
    }

    /// Same hue and chroma at lightness `l`, clamped into 0.0..=1.0.
    #[inline]
    #[must_use]
    pub const fn with_lightness(self, l: f32) -> Self {
        Self {
            l: l.clamp(0.0, 1.0),
            ..self
        }
    }

    /// True when every sRGB channel lands in 0..=1 (with a little slack for
    /// rounding).
    #[must_use]
    pub fn in_srgb_gamut(self) -> bool {
        const SLACK: f32 = 1e-4;
        oklch_to_srgb([self.l, self.c, self.h])
            .iter()
            .all(|v| (-SLACK..=1.0 + SLACK).contains(v))
    }

    /// The most saturated in-gamut color with the same lightness and hue.
    /// Chroma is bisected; colors already in gamut come back unchanged.
    #[must_use]
    pub fn to_gamut(self) -> Self {
        if self.in_srgb_gamut() {
            return self;
        }
        let (mut inside, mut outside) = (0.0_f32, self.c);
        for _ in 0..16 {
            let c = (inside + outside) / 2.0;
            if (Self { c, ..self }).in_srgb_gamut() {
                inside = c;
            } else {
                outside = c;
            }
        }
        Self { c: inside, ..self }
    }

    fn srgb(self) -> Vec3 {
        oklch_to_srgb([self.l, self.c, self.h]).map(|v| v.clamp(0.0, 1.0))
    }
}

fn channel(v: f32) -> u8 {
    to_u8(f64::from(v) * 255.0)
}

// ─── Conversion Matrices ─────────────────────────────────────────────────────
//
// Oklab goes through LMS cone space: linear sRGB → LMS, cube root, → Lab.

type Vec3 = [f32; 3];
type Mat3 = [Vec3; 3];

const SRGB_TO_LMS: Mat3 = [
    [0.412_221_47, 0.536_332_55, 0.051_445_995],
    [0.211_903_5, 0.680_699_5, 0.107_396_96],
    [0.088_302_46, 0.281_718_84, 0.629_978_7],
];

const LMS_TO_OKLAB: Mat3 = [
    [0.210_454_26, 0.793_617_8, -0.004_072_047],
    [1.977_998_5, -2.428_592_2, 0.450_593_7],
    [0.025_904_037, 0.782_771_77, -0.808_675_77],
];

const OKLAB_TO_LMS: Mat3 = [
    [1.0, 0.396_337_78, 0.215_803_76],
    [1.0, -0.105_561_346, -0.063_854_17],
    [1.0, -0.089_484_18, -1.291_485_5],
];

const LMS_TO_SRGB: Mat3 = [
    [4.076_741_7, -3.307_711_6, 0.230_969_94],
    [-1.268_438, 2.609_757_4, -0.341_319_38],
    [-0.004_196_086_3, -0.703_418_6, 1.707_614_7],
];

fn apply(m: &Mat3, v: Vec3) -> Vec3 {
    m.map(|row| row[0].mul_add(v[0], row[1].mul_add(v[1], row[2] * v[2])))
}

// ─── Transfer Functions ──────────────────────────────────────────────────────

fn decode_gamma(c: f32) -> f32 {
    if c > 0.040_45 {
        ((c + 0.055) / 1.055).powf(2.4)
    } else {
        c / 12.92
    }
}

fn encode_gamma(c: f32) -> f32 {
    if c > 0.003_130_8 {
        c.powf(2.4_f32.recip()).mul_add(1.055, -0.055)
    } else {
        12.92 * c
    }
}

// ─── Whole Pipeline ──────────────────────────────────────────────────────────

fn srgb_to_oklch(rgb: Vec3) -> Vec3 {
    let lms = apply(&SRGB_TO_LMS, rgb.map(decode_gamma));
    let [l, a, b] = apply(&LMS_TO_OKLAB, lms.map(f32::cbrt));

    let c = a.hypot(b);
    // Grays have no meaningful hue; pin it to zero.
    let h = if c < 1e-8 {
        0.0
    } else {
        b.atan2(a).to_degrees().rem_euclid(360.0)
    };
    [l, c, h]
}

fn oklch_to_srgb([l, c, h]: Vec3) -> Vec3 {
    let (sin, cos) = h.to_radians().sin_cos();
    let lms = apply(&OKLAB_TO_LMS, [l, c * cos, c * sin]).map(|x| x * x * x);
    apply(&LMS_TO_SRGB, lms).map(encode_gamma)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
