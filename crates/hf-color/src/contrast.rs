//! WCAG contrast ratio and bounded foreground correction.
//!
//! Pass/fail decisions depend on these numbers exactly, so luminance follows
//! the WCAG 2.x definition to the letter: 8-bit channels scaled to 0–1,
//! linearized with the 0.03928 breakpoint, weighted 0.2126/0.7152/0.0722.
//!
//! Corrections happen in OKLCH lightness (see [`crate::oklch`]) because
//! equal steps there are equal steps to the eye.

use crate::color::ColorValue;
use crate::oklch::Oklch;

/// Lightness moved per correction step.
pub const LIGHTNESS_STEP: f32 = 0.05;

/// Default bound on correction steps.
pub const DEFAULT_MAX_STEPS: u32 = 20;

/// WCAG AA threshold for normal text.
pub const WCAG_AA: f64 = 4.5;

/// Linearize one sRGB channel (0.0–1.0) per WCAG 2.x.
#[inline]
#[must_use]
pub fn linearize(c: f64) -> f64 {
    if c <= 0.039_28 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

/// Relative luminance of a color per WCAG 2.x, in 0.0–1.0.
///
/// The alpha channel is ignored. Composite with
/// [`ColorValue::composite_over`] first if translucency should count.
#[must_use]
pub fn relative_luminance(color: ColorValue) -> f64 {
    let (r, g, b) = color.to_unit_rgb();
    0.2126f64.mul_add(linearize(r), 0.7152f64.mul_add(linearize(g), 0.0722 * linearize(b)))
}

/// WCAG contrast ratio between two colors, in 1.0–21.0.
///
/// `(L_lighter + 0.05) / (L_darker + 0.05)`; argument order does not matter.
#[must_use]
pub fn contrast_ratio(a: ColorValue, b: ColorValue) -> f64 {
    let la = relative_luminance(a);
    let lb = relative_luminance(b);
    let (lighter, darker) = if la >= lb { (la, lb) } else { (lb, la) };
    (lighter + 0.05) / (darker + 0.05)
}

/// Outcome of [`adjust_for_contrast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContrastFix {
    /// The foreground already met the threshold; nothing changed.
    AlreadyMet,
    /// A replacement foreground meeting the threshold, and its ratio.
    Fixed { color: ColorValue, ratio: f64 },
    /// The step bound ran out. `best` is the closest candidate seen; callers
    /// are expected to keep the original color.
    Unresolved { best: ColorValue, ratio: f64 },
}

impl ContrastFix {
    /// The replacement color, if the fix succeeded with a change.
    #[must_use]
    pub const fn replacement(self) -> Option<ColorValue> {
        match self {
            Self::Fixed { color, .. } => Some(color),
            Self::AlreadyMet | Self::Unresolved { .. } => None,
        }
    }
}

/// Move `fg`'s OKLCH lightness away from `bg` in fixed steps until the pair
/// reaches `min_ratio`, giving up after `max_steps`.
///
/// Direction is whichever end of the lightness axis contrasts more with the
/// background: lighter on dark backgrounds, darker on light ones. Each step
/// is [`LIGHTNESS_STEP`], so the walk is deterministic. The foreground's
/// alpha digits are preserved; contrast is measured on the opaque channels.
#[must_use]
pub fn adjust_for_contrast(
    fg: ColorValue,
    bg: ColorValue,
    min_ratio: f64,
    max_steps: u32,
) -> ContrastFix {
    if contrast_ratio(fg, bg) >= min_ratio {
        return ContrastFix::AlreadyMet;
    }

    let lighten = contrast_ratio(ColorValue::WHITE, bg) >= contrast_ratio(ColorValue::BLACK, bg);
    let step = if lighten { LIGHTNESS_STEP } else { -LIGHTNESS_STEP };
    let start = Oklch::from_color(fg);

    let mut best = fg;
    let mut best_ratio = contrast_ratio(fg, bg);
    for i in 1..=max_steps {
        #[allow(clippy::cast_precision_loss)]
        let candidate = start.with_lightness(step.mul_add(i as f32, start.l)).to_color();
        let ratio = contrast_ratio(candidate, bg);
        if ratio >= min_ratio {
            return ContrastFix::Fixed {
                color: candidate,
                ratio,
            };
        }
        if ratio > best_ratio {
            best = candidate;
            best_ratio = ratio;
        }
    }

    ContrastFix::Unresolved {
        best,
        ratio: best_ratio,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    fn hex(s: &str) -> ColorValue {
        ColorValue::parse(s).unwrap()
    }

    // ── Relative luminance ──────────────────────────────────────────

    #[test]
    fn luminance_black_is_zero() {
        assert!(relative_luminance(ColorValue::BLACK).abs() < f64::EPSILON);
    }

    #[test]
    fn luminance_white_is_one() {
        let lum = relative_luminance(ColorValue::WHITE);
        assert!(approx_eq(lum, 1.0, 1e-12), "White luminance: {lum}");
    }

    #[test]
    fn luminance_pure_red() {
        let lum = relative_luminance(hex("#ff0000"));
        assert!(approx_eq(lum, 0.2126, 1e-12), "Red luminance: {lum}");
    }

    #[test]
    fn luminance_pure_green() {
        let lum = relative_luminance(hex("#00ff00"));
        assert!(approx_eq(lum, 0.7152, 1e-12), "Green luminance: {lum}");
    }

    #[test]
    fn luminance_ignores_alpha() {
        let opaque = relative_luminance(hex("#569cd6"));
        let translucent = relative_luminance(hex("#569cd610"));
        assert!(approx_eq(opaque, translucent, f64::EPSILON));
    }

    #[test]
    fn luminance_uses_wcag_breakpoint() {
        // 10/255 = 0.0392 sits below 0.03928, so it takes the linear branch.
        let lum = relative_luminance(ColorValue::rgb(10, 10, 10));
        assert!(approx_eq(lum, (10.0 / 255.0) / 12.92, 1e-12), "{lum}");
    }

    // ── Contrast ratio ──────────────────────────────────────────────

    #[test]
    fn contrast_black_white_is_21() {
        assert_eq!(contrast_ratio(ColorValue::BLACK, ColorValue::WHITE), 21.0);
    }

    #[test]
    fn contrast_same_color_is_1() {
        let c = hex("#3a86ff");
        assert_eq!(contrast_ratio(c, c), 1.0);
    }

    #[test]
    fn contrast_is_symmetric() {
        let pairs = [("#1e1e1e", "#d4d4d4"), ("#007acc", "#ffffff"), ("#cca700", "#252526")];
        for (a, b) in pairs {
            assert_eq!(contrast_ratio(hex(a), hex(b)), contrast_ratio(hex(b), hex(a)));
        }
    }

    #[test]
    fn contrast_known_vscode_pair() {
        // Dark+ editor text: comfortably above AA.
        let ratio = contrast_ratio(hex("#1e1e1e"), hex("#d4d4d4"));
        assert!(ratio > 11.0 && ratio < 12.0, "Dark+ contrast: {ratio}");
    }

    // ── adjust_for_contrast ─────────────────────────────────────────

    #[test]
    fn adjust_noop_when_already_readable() {
        let fix = adjust_for_contrast(ColorValue::WHITE, ColorValue::BLACK, WCAG_AA, 20);
        assert_eq!(fix, ContrastFix::AlreadyMet);
        assert_eq!(fix.replacement(), None);
    }

    #[test]
    fn adjust_black_on_black_lightens() {
        let fix = adjust_for_contrast(ColorValue::BLACK, ColorValue::BLACK, WCAG_AA, 20);
        let ContrastFix::Fixed { color, ratio } = fix else {
            panic!("expected a fix, got {fix:?}");
        };
        assert_ne!(color, ColorValue::BLACK);
        assert!(ratio >= WCAG_AA);
        assert_eq!(contrast_ratio(color, ColorValue::BLACK), ratio);
    }

    #[test]
    fn adjust_light_background_darkens() {
        let bg = hex("#fafafa");
        let fg = hex("#c0c0c0");
        let color = adjust_for_contrast(fg, bg, WCAG_AA, 20).replacement().unwrap();
        assert!(relative_luminance(color) < relative_luminance(fg));
        assert!(contrast_ratio(color, bg) >= WCAG_AA);
    }

    #[test]
    fn adjust_is_deterministic() {
        let a = adjust_for_contrast(hex("#333333"), hex("#2a2a2a"), 7.0, 20);
        let b = adjust_for_contrast(hex("#333333"), hex("#2a2a2a"), 7.0, 20);
        assert_eq!(a, b);
    }

    #[test]
    fn adjust_preserves_alpha() {
        let color = adjust_for_contrast(hex("#10101080"), ColorValue::BLACK, WCAG_AA, 20)
            .replacement()
            .unwrap();
        assert_eq!(color.alpha, Some(0x80));
    }

    #[test]
    fn adjust_unresolved_when_bound_is_too_small() {
        let fix = adjust_for_contrast(ColorValue::BLACK, ColorValue::BLACK, WCAG_AA, 1);
        let ContrastFix::Unresolved { ratio, .. } = fix else {
            panic!("one step cannot reach AA from black on black: {fix:?}");
        };
        assert!(ratio < WCAG_AA);
    }

    #[test]
    fn adjust_unresolved_when_threshold_is_unreachable() {
        // Mid gray tops out around 5:1 against either extreme.
        let fix = adjust_for_contrast(hex("#777777"), hex("#767676"), 15.0, 20);
        assert!(matches!(fix, ContrastFix::Unresolved { .. }), "{fix:?}");
        assert_eq!(fix.replacement(), None);
    }
}
