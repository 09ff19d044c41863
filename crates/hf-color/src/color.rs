// SPDX-License-Identifier: MIT
//
// hf-color hex color values — the unit every theme color is stored as.
//
// VS Code accepts `#RRGGBB` and `#RRGGBBAA`. That is the whole grammar here:
// no `#RGB` shorthand, no missing `#`, no named colors. Anything else is a
// `MalformedColor`, which the validator turns into an issue rather than a
// hard failure.
//
// Values are stored as 8-bit channels. Formatting always produces lowercase
// hex, so `parse(format(parse(s))) == parse(s)` for every valid `s`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// The text did not match `^#[0-9A-Fa-f]{6}([0-9A-Fa-f]{2})?$`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed color {text:?}: expected #RRGGBB or #RRGGBBAA")]
pub struct MalformedColor {
    /// The rejected input, verbatim.
    pub text: String,
}

// ─── ColorValue ──────────────────────────────────────────────────────────────

/// An sRGB color with an optional alpha channel, as written in a theme file.
///
/// # Examples
///
/// ```
/// use hf_color::ColorValue;
///
/// let bg: ColorValue = "#1E1E1E".parse().unwrap();
/// assert_eq!(bg.to_string(), "#1e1e1e");
///
/// let overlay = ColorValue::parse("#264f7880").unwrap();
/// assert_eq!(overlay.alpha, Some(0x80));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColorValue {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    /// `None` for 6-digit colors. `Some(0xff)` is kept distinct from `None`
    /// so that formatting reproduces the digit count of the input.
    pub alpha: Option<u8>,
}

impl ColorValue {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    // ─── Constructors ────────────────────────────────────────────────────

    /// Create an opaque color from 8-bit channels.
    #[inline]
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, alpha: None }
    }

    /// Create a color with an explicit alpha channel.
    #[inline]
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, alpha: Some(a) }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (hex digits in either case).
    ///
    /// # Errors
    ///
    /// Returns [`MalformedColor`] for any other input, including surrounding
    /// whitespace.
    pub fn parse(text: &str) -> Result<Self, MalformedColor> {
        parse_hex(text).ok_or_else(|| MalformedColor {
            text: text.to_string(),
        })
    }

    /// Whether `text` is a valid color without allocating an error.
    #[must_use]
    pub fn is_valid(text: &str) -> bool {
        parse_hex(text).is_some()
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    /// Channels as floats in 0.0–1.0.
    #[must_use]
    pub fn to_unit_rgb(self) -> (f64, f64, f64) {
        (
            f64::from(self.r) / 255.0,
            f64::from(self.g) / 255.0,
            f64::from(self.b) / 255.0,
        )
    }

    /// Whether the color is fully opaque (no alpha digits, or alpha `ff`).
    #[must_use]
    pub fn is_opaque(self) -> bool {
        self.alpha.is_none_or(|a| a == u8::MAX)
    }

    /// Perceived brightness in 0.0–1.0 using the Rec. 601 luma weights.
    ///
    /// A rough "is this dark?" measure. Not used for contrast decisions;
    /// those go through [`relative_luminance`](crate::relative_luminance).
    #[must_use]
    pub fn perceived_brightness(self) -> f64 {
        0.114f64.mul_add(
            f64::from(self.b),
            0.299f64.mul_add(f64::from(self.r), 0.587 * f64::from(self.g)),
        ) / 255.0
    }

    // ─── Transformations ─────────────────────────────────────────────────

    /// The same color with a different alpha channel.
    #[must_use]
    pub const fn with_alpha(self, alpha: Option<u8>) -> Self {
        Self { alpha, ..self }
    }

    /// Composite this color over an opaque background (8-bit sRGB "over").
    ///
    /// The result is always opaque. Opaque inputs are returned with their
    /// alpha digits dropped. The background's own alpha is ignored.
    #[must_use]
    pub fn composite_over(self, background: Self) -> Self {
        let Some(a) = self.alpha else {
            return self;
        };
        let t = f64::from(a) / 255.0;
        let mix = |fg: u8, bg: u8| to_u8(f64::from(fg).mul_add(t, f64::from(bg) * (1.0 - t)));
        Self::rgb(
            mix(self.r, background.r),
            mix(self.g, background.g),
            mix(self.b, background.b),
        )
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if let Some(a) = self.alpha {
            write!(f, "{a:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for ColorValue {
    type Err = MalformedColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ColorValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ColorValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// ─── Hex Parsing ─────────────────────────────────────────────────────────────

fn parse_hex(text: &str) -> Option<ColorValue> {
    let digits = text.strip_prefix('#')?.as_bytes();

    match digits.len() {
        // #RRGGBB
        6 => Some(ColorValue::rgb(
            parse_hex_byte(&digits[0..2])?,
            parse_hex_byte(&digits[2..4])?,
            parse_hex_byte(&digits[4..6])?,
        )),
        // #RRGGBBAA
        8 => Some(ColorValue::rgba(
            parse_hex_byte(&digits[0..2])?,
            parse_hex_byte(&digits[2..4])?,
            parse_hex_byte(&digits[4..6])?,
            parse_hex_byte(&digits[6..8])?,
        )),
        _ => None,
    }
}

#[inline]
const fn parse_hex_digit(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

#[inline]
fn parse_hex_byte(bytes: &[u8]) -> Option<u8> {
    let hi = parse_hex_digit(bytes[0])?;
    let lo = parse_hex_digit(bytes[1])?;
    Some(hi << 4 | lo)
}

/// Round a 0–255 float to the nearest channel value.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn to_u8(v: f64) -> u8 {
    // Clamp first so the cast never saturates silently.
    (v + 0.5).clamp(0.0, 255.0) as u8
}

// ─── Tests ───────────────────────────────────────────────────────────────────
