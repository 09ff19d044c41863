// SPDX-License-Identifier: MIT
//
// hf-color — the color model underneath hueforge.
//
// Three layers:
//
//   color    → ColorValue: `#RRGGBB` / `#RRGGBBAA` parsing and formatting
//   contrast → WCAG relative luminance, contrast ratio, bounded correction
//   oklch    → perceptual lightness for the correction walk
//
// Everything here is pure and allocation-free apart from error messages.

pub mod color;
pub mod contrast;
pub mod oklch;

pub use color::{ColorValue, MalformedColor};
pub use contrast::{ContrastFix, adjust_for_contrast, contrast_ratio, relative_luminance};
pub use oklch::Oklch;
