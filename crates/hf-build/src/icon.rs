// SPDX-License-Identifier: MIT
//
// Extension icon — a 128×128 PNG drawn from the theme's own colors.
//
// A disc of `editor.background` carries six code lines in the badge,
// foreground, and activity-bar colors, with a cursor bar on the third.
// Keys that are missing or malformed fall back to VS Code's dark defaults,
// so every theme that passes validation gets an icon.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use hf_color::ColorValue;
use hf_theme::ThemeDocument;
use image::{ImageFormat, Rgba, RgbaImage};

/// Marketplace icon size in pixels.
pub const ICON_SIZE: u32 = 128;

/// Where the icon lives inside an extension, as `package.json` names it.
pub const ICON_PATH: &str = "images/icon.png";

const MARGIN: u32 = 10;
const LINE_LEFT: u32 = 30;
const LINE_TOP: u32 = 35;
const LINE_HEIGHT: u32 = 8;
const LINE_GAP: u32 = 4;
const LINE_LENGTHS: [u32; 6] = [40, 60, 50, 70, 45, 55];

#[derive(Debug, thiserror::Error)]
pub enum IconError {
    #[error("cannot encode icon: {0}")]
    Encode(#[from] image::ImageError),
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

struct Palette {
    background: Rgba<u8>,
    foreground: Rgba<u8>,
    accent: Rgba<u8>,
    badge: Rgba<u8>,
}

impl Palette {
    fn of(doc: &ThemeDocument) -> Self {
        Self {
            background: pick(doc, "editor.background", ColorValue::rgb(0x1e, 0x1e, 0x1e)),
            foreground: pick(doc, "editor.foreground", ColorValue::rgb(0xd4, 0xd4, 0xd4)),
            accent: pick(doc, "activityBar.background", ColorValue::rgb(0x33, 0x33, 0x33)),
            badge: pick(doc, "activityBarBadge.background", ColorValue::rgb(0x00, 0x7a, 0xcc)),
        }
    }
}

fn pick(doc: &ThemeDocument, key: &str, fallback: ColorValue) -> Rgba<u8> {
    let color = doc.color(key).and_then(Result::ok).unwrap_or(fallback);
    Rgba([color.r, color.g, color.b, color.alpha.unwrap_or(u8::MAX)])
}

/// Draw the icon for `doc`. Pixels outside the disc stay transparent.
#[must_use]
pub fn render_icon(doc: &ThemeDocument) -> RgbaImage {
    let palette = Palette::of(doc);
    let mut img = RgbaImage::new(ICON_SIZE, ICON_SIZE);

    // Compare doubled coordinates so pixel centers stay integral.
    let diameter = i64::from(ICON_SIZE - 2 * MARGIN);
    let size = i64::from(ICON_SIZE);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        let dx = 2 * i64::from(x) + 1 - size;
        let dy = 2 * i64::from(y) + 1 - size;
        if dx * dx + dy * dy <= diameter * diameter {
            *pixel = palette.background;
        }
    }

    let line_colors = [palette.badge, palette.foreground, palette.accent, palette.foreground];
    let mut top = LINE_TOP;
    for (i, length) in LINE_LENGTHS.into_iter().enumerate() {
        fill(&mut img, LINE_LEFT, top, length, LINE_HEIGHT, line_colors[i % line_colors.len()]);
        top += LINE_HEIGHT + LINE_GAP;
    }

    let cursor_top = LINE_TOP + 2 * (LINE_HEIGHT + LINE_GAP);
    fill(&mut img, LINE_LEFT + 25, cursor_top, 3, LINE_HEIGHT + 3, palette.badge);
    img
}

fn fill(img: &mut RgbaImage, left: u32, top: u32, width: u32, height: u32, color: Rgba<u8>) {
    for y in top..(top + height).min(img.height()) {
        for x in left..(left + width).min(img.width()) {
            img.put_pixel(x, y, color);
        }
    }
}

/// [`render_icon`] encoded as PNG.
///
/// # Errors
///
/// Only if the encoder does.
pub fn icon_png(doc: &ThemeDocument) -> Result<Vec<u8>, IconError> {
    let mut bytes = Vec::new();
    render_icon(doc).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// Write the icon to `path`, creating its directory.
///
/// # Errors
///
/// Encoding failures and I/O.
pub fn write_icon(doc: &ThemeDocument, path: &Path) -> Result<(), IconError> {
    let bytes = icon_png(doc)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| IconError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, bytes).map_err(|source| IconError::Io {
        path: path.to_path_buf(),
        source,
    })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
