// SPDX-License-Identifier: MIT
//
// Theme discovery and loading.
//
// A themes directory holds one `<name>.yaml` (or `.yml`) per theme. A file
// may be a complete theme or a variant that `extends` a sibling by name; the
// base must itself be complete, so resolution is one level deep.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use hf_theme::{ParsedTheme, ThemeDocument, merge, normalize, parse_theme};

use crate::error::BuildError;

const EXTENSIONS: &[&str] = &["yaml", "yml"];

fn is_theme_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Every theme file in `dir`, sorted by path. A missing directory holds no
/// themes.
///
/// # Errors
///
/// Directory entries that cannot be read.
pub fn discover(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    if !dir.is_dir() {
        tracing::debug!(path = %dir.display(), "themes directory does not exist");
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(BuildError::io(dir))? {
        let path = entry.map_err(BuildError::io(dir))?.path();
        if is_theme_file(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

/// `<dir>/<name>.yaml`, else `<dir>/<name>.yml`.
#[must_use]
pub fn find_theme(dir: &Path, name: &str) -> Option<PathBuf> {
    EXTENSIONS
        .iter()
        .map(|ext| dir.join(format!("{name}.{ext}")))
        .find(|path| path.is_file())
}

/// The themes a command should act on: the named one, or all of them.
///
/// # Errors
///
/// A named theme that does not exist, or an unreadable directory.
pub fn select(dir: &Path, name: Option<&str>) -> Result<Vec<PathBuf>, BuildError> {
    match name {
        Some(name) => find_theme(dir, name)
            .map(|path| vec![path])
            .ok_or_else(|| BuildError::ThemeNotFound {
                name: name.to_string(),
                dir: dir.to_path_buf(),
            }),
        None => discover(dir),
    }
}

pub(crate) fn read_parsed(path: &Path) -> Result<ParsedTheme, BuildError> {
    let text = std::fs::read_to_string(path).map_err(BuildError::io(path))?;
    parse_theme(&text).map_err(|source| BuildError::Load {
        path: path.to_path_buf(),
        source,
    })
}

/// Load a theme file into a normalized document, resolving `extends`.
///
/// # Errors
///
/// Unreadable or malformed files, and variants whose base is missing or is
/// itself a variant.
pub fn load_theme(path: &Path) -> Result<ThemeDocument, BuildError> {
    match read_parsed(path)? {
        ParsedTheme::Complete(doc) => Ok(normalize(&doc)),
        ParsedTheme::Variant { extends, overrides } => {
            let base_path = resolve_base(path, &extends)?;
            tracing::debug!(
                path = %path.display(),
                base = %base_path.display(),
                "resolving variant"
            );
            match read_parsed(&base_path)? {
                ParsedTheme::Complete(base) => Ok(merge(&base, &overrides)),
                ParsedTheme::Variant { .. } => Err(BuildError::NestedVariant {
                    path: path.to_path_buf(),
                    base: extends,
                }),
            }
        }
    }
}

/// `extends` names a sibling theme, or gives a sibling file name outright.
fn resolve_base(path: &Path, extends: &str) -> Result<PathBuf, BuildError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let direct = dir.join(extends);
    let found = if is_theme_file(&direct) {
        Some(direct)
    } else {
        find_theme(dir, extends)
    };
    found
        .filter(|base| base.as_path() != path)
        .ok_or_else(|| BuildError::MissingBase {
            path: path.to_path_buf(),
            base: extends.to_string(),
        })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
