// SPDX-License-Identifier: MIT
//
// `hueforge list` and `hueforge clean`.

use std::path::{Path, PathBuf};

use crate::error::BuildError;
use crate::loader::{discover, load_theme};

/// One theme file as `list` shows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEntry {
    /// File stem.
    pub name: String,
    pub path: PathBuf,
    /// Present when details were asked for and the theme loaded.
    pub details: Option<ThemeDetails>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeDetails {
    pub display_name: String,
    pub description: String,
    pub version: String,
    pub author: String,
}

/// Every theme in `themes_dir`. With `detailed`, each is loaded for its
/// metadata; a theme that fails to load is still listed, without details.
///
/// # Errors
///
/// Only when the directory cannot be read.
pub fn list_themes(themes_dir: &Path, detailed: bool) -> Result<Vec<ThemeEntry>, BuildError> {
    let entries = discover(themes_dir)?
        .into_iter()
        .map(|path| {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let details = detailed.then(|| details(&path)).flatten();
            ThemeEntry {
                name,
                path,
                details,
            }
        })
        .collect();
    Ok(entries)
}

fn details(path: &Path) -> Option<ThemeDetails> {
    match load_theme(path) {
        Ok(doc) => {
            let meta = doc.metadata;
            Some(ThemeDetails {
                display_name: meta.display_name,
                description: meta.description.unwrap_or_default(),
                version: meta.version,
                author: meta.author.name.unwrap_or_default(),
            })
        }
        Err(err) => {
            tracing::error!(path = %path.display(), %err, "cannot read theme");
            None
        }
    }
}

/// What `clean` removes from the output directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CleanScope {
    /// Extension directories; packaged `.vsix` files stay.
    #[default]
    Extensions,
    /// Only captured `images/screenshot-*.png` files inside extensions.
    Screenshots,
    /// The whole output directory.
    All,
}

/// Remove build output within `scope`. Returns what was deleted.
///
/// # Errors
///
/// Entries that cannot be read or removed.
pub fn clean(output_dir: &Path, scope: CleanScope) -> Result<Vec<PathBuf>, BuildError> {
    if !output_dir.exists() {
        return Ok(Vec::new());
    }
    if scope == CleanScope::All {
        std::fs::remove_dir_all(output_dir).map_err(BuildError::io(output_dir))?;
        tracing::info!(path = %output_dir.display(), "removed output directory");
        return Ok(vec![output_dir.to_path_buf()]);
    }

    let mut removed = Vec::new();
    for entry in std::fs::read_dir(output_dir).map_err(BuildError::io(output_dir))? {
        let path = entry.map_err(BuildError::io(output_dir))?.path();
        if !path.is_dir() {
            continue;
        }
        match scope {
            CleanScope::Screenshots => removed.extend(remove_screenshots(&path)?),
            _ => {
                std::fs::remove_dir_all(&path).map_err(BuildError::io(&path))?;
                tracing::info!(path = %path.display(), "removed");
                removed.push(path);
            }
        }
    }
    removed.sort();
    Ok(removed)
}

fn remove_screenshots(extension: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let images = extension.join("images");
    if !images.is_dir() {
        return Ok(Vec::new());
    }
    let mut removed = Vec::new();
    for entry in std::fs::read_dir(&images).map_err(BuildError::io(&images))? {
        let path = entry.map_err(BuildError::io(&images))?.path();
        let is_screenshot = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("screenshot-") && name.ends_with(".png"));
        if is_screenshot {
            std::fs::remove_file(&path).map_err(BuildError::io(&path))?;
            tracing::info!(path = %path.display(), "removed");
            removed.push(path);
        }
    }
    Ok(removed)
}

// ─── Tests ───────────────────────────────────────────────────────────────────
