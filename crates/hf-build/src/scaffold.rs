// SPDX-License-Identifier: MIT
//
// `hueforge create` — a fresh theme file to start editing from.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use hf_theme::vocabulary::CORE_KEYS;
use hf_theme::{Author, ThemeDocument, ThemeMetadata, TokenColorRule, TokenSettings, slugify};

use crate::error::BuildError;

/// How many UI colors a new theme starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Starter {
    /// The eight core surfaces.
    Minimal,
    /// Core plus tabs, selection, cursor and terminal.
    #[default]
    Default,
    /// Default plus gutter, line numbers and diagnostics.
    Full,
}

impl Starter {
    pub const ALL: [Self; 3] = [Self::Minimal, Self::Default, Self::Full];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Default => "default",
            Self::Full => "full",
        }
    }

    fn colors(self) -> Vec<(&'static str, &'static str)> {
        let mut colors = CORE_KEYS.to_vec();
        if self != Self::Minimal {
            colors.extend_from_slice(DEFAULT_EXTRA);
        }
        if self == Self::Full {
            colors.extend_from_slice(FULL_EXTRA);
        }
        colors
    }
}

impl fmt::Display for Starter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown starter {0:?} (expected minimal, default or full)")]
pub struct UnknownStarter(pub String);

impl FromStr for Starter {
    type Err = UnknownStarter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|starter| starter.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStarter(s.to_string()))
    }
}

const DEFAULT_EXTRA: &[(&str, &str)] = &[
    ("editor.lineHighlightBackground", "#2a2a2a"),
    ("editor.selectionBackground", "#264f78"),
    ("editorCursor.foreground", "#ffffff"),
    ("editorGroupHeader.tabsBackground", "#2d2d30"),
    ("tab.activeBackground", "#1e1e1e"),
    ("tab.activeForeground", "#ffffff"),
    ("tab.inactiveBackground", "#2d2d30"),
    ("tab.inactiveForeground", "#969696"),
    ("terminal.background", "#1e1e1e"),
    ("terminal.foreground", "#cccccc"),
];

const FULL_EXTRA: &[(&str, &str)] = &[
    ("editorLineNumber.foreground", "#858585"),
    ("editorLineNumber.activeForeground", "#c6c6c6"),
    ("editorError.foreground", "#f48771"),
    ("editorWarning.foreground", "#cca700"),
    ("editorInfo.foreground", "#75beff"),
    ("editorHint.foreground", "#eeeeeeb3"),
    ("editorGutter.background", "#1e1e1e"),
    ("editorGutter.modifiedBackground", "#0c7d9d"),
    ("editorGutter.addedBackground", "#587c0c"),
    ("editorGutter.deletedBackground", "#94151b"),
];

/// (name, scopes, foreground, font style)
const TOKEN_RULES: &[(&str, &[&str], &str, Option<&str>)] = &[
    ("Comment", &["comment", "punctuation.definition.comment"], "#6a9955", Some("italic")),
    ("String", &["string"], "#ce9178", None),
    ("Keyword", &["keyword", "storage.type", "storage.modifier"], "#569cd6", None),
    ("Function", &["entity.name.function"], "#dcdcaa", None),
    ("Variable", &["variable"], "#9cdcfe", None),
    ("Number", &["constant.numeric"], "#b5cea8", None),
];

/// What `create` needs beyond the name.
#[derive(Debug, Clone, Default)]
pub struct NewTheme {
    pub name: String,
    pub starter: Starter,
    pub display_name: Option<String>,
    pub description: Option<String>,
    /// Replace a theme of the same name instead of refusing.
    pub force: bool,
}

/// `ocean-deep` → `Ocean Deep`.
fn display_name_for(slug: &str) -> String {
    slug.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The document a new theme file starts with. Always passes validation.
#[must_use]
pub fn starter_document(request: &NewTheme) -> ThemeDocument {
    let metadata = ThemeMetadata {
        name: request.name.clone(),
        display_name: request
            .display_name
            .clone()
            .unwrap_or_else(|| display_name_for(&request.name)),
        description: Some(
            request.description
                .clone()
                .unwrap_or_else(|| "A custom VS Code theme".to_string()),
        ),
        version: "1.0.0".to_string(),
        author: Author {
            name: Some("Your Name".to_string()),
            email: Some("your.email@example.com".to_string()),
            url: None,
        },
        license: Some("MIT".to_string()),
        ..ThemeMetadata::default()
    };

    let colors = request
        .starter
        .colors()
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    let token_colors = TOKEN_RULES
        .iter()
        .map(|&(name, scopes, foreground, font_style)| TokenColorRule {
            name: Some(name.to_string()),
            scope: scopes.iter().map(ToString::to_string).collect(),
            settings: TokenSettings {
                foreground: Some(foreground.to_string()),
                background: None,
                font_style: font_style.map(str::to_string),
            },
        })
        .collect();

    ThemeDocument {
        metadata,
        colors,
        token_colors,
    }
}

/// Write `<themes_dir>/<name>.yaml`, creating the directory if needed.
///
/// # Errors
///
/// A name that is not a slug, an existing theme of that name (unless
/// `force` is set), or I/O failures.
pub fn create_theme(themes_dir: &Path, request: &NewTheme) -> Result<PathBuf, BuildError> {
    let suggestion = slugify(&request.name);
    if suggestion != request.name || suggestion.is_empty() {
        return Err(BuildError::InvalidName {
            name: request.name.clone(),
            suggestion,
        });
    }
    if let Some(existing) = crate::loader::find_theme(themes_dir, &request.name) {
        if !request.force {
            return Err(BuildError::AlreadyExists { path: existing });
        }
        std::fs::remove_file(&existing).map_err(BuildError::io(&existing))?;
        tracing::info!(path = %existing.display(), "replacing existing theme");
    }

    std::fs::create_dir_all(themes_dir).map_err(BuildError::io(themes_dir))?;
    let path = themes_dir.join(format!("{}.yaml", request.name));
    let yaml = starter_document(request).to_yaml_string()?;
    std::fs::write(&path, yaml).map_err(BuildError::io(&path))?;

    tracing::info!(
        theme = %request.name,
        starter = %request.starter,
        path = %path.display(),
        "created theme"
    );
    Ok(path)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hf_theme::vocabulary::is_known_key;
    use hf_theme::{ValidationConfig, validate};
    use pretty_assertions::assert_eq;

    fn new_theme(name: &str, starter: Starter) -> NewTheme {
        NewTheme {
            name: name.to_string(),
            starter,
            ..NewTheme::default()
        }
    }

    #[test]
    fn starter_sizes_grow() {
        let sizes: Vec<_> = Starter::ALL
            .iter()
            .map(|&s| starter_document(&new_theme("x", s)).colors.len())
            .collect();
        assert_eq!(sizes, vec![8, 18, 28]);
    }

    #[test]
    fn every_starter_key_is_known() {
        let doc = starter_document(&new_theme("x", Starter::Full));
        for key in doc.colors.keys() {
            assert!(is_known_key(key), "{key}");
        }
    }

    #[test]
    fn starters_validate_cleanly() {
        for starter in Starter::ALL {
            let doc = starter_document(&new_theme("night-owl", starter));
            let validated = validate(doc, &ValidationConfig::default()).unwrap();
            assert!(!validated.has_blocking(true), "{starter}: {:?}", validated.issues);
        }
    }

    #[test]
    fn display_name_from_slug() {
        assert_eq!(display_name_for("night-owl"), "Night Owl");
        assert_eq!(display_name_for("solar_flare-2"), "Solar Flare 2");
        let doc = starter_document(&NewTheme {
            display_name: Some("Custom".into()),
            ..new_theme("x", Starter::Minimal)
        });
        assert_eq!(doc.metadata.display_name, "Custom");
    }

    #[test]
    fn starter_parses() {
        assert_eq!("FULL".parse::<Starter>().unwrap(), Starter::Full);
        assert!("huge".parse::<Starter>().is_err());
    }

    // ── create_theme ────────────────────────────────────────────────

    #[test]
    fn writes_loadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let themes = dir.path().join("themes");
        let path = create_theme(&themes, &new_theme("night-owl", Starter::Default)).unwrap();
        assert_eq!(path, themes.join("night-owl.yaml"));

        let doc = crate::loader::load_theme(&path).unwrap();
        assert_eq!(doc, hf_theme::normalize(&starter_document(&new_theme("night-owl", Starter::Default))));
    }

    #[test]
    fn refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        create_theme(dir.path(), &new_theme("owl", Starter::Minimal)).unwrap();
        assert!(matches!(
            create_theme(dir.path(), &new_theme("owl", Starter::Full)),
            Err(BuildError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn force_replaces_existing_theme() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("owl.yml"), "theme:\n  name: owl\n").unwrap();
        let request = NewTheme {
            force: true,
            ..new_theme("owl", Starter::Full)
        };
        let path = create_theme(dir.path(), &request).unwrap();
        assert_eq!(path, dir.path().join("owl.yaml"));
        assert!(!dir.path().join("owl.yml").exists());
        assert!(crate::loader::load_theme(&path).unwrap().colors.len() > 1);
    }

    #[test]
    fn rejects_non_slug_names() {
        let dir = tempfile::tempdir().unwrap();
        let err = create_theme(dir.path(), &new_theme("Night Owl", Starter::Minimal)).unwrap_err();
        match err {
            BuildError::InvalidName { suggestion, .. } => assert_eq!(suggestion, "night-owl"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
