//! Theme documents — the in-memory form of one YAML theme file.
//!
//! A `ThemeDocument` is what the validator checks and the renderer consumes:
//! metadata, a flat map of UI-surface colors, and an ordered list of
//! token-color rules.
//!
//! Color values are kept as the text the author wrote. A malformed value must
//! survive loading so the validator can point at it; parsing into
//! [`ColorValue`] happens on demand via [`ThemeDocument::color`].
//!
//! # File shape
//!
//! ```yaml
//! theme:
//!   name: midnight-neon
//!   display_name: Midnight Neon
//!   version: 1.0.0
//!   license: MIT
//!   type: dark
//!   colors:
//!     editor.background: "#0a0e14"
//!     editor.foreground: "#b3b1ad"
//!   token_colors:
//!     - name: Comment
//!       scope: [comment, punctuation.definition.comment]
//!       settings: { foreground: "#626a73", fontStyle: italic }
//! ```
//!
//! The `theme:` wrapper is optional. A file with a top-level `extends:` key
//! is a variant: it names a base theme and carries only overrides.

use std::collections::BTreeMap;

use hf_color::{ColorValue, MalformedColor};
use serde::{Deserialize, Deserializer, Serialize};

use crate::font::{FontStyle, UnknownFontStyle};
use crate::merge::ThemeOverrides;

/// UI-surface key → color text, ordered by key.
pub type UiColorMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A theme file that could not be read into a document at all.
///
/// Only structural problems land here (not YAML, wrong shape). Bad values
/// inside a well-formed document are validation issues instead.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("invalid theme YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("theme file must be a mapping, found {found}")]
    NotAMapping { found: &'static str },
    #[error("`extends` must name a theme, found {found}")]
    BadExtends { found: &'static str },
    #[error("expected a complete theme, found a variant of `{extends}`")]
    UnexpectedVariant { extends: String },
}

// ---------------------------------------------------------------------------
// Metadata
// ---------------------------------------------------------------------------

/// Whether a theme is dark, light, or high contrast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThemeKind {
    Dark,
    Light,
    HighContrast,
    HighContrastLight,
}

impl ThemeKind {
    /// The `uiTheme` value VS Code expects in `package.json`.
    #[must_use]
    pub const fn ui_theme(self) -> &'static str {
        match self {
            Self::Dark => "vs-dark",
            Self::Light => "vs",
            Self::HighContrast => "hc-black",
            Self::HighContrastLight => "hc-light",
        }
    }

    /// The `type` value VS Code expects in the color-theme JSON.
    #[must_use]
    pub const fn theme_type(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::HighContrast => "hc",
            Self::HighContrastLight => "hcLight",
        }
    }

    /// The `type:` spelling of this kind.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dark => "dark",
            Self::Light => "light",
            Self::HighContrast => "high-contrast",
            Self::HighContrastLight => "high-contrast-light",
        }
    }

    /// Read a `type:` value as authored (`dark`, `light`, `high-contrast`,
    /// `high-contrast-light`). Case and surrounding blanks are ignored.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            "high-contrast" => Some(Self::HighContrast),
            "high-contrast-light" => Some(Self::HighContrastLight),
            _ => None,
        }
    }
}

/// Who made the theme.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub url: Option<String>,
}

impl Author {
    /// True when no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.url.is_none()
    }
}

/// Descriptive fields of a theme. Read-only once authored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThemeMetadata {
    /// Slug: lowercase letters, digits, hyphens.
    #[serde(default, deserialize_with = "scalar")]
    pub name: String,
    #[serde(default, deserialize_with = "scalar")]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub description: Option<String>,
    /// `MAJOR.MINOR.PATCH`.
    #[serde(default, deserialize_with = "scalar")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Author::is_empty")]
    pub author: Author,
    /// SPDX identifier.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub repository: Option<String>,
    /// Entries that are not text load as empty strings for the validator.
    #[serde(default, skip_serializing_if = "Vec::is_empty", deserialize_with = "text_list")]
    pub keywords: Vec<String>,
    /// Explicit kind as written; see [`ThemeKind::from_name`]. When absent
    /// or unrecognized, [`ThemeDocument::kind`] infers one.
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_scalar"
    )]
    pub kind: Option<String>,
    /// Entries for the rendered CHANGELOG, newest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub changelog: Vec<String>,
}

// ---------------------------------------------------------------------------
// Token colors
// ---------------------------------------------------------------------------

/// Foreground, background, and style applied by a token rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSettings {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub foreground: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub background: Option<String>,
    #[serde(
        default,
        rename = "fontStyle",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "opt_scalar"
    )]
    pub font_style: Option<String>,
}

impl TokenSettings {
    /// Parse the `fontStyle` text, if set.
    ///
    /// # Errors
    ///
    /// Returns the first unknown style word.
    pub fn font_style(&self) -> Result<Option<FontStyle>, UnknownFontStyle> {
        self.font_style.as_deref().map(FontStyle::parse).transpose()
    }
}

/// One syntax-highlighting rule: scopes plus the settings applied to them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenColorRule {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "opt_scalar")]
    pub name: Option<String>,
    /// TextMate scopes, most specific last. A single string in YAML is read
    /// as a one-element list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub scope: Vec<String>,
    #[serde(default)]
    pub settings: TokenSettings,
}

// ---------------------------------------------------------------------------
// ThemeDocument
// ---------------------------------------------------------------------------

/// A complete theme: the unit of validation and rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThemeDocument {
    pub metadata: ThemeMetadata,
    pub colors: UiColorMap,
    pub token_colors: Vec<TokenColorRule>,
}

/// What a theme file turned out to contain.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedTheme {
    /// A self-contained theme.
    Complete(ThemeDocument),
    /// Overrides on top of another theme, by name.
    Variant {
        extends: String,
        overrides: ThemeOverrides,
    },
}

/// Flat YAML layout shared by reading and writing.
#[derive(Debug, Default, Serialize, Deserialize)]
struct RawTheme {
    #[serde(flatten)]
    metadata: ThemeMetadata,
    #[serde(default, deserialize_with = "color_map")]
    colors: UiColorMap,
    #[serde(default)]
    token_colors: Vec<TokenColorRule>,
}

#[derive(Serialize)]
struct ThemeFile<'a> {
    theme: &'a RawTheme,
}

impl ThemeDocument {
    /// Parse a theme file that must be self-contained.
    ///
    /// # Errors
    ///
    /// Fails on malformed YAML, a non-mapping document, or a variant file
    /// (use [`parse_theme`] to accept those).
    pub fn from_yaml_str(text: &str) -> Result<Self, LoadError> {
        match parse_theme(text)? {
            ParsedTheme::Complete(doc) => Ok(doc),
            ParsedTheme::Variant { extends, .. } => Err(LoadError::UnexpectedVariant { extends }),
        }
    }

    /// Serialize back to the `theme:`-wrapped YAML layout.
    ///
    /// # Errors
    ///
    /// Only fails if `serde_yaml` does, which for these types it does not.
    pub fn to_yaml_string(&self) -> Result<String, serde_yaml::Error> {
        let raw = RawTheme {
            metadata: self.metadata.clone(),
            colors: self.colors.clone(),
            token_colors: self.token_colors.clone(),
        };
        serde_yaml::to_string(&ThemeFile { theme: &raw })
    }

    /// Parse the color stored under `key`, if there is one.
    #[must_use]
    pub fn color(&self, key: &str) -> Option<Result<ColorValue, MalformedColor>> {
        self.colors.get(key).map(|text| ColorValue::parse(text))
    }

    /// The explicit kind, or one inferred from `editor.background`:
    /// dark when its perceived brightness is below one half. Themes without
    /// a usable background are treated as dark.
    #[must_use]
    pub fn kind(&self) -> ThemeKind {
        if let Some(kind) = self.metadata.kind.as_deref().and_then(ThemeKind::from_name) {
            return kind;
        }
        match self.color("editor.background") {
            Some(Ok(bg)) if bg.perceived_brightness() >= 0.5 => ThemeKind::Light,
            _ => ThemeKind::Dark,
        }
    }

    /// File name of the color-theme JSON inside the extension.
    #[must_use]
    pub fn theme_file_name(&self) -> String {
        format!("{}-color-theme.json", self.metadata.name)
    }
}

/// Parse a theme file, which may be complete or a variant of another theme.
///
/// # Errors
///
/// Fails on malformed YAML or when the document is not a mapping.
pub fn parse_theme(text: &str) -> Result<ParsedTheme, LoadError> {
    let value: serde_yaml::Value = serde_yaml::from_str(text)?;
    let serde_yaml::Value::Mapping(mut root) = value else {
        return Err(LoadError::NotAMapping {
            found: kind_of(&value),
        });
    };

    let body = match root.remove("theme") {
        Some(serde_yaml::Value::Mapping(inner)) => inner,
        Some(other) => {
            return Err(LoadError::NotAMapping {
                found: kind_of(&other),
            });
        }
        None => root,
    };

    let mut body = body;
    if let Some(extends) = body.remove("extends") {
        let serde_yaml::Value::String(base) = extends else {
            return Err(LoadError::BadExtends {
                found: kind_of(&extends),
            });
        };
        let overrides: ThemeOverrides = serde_yaml::from_value(serde_yaml::Value::Mapping(body))?;
        return Ok(ParsedTheme::Variant {
            extends: base,
            overrides,
        });
    }

    let raw: RawTheme = serde_yaml::from_value(serde_yaml::Value::Mapping(body))?;
    Ok(ParsedTheme::Complete(ThemeDocument {
        metadata: raw.metadata,
        colors: raw.colors,
        token_colors: raw.token_colors,
    }))
}

const fn kind_of(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

// ---------------------------------------------------------------------------
// Lenient scalar deserialization
// ---------------------------------------------------------------------------
//
// Authors write `version: 1.0` or forget to quote a color, which YAML reads
// as a number or (for `#…`) a comment, i.e. null. Those should reach the
// validator as text, not abort the load.

fn scalar_text(value: serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => None,
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Tagged(tagged) => scalar_text(tagged.value),
        other @ (serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_)) => {
            Some(serde_yaml::to_string(&other).unwrap_or_default().trim().to_string())
        }
    }
}

fn scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(scalar_text(serde_yaml::Value::deserialize(deserializer)?).unwrap_or_default())
}

pub(crate) fn opt_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(scalar_text(serde_yaml::Value::deserialize(deserializer)?))
}

pub(crate) fn color_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<UiColorMap, D::Error> {
    let raw = Option::<BTreeMap<String, serde_yaml::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, scalar_text(value).unwrap_or_default()))
        .collect())
}

/// A list whose scalar entries become text and whose nested or null
/// entries become empty strings. A lone scalar is a one-entry list.
pub(crate) fn text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let entry = |value: serde_yaml::Value| match value {
        serde_yaml::Value::Sequence(_) | serde_yaml::Value::Mapping(_) => String::new(),
        other => scalar_text(other).unwrap_or_default(),
    };
    Ok(match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Vec::new(),
        serde_yaml::Value::Sequence(items) => items.into_iter().map(entry).collect(),
        other => vec![entry(other)],
    })
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(scope)) => scope
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect(),
        Some(OneOrMany::Many(scopes)) => scopes,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
