//! Layering overrides onto a base theme, and canonical formatting.
//!
//! Variants such as a "soft" or "high contrast" edition of a theme are
//! written as a base name plus the fields that differ. [`merge`] applies
//! those fields; [`normalize`] puts any document into canonical form so two
//! documents that mean the same thing compare equal.

use hf_color::ColorValue;
use serde::{Deserialize, Deserializer};

use crate::document::{
    Author, ThemeDocument, ThemeMetadata, TokenColorRule, TokenSettings, UiColorMap, color_map,
    opt_scalar, text_list,
};
use crate::font::FontStyle;

/// The fields a variant changes. Anything left unset is inherited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ThemeOverrides {
    #[serde(default, deserialize_with = "opt_scalar")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub version: Option<String>,
    /// Merged field by field.
    #[serde(default)]
    pub author: Author,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub license: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub publisher: Option<String>,
    #[serde(default, deserialize_with = "opt_scalar")]
    pub repository: Option<String>,
    #[serde(default, deserialize_with = "opt_text_list")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, rename = "type", deserialize_with = "opt_scalar")]
    pub kind: Option<String>,
    #[serde(default)]
    pub changelog: Option<Vec<String>>,
    /// Merged key by key; an override wins.
    #[serde(default, deserialize_with = "color_map")]
    pub colors: UiColorMap,
    /// Replaces the base list wholesale when present.
    #[serde(default)]
    pub token_colors: Option<Vec<TokenColorRule>>,
}

/// Apply `overrides` on top of `base` and normalize the result.
///
/// Scalars replace, the author merges per field, colors merge per key, and
/// token rules are inherited unless the overrides supply a list. With empty
/// overrides this is exactly [`normalize`].
#[must_use]
pub fn merge(base: &ThemeDocument, overrides: &ThemeOverrides) -> ThemeDocument {
    let mut doc = base.clone();
    let meta = &mut doc.metadata;

    replace(&mut meta.name, overrides.name.as_ref());
    replace(&mut meta.display_name, overrides.display_name.as_ref());
    replace(&mut meta.version, overrides.version.as_ref());
    replace_opt(&mut meta.description, overrides.description.as_ref());
    replace_opt(&mut meta.license, overrides.license.as_ref());
    replace_opt(&mut meta.publisher, overrides.publisher.as_ref());
    replace_opt(&mut meta.repository, overrides.repository.as_ref());
    replace_opt(&mut meta.author.name, overrides.author.name.as_ref());
    replace_opt(&mut meta.author.email, overrides.author.email.as_ref());
    replace_opt(&mut meta.author.url, overrides.author.url.as_ref());
    if let Some(keywords) = &overrides.keywords {
        meta.keywords.clone_from(keywords);
    }
    if let Some(changelog) = &overrides.changelog {
        meta.changelog.clone_from(changelog);
    }
    replace_opt(&mut meta.kind, overrides.kind.as_ref());

    doc.colors
        .extend(overrides.colors.iter().map(|(k, v)| (k.clone(), v.clone())));
    if let Some(rules) = &overrides.token_colors {
        doc.token_colors.clone_from(rules);
    }

    normalize(&doc)
}

fn opt_text_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<String>>, D::Error> {
    text_list(deserializer).map(Some)
}

fn replace(field: &mut String, value: Option<&String>) {
    if let Some(value) = value {
        field.clone_from(value);
    }
}

fn replace_opt(field: &mut Option<String>, value: Option<&String>) {
    if let Some(value) = value {
        *field = Some(value.clone());
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Canonical form of a document.
///
/// - colors that parse are rewritten as lowercase hex; malformed ones are
///   only trimmed, so the validator still sees what the author wrote
/// - every text field is trimmed
/// - keywords are sorted and deduplicated; empty entries are kept for the
///   validator
/// - font styles that parse are written in canonical word order
///
/// Idempotent: `normalize(&normalize(d)) == normalize(d)`.
#[must_use]
pub fn normalize(doc: &ThemeDocument) -> ThemeDocument {
    ThemeDocument {
        metadata: normalize_metadata(&doc.metadata),
        colors: doc
            .colors
            .iter()
            .map(|(key, value)| (key.trim().to_string(), normalize_color(value)))
            .collect(),
        token_colors: doc.token_colors.iter().map(normalize_rule).collect(),
    }
}

fn normalize_metadata(meta: &ThemeMetadata) -> ThemeMetadata {
    let mut keywords: Vec<String> = meta
        .keywords
        .iter()
        .map(|k| k.trim().to_string())
        .collect();
    keywords.sort();
    keywords.dedup();

    ThemeMetadata {
        name: meta.name.trim().to_string(),
        display_name: meta.display_name.trim().to_string(),
        description: trim_opt(meta.description.as_deref()),
        version: meta.version.trim().to_string(),
        author: Author {
            name: trim_opt(meta.author.name.as_deref()),
            email: trim_opt(meta.author.email.as_deref()),
            url: trim_opt(meta.author.url.as_deref()),
        },
        license: trim_opt(meta.license.as_deref()),
        publisher: trim_opt(meta.publisher.as_deref()),
        repository: trim_opt(meta.repository.as_deref()),
        keywords,
        kind: trim_opt(meta.kind.as_deref()),
        changelog: meta.changelog.iter().map(|c| c.trim().to_string()).collect(),
    }
}

fn normalize_rule(rule: &TokenColorRule) -> TokenColorRule {
    TokenColorRule {
        name: trim_opt(rule.name.as_deref()),
        scope: rule
            .scope
            .iter()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        settings: TokenSettings {
            foreground: rule.settings.foreground.as_deref().map(normalize_color),
            background: rule.settings.background.as_deref().map(normalize_color),
            font_style: rule.settings.font_style.as_deref().map(normalize_font_style),
        },
    }
}

/// Lowercase hex for valid colors, trimmed text otherwise.
#[must_use]
pub fn normalize_color(text: &str) -> String {
    let trimmed = text.trim();
    ColorValue::parse(trimmed).map_or_else(|_| trimmed.to_string(), |c| c.to_string())
}

fn normalize_font_style(text: &str) -> String {
    let trimmed = text.trim();
    FontStyle::parse(trimmed).map_or_else(|_| trimmed.to_string(), |s| s.to_string())
}

fn trim_opt(text: Option<&str>) -> Option<String> {
    text.map(|t| t.trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
