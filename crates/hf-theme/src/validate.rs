//! Theme validation and contrast auto-fix.
//!
//! [`validate`] walks a document through a fixed sequence of checks and
//! reports every data problem as a [`ValidationIssue`]. It never fails on
//! bad data; only a nonsensical [`ValidationConfig`] is an error.
//!
//! The one mutation it performs is the contrast auto-fix: a foreground that
//! fails its pair is walked in lightness until it passes (see
//! [`hf_color::adjust_for_contrast`]), and the issue is kept with
//! `resolved = true` so callers can show what changed.

use std::fmt;
use std::sync::LazyLock;

use hf_color::{ColorValue, ContrastFix, adjust_for_contrast, contrast_ratio};
use regex::Regex;
use serde::Deserialize;

use crate::document::{ThemeDocument, ThemeKind};
use crate::font::FontStyle;
use crate::vocabulary::{CONTRAST_PAIRS, CORE_KEYS, UI_KEYS, is_known_key};

static SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9-]*$").unwrap_or_else(|err| panic!("slug regex: {err}"))
});

static SEMVER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").unwrap_or_else(|err| panic!("semver regex: {err}"))
});

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .unwrap_or_else(|err| panic!("email regex: {err}"))
});

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Knobs for [`validate`]. Deserializes from the `validation:` section of
/// the build config with every field optional.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// WCAG ratio every contrast pair must reach.
    pub min_contrast_ratio: f64,
    /// Escalate soft findings (semver, contrast) to errors, and make any
    /// unresolved warning block a build.
    pub strict_mode: bool,
    /// Repair failing contrast pairs in place.
    pub auto_fix: bool,
    pub check_contrast: bool,
    /// Bound on lightness steps per auto-fix.
    pub max_fix_steps: u32,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            min_contrast_ratio: hf_color::contrast::WCAG_AA,
            strict_mode: false,
            auto_fix: true,
            check_contrast: true,
            max_fix_steps: hf_color::contrast::DEFAULT_MAX_STEPS,
        }
    }
}

/// A [`ValidationConfig`] that cannot be acted on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidConfiguration {
    #[error("min_contrast_ratio must be a positive finite number, got {0}")]
    MinContrastRatio(f64),
    #[error("max_fix_steps must be at least 1 when auto_fix is enabled")]
    NoFixSteps,
}

impl ValidationConfig {
    /// Check the configuration itself.
    ///
    /// # Errors
    ///
    /// See [`InvalidConfiguration`].
    pub fn check(&self) -> Result<(), InvalidConfiguration> {
        if !self.min_contrast_ratio.is_finite() || self.min_contrast_ratio <= 0.0 {
            return Err(InvalidConfiguration::MinContrastRatio(self.min_contrast_ratio));
        }
        if self.auto_fix && self.max_fix_steps == 0 {
            return Err(InvalidConfiguration::NoFixSteps);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Error => "error",
            Self::Warning => "warning",
        })
    }
}

/// One finding, located by a dotted field path such as
/// `theme.colors.editor.foreground` or `theme.token_colors[2].scope`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: Severity,
    pub path: String,
    pub message: String,
    /// A value that would make the finding go away.
    pub suggestion: Option<String>,
    /// The auto-fix already applied `suggestion` to the document.
    pub resolved: bool,
}

impl ValidationIssue {
    fn new(severity: Severity, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            path: path.into(),
            message: message.into(),
            suggestion: None,
            resolved: false,
        }
    }

    fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, path, message)
    }

    fn warning(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, path, message)
    }

    fn suggest(mut self, value: impl Into<String>) -> Self {
        self.suggestion = Some(value.into());
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}: {}", self.severity, self.path, self.message)?;
        match (&self.suggestion, self.resolved) {
            (Some(value), true) => write!(f, " (fixed: {value})"),
            (Some(value), false) => write!(f, " (try {value})"),
            (None, _) => Ok(()),
        }
    }
}

/// The document after validation (auto-fixes applied) and everything found.
#[derive(Debug, Clone, PartialEq)]
pub struct Validated {
    pub document: ThemeDocument,
    pub issues: Vec<ValidationIssue>,
}

impl Validated {
    /// Whether this result must stop the theme from being built: any
    /// unresolved error, or under `strict` any unresolved warning too.
    #[must_use]
    pub fn has_blocking(&self, strict: bool) -> bool {
        self.issues.iter().any(|issue| {
            !issue.resolved && (issue.severity == Severity::Error || strict)
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    /// Issues the auto-fix repaired.
    pub fn fixed(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.resolved)
    }
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

/// Validate `doc` under `config`.
///
/// Checks run in this order:
///
/// 1. required metadata (`name`, `display_name`, `version`, `license`)
/// 2. name is a slug
/// 3. version is `MAJOR.MINOR.PATCH` (error only in strict mode)
/// 4. every color and token setting parses; font styles are known; every
///    token rule has a scope
/// 5. contrast pairs reach `min_contrast_ratio`, with optional auto-fix
/// 6. unknown UI keys (always warnings)
/// 7. missing core UI keys
/// 8. author email shape
/// 9. `type` names a known kind; keywords are non-empty text
///
/// # Errors
///
/// Only when `config` itself is invalid.
pub fn validate(
    doc: ThemeDocument,
    config: &ValidationConfig,
) -> Result<Validated, InvalidConfiguration> {
    config.check()?;

    let mut document = doc;
    let mut issues = Vec::new();

    check_required(&document, &mut issues);
    check_name(&document, &mut issues);
    check_version(&document, config, &mut issues);
    check_colors(&document, &mut issues);
    check_token_colors(&document, &mut issues);
    if config.check_contrast {
        check_contrast(&mut document, config, &mut issues);
    }
    check_unknown_keys(&document, &mut issues);
    check_core_keys(&document, &mut issues);
    check_email(&document, &mut issues);
    check_kind(&document, &mut issues);
    check_keywords(&document, &mut issues);

    Ok(Validated { document, issues })
}

fn check_required(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    let meta = &doc.metadata;
    let fields = [
        ("name", meta.name.as_str()),
        ("display_name", meta.display_name.as_str()),
        ("version", meta.version.as_str()),
        ("license", meta.license.as_deref().unwrap_or_default()),
    ];
    for (field, value) in fields {
        if value.trim().is_empty() {
            issues.push(ValidationIssue::error(
                format!("theme.{field}"),
                format!("required field `{field}` is missing or empty"),
            ));
        }
    }
}

fn check_name(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    let name = &doc.metadata.name;
    if name.is_empty() || SLUG.is_match(name) {
        return;
    }
    let slug = slugify(name);
    let issue = ValidationIssue::error(
        "theme.name",
        format!("{name:?} is not a valid name: use lowercase letters, digits, and hyphens"),
    );
    issues.push(if slug.is_empty() { issue } else { issue.suggest(slug) });
}

fn check_version(doc: &ThemeDocument, config: &ValidationConfig, issues: &mut Vec<ValidationIssue>) {
    let version = &doc.metadata.version;
    if version.is_empty() || SEMVER.is_match(version) {
        return;
    }
    let severity = if config.strict_mode { Severity::Error } else { Severity::Warning };
    issues.push(ValidationIssue::new(
        severity,
        "theme.version",
        format!("{version:?} is not a semantic version (MAJOR.MINOR.PATCH)"),
    ));
}

fn check_colors(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    for (key, text) in &doc.colors {
        if let Err(err) = ColorValue::parse(text) {
            issues.push(malformed(format!("theme.colors.{key}"), text, &err));
        }
    }
}

fn check_token_colors(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    for (i, rule) in doc.token_colors.iter().enumerate() {
        let base = format!("theme.token_colors[{i}]");
        if rule.scope.iter().all(|s| s.trim().is_empty()) {
            issues.push(ValidationIssue::error(
                format!("{base}.scope"),
                "token rule has no scope",
            ));
        }
        let settings = &rule.settings;
        for (field, value) in [
            ("foreground", &settings.foreground),
            ("background", &settings.background),
        ] {
            if let Some(Err(err)) = value.as_deref().map(ColorValue::parse) {
                let text = value.as_deref().unwrap_or_default();
                issues.push(malformed(format!("{base}.settings.{field}"), text, &err));
            }
        }
        if let Some(Err(err)) = settings.font_style.as_deref().map(FontStyle::parse) {
            issues.push(ValidationIssue::error(
                format!("{base}.settings.fontStyle"),
                err.to_string(),
            ));
        }
    }
}

fn malformed(path: String, text: &str, err: &hf_color::MalformedColor) -> ValidationIssue {
    let issue = ValidationIssue::error(path, err.to_string());
    match repair_hex(text) {
        Some(fixed) => issue.suggest(fixed),
        None => issue,
    }
}

/// Best guess at what a malformed color meant: `#abc` shorthand expanded,
/// or a missing `#` restored.
fn repair_hex(text: &str) -> Option<String> {
    let text = text.trim();
    let digits = text.strip_prefix('#').unwrap_or(text);
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let expanded = match digits.len() {
        3 | 4 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 | 8 => digits.to_string(),
        _ => return None,
    };
    ColorValue::parse(&format!("#{expanded}")).ok().map(|c| c.to_string())
}

fn check_contrast(
    doc: &mut ThemeDocument,
    config: &ValidationConfig,
    issues: &mut Vec<ValidationIssue>,
) {
    let severity = if config.strict_mode { Severity::Error } else { Severity::Warning };

    for &(bg_key, fg_key) in CONTRAST_PAIRS {
        let (Some(Ok(bg)), Some(Ok(fg))) = (doc.color(bg_key), doc.color(fg_key)) else {
            continue;
        };
        let ratio = contrast_ratio(fg, bg);
        if ratio >= config.min_contrast_ratio {
            continue;
        }

        let mut issue = ValidationIssue::new(
            severity,
            format!("theme.colors.{fg_key}"),
            format!(
                "{fg_key} on {bg_key} has contrast {ratio:.2}:1, below {:.2}:1",
                config.min_contrast_ratio
            ),
        );

        if config.auto_fix {
            match adjust_for_contrast(fg, bg, config.min_contrast_ratio, config.max_fix_steps) {
                ContrastFix::Fixed { color, ratio: fixed } => {
                    let value = color.to_string();
                    doc.colors.insert(fg_key.to_string(), value.clone());
                    issue.message.push_str(&format!("; adjusted to {fixed:.2}:1"));
                    issue = issue.suggest(value);
                    issue.resolved = true;
                }
                ContrastFix::Unresolved { ratio: best, .. } => {
                    issue.message.push_str(&format!(
                        "; no fix within {} steps (best {best:.2}:1)",
                        config.max_fix_steps
                    ));
                }
                ContrastFix::AlreadyMet => {}
            }
        }

        issues.push(issue);
    }
}

fn check_unknown_keys(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    for key in doc.colors.keys().filter(|k| !is_known_key(k)) {
        let issue = ValidationIssue::warning(
            format!("theme.colors.{key}"),
            format!("{key:?} is not a recognized UI color key"),
        );
        let near = UI_KEYS.iter().find(|known| known.eq_ignore_ascii_case(key));
        issues.push(match near {
            Some(known) => issue.suggest(*known),
            None => issue,
        });
    }
}

fn check_core_keys(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    for &(key, default) in CORE_KEYS {
        if !doc.colors.contains_key(key) {
            issues.push(
                ValidationIssue::warning(
                    format!("theme.colors.{key}"),
                    format!("core UI color {key:?} is not set"),
                )
                .suggest(default),
            );
        }
    }
}

fn check_email(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    let email = doc.metadata.author.email.as_deref().unwrap_or_default();
    if !email.is_empty() && !EMAIL.is_match(email) {
        issues.push(ValidationIssue::warning(
            "theme.author.email",
            format!("{email:?} does not look like an email address"),
        ));
    }
}

fn check_kind(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    let Some(kind) = doc.metadata.kind.as_deref() else {
        return;
    };
    if ThemeKind::from_name(kind).is_none() {
        issues.push(
            ValidationIssue::error(
                "theme.type",
                format!("{kind:?} is not a theme type: use dark, light, high-contrast, or high-contrast-light"),
            )
            .suggest(doc.kind().name()),
        );
    }
}

fn check_keywords(doc: &ThemeDocument, issues: &mut Vec<ValidationIssue>) {
    if doc.metadata.keywords.iter().any(|k| k.trim().is_empty()) {
        issues.push(ValidationIssue::error(
            "theme.keywords",
            "every keyword must be non-empty text",
        ));
    }
}

/// Lowercase, with runs of anything outside `[a-z0-9]` collapsed to one
/// hyphen and no hyphens at either end.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
