// SPDX-License-Identifier: MIT
//
// `hueforge validate` — validation without building, with optional repair.
//
// With `fix`, contrast auto-fix is forced on and the validator's own
// suggestions are applied where they are mechanical: a repaired hex value, a
// default for a missing core color, a correctly-cased key, a slugified name.
// The repaired theme is written back to its file. Variant files are never
// rewritten, since saving the merged result would flatten them.

use std::path::{Path, PathBuf};

use hf_color::ColorValue;
use hf_theme::vocabulary::is_known_key;
use hf_theme::{ParsedTheme, ThemeDocument, Validated, ValidationConfig, ValidationIssue, validate};

use crate::error::BuildError;
use crate::loader::{load_theme, read_parsed};

const COLOR_PREFIX: &str = "theme.colors.";

/// Result of checking one theme file.
#[derive(Debug)]
pub struct CheckReport {
    pub path: PathBuf,
    pub result: Result<Validated, BuildError>,
    /// The file was rewritten with repairs.
    pub rewritten: bool,
}

impl CheckReport {
    /// Passed under `strict`: loaded, and nothing blocking remains.
    #[must_use]
    pub fn passed(&self, strict: bool) -> bool {
        self.result
            .as_ref()
            .is_ok_and(|validated| !validated.has_blocking(strict))
    }
}

/// Validate each file in `paths`.
pub fn check_themes(paths: &[PathBuf], config: &ValidationConfig, fix: bool) -> Vec<CheckReport> {
    paths
        .iter()
        .map(|path| {
            let (result, rewritten) = match check_theme(path, config, fix) {
                Ok((validated, rewritten)) => (Ok(validated), rewritten),
                Err(err) => (Err(err), false),
            };
            CheckReport {
                path: path.clone(),
                result,
                rewritten,
            }
        })
        .collect()
}

fn check_theme(
    path: &Path,
    config: &ValidationConfig,
    fix: bool,
) -> Result<(Validated, bool), BuildError> {
    let doc = load_theme(path)?;
    if !fix {
        return Ok((validate(doc, config)?, false));
    }

    let config = ValidationConfig {
        auto_fix: true,
        ..*config
    };
    let first = validate(doc, &config)?;
    let mut document = first.document.clone();
    let mut repaired: Vec<ValidationIssue> = first.fixed().cloned().collect();
    for issue in first.issues.iter().filter(|i| !i.resolved) {
        if apply_suggestion(&mut document, issue) {
            repaired.push(ValidationIssue {
                resolved: true,
                ..issue.clone()
            });
        }
    }

    let second = validate(document, &config)?;
    let changed = !repaired.is_empty();
    let rewritten = changed && write_back(path, &second.document)?;

    let mut issues = repaired;
    issues.extend(second.issues);
    Ok((
        Validated {
            document: second.document,
            issues,
        },
        rewritten,
    ))
}

/// Apply a suggestion the validator offered, if it is a mechanical one.
fn apply_suggestion(doc: &mut ThemeDocument, issue: &ValidationIssue) -> bool {
    let Some(suggestion) = issue.suggestion.as_deref() else {
        return false;
    };

    if issue.path == "theme.name" {
        doc.metadata.name = suggestion.to_string();
        return true;
    }

    let Some(key) = issue.path.strip_prefix(COLOR_PREFIX) else {
        return false;
    };
    if ColorValue::is_valid(suggestion) {
        doc.colors.insert(key.to_string(), suggestion.to_string());
        return true;
    }
    if is_known_key(suggestion) && !doc.colors.contains_key(suggestion) {
        if let Some(value) = doc.colors.remove(key) {
            doc.colors.insert(suggestion.to_string(), value);
            return true;
        }
    }
    false
}

fn write_back(path: &Path, doc: &ThemeDocument) -> Result<bool, BuildError> {
    if matches!(read_parsed(path)?, ParsedTheme::Variant { .. }) {
        tracing::warn!(path = %path.display(), "variant themes are not rewritten; apply the fixes by hand");
        return Ok(false);
    }
    let yaml = doc.to_yaml_string()?;
    std::fs::write(path, yaml).map_err(BuildError::io(path))?;
    tracing::info!(path = %path.display(), "rewrote theme with fixes");
    Ok(true)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BROKEN: &str = r##"
theme:
  name: Ocean Deep
  display_name: Ocean
  version: 1.0.0
  license: MIT
  colors:
    editor.background: "#000000"
    editor.foreground: "#111111"
    sidebar.background: "#252526"
    activityBar.background: "333333"
"##;

    fn write(dir: &Path, file: &str, text: &str) -> PathBuf {
        let path = dir.join(file);
        std::fs::write(&path, text).unwrap();
        path
    }

    #[test]
    fn plain_check_reports_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "ocean.yaml", BROKEN);
        let reports = check_themes(&[path.clone()], &ValidationConfig::default(), false);

        assert_eq!(reports.len(), 1);
        assert!(!reports[0].passed(false));
        assert!(!reports[0].rewritten);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), BROKEN);
    }

    #[test]
    fn fix_repairs_and_rewrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "ocean.yaml", BROKEN);
        let config = ValidationConfig {
            auto_fix: false,
            ..ValidationConfig::default()
        };
        let reports = check_themes(&[path.clone()], &config, true);
        let report = &reports[0];

        assert!(report.rewritten);
        assert!(report.passed(false), "{:?}", report.result);

        let doc = load_theme(&path).unwrap();
        assert_eq!(doc.metadata.name, "ocean-deep");
        assert_eq!(doc.colors["activityBar.background"], "#333333");
        assert!(doc.colors.contains_key("sideBar.background"));
        assert!(!doc.colors.contains_key("sidebar.background"));
        assert!(doc.colors.contains_key("statusBar.background"));
        assert_ne!(doc.colors["editor.foreground"], "#111111");
    }

    #[test]
    fn variants_are_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "ocean.yaml", BROKEN.replace("Ocean Deep", "ocean").as_str());
        let variant = "theme:\n  extends: ocean\n  name: ocean-soft\n";
        let path = write(dir.path(), "ocean-soft.yaml", variant);

        let reports = check_themes(&[path.clone()], &ValidationConfig::default(), true);
        assert!(!reports[0].rewritten);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), variant);
    }

    #[test]
    fn unreadable_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "bad.yaml", "theme: [");
        let reports = check_themes(&[path], &ValidationConfig::default(), true);
        assert!(matches!(reports[0].result, Err(BuildError::Load { .. })));
        assert!(!reports[0].passed(false));
    }
}
