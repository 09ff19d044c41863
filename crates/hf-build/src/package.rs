// SPDX-License-Identifier: MIT
//
// Packaging — turning an extension directory into a `.vsix`.
//
// The work is done by `vsce package --out <file>`, run inside the extension
// directory. Before that the directory is checked for what the marketplace
// needs, so a broken build fails with a precise message instead of whatever
// the packager prints.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

use serde_json::Value;

use crate::config::PackageConfig;

const REQUIRED_FILES: &[&str] = &["package.json", "README.md"];
const REQUIRED_DIRS: &[&str] = &["themes"];
const REQUIRED_FIELDS: &[&str] = &["name", "version", "engines", "contributes"];

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("packager {tool:?} not found (install it with `npm install -g @vscode/vsce`): {source}")]
    ToolNotFound {
        tool: String,
        #[source]
        source: which::Error,
    },
    #[error("{} is missing {entry}", dir.display())]
    Missing { dir: PathBuf, entry: &'static str },
    #[error("malformed {}: {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("package.json has no {field:?}")]
    ManifestField { field: &'static str },
    #[error("package.json contributes no themes")]
    NoThemes,
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("packager exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
}

// ─── Manifest check ──────────────────────────────────────────────────────────

/// The parts of `package.json` packaging cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestInfo {
    pub name: String,
    pub version: String,
}

impl ManifestInfo {
    #[must_use]
    pub fn vsix_name(&self) -> String {
        format!("{}-{}.vsix", self.name, self.version)
    }
}

fn text_field(manifest: &Value, field: &'static str) -> Result<String, PackageError> {
    manifest
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(PackageError::ManifestField { field })
}

/// Check that `dir` holds a packageable extension.
///
/// # Errors
///
/// Missing files or directories, an unreadable `package.json`, or one that
/// lacks a required field or contributes no themes.
pub fn check_extension_dir(dir: &Path) -> Result<ManifestInfo, PackageError> {
    for &entry in REQUIRED_FILES {
        if !dir.join(entry).is_file() {
            return Err(PackageError::Missing {
                dir: dir.to_path_buf(),
                entry,
            });
        }
    }
    for &entry in REQUIRED_DIRS {
        if !dir.join(entry).is_dir() {
            return Err(PackageError::Missing {
                dir: dir.to_path_buf(),
                entry,
            });
        }
    }

    let path = dir.join("package.json");
    let text = std::fs::read_to_string(&path).map_err(|source| PackageError::Io {
        path: path.clone(),
        source,
    })?;
    let manifest: Value =
        serde_json::from_str(&text).map_err(|source| PackageError::Manifest { path, source })?;

    for &field in REQUIRED_FIELDS {
        if manifest.get(field).is_none() {
            return Err(PackageError::ManifestField { field });
        }
    }
    let has_themes = manifest
        .pointer("/contributes/themes")
        .and_then(Value::as_array)
        .is_some_and(|themes| !themes.is_empty());
    if !has_themes {
        return Err(PackageError::NoThemes);
    }

    Ok(ManifestInfo {
        name: text_field(&manifest, "name")?,
        version: text_field(&manifest, "version")?,
    })
}

// ─── Packager ────────────────────────────────────────────────────────────────

/// A located packager executable plus extra arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packager {
    program: PathBuf,
    args: Vec<String>,
}

impl Packager {
    #[must_use]
    pub const fn new(program: PathBuf, args: Vec<String>) -> Self {
        Self { program, args }
    }

    /// Find `config.tool` on `PATH`.
    ///
    /// # Errors
    ///
    /// The tool is not installed.
    pub fn locate(config: &PackageConfig) -> Result<Self, PackageError> {
        let program = which::which(&config.tool).map_err(|source| PackageError::ToolNotFound {
            tool: config.tool.clone(),
            source,
        })?;
        tracing::debug!(path = %program.display(), "found packager");
        Ok(Self::new(program, config.args.clone()))
    }

    #[must_use]
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Package `dir`, writing to `out` or to `<name>-<version>.vsix` next to
    /// the directory. Returns the written file.
    ///
    /// # Errors
    ///
    /// See [`check_extension_dir`], plus packager failures.
    pub fn package(&self, dir: &Path, out: Option<&Path>) -> Result<PathBuf, PackageError> {
        let manifest = check_extension_dir(dir)?;
        let out = match out {
            Some(out) => out.to_path_buf(),
            None => dir
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join(manifest.vsix_name()),
        };
        // The packager runs inside `dir`, so hand it an absolute path.
        let out = std::path::absolute(&out).map_err(|source| PackageError::Io {
            path: out.clone(),
            source,
        })?;
        if let Some(parent) = out.parent() {
            std::fs::create_dir_all(parent).map_err(|source| PackageError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        tracing::info!(path = %out.display(), "packaging extension");
        let output = Command::new(&self.program)
            .arg("package")
            .arg("--out")
            .arg(&out)
            .args(&self.args)
            .current_dir(dir)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PackageError::Io {
                path: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(PackageError::Failed {
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(out)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MANIFEST: &str = r#"{
  "name": "ocean",
  "version": "1.2.3",
  "engines": { "vscode": "^1.74.0" },
  "contributes": { "themes": [{ "label": "Ocean", "path": "./themes/ocean-color-theme.json" }] }
}"#;

    fn extension(dir: &Path, manifest: &str) -> PathBuf {
        let ext = dir.join("ocean");
        std::fs::create_dir_all(ext.join("themes")).unwrap();
        std::fs::write(ext.join("package.json"), manifest).unwrap();
        std::fs::write(ext.join("README.md"), "# Ocean\n").unwrap();
        ext
    }

    // ── check_extension_dir ─────────────────────────────────────────

    #[test]
    fn complete_dir_passes() {
        let dir = tempfile::tempdir().unwrap();
        let info = check_extension_dir(&extension(dir.path(), MANIFEST)).unwrap();
        assert_eq!(info.vsix_name(), "ocean-1.2.3.vsix");
    }

    #[test]
    fn missing_readme() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), MANIFEST);
        std::fs::remove_file(ext.join("README.md")).unwrap();
        assert!(matches!(
            check_extension_dir(&ext),
            Err(PackageError::Missing { entry: "README.md", .. })
        ));
    }

    #[test]
    fn missing_themes_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), MANIFEST);
        std::fs::remove_dir(ext.join("themes")).unwrap();
        assert!(matches!(
            check_extension_dir(&ext),
            Err(PackageError::Missing { entry: "themes", .. })
        ));
    }

    #[test]
    fn manifest_without_engines() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), r#"{"name":"o","version":"1.0.0","contributes":{}}"#);
        assert!(matches!(
            check_extension_dir(&ext),
            Err(PackageError::ManifestField { field: "engines" })
        ));
    }

    #[test]
    fn manifest_without_themes() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(
            dir.path(),
            r#"{"name":"o","version":"1.0.0","engines":{},"contributes":{"themes":[]}}"#,
        );
        assert!(matches!(check_extension_dir(&ext), Err(PackageError::NoThemes)));
    }

    #[test]
    fn malformed_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), "{ not json");
        assert!(matches!(check_extension_dir(&ext), Err(PackageError::Manifest { .. })));
    }

    // ── packager ────────────────────────────────────────────────────

    #[test]
    fn unknown_tool_not_found() {
        let config = PackageConfig {
            tool: "hueforge-no-such-packager".into(),
            args: Vec::new(),
        };
        assert!(matches!(
            Packager::locate(&config),
            Err(PackageError::ToolNotFound { .. })
        ));
    }

    #[cfg(unix)]
    fn script(dir: &Path, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-vsce");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn packages_next_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), MANIFEST);
        // $1 = package, $2 = --out, $3 = file
        let packager = Packager::new(script(dir.path(), r#"touch "$3""#), Vec::new());
        let out = packager.package(&ext, None).unwrap();
        assert_eq!(out.file_name().unwrap(), "ocean-1.2.3.vsix");
        assert!(out.is_file());
        assert!(out.is_absolute());
    }

    #[cfg(unix)]
    #[test]
    fn explicit_out_path() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), MANIFEST);
        let packager = Packager::new(script(dir.path(), r#"touch "$3""#), Vec::new());
        let target = dir.path().join("dist/custom.vsix");
        let out = packager.package(&ext, Some(&target)).unwrap();
        assert_eq!(out, target);
        assert!(target.is_file());
    }

    #[cfg(unix)]
    #[test]
    fn failing_packager_reports_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let ext = extension(dir.path(), MANIFEST);
        let packager = Packager::new(script(dir.path(), "echo 'missing publisher' >&2; exit 1"), Vec::new());
        match packager.package(&ext, None).unwrap_err() {
            PackageError::Failed { stderr, .. } => assert_eq!(stderr, "missing publisher"),
            other => panic!("unexpected {other:?}"),
        }
    }
}
