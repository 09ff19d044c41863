// SPDX-License-Identifier: MIT
//
// Renderer — one theme document in, a map of extension artifacts out.
//
// A TemplateSet pairs artifact names with template bodies in one minijinja
// environment. Names are templates too (`themes/{{ theme_file }}`, stored as
// `<name of …>`), rendered against the same context as the body, so one set
// serves every theme.
//
// Rendering is pure: the context is built from the document and the set's
// globals only, and every map in it is ordered, so the same inputs always
// produce byte-identical output.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};

use hf_theme::{ThemeDocument, slugify};
use minijinja::Environment;
use serde::Serialize;
use serde_json::{Value, json};

use crate::template::{self, TemplateBindingError, TemplateSyntaxError};

/// VS Code engine range written into `package.json`.
pub const DEFAULT_ENGINES_VERSION: &str = "^1.74.0";

/// Artifact name of the color-theme JSON in the builtin set.
pub const THEME_ARTIFACT: &str = "themes/{{ theme_file }}";

const BUILTIN: &[(&str, &str)] = &[
    ("package.json", include_str!("../templates/package.json.tmpl")),
    (THEME_ARTIFACT, include_str!("../templates/theme.json.tmpl")),
    ("README.md", include_str!("../templates/README.md.tmpl")),
    ("CHANGELOG.md", include_str!("../templates/CHANGELOG.md.tmpl")),
    ("LICENSE", include_str!("../templates/LICENSE.tmpl")),
    (
        "vsc-extension-quickstart.md",
        include_str!("../templates/vsc-extension-quickstart.md.tmpl"),
    ),
    (".vscode/launch.json", include_str!("../templates/launch.json.tmpl")),
];

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error(transparent)]
    Syntax(#[from] TemplateSyntaxError),
    #[error(transparent)]
    Binding(#[from] TemplateBindingError),
    #[error("template {template:?} names artifact {path:?}, which is not a relative path inside the extension")]
    ArtifactPath { template: String, path: String },
    #[error("cannot read templates from {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ─── Globals ─────────────────────────────────────────────────────────────────

/// A screenshot listed in the README.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Screenshot {
    /// Path relative to the extension root, e.g. `images/screenshot-rust.png`.
    pub path: String,
    pub caption: String,
}

/// Values every template sees that do not come from the theme itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Globals {
    pub engines_version: String,
    /// Copyright year. Left out of the LICENSE when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    /// Extension icon path, relative to the extension root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub screenshots: Vec<Screenshot>,
}

impl Default for Globals {
    fn default() -> Self {
        Self {
            engines_version: DEFAULT_ENGINES_VERSION.to_string(),
            year: None,
            icon: None,
            screenshots: Vec::new(),
        }
    }
}

// ─── TemplateSet ─────────────────────────────────────────────────────────────

/// Artifact templates plus the globals they render with.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    env: Environment<'static>,
    artifacts: BTreeSet<String>,
    pub globals: Globals,
}

fn name_template(artifact: &str) -> String {
    format!("<name of {artifact}>")
}

impl TemplateSet {
    /// An empty set.
    #[must_use]
    pub fn new(globals: Globals) -> Self {
        Self {
            env: template::environment(),
            artifacts: BTreeSet::new(),
            globals,
        }
    }

    /// The seven artifacts of a VS Code color-theme extension.
    ///
    /// # Panics
    ///
    /// If a builtin template fails to parse.
    #[must_use]
    pub fn builtin() -> Self {
        BUILTIN.iter().fold(Self::new(Globals::default()), |set, (name, source)| {
            set.with_template(name, source)
                .unwrap_or_else(|err| panic!("builtin template {name}: {err}"))
        })
    }

    /// Add or replace the artifact `name` with `source`.
    ///
    /// # Errors
    ///
    /// When either the name or the body fails to parse.
    pub fn with_template(mut self, name: &str, source: &str) -> Result<Self, TemplateSyntaxError> {
        template::add(&mut self.env, &name_template(name), name)?;
        template::add(&mut self.env, name, source)?;
        self.artifacts.insert(name.to_string());
        Ok(self)
    }

    /// The builtin set with every `*.tmpl` file under `dir` layered on top.
    ///
    /// A file's path relative to `dir`, minus `.tmpl`, is its artifact name
    /// (`README.md.tmpl` replaces the builtin README). `theme.json.tmpl`
    /// replaces the color-theme JSON. Other files add new artifacts.
    ///
    /// # Errors
    ///
    /// Unreadable files and templates that fail to parse.
    pub fn from_dir(dir: &Path) -> Result<Self, RenderError> {
        let mut set = Self::builtin();
        for entry in walkdir::WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.map_err(|err| RenderError::Io {
                path: err.path().unwrap_or(dir).to_path_buf(),
                source: err.into(),
            })?;
            let path = entry.path();
            if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "tmpl") {
                continue;
            }
            let source = std::fs::read_to_string(path).map_err(|source| RenderError::Io {
                path: path.to_path_buf(),
                source,
            })?;
            let name = artifact_name(dir, path);
            set = set.with_template(&name, &source)?;
        }
        Ok(set)
    }

    /// Artifact name templates, in render order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.artifacts.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

fn artifact_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).with_extension("");
    let name = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/");
    if name == "theme.json" {
        THEME_ARTIFACT.to_string()
    } else {
        name
    }
}

// ─── render ──────────────────────────────────────────────────────────────────

/// The template context for `doc`.
///
/// Metadata fields sit at the top level (`name`, `display_name`, `author`,
/// …; unset optional ones are absent so `default` applies), next to
/// `colors`, `token_colors`, the derived `theme_file`, `theme_type`,
/// `ui_theme`, and `package_name`, and the globals.
#[must_use]
pub fn context(doc: &ThemeDocument, globals: &Globals) -> Value {
    let mut ctx = serde_json::to_value(&doc.metadata).unwrap_or_else(|_| json!({}));
    let kind = doc.kind();
    let derived = json!({
        "author": doc.metadata.author,
        "keywords": doc.metadata.keywords,
        "changelog": doc.metadata.changelog,
        "colors": doc.colors,
        "token_colors": doc.token_colors,
        "theme_file": doc.theme_file_name(),
        "theme_type": kind.theme_type(),
        "ui_theme": kind.ui_theme(),
        "package_name": slugify(&doc.metadata.name),
    });
    merge_objects(&mut ctx, derived);
    merge_objects(&mut ctx, serde_json::to_value(globals).unwrap_or_else(|_| json!({})));
    ctx
}

fn merge_objects(into: &mut Value, from: Value) {
    if let (Value::Object(into), Value::Object(from)) = (into, from) {
        into.extend(from);
    }
}

/// Render every artifact in `set` for `doc`, keyed by artifact path.
///
/// # Errors
///
/// The first binding failure, or an artifact name that escapes the
/// extension directory.
pub fn render(
    doc: &ThemeDocument,
    set: &TemplateSet,
) -> Result<BTreeMap<String, String>, RenderError> {
    render_with(doc, set, &set.globals)
}

/// [`render`] with `globals` in place of the set's own, e.g. once the
/// screenshots that actually exist are known.
///
/// # Errors
///
/// As [`render`].
pub fn render_with(
    doc: &ThemeDocument,
    set: &TemplateSet,
    globals: &Globals,
) -> Result<BTreeMap<String, String>, RenderError> {
    let ctx = context(doc, globals);
    let mut out = BTreeMap::new();
    for name in &set.artifacts {
        let path = template::render(&set.env, &name_template(name), &ctx)?;
        if !is_safe_relative(&path) {
            return Err(RenderError::ArtifactPath {
                template: name.clone(),
                path,
            });
        }
        out.insert(path, template::render(&set.env, name, &ctx)?);
    }
    Ok(out)
}

fn is_safe_relative(path: &str) -> bool {
    let path = Path::new(path);
    !path.as_os_str().is_empty()
        && path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc() -> ThemeDocument {
        ThemeDocument::from_yaml_str(
            r##"
theme:
  name: midnight-neon
  display_name: Midnight Neon
  description: Neon on midnight.
  version: 1.2.0
  license: MIT
  publisher: neon-labs
  author: { name: Ada Lovelace, email: ada@example.com }
  keywords: [dark, neon]
  changelog: [Brighter comments, New terminal palette]
  colors:
    editor.background: "#0a0e14"
    editor.foreground: "#b3b1ad"
  token_colors:
    - name: Comment
      scope: [comment]
      settings: { foreground: "#626a73", fontStyle: italic }
"##,
        )
        .unwrap()
    }

    fn artifacts() -> BTreeMap<String, String> {
        render(&doc(), &TemplateSet::builtin()).unwrap()
    }

    // ── Builtin set ─────────────────────────────────────────────────

    #[test]
    fn builtin_renders_seven_artifacts() {
        let names: Vec<_> = artifacts().into_keys().collect();
        assert_eq!(
            names,
            vec![
                ".vscode/launch.json",
                "CHANGELOG.md",
                "LICENSE",
                "README.md",
                "package.json",
                "themes/midnight-neon-color-theme.json",
                "vsc-extension-quickstart.md",
            ]
        );
    }

    #[test]
    fn json_artifacts_parse() {
        let out = artifacts();
        for name in ["package.json", "themes/midnight-neon-color-theme.json", ".vscode/launch.json"] {
            let parsed: Result<Value, _> = serde_json::from_str(&out[name]);
            assert!(parsed.is_ok(), "{name} is not valid JSON:\n{}", out[name]);
        }
    }

    #[test]
    fn package_json_fields() {
        let pkg: Value = serde_json::from_str(&artifacts()["package.json"]).unwrap();
        assert_eq!(pkg["name"], "midnight-neon");
        assert_eq!(pkg["displayName"], "Midnight Neon");
        assert_eq!(pkg["publisher"], "neon-labs");
        assert_eq!(pkg["author"]["email"], "ada@example.com");
        assert_eq!(pkg["engines"]["vscode"], DEFAULT_ENGINES_VERSION);
        assert_eq!(pkg["keywords"], json!(["dark", "neon"]));
        let theme = &pkg["contributes"]["themes"][0];
        assert_eq!(theme["uiTheme"], "vs-dark");
        assert_eq!(theme["path"], "./themes/midnight-neon-color-theme.json");
        assert!(pkg.get("icon").is_none());
        assert!(pkg.get("repository").is_none());
    }

    #[test]
    fn package_json_defaults_for_missing_metadata() {
        let mut doc = doc();
        doc.metadata.description = None;
        doc.metadata.publisher = None;
        doc.metadata.author = hf_theme::Author::default();
        let out = render(&doc, &TemplateSet::builtin()).unwrap();
        let pkg: Value = serde_json::from_str(&out["package.json"]).unwrap();
        assert_eq!(pkg["publisher"], "unknown");
        assert_eq!(pkg["description"], "A custom VS Code theme");
        assert!(pkg.get("author").is_none());
    }

    #[test]
    fn theme_json_carries_colors_and_tokens() {
        let theme: Value =
            serde_json::from_str(&artifacts()["themes/midnight-neon-color-theme.json"]).unwrap();
        assert_eq!(theme["type"], "dark");
        assert_eq!(theme["colors"]["editor.background"], "#0a0e14");
        assert_eq!(theme["tokenColors"][0]["scope"], json!(["comment"]));
        assert_eq!(theme["tokenColors"][0]["settings"]["fontStyle"], "italic");
    }

    #[test]
    fn light_theme_uses_vs() {
        let mut doc = doc();
        doc.colors.insert("editor.background".into(), "#ffffff".into());
        let out = render(&doc, &TemplateSet::builtin()).unwrap();
        let pkg: Value = serde_json::from_str(&out["package.json"]).unwrap();
        assert_eq!(pkg["contributes"]["themes"][0]["uiTheme"], "vs");
    }

    #[test]
    fn changelog_lists_entries() {
        let changelog = &artifacts()["CHANGELOG.md"];
        assert!(changelog.contains("## [1.2.0]\n\n- Brighter comments\n- New terminal palette\n"));
    }

    #[test]
    fn changelog_falls_back_to_initial_release() {
        let mut doc = doc();
        doc.metadata.changelog.clear();
        let out = render(&doc, &TemplateSet::builtin()).unwrap();
        assert!(out["CHANGELOG.md"].ends_with("## [1.2.0]\n\n- Initial release\n"));
    }

    #[test]
    fn license_uses_year_and_author() {
        let mut set = TemplateSet::builtin();
        set.globals.year = Some(2026);
        let out = render(&doc(), &set).unwrap();
        assert!(out["LICENSE"].starts_with("MIT License\n\nCopyright (c) 2026 Ada Lovelace\n"));
    }

    #[test]
    fn non_mit_license_points_to_spdx() {
        let mut doc = doc();
        doc.metadata.license = Some("Apache-2.0".into());
        let out = render(&doc, &TemplateSet::builtin()).unwrap();
        assert!(out["LICENSE"].contains("https://spdx.org/licenses/Apache-2.0.html"));
    }

    #[test]
    fn readme_lists_screenshots() {
        let mut set = TemplateSet::builtin();
        set.globals.screenshots = vec![
            Screenshot {
                path: "images/screenshot-rust.png".into(),
                caption: "Rust".into(),
            },
            Screenshot {
                path: "images/screenshot-python.png".into(),
                caption: "Python".into(),
            },
        ];
        let readme = &render(&doc(), &set).unwrap()["README.md"];
        assert!(readme.contains(
            "## Screenshots\n\n![Rust](images/screenshot-rust.png)\n![Python](images/screenshot-python.png)\n\n## Installation"
        ));
        assert!(readme.contains("`dark` · `neon`"));
    }

    #[test]
    fn render_with_overrides_set_globals() {
        let set = TemplateSet::builtin();
        let globals = Globals {
            screenshots: vec![Screenshot {
                path: "images/screenshot-go.png".into(),
                caption: "Go".into(),
            }],
            ..set.globals.clone()
        };
        let readme = &render_with(&doc(), &set, &globals).unwrap()["README.md"];
        assert!(readme.contains("![Go](images/screenshot-go.png)"));
        assert!(!render(&doc(), &set).unwrap()["README.md"].contains("## Screenshots"));
    }

    #[test]
    fn html_characters_pass_through_unescaped() {
        let mut doc = doc();
        doc.metadata.description = Some("Neon & <midnight>".into());
        let out = render(&doc, &TemplateSet::builtin()).unwrap();
        assert!(out["README.md"].contains("Neon & <midnight>"));
        let pkg: Value = serde_json::from_str(&out["package.json"]).unwrap();
        assert_eq!(pkg["description"], "Neon & <midnight>");
    }

    #[test]
    fn readme_without_screenshots_has_no_section() {
        let readme = &artifacts()["README.md"];
        assert!(readme.starts_with("# Midnight Neon\n\nNeon on midnight.\n\n## Installation"));
    }

    // ── Properties ──────────────────────────────────────────────────

    #[test]
    fn rendering_is_deterministic() {
        assert_eq!(artifacts(), artifacts());
    }

    #[test]
    fn missing_binding_names_template_and_path() {
        let set = TemplateSet::new(Globals::default())
            .with_template("NOTES.md", "# {{ display_name }}\n{{ homepage }}\n")
            .unwrap();
        let err = render(&doc(), &set).unwrap_err();
        let RenderError::Binding(err) = err else {
            panic!("expected a binding error, got {err:?}");
        };
        assert_eq!(err.template, "NOTES.md");
        assert_eq!(err.path, "homepage");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn escaping_artifact_name_is_rejected() {
        let set = TemplateSet::new(Globals::default())
            .with_template("../{{ name }}.txt", "x")
            .unwrap();
        assert!(matches!(render(&doc(), &set), Err(RenderError::ArtifactPath { .. })));
    }

    // ── from_dir ────────────────────────────────────────────────────

    #[test]
    fn from_dir_overlays_builtins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md.tmpl"), "custom {{ name }}\n").unwrap();
        std::fs::write(dir.path().join("theme.json.tmpl"), "{{ colors | json }}").unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs/COLORS.md.tmpl"), "{{ colors | length }}").unwrap();
        std::fs::write(dir.path().join("ignored.txt"), "{{ nope").unwrap();

        let set = TemplateSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 8);
        let out = render(&doc(), &set).unwrap();
        assert_eq!(out["README.md"], "custom midnight-neon\n");
        assert_eq!(out["docs/COLORS.md"], "2");
        assert!(out["themes/midnight-neon-color-theme.json"].starts_with("{\n  \"editor.background\""));
    }

    #[test]
    fn from_dir_reports_syntax_errors() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md.tmpl"), "{% if x %}").unwrap();
        let err = TemplateSet::from_dir(dir.path()).unwrap_err();
        let RenderError::Syntax(err) = err else {
            panic!("expected a syntax error, got {err:?}");
        };
        assert_eq!(err.template, "README.md");
    }

    #[test]
    fn context_exposes_derived_fields() {
        let ctx = context(&doc(), &Globals::default());
        assert_eq!(ctx["theme_file"], "midnight-neon-color-theme.json");
        assert_eq!(ctx["package_name"], "midnight-neon");
        assert_eq!(ctx["engines_version"], DEFAULT_ENGINES_VERSION);
        assert!(ctx.get("year").is_none());
    }
}
