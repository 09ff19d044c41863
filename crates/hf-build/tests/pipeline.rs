// SPDX-License-Identifier: MIT
//
// End-to-end batch builds in a scratch directory, with stub enhancer and
// screenshot capabilities and packaging left off.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use hf_build::screenshot::CaptureRequest;
use hf_build::{
    CancelToken, CaptureError, Config, Deadline, EnhanceError, Enhancer, Pipeline,
    ScreenshotCapture, ThemeOutcome, build_globals, loader, run_batch,
};
use hf_render::TemplateSet;
use pretty_assertions::assert_eq;
use serde_json::Value;

const OCEAN: &str = r##"
theme:
  name: ocean
  display_name: Ocean
  description: Deep blue.
  version: 1.0.0
  license: MIT
  author: { name: Ada, email: ada@example.com }
  keywords: [blue, dark]
  colors:
    editor.background: "#0a1b2c"
    editor.foreground: "#0b1c2d"
    activityBar.background: "#0a1b2c"
    activityBar.foreground: "#ffffff"
    sideBar.background: "#0a1b2c"
    sideBar.foreground: "#cccccc"
    statusBar.background: "#005a9e"
    statusBar.foreground: "#ffffff"
  token_colors:
    - name: Comment
      scope: comment
      settings: { foreground: "#6a9955", fontStyle: italic }
"##;

const OCEAN_LIGHT: &str = r##"
theme:
  extends: ocean
  name: ocean-light
  display_name: Ocean Light
  type: light
  colors:
    editor.background: "#f5f9fc"
    editor.foreground: "#0a1b2c"
"##;

const NAMELESS: &str = "theme:\n  display_name: Nameless\n  version: 1.0.0\n";

struct Workspace {
    _dir: tempfile::TempDir,
    config: Config,
}

impl Workspace {
    fn new(themes: &[(&str, &str)]) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let themes_dir = dir.path().join("themes");
        std::fs::create_dir_all(&themes_dir).unwrap();
        for (file, text) in themes {
            std::fs::write(themes_dir.join(file), text).unwrap();
        }
        let mut config = Config::default();
        config.paths.themes = themes_dir;
        config.paths.output = dir.path().join("build");
        config.build.workers = Some(2);
        Self { _dir: dir, config }
    }

    fn paths(&self) -> Vec<PathBuf> {
        loader::discover(&self.config.paths.themes).unwrap()
    }

    fn out(&self, rel: &str) -> PathBuf {
        self.config.paths.output.join(rel)
    }
}

fn read_json(path: &Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

/// Rewrites every description and proposes one color change.
struct StubEnhancer {
    calls: AtomicUsize,
}

impl Enhancer for StubEnhancer {
    fn complete(&self, prompt: &str, _deadline: Deadline) -> Result<String, EnhanceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if prompt.contains("Current colors:") {
            Ok("sideBar.foreground: #dddddd\nunknown.key: #123456".into())
        } else {
            Ok("\"A calm, deep-sea palette for long nights.\"".into())
        }
    }
}

/// Writes a placeholder PNG.
struct StubCapture;

impl ScreenshotCapture for StubCapture {
    fn capture(&self, request: &CaptureRequest<'_>, _deadline: Deadline) -> Result<(), CaptureError> {
        std::fs::write(request.output, b"\x89PNG").map_err(|source| CaptureError::Io {
            path: request.output.to_path_buf(),
            source,
        })
    }
}

// ── batch ─────────────────────────────────────────────────────────────

#[test]
fn mixed_batch_builds_good_themes_and_rejects_bad_ones() {
    let ws = Workspace::new(&[
        ("ocean.yaml", OCEAN),
        ("ocean-light.yaml", OCEAN_LIGHT),
        ("nameless.yaml", NAMELESS),
    ]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates);

    let report = run_batch(&ws.paths(), &pipeline, &CancelToken::new()).unwrap();

    assert_eq!(report.themes.len(), 3);
    assert_eq!(report.built(), 2);
    assert_eq!(report.rejected(), 1);
    assert_eq!(report.failed(), 0);
    assert!(!report.is_success());

    let rejected = report
        .themes
        .iter()
        .find(|t| matches!(t.outcome, ThemeOutcome::Rejected { .. }))
        .unwrap();
    assert_eq!(rejected.label(), "nameless");
    assert!(!ws.out("nameless").exists());
}

#[test]
fn built_extension_is_complete() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates);
    let report = run_batch(&ws.paths(), &pipeline, &CancelToken::new()).unwrap();
    assert!(report.is_success());

    for file in [
        "package.json",
        "README.md",
        "CHANGELOG.md",
        "LICENSE",
        "vsc-extension-quickstart.md",
        ".vscode/launch.json",
        "themes/ocean-color-theme.json",
    ] {
        assert!(ws.out("ocean").join(file).is_file(), "{file}");
    }

    let package = read_json(&ws.out("ocean/package.json"));
    assert_eq!(package["name"], "ocean");
    assert_eq!(package["contributes"]["themes"][0]["uiTheme"], "vs-dark");

    // editor.foreground was too dark on its background and got auto-fixed.
    let theme = read_json(&ws.out("ocean/themes/ocean-color-theme.json"));
    assert_ne!(theme["colors"]["editor.foreground"], "#0b1c2d");
    assert_eq!(theme["tokenColors"][0]["scope"][0], "comment");
}

#[test]
fn variant_builds_as_light_theme() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN), ("ocean-light.yaml", OCEAN_LIGHT)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates);
    let path = loader::find_theme(&ws.config.paths.themes, "ocean-light").unwrap();

    let ThemeOutcome::Built(built) = pipeline.build_theme(&path) else {
        panic!("variant should build");
    };
    assert_eq!(built.name, "ocean-light");

    let package = read_json(&ws.out("ocean-light/package.json"));
    assert_eq!(package["contributes"]["themes"][0]["uiTheme"], "vs");
    let theme = read_json(&ws.out("ocean-light/themes/ocean-light-color-theme.json"));
    assert_eq!(theme["type"], "light");
    assert_eq!(theme["colors"]["sideBar.foreground"], "#cccccc");
}

#[test]
fn strict_mode_rejects_on_warnings() {
    let mut ws = Workspace::new(&[("ocean.yaml", &OCEAN.replace("1.0.0", "1.0"))]);
    ws.config.validation.strict_mode = true;
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates);

    let report = run_batch(&ws.paths(), &pipeline, &CancelToken::new()).unwrap();
    assert_eq!(report.rejected(), 1);
}

#[test]
fn output_is_deterministic_across_runs() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates);
    let path = ws.paths().remove(0);

    pipeline.build_theme(&path);
    let first = std::fs::read_to_string(ws.out("ocean/themes/ocean-color-theme.json")).unwrap();
    pipeline.build_theme(&path);
    let second = std::fs::read_to_string(ws.out("ocean/themes/ocean-color-theme.json")).unwrap();
    assert_eq!(first, second);
}

// ── capabilities ──────────────────────────────────────────────────────

#[test]
fn enhancer_and_capture_run_when_present() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let mut templates = TemplateSet::builtin();
    templates.globals = build_globals(&templates.globals);
    let enhancer = StubEnhancer {
        calls: AtomicUsize::new(0),
    };
    let pipeline = Pipeline::new(&ws.config, &templates)
        .with_enhancer(&enhancer)
        .with_capture(&StubCapture);

    let ThemeOutcome::Built(built) = pipeline.build_theme(&ws.paths()[0]) else {
        panic!("expected a build");
    };
    assert!(built.enhanced);
    assert_eq!(enhancer.calls.load(Ordering::SeqCst), 2);
    assert_eq!(built.screenshots.len(), 3);
    assert!(ws.out("ocean/images/screenshot-rust.png").is_file());

    let package = read_json(&ws.out("ocean/package.json"));
    assert_eq!(package["description"], "A calm, deep-sea palette for long nights.");
    let theme = read_json(&ws.out("ocean/themes/ocean-color-theme.json"));
    assert_eq!(theme["colors"]["sideBar.foreground"], "#dddddd");
    assert!(theme["colors"].get("unknown.key").is_none());

    let readme = std::fs::read_to_string(ws.out("ocean/README.md")).unwrap();
    assert!(readme.contains("images/screenshot-rust.png"));
}

/// Refuses every language but one.
struct OnlyRust;

impl ScreenshotCapture for OnlyRust {
    fn capture(&self, request: &CaptureRequest<'_>, deadline: Deadline) -> Result<(), CaptureError> {
        if request.language == "rust" {
            StubCapture.capture(request, deadline)
        } else {
            Err(CaptureError::MissingOutput {
                program: "stub".into(),
                path: request.output.to_path_buf(),
            })
        }
    }
}

/// Refuses everything.
struct Broken;

impl ScreenshotCapture for Broken {
    fn capture(&self, request: &CaptureRequest<'_>, _deadline: Deadline) -> Result<(), CaptureError> {
        Err(CaptureError::MissingOutput {
            program: "stub".into(),
            path: request.output.to_path_buf(),
        })
    }
}

#[test]
fn failed_captures_leave_no_screenshot_links() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates).with_capture(&Broken);

    let ThemeOutcome::Built(built) = pipeline.build_theme(&ws.paths()[0]) else {
        panic!("a failed capture must not fail the build");
    };
    assert!(built.screenshots.is_empty());
    let readme = std::fs::read_to_string(ws.out("ocean/README.md")).unwrap();
    assert!(!readme.contains("images/screenshot-"), "{readme}");
    assert!(!readme.contains("## Screenshots"));
}

#[test]
fn readme_lists_only_captured_screenshots() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates).with_capture(&OnlyRust);

    let ThemeOutcome::Built(built) = pipeline.build_theme(&ws.paths()[0]) else {
        panic!("expected a build");
    };
    assert_eq!(built.screenshots.len(), 1);
    let readme = std::fs::read_to_string(ws.out("ocean/README.md")).unwrap();
    assert!(readme.contains("![Rust](images/screenshot-rust.png)"));
    assert!(!readme.contains("images/screenshot-python.png"));
    for shot in &built.screenshots {
        assert!(ws.out("ocean").join(&shot.path).is_file(), "{}", shot.path);
    }
}

#[test]
fn built_extension_has_an_icon() {
    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates);
    let report = run_batch(&ws.paths(), &pipeline, &CancelToken::new()).unwrap();
    assert!(report.is_success());

    let package = read_json(&ws.out("ocean/package.json"));
    assert_eq!(package["icon"], "images/icon.png");
    let icon = std::fs::read(ws.out("ocean/images/icon.png")).unwrap();
    assert!(icon.starts_with(b"\x89PNG"));
}

#[test]
fn failing_enhancer_does_not_fail_the_build() {
    struct Down;
    impl Enhancer for Down {
        fn complete(&self, _: &str, _: Deadline) -> Result<String, EnhanceError> {
            Err(EnhanceError::Transport("connection refused".into()))
        }
    }

    let ws = Workspace::new(&[("ocean.yaml", OCEAN)]);
    let templates = TemplateSet::builtin();
    let pipeline = Pipeline::new(&ws.config, &templates).with_enhancer(&Down);

    let ThemeOutcome::Built(built) = pipeline.build_theme(&ws.paths()[0]) else {
        panic!("expected a build");
    };
    assert!(!built.enhanced);
    let package = read_json(&ws.out("ocean/package.json"));
    assert_eq!(package["description"], "Deep blue.");
}
