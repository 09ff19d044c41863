// SPDX-License-Identifier: MIT
//
// Batch builds — every selected theme through the whole pipeline.
//
//   load → validate → enhance → icon → render → write → package → screenshots
//
// The README lists only screenshots that were actually captured. When any
// were, the artifacts are rendered again with that list and the extension is
// repackaged so the .vsix carries both.
//
// Themes are independent, so they run on a bounded rayon pool with no
// shared mutable state. Each one ends in a ThemeOutcome; a bad theme never
// stops its siblings. The only error `run_batch` itself returns is failing
// to start the pool.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{Datelike, Utc};
use hf_render::{Globals, Screenshot, TemplateSet, render_with};
use hf_theme::{Severity, ThemeDocument, ValidationIssue, Validated, validate};
use rayon::prelude::*;

use crate::config::Config;
use crate::enhance::{Enhancer, enhance};
use crate::error::BuildError;
use crate::icon::{ICON_PATH, write_icon};
use crate::loader::load_theme;
use crate::package::Packager;
use crate::screenshot::{self, ScreenshotCapture};

/// Subdirectories every extension gets, even when nothing lands in them.
const EXTENSION_DIRS: &[&str] = &["themes", "images", ".vscode"];

// ─── Cancellation ────────────────────────────────────────────────────────────

/// Shared stop flag, checked before each theme starts.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// A theme that made it all the way through.
#[derive(Debug)]
pub struct BuiltTheme {
    pub name: String,
    pub dir: PathBuf,
    /// Relative artifact paths, sorted.
    pub artifacts: Vec<String>,
    pub vsix: Option<PathBuf>,
    pub screenshots: Vec<Screenshot>,
    /// Non-blocking findings, including repaired ones.
    pub issues: Vec<ValidationIssue>,
    pub enhanced: bool,
}

#[derive(Debug)]
pub enum ThemeOutcome {
    Built(BuiltTheme),
    /// Validation found blocking issues; nothing was written.
    Rejected {
        name: String,
        issues: Vec<ValidationIssue>,
    },
    Failed(BuildError),
    /// Cancelled before it started.
    Skipped,
}

#[derive(Debug)]
pub struct ThemeReport {
    /// The theme file.
    pub path: PathBuf,
    pub outcome: ThemeOutcome,
}

impl ThemeReport {
    /// Theme name if it got far enough to have one, else the file stem.
    #[must_use]
    pub fn label(&self) -> String {
        match &self.outcome {
            ThemeOutcome::Built(built) => built.name.clone(),
            ThemeOutcome::Rejected { name, .. } if !name.is_empty() => name.clone(),
            _ => self
                .path
                .file_stem()
                .map_or_else(|| self.path.display().to_string(), |s| s.to_string_lossy().into_owned()),
        }
    }
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub themes: Vec<ThemeReport>,
}

impl BatchReport {
    fn count(&self, pred: impl Fn(&ThemeOutcome) -> bool) -> usize {
        self.themes.iter().filter(|t| pred(&t.outcome)).count()
    }

    #[must_use]
    pub fn built(&self) -> usize {
        self.count(|o| matches!(o, ThemeOutcome::Built(_)))
    }

    #[must_use]
    pub fn rejected(&self) -> usize {
        self.count(|o| matches!(o, ThemeOutcome::Rejected { .. }))
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ThemeOutcome::Failed(_)))
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, ThemeOutcome::Skipped))
    }

    /// Every theme was built.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.built() == self.themes.len()
    }
}

// ─── Pipeline ────────────────────────────────────────────────────────────────

/// Template globals for a build: `base` stamped with the current year.
/// Icon and screenshots are filled in per theme as they are produced.
#[must_use]
pub fn build_globals(base: &Globals) -> Globals {
    Globals {
        year: Some(Utc::now().year()),
        ..base.clone()
    }
}

/// Everything one build needs. Optional stages run only when their
/// capability is present.
#[derive(Clone, Copy)]
pub struct Pipeline<'a> {
    config: &'a Config,
    templates: &'a TemplateSet,
    enhancer: Option<&'a dyn Enhancer>,
    capture: Option<&'a dyn ScreenshotCapture>,
    packager: Option<&'a Packager>,
}

impl<'a> Pipeline<'a> {
    #[must_use]
    pub const fn new(config: &'a Config, templates: &'a TemplateSet) -> Self {
        Self {
            config,
            templates,
            enhancer: None,
            capture: None,
            packager: None,
        }
    }

    #[must_use]
    pub const fn with_enhancer(mut self, enhancer: &'a dyn Enhancer) -> Self {
        self.enhancer = Some(enhancer);
        self
    }

    #[must_use]
    pub const fn with_capture(mut self, capture: &'a dyn ScreenshotCapture) -> Self {
        self.capture = Some(capture);
        self
    }

    #[must_use]
    pub const fn with_packager(mut self, packager: &'a Packager) -> Self {
        self.packager = Some(packager);
        self
    }

    /// Build one theme file.
    pub fn build_theme(&self, path: &Path) -> ThemeOutcome {
        match self.try_build(path) {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(path = %path.display(), %err, "theme failed");
                ThemeOutcome::Failed(err)
            }
        }
    }

    fn try_build(&self, path: &Path) -> Result<ThemeOutcome, BuildError> {
        let doc = load_theme(path)?;
        let name = doc.metadata.name.clone();
        let strict = self.config.validation.strict_mode;

        let validated = validate(doc, &self.config.validation)?;
        log_issues(&name, &validated.issues);
        if validated.has_blocking(strict) {
            tracing::warn!(theme = %name, "theme rejected by validation");
            return Ok(ThemeOutcome::Rejected {
                name,
                issues: validated.issues,
            });
        }

        let (validated, enhanced) = match self.enhancer {
            Some(enhancer) => self.enhanced(validated, enhancer)?,
            None => (validated, false),
        };
        let Validated { document, issues } = validated;

        let dir = self.config.theme_output_dir(&name);
        prepare_dir(&dir)?;
        let mut globals = self.templates.globals.clone();
        if self.config.build.icon {
            match write_icon(&document, &dir.join(ICON_PATH)) {
                Ok(()) => globals.icon = Some(ICON_PATH.to_string()),
                Err(err) => tracing::warn!(theme = %name, %err, "icon skipped"),
            }
        }
        let artifacts = self.write(&document, &dir, &globals)?;
        tracing::info!(theme = %name, path = %dir.display(), artifacts = artifacts.len(), "rendered");

        let mut vsix = self.package(&name, &dir)?;

        let screenshots = self
            .capture
            .map(|capture| screenshot::capture_all(&name, &dir, capture, &self.config.screenshot))
            .unwrap_or_default();
        if !screenshots.is_empty() {
            globals.screenshots.clone_from(&screenshots);
            self.write(&document, &dir, &globals)?;
            if vsix.is_some() {
                vsix = self.package(&name, &dir)?;
            }
        }

        Ok(ThemeOutcome::Built(BuiltTheme {
            name,
            dir,
            artifacts,
            vsix,
            screenshots,
            issues,
            enhanced,
        }))
    }

    /// Enhance, then validate again so suggested colors still meet contrast.
    /// An enhancement the validator would block is dropped.
    fn enhanced(
        &self,
        validated: Validated,
        enhancer: &dyn Enhancer,
    ) -> Result<(Validated, bool), BuildError> {
        let mut candidate = validated.document.clone();
        let changes = enhance(&mut candidate, enhancer, &self.config.ai);
        if changes.is_empty() {
            return Ok((validated, false));
        }

        let name = candidate.metadata.name.clone();
        let revalidated = validate(candidate, &self.config.validation)?;
        if revalidated.has_blocking(self.config.validation.strict_mode) {
            tracing::warn!(theme = %name, "enhanced theme fails validation, keeping the original");
            return Ok((validated, false));
        }
        tracing::info!(
            theme = %name,
            description = changes.description,
            colors = changes.colors.len(),
            "enhanced"
        );
        Ok((revalidated, true))
    }

    fn package(&self, name: &str, dir: &Path) -> Result<Option<PathBuf>, BuildError> {
        let Some(packager) = self.packager else {
            return Ok(None);
        };
        let vsix = packager.package(dir, None)?;
        tracing::info!(theme = %name, path = %vsix.display(), "packaged");
        Ok(Some(vsix))
    }

    /// Render with `globals` into `dir`. Returns the artifact names written.
    fn write(&self, doc: &ThemeDocument, dir: &Path, globals: &Globals) -> Result<Vec<String>, BuildError> {
        let rendered = render_with(doc, self.templates, globals)?;
        for (name, body) in &rendered {
            let path = dir.join(name);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
            }
            std::fs::write(&path, body).map_err(BuildError::io(&path))?;
            tracing::debug!(path = %path.display(), "wrote artifact");
        }
        Ok(rendered.into_keys().collect())
    }
}

/// Empty `dir` and lay out the extension subdirectories.
fn prepare_dir(dir: &Path) -> Result<(), BuildError> {
    if dir.exists() {
        std::fs::remove_dir_all(dir).map_err(BuildError::io(dir))?;
    }
    for sub in EXTENSION_DIRS {
        let path = dir.join(sub);
        std::fs::create_dir_all(&path).map_err(BuildError::io(&path))?;
    }
    Ok(())
}

fn log_issues(theme: &str, issues: &[ValidationIssue]) {
    for issue in issues {
        match (issue.severity, issue.resolved) {
            (Severity::Error, false) => tracing::error!(theme = %theme, "{issue}"),
            (Severity::Warning, false) => tracing::warn!(theme = %theme, "{issue}"),
            (_, true) => tracing::info!(theme = %theme, "{issue}"),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

/// Build every theme in `paths` on a pool of `build.workers` threads.
///
/// # Errors
///
/// Only when the thread pool cannot be created.
pub fn run_batch(
    paths: &[PathBuf],
    pipeline: &Pipeline<'_>,
    cancel: &CancelToken,
) -> Result<BatchReport, BuildError> {
    let workers = pipeline.config.build.workers.unwrap_or_else(default_workers);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("hueforge-build-{i}"))
        .build()?;
    tracing::debug!(workers, themes = paths.len(), "starting batch");

    let themes = pool.install(|| {
        paths
            .par_iter()
            .map(|path| {
                let outcome = if cancel.is_cancelled() {
                    tracing::info!(path = %path.display(), "skipped (cancelled)");
                    ThemeOutcome::Skipped
                } else {
                    pipeline.build_theme(path)
                };
                ThemeReport {
                    path: path.clone(),
                    outcome,
                }
            })
            .collect()
    });
    Ok(BatchReport { themes })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
