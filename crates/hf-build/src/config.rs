// SPDX-License-Identifier: MIT
//
// Build configuration — `hueforge.yaml`.
//
// Every section and every field is optional; a missing file is the same as
// an empty one. Two environment variables override the directory layout
// after the file is read:
//
//   HUEFORGE_THEMES → paths.themes
//   HUEFORGE_OUTPUT → paths.output
//
// The config is loaded once by the binary and handed down by reference.
// Nothing in the pipeline reads the environment on its own.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hf_theme::{InvalidConfiguration, ValidationConfig};
use serde::Deserialize;

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "hueforge.yaml";

pub const THEMES_ENV: &str = "HUEFORGE_THEMES";
pub const OUTPUT_ENV: &str = "HUEFORGE_OUTPUT";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid validation settings: {0}")]
    Validation(#[from] InvalidConfiguration),
    #[error("build.workers must be at least 1")]
    NoWorkers,
    #[error("{section}.timeout_secs must be at least 1")]
    NoTimeout { section: &'static str },
}

// ─── Sections ────────────────────────────────────────────────────────────────

/// Where themes are read from and extensions are written to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub themes: PathBuf,
    pub output: PathBuf,
    /// Directory of `*.tmpl` files layered over the builtin templates.
    pub templates: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            themes: PathBuf::from("themes"),
            output: PathBuf::from("build"),
            templates: None,
        }
    }
}

/// Which optional stages a build runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub ai: bool,
    /// Draw `images/icon.png` from the theme colors.
    pub icon: bool,
    pub screenshots: bool,
    pub package: bool,
    /// Size of the batch thread pool. `None` uses the available parallelism.
    pub workers: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            ai: true,
            icon: true,
            screenshots: true,
            package: true,
            workers: None,
        }
    }
}

/// The chat-completions service used to polish descriptions and colors.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// OpenAI-compatible base URL. Enhancement is off while this is unset.
    pub endpoint: Option<String>,
    pub model: String,
    /// Environment variable holding the bearer token.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Extra attempts after the first failed request.
    pub retries: u32,
    pub enhance_description: bool,
    pub optimize_colors: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 30,
            retries: 1,
            enhance_description: true,
            optimize_colors: true,
        }
    }
}

impl AiConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// External screenshot command. Capture is off while `command` is unset.
///
/// `args` may use the placeholders `{theme}`, `{theme_dir}`, `{language}`,
/// `{sample}` and `{output}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScreenshotConfig {
    pub command: Option<String>,
    pub args: Vec<String>,
    pub languages: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            command: None,
            args: Vec::new(),
            languages: ["python", "javascript", "rust"].map(String::from).to_vec(),
            timeout_secs: 60,
        }
    }
}

impl ScreenshotConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PackageConfig {
    /// Program name or path of the packager.
    pub tool: String,
    /// Extra arguments appended after `package --out <file>`.
    pub args: Vec<String>,
}

impl Default for PackageConfig {
    fn default() -> Self {
        Self {
            tool: "vsce".to_string(),
            args: Vec::new(),
        }
    }
}

// ─── Config ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub validation: ValidationConfig,
    pub build: BuildConfig,
    pub ai: AiConfig,
    pub screenshot: ScreenshotConfig,
    pub package: PackageConfig,
}

impl Config {
    /// Load the build configuration.
    ///
    /// With an explicit `path` the file must exist. Without one,
    /// [`DEFAULT_CONFIG_FILE`] is used if present and defaults otherwise.
    /// Environment overrides are applied before the result is checked.
    ///
    /// # Errors
    ///
    /// Unreadable or malformed files, and settings that cannot work.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    tracing::debug!("no {DEFAULT_CONFIG_FILE}, using defaults");
                    Self::default()
                }
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.check()?;
        Ok(config)
    }

    /// Read one YAML file. An empty file yields the defaults.
    ///
    /// # Errors
    ///
    /// I/O failures and YAML that does not fit the schema.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// # Errors
    ///
    /// YAML that does not fit the schema.
    pub fn from_yaml_str(text: &str) -> Result<Self, serde_yaml::Error> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Apply `HUEFORGE_THEMES` / `HUEFORGE_OUTPUT` as seen through `lookup`.
    /// Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(themes) = lookup(THEMES_ENV).filter(|v| !v.is_empty()) {
            self.paths.themes = PathBuf::from(themes);
        }
        if let Some(output) = lookup(OUTPUT_ENV).filter(|v| !v.is_empty()) {
            self.paths.output = PathBuf::from(output);
        }
    }

    /// Reject settings that would make a build misbehave.
    ///
    /// # Errors
    ///
    /// Invalid validation knobs, zero workers, or zero timeouts.
    pub fn check(&self) -> Result<(), ConfigError> {
        self.validation.check()?;
        if self.build.workers == Some(0) {
            return Err(ConfigError::NoWorkers);
        }
        if self.ai.timeout_secs == 0 {
            return Err(ConfigError::NoTimeout { section: "ai" });
        }
        if self.screenshot.timeout_secs == 0 {
            return Err(ConfigError::NoTimeout { section: "screenshot" });
        }
        Ok(())
    }

    /// Extension directory for a theme.
    #[must_use]
    pub fn theme_output_dir(&self, name: &str) -> PathBuf {
        self.paths.output.join(name)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
