// SPDX-License-Identifier: MIT
//
// Screenshots — previews of a built theme, taken by an external command.
//
// hueforge does not drive an editor itself. For each configured language
// it writes a code sample into the extension's `images/` directory and runs
// the capture command with placeholders filled in:
//
//   {theme}      theme name
//   {theme_dir}  extension directory
//   {language}   sample language
//   {sample}     path of the sample file
//   {output}     path the PNG must be written to
//
// The command must finish before its deadline and leave a file at
// `{output}`; anything else is a CaptureError, logged and skipped.

use std::io::Read as _;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

use hf_render::Screenshot;

use crate::config::ScreenshotConfig;
use crate::deadline::Deadline;

const IMAGES_DIR: &str = "images";
const POLL_INTERVAL: Duration = Duration::from_millis(25);
/// How long a killed command's stderr reader gets to see end-of-file.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("cannot start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} did not finish within {}s", after.as_secs_f32())]
    Timeout { program: String, after: Duration },
    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
    #[error("{program} finished but wrote no {}", path.display())]
    MissingOutput { program: String, path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("no code sample for {0:?}")]
    UnknownLanguage(String),
}

// ─── Samples ─────────────────────────────────────────────────────────────────

/// File extension and code for a preview language.
#[must_use]
pub fn code_sample(language: &str) -> Option<(&'static str, &'static str)> {
    match language {
        "python" => Some(("py", PYTHON_SAMPLE)),
        "javascript" => Some(("js", JAVASCRIPT_SAMPLE)),
        "typescript" => Some(("ts", TYPESCRIPT_SAMPLE)),
        "rust" => Some(("rs", RUST_SAMPLE)),
        "go" => Some(("go", GO_SAMPLE)),
        "java" => Some(("java", JAVA_SAMPLE)),
        _ => None,
    }
}

/// The preview language a source file's extension suggests.
#[must_use]
pub fn language_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "py" => Some("python"),
        "js" | "mjs" | "cjs" => Some("javascript"),
        "ts" => Some("typescript"),
        "rs" => Some("rust"),
        "go" => Some("go"),
        "java" => Some("java"),
        _ => None,
    }
}

const PYTHON_SAMPLE: &str = r##"#!/usr/bin/env python3
"""Example Python code for theme preview."""

from dataclasses import dataclass
from typing import Dict, List, Optional


@dataclass
class ThemePreview:
    name: str
    colors: Dict[str, str]
    _loaded: bool = False

    async def render(self, samples: List[str]) -> None:
        for index, sample in enumerate(samples):
            print(f"Rendering sample {index + 1}...")
            await self._process(sample)

    async def _process(self, sample: str) -> Optional[str]:
        # Process each code sample
        if not sample:
            return None
        return f"Processed: {sample}"


if __name__ == "__main__":
    preview = ThemePreview("ocean", {"background": "#0a1b2c"})
    print(preview.name, len(preview.colors), 42, 3.14)
"##;

const JAVASCRIPT_SAMPLE: &str = r##"// Example JavaScript code for theme preview
import { readFile } from "node:fs/promises";

const DEFAULT_COLORS = { background: "#0a1b2c", foreground: "#e0e0e0" };

export class ThemePreview {
  #loaded = false;

  constructor(name, colors = DEFAULT_COLORS) {
    this.name = name;
    this.colors = colors;
  }

  async load(path) {
    const text = await readFile(path, "utf8");
    this.colors = { ...this.colors, ...JSON.parse(text) };
    this.#loaded = true;
    return Object.keys(this.colors).length;
  }
}

const preview = new ThemePreview("ocean");
preview.load("./colors.json").then((count) => console.log(`${count} colors`), console.error);
"##;

const TYPESCRIPT_SAMPLE: &str = r##"// Example TypeScript code for theme preview
interface Palette {
  readonly background: string;
  readonly foreground: string;
  accent?: string;
}

type Kind = "dark" | "light";

export function describe(name: string, palette: Palette, kind: Kind = "dark"): string {
  const accent = palette.accent ?? palette.foreground;
  return `${name} (${kind}): ${palette.background} / ${accent}`;
}

console.log(describe("ocean", { background: "#0a1b2c", foreground: "#e0e0e0" }));
"##;

const RUST_SAMPLE: &str = r##"//! Example Rust code for theme preview.

use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(u8, u8, u8);

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

/// A named palette.
pub struct Palette<'a> {
    name: &'a str,
    colors: BTreeMap<&'a str, Rgb>,
}

impl<'a> Palette<'a> {
    pub fn new(name: &'a str) -> Self {
        Self { name, colors: BTreeMap::new() }
    }

    pub fn set(&mut self, key: &'a str, color: Rgb) -> Option<Rgb> {
        self.colors.insert(key, color)
    }
}

fn main() {
    let mut palette = Palette::new("ocean");
    palette.set("background", Rgb(0x0a, 0x1b, 0x2c));
    for (key, color) in &palette.colors {
        println!("{}.{key} = {color}", palette.name);
    }
}
"##;

const GO_SAMPLE: &str = r##"// Example Go code for theme preview
package main

import (
	"fmt"
	"sort"
)

type Palette struct {
	Name   string
	Colors map[string]string
}

func (p *Palette) Keys() []string {
	keys := make([]string, 0, len(p.Colors))
	for key := range p.Colors {
		keys = append(keys, key)
	}
	sort.Strings(keys)
	return keys
}

func main() {
	p := &Palette{Name: "ocean", Colors: map[string]string{"background": "#0a1b2c"}}
	for i, key := range p.Keys() {
		fmt.Printf("%d: %s = %s\n", i, key, p.Colors[key])
	}
}
"##;

const JAVA_SAMPLE: &str = r##"// Example Java code for theme preview
package preview;

import java.util.Map;
import java.util.TreeMap;

public final class Palette {
    private static final int MAX_COLORS = 256;
    private final String name;
    private final Map<String, String> colors = new TreeMap<>();

    public Palette(String name) {
        this.name = name;
    }

    /** Adds a color, refusing more than {@link #MAX_COLORS}. */
    public boolean put(String key, String hex) {
        if (colors.size() >= MAX_COLORS) {
            return false;
        }
        colors.put(key, hex);
        return true;
    }

    public static void main(String[] args) {
        Palette palette = new Palette("ocean");
        palette.put("background", "#0a1b2c");
        System.out.println(palette.name + " has " + palette.colors.size() + " colors");
    }
}
"##;

fn caption(language: &str) -> String {
    match language {
        "javascript" => "JavaScript".to_string(),
        "typescript" => "TypeScript".to_string(),
        other => {
            let mut chars = other.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        }
    }
}

fn relative_output(language: &str) -> String {
    format!("{IMAGES_DIR}/screenshot-{language}.png")
}

// ─── Capability ──────────────────────────────────────────────────────────────

/// Everything a capture call needs to know.
#[derive(Debug, Clone, Copy)]
pub struct CaptureRequest<'a> {
    pub theme: &'a str,
    pub theme_dir: &'a Path,
    pub language: &'a str,
    pub sample: &'a Path,
    pub output: &'a Path,
}

/// Something that can turn a code sample into a PNG of the built theme.
pub trait ScreenshotCapture: Send + Sync {
    /// Write the screenshot for `request` to `request.output` before
    /// `deadline`.
    ///
    /// # Errors
    ///
    /// Whatever kept the screenshot from being written.
    fn capture(&self, request: &CaptureRequest<'_>, deadline: Deadline) -> Result<(), CaptureError>;
}

/// Runs a configured program once per screenshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandCapture {
    program: String,
    args: Vec<String>,
}

impl CommandCapture {
    #[must_use]
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// A capture for `config.command`, or `None` while none is set.
    #[must_use]
    pub fn from_config(config: &ScreenshotConfig) -> Option<Self> {
        config
            .command
            .as_ref()
            .filter(|command| !command.trim().is_empty())
            .map(|command| Self::new(command.clone(), config.args.clone()))
    }

    fn expand(&self, request: &CaptureRequest<'_>) -> Vec<String> {
        let theme_dir = request.theme_dir.display().to_string();
        let sample = request.sample.display().to_string();
        let output = request.output.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{theme_dir}", &theme_dir)
                    .replace("{theme}", request.theme)
                    .replace("{language}", request.language)
                    .replace("{sample}", &sample)
                    .replace("{output}", &output)
            })
            .collect()
    }
}

impl ScreenshotCapture for CommandCapture {
    fn capture(&self, request: &CaptureRequest<'_>, deadline: Deadline) -> Result<(), CaptureError> {
        let timeout = deadline.remaining().ok_or_else(|| CaptureError::Timeout {
            program: self.program.clone(),
            after: Duration::ZERO,
        })?;

        let mut child = Command::new(&self.program)
            .args(self.expand(request))
            .current_dir(request.theme_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CaptureError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain stderr on the side so a chatty command cannot block on a
        // full pipe while we poll.
        let stderr = child.stderr.take();
        let drain = std::thread::spawn(move || {
            let mut text = String::new();
            if let Some(mut pipe) = stderr {
                let _ = pipe.read_to_string(&mut text);
            }
            text
        });

        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if deadline.expired() => {
                    reap(&mut child, drain);
                    return Err(CaptureError::Timeout {
                        program: self.program.clone(),
                        after: timeout,
                    });
                }
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(source) => {
                    reap(&mut child, drain);
                    return Err(CaptureError::Spawn {
                        program: self.program.clone(),
                        source,
                    });
                }
            }
        };
        let stderr = drain.join().unwrap_or_default();

        if !status.success() {
            return Err(CaptureError::Failed {
                program: self.program.clone(),
                status,
                stderr: stderr.trim().to_string(),
            });
        }
        if !request.output.is_file() {
            return Err(CaptureError::MissingOutput {
                program: self.program.clone(),
                path: request.output.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Kill and wait for `child`, then join its stderr reader. A grandchild can
/// keep the pipe open after the kill; past [`DRAIN_GRACE`] the reader is
/// left to finish on its own.
fn reap(child: &mut Child, drain: JoinHandle<String>) {
    let _ = child.kill();
    if let Err(err) = child.wait() {
        tracing::debug!(%err, "capture command could not be reaped");
    }
    let grace = Deadline::after(DRAIN_GRACE);
    while !drain.is_finished() && !grace.expired() {
        std::thread::sleep(POLL_INTERVAL);
    }
    if drain.is_finished() {
        let stderr = drain.join().unwrap_or_default();
        if !stderr.trim().is_empty() {
            tracing::debug!(stderr = %stderr.trim(), "killed capture command");
        }
    } else {
        tracing::debug!("stderr still held open after kill");
    }
}

// ─── Driving a capture ───────────────────────────────────────────────────────

/// Capture one language into `<theme_dir>/images/screenshot-<language>.png`.
///
/// # Errors
///
/// Unknown languages, I/O around the sample file, and capture failures.
pub fn capture_language(
    theme: &str,
    theme_dir: &Path,
    language: &str,
    capture: &dyn ScreenshotCapture,
    timeout: Duration,
) -> Result<Screenshot, CaptureError> {
    let (ext, code) =
        code_sample(language).ok_or_else(|| CaptureError::UnknownLanguage(language.to_string()))?;
    capture_code(theme, theme_dir, language, (ext, code), capture, timeout)
}

/// [`capture_language`] with caller-supplied code: `sample` is the file
/// extension and text to show.
///
/// # Errors
///
/// I/O around the sample file, and capture failures.
pub fn capture_code(
    theme: &str,
    theme_dir: &Path,
    language: &str,
    (ext, code): (&str, &str),
    capture: &dyn ScreenshotCapture,
    timeout: Duration,
) -> Result<Screenshot, CaptureError> {
    let images = theme_dir.join(IMAGES_DIR);
    std::fs::create_dir_all(&images).map_err(|source| CaptureError::Io {
        path: images.clone(),
        source,
    })?;
    let sample = images.join(format!("sample.{ext}"));
    std::fs::write(&sample, code).map_err(|source| CaptureError::Io {
        path: sample.clone(),
        source,
    })?;

    let relative = relative_output(language);
    let output = theme_dir.join(&relative);
    let request = CaptureRequest {
        theme,
        theme_dir,
        language,
        sample: &sample,
        output: &output,
    };
    let result = capture.capture(&request, Deadline::after(timeout));
    let _ = std::fs::remove_file(&sample);
    result?;

    Ok(Screenshot {
        path: relative,
        caption: caption(language),
    })
}

/// Capture every configured language. Failures are logged and skipped.
pub fn capture_all(
    theme: &str,
    theme_dir: &Path,
    capture: &dyn ScreenshotCapture,
    config: &ScreenshotConfig,
) -> Vec<Screenshot> {
    let mut taken = Vec::new();
    for language in &config.languages {
        match capture_language(theme, theme_dir, language, capture, config.timeout()) {
            Ok(shot) => {
                tracing::info!(theme = %theme, path = %shot.path, "captured screenshot");
                taken.push(shot);
            }
            Err(err) => tracing::warn!(theme = %theme, language = %language, %err, "screenshot skipped"),
        }
    }
    taken
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Writes a fixed byte string to the requested output.
    struct Fake;

    impl ScreenshotCapture for Fake {
        fn capture(&self, request: &CaptureRequest<'_>, _deadline: Deadline) -> Result<(), CaptureError> {
            assert!(request.sample.is_file());
            std::fs::write(request.output, b"png").map_err(|source| CaptureError::Io {
                path: request.output.to_path_buf(),
                source,
            })
        }
    }

    fn config(languages: &[&str]) -> ScreenshotConfig {
        ScreenshotConfig {
            languages: languages.iter().map(ToString::to_string).collect(),
            ..ScreenshotConfig::default()
        }
    }

    // ── samples ─────────────────────────────────────────────────────

    #[test]
    fn default_languages_have_samples() {
        for language in ScreenshotConfig::default().languages {
            assert!(code_sample(&language).is_some(), "{language}");
        }
        assert!(code_sample("cobol").is_none());
    }

    // ── capture_all ─────────────────────────────────────────────────

    #[test]
    fn extensions_map_to_languages() {
        assert_eq!(language_for_extension("RS"), Some("rust"));
        assert_eq!(language_for_extension("mjs"), Some("javascript"));
        assert_eq!(language_for_extension("cob"), None);
        for language in ["go", "java"] {
            assert!(code_sample(language).is_some(), "{language}");
        }
    }

    #[test]
    fn captured_custom_code_is_what_the_capture_sees() {
        struct Echo;
        impl ScreenshotCapture for Echo {
            fn capture(&self, request: &CaptureRequest<'_>, _deadline: Deadline) -> Result<(), CaptureError> {
                std::fs::copy(request.sample, request.output).map(drop).map_err(|source| CaptureError::Io {
                    path: request.output.to_path_buf(),
                    source,
                })
            }
        }

        let dir = tempfile::tempdir().unwrap();
        let shot = capture_code("ocean", dir.path(), "go", ("go", "package main\n"), &Echo, Duration::from_secs(5))
            .unwrap();
        assert_eq!(shot.caption, "Go");
        assert_eq!(std::fs::read_to_string(dir.path().join(&shot.path)).unwrap(), "package main\n");
        assert!(!dir.path().join("images/sample.go").exists());
    }

    #[test]
    fn capture_all_writes_images_and_removes_samples() {
        let dir = tempfile::tempdir().unwrap();
        let shots = capture_all("ocean", dir.path(), &Fake, &config(&["python", "cobol"]));

        assert_eq!(shots.len(), 1);
        assert!(dir.path().join("images/screenshot-python.png").is_file());
        assert!(!dir.path().join("images/sample.py").exists());
    }

    // ── command capture ─────────────────────────────────────────────

    #[test]
    fn from_config_needs_a_command() {
        assert!(CommandCapture::from_config(&ScreenshotConfig::default()).is_none());
        let config = ScreenshotConfig {
            command: Some("shoot".into()),
            ..ScreenshotConfig::default()
        };
        assert!(CommandCapture::from_config(&config).is_some());
    }

    #[test]
    fn placeholders_expand() {
        let capture = CommandCapture::new("shoot", vec!["--in={sample}".into(), "{theme}/{language}".into()]);
        let request = CaptureRequest {
            theme: "ocean",
            theme_dir: Path::new("/tmp/ocean"),
            language: "rust",
            sample: Path::new("/tmp/ocean/images/sample.rs"),
            output: Path::new("/tmp/ocean/images/screenshot-rust.png"),
        };
        assert_eq!(
            capture.expand(&request),
            vec!["--in=/tmp/ocean/images/sample.rs", "ocean/rust"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn command_copies_sample() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new("sh", vec!["-c".into(), "cp {sample} {output}".into()]);
        let shot = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_secs(10)).unwrap();
        assert_eq!(shot.path, "images/screenshot-rust.png");
        assert!(dir.path().join(&shot.path).is_file());
    }

    #[cfg(unix)]
    #[test]
    fn command_failure_carries_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new("sh", vec!["-c".into(), "echo boom >&2; exit 3".into()]);
        let err = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_secs(10)).unwrap_err();
        match err {
            CaptureError::Failed { stderr, .. } => assert_eq!(stderr, "boom"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn command_without_output_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new("sh", vec!["-c".into(), "true".into()]);
        let err = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, CaptureError::MissingOutput { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn slow_command_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new("sh", vec!["-c".into(), "sleep 5".into()]);
        let err = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, CaptureError::Timeout { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn timeout_returns_promptly_when_a_grandchild_holds_stderr() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new("sh", vec!["-c".into(), "sleep 5 & sleep 5".into()]);
        let started = std::time::Instant::now();
        let err = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, CaptureError::Timeout { .. }));
        assert!(started.elapsed() < Duration::from_secs(3), "took {:?}", started.elapsed());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn timed_out_command_is_reaped() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("pid");
        let capture = CommandCapture::new(
            "sh",
            vec!["-c".into(), format!("echo $$ > {}; exec sleep 5", pid_file.display())],
        );
        let err = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_millis(300)).unwrap_err();
        assert!(matches!(err, CaptureError::Timeout { .. }));

        // A reaped child leaves no zombie entry behind.
        let pid = std::fs::read_to_string(&pid_file).unwrap();
        assert!(!Path::new(&format!("/proc/{}", pid.trim())).exists());
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let capture = CommandCapture::new("hueforge-no-such-capture-tool", Vec::new());
        let err = capture_language("ocean", dir.path(), "rust", &capture, Duration::from_secs(10)).unwrap_err();
        assert!(matches!(err, CaptureError::Spawn { .. }));
    }
}
