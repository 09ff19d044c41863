// SPDX-License-Identifier: MIT
//
// hf-build — everything around the pure core that touches the outside world.
//
//   config     → hueforge.yaml, environment overrides
//   loader     → theme discovery, `extends` resolution
//   scaffold   → `create`: new theme files from starter color sets
//   check      → `validate`: validation with optional repair
//   catalog    → `list` and `clean`
//   enhance    → Enhancer capability, chat-completions client
//   icon       → procedural extension icon from theme colors
//   screenshot → ScreenshotCapture capability, capture command
//   package    → extension checks, `vsce package`
//   batch      → the build pipeline on a bounded thread pool
//
// Logging goes through `tracing`; installing a subscriber is the binary's
// job.

pub mod batch;
pub mod catalog;
pub mod check;
pub mod config;
pub mod deadline;
pub mod enhance;
pub mod error;
pub mod icon;
pub mod loader;
pub mod package;
pub mod scaffold;
pub mod screenshot;

pub use batch::{
    BatchReport, BuiltTheme, CancelToken, Pipeline, ThemeOutcome, ThemeReport, build_globals,
    run_batch,
};
pub use config::{Config, ConfigError};
pub use deadline::Deadline;
pub use enhance::{EnhanceError, Enhancer, HttpEnhancer};
pub use error::BuildError;
pub use icon::{ICON_PATH, IconError, write_icon};
pub use package::{PackageError, Packager};
pub use scaffold::{NewTheme, Starter};
pub use screenshot::{CaptureError, CommandCapture, ScreenshotCapture};
