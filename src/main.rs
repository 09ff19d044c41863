// SPDX-License-Identifier: MIT
//
// hueforge — build VS Code color themes from YAML.
//
// This is the binary that wires the crates together:
//
//   hf-color  → colors, contrast, lightness correction
//   hf-theme  → theme documents, merging, validation
//   hf-render → templates and extension artifacts
//   hf-build  → config, discovery, enhancement, icons, screenshots, packaging
//
// Each subcommand loads the config once, builds what it needs from it, and
// reports on stdout. Diagnostics go through tracing on stderr.
//
// Exit codes:
//
//   0  everything succeeded
//   1  a theme was rejected by validation or failed to build
//   2  the command itself could not run

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

use hf_build::catalog::{self, CleanScope, ThemeEntry};
use hf_build::check::{CheckReport, check_themes};
use hf_build::screenshot::{self, capture_code, capture_language, code_sample};
use hf_build::{
    BatchReport, CancelToken, CommandCapture, Config, HttpEnhancer, ICON_PATH, NewTheme, Packager,
    Pipeline, Starter, ThemeOutcome, build_globals, loader, run_batch, scaffold, write_icon,
};
use hf_render::TemplateSet;
use hf_theme::ValidationIssue;

// ─── Command line ───────────────────────────────────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "hueforge", version, about = "Build, validate, and package VS Code color themes")]
struct Cli {
    /// Config file (default: ./hueforge.yaml when present).
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log debug detail.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Log errors only.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build one theme, or every theme, into extensions.
    Build(BuildArgs),
    /// Start a new theme file.
    Create(CreateArgs),
    /// Create a theme and build it straight away, without AI enhancement.
    Quickstart(QuickstartArgs),
    /// Capture screenshots of an already-built extension.
    Screenshot(ScreenshotArgs),
    /// Draw the extension icon from a theme's colors.
    Icon {
        theme: String,
        /// Where to write the PNG (default: the extension's images/icon.png).
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Validate themes without building them.
    Validate {
        /// Theme name (default: all).
        theme: Option<String>,
        /// Repair what can be repaired and rewrite the files.
        #[arg(long)]
        fix: bool,
    },
    /// Package an already-built extension into a .vsix.
    Package {
        theme: String,
        /// Where to write the .vsix.
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// List themes.
    List {
        /// Show display name, version, author, and description.
        #[arg(long)]
        detailed: bool,
    },
    /// Remove build output.
    Clean {
        /// Remove the whole output directory, packaged .vsix files included.
        #[arg(long, conflicts_with_all = ["build_only", "screenshots_only"])]
        all: bool,
        /// Remove extension directories only (the default).
        #[arg(long, conflicts_with = "screenshots_only")]
        build_only: bool,
        /// Remove captured screenshots only.
        #[arg(long)]
        screenshots_only: bool,
    },
}

#[derive(Debug, Args)]
struct BuildArgs {
    /// Theme name (default: all).
    theme: Option<String>,
    /// Skip AI enhancement.
    #[arg(long)]
    no_ai: bool,
    /// Skip screenshots.
    #[arg(long)]
    no_screenshots: bool,
    /// Skip packaging.
    #[arg(long)]
    no_package: bool,
    /// Skip the generated icon.
    #[arg(long)]
    no_icon: bool,
    /// Output directory (overrides paths.output).
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CreateArgs {
    name: String,
    /// Starting color set: minimal, default, or full.
    #[arg(long, default_value_t = Starter::Default)]
    template: Starter,
    #[arg(long)]
    display_name: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

#[derive(Debug, Args)]
struct QuickstartArgs {
    #[command(flatten)]
    theme: CreateArgs,
    /// Replace an existing theme of the same name.
    #[arg(long)]
    force: bool,
    /// Skip screenshots.
    #[arg(long)]
    no_screenshots: bool,
    /// Skip packaging.
    #[arg(long)]
    no_package: bool,
    /// Skip the generated icon.
    #[arg(long)]
    no_icon: bool,
}

#[derive(Debug, Args)]
struct ScreenshotArgs {
    theme: String,
    /// Language to capture; repeatable (default: screenshot.languages).
    #[arg(short, long = "language", value_name = "LANG")]
    languages: Vec<String>,
    /// Show this file instead of the builtin sample.
    #[arg(long, value_name = "FILE")]
    code_file: Option<PathBuf>,
}

// ─── Logging ────────────────────────────────────────────────────────────────

/// `RUST_LOG` wins; otherwise the flags pick the level.
fn install_tracing(verbose: bool, quiet: bool) {
    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

// ─── Commands ───────────────────────────────────────────────────────────────

/// Whether every theme the command touched came out clean.
type Passed = bool;

fn run(cli: Cli) -> Result<Passed> {
    let config = Config::load(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Build(args) => build(config, &args),
        Command::Create(args) => create(&config, args, false),
        Command::Quickstart(args) => quickstart(config, args),
        Command::Screenshot(args) => screenshots(&config, &args),
        Command::Icon { theme, output } => icon(&config, &theme, output),
        Command::Validate { theme, fix } => validate(&config, theme.as_deref(), fix),
        Command::Package { theme, output } => package(&config, &theme, output),
        Command::List { detailed } => list(&config, detailed),
        Command::Clean {
            all,
            screenshots_only,
            ..
        } => {
            let scope = if all {
                CleanScope::All
            } else if screenshots_only {
                CleanScope::Screenshots
            } else {
                CleanScope::Extensions
            };
            clean(&config, scope)
        }
    }
}

fn build(mut config: Config, args: &BuildArgs) -> Result<Passed> {
    if let Some(output) = &args.output {
        config.paths.output.clone_from(output);
    }

    let paths = loader::select(&config.paths.themes, args.theme.as_deref())?;
    if paths.is_empty() {
        tracing::warn!(path = %config.paths.themes.display(), "no themes found");
        return Ok(true);
    }

    let enhancer = if config.build.ai && !args.no_ai {
        let key = std::env::var(&config.ai.api_key_env).ok();
        let client = HttpEnhancer::from_config(&config.ai, key);
        if client.is_none() {
            tracing::info!("AI enhancement off: ai.endpoint is not set");
        }
        client
    } else {
        None
    };

    let capture = if config.build.screenshots && !args.no_screenshots {
        let capture = CommandCapture::from_config(&config.screenshot);
        if capture.is_none() {
            tracing::info!("screenshots off: screenshot.command is not set");
        }
        capture
    } else {
        None
    };

    let packager = if config.build.package && !args.no_package {
        Some(
            Packager::locate(&config.package)
                .context("packaging is enabled; install vsce or pass --no-package")?,
        )
    } else {
        None
    };

    if args.no_icon {
        config.build.icon = false;
    }

    let mut templates = match &config.paths.templates {
        Some(dir) => TemplateSet::from_dir(dir)
            .with_context(|| format!("loading templates from {}", dir.display()))?,
        None => TemplateSet::builtin(),
    };
    templates.globals = build_globals(&templates.globals);

    let mut pipeline = Pipeline::new(&config, &templates);
    if let Some(enhancer) = &enhancer {
        pipeline = pipeline.with_enhancer(enhancer);
    }
    if let Some(capture) = &capture {
        pipeline = pipeline.with_capture(capture);
    }
    if let Some(packager) = &packager {
        pipeline = pipeline.with_packager(packager);
    }

    let report = run_batch(&paths, &pipeline, &CancelToken::new())?;
    print_batch(&report);
    Ok(report.is_success())
}

fn print_batch(report: &BatchReport) {
    for theme in &report.themes {
        let label = theme.label();
        match &theme.outcome {
            ThemeOutcome::Built(built) => {
                print!("✓ {label} → {}", built.dir.display());
                if let Some(vsix) = &built.vsix {
                    print!(" ({})", vsix.display());
                }
                println!();
                print_issues(&built.issues);
            }
            ThemeOutcome::Rejected { issues, .. } => {
                println!("✗ {label}: rejected");
                print_issues(issues);
            }
            ThemeOutcome::Failed(err) => println!("✗ {label}: {err}"),
            ThemeOutcome::Skipped => println!("- {label}: skipped"),
        }
    }
    println!(
        "\n{} built, {} rejected, {} failed, {} skipped",
        report.built(),
        report.rejected(),
        report.failed(),
        report.skipped()
    );
}

fn print_issues(issues: &[ValidationIssue]) {
    for issue in issues {
        println!("    {issue}");
    }
}

fn create(config: &Config, args: CreateArgs, force: bool) -> Result<Passed> {
    let request = NewTheme {
        name: args.name,
        starter: args.template,
        display_name: args.display_name,
        description: args.description,
        force,
    };
    let path = scaffold::create_theme(&config.paths.themes, &request)?;
    println!("Created {}", path.display());
    Ok(true)
}

fn quickstart(config: Config, args: QuickstartArgs) -> Result<Passed> {
    let build_args = BuildArgs {
        theme: Some(args.theme.name.clone()),
        no_ai: true,
        no_screenshots: args.no_screenshots,
        no_package: args.no_package,
        no_icon: args.no_icon,
        output: None,
    };
    create(&config, args.theme, args.force)?;
    build(config, &build_args)
}

/// The built extension directory for `theme`, or an error naming the fix.
fn built_dir(config: &Config, theme: &str) -> Result<PathBuf> {
    let dir = config.theme_output_dir(theme);
    if !dir.is_dir() {
        bail!(
            "no built extension at {} (run `hueforge build {theme}` first)",
            dir.display()
        );
    }
    Ok(dir)
}

fn screenshots(config: &Config, args: &ScreenshotArgs) -> Result<Passed> {
    let dir = built_dir(config, &args.theme)?;
    let capture = CommandCapture::from_config(&config.screenshot)
        .ok_or_else(|| anyhow!("screenshot.command is not set in the configuration"))?;
    let timeout = config.screenshot.timeout();

    let shots = match &args.code_file {
        Some(file) => {
            let code = std::fs::read_to_string(file)
                .with_context(|| format!("reading {}", file.display()))?;
            let ext = file.extension().and_then(|e| e.to_str()).unwrap_or("txt");
            let language = match args.languages.as_slice() {
                [] => screenshot::language_for_extension(ext)
                    .map(str::to_string)
                    .ok_or_else(|| anyhow!("cannot tell the language of {}; pass --language", file.display()))?,
                [language] => language.clone(),
                _ => bail!("--code-file takes a single --language"),
            };
            vec![capture_code(&args.theme, &dir, &language, (ext, code.as_str()), &capture, timeout)?]
        }
        None => {
            let languages = if args.languages.is_empty() {
                &config.screenshot.languages
            } else {
                &args.languages
            };
            if let Some(unknown) = languages.iter().find(|l| code_sample(l).is_none()) {
                bail!("no code sample for {unknown:?}; use --code-file");
            }
            let mut shots = Vec::new();
            for language in languages {
                match capture_language(&args.theme, &dir, language, &capture, timeout) {
                    Ok(shot) => shots.push(shot),
                    Err(err) => tracing::warn!(theme = %args.theme, %language, %err, "screenshot skipped"),
                }
            }
            shots
        }
    };

    for shot in &shots {
        println!("Captured {}", dir.join(&shot.path).display());
    }
    Ok(!shots.is_empty())
}

fn icon(config: &Config, theme: &str, output: Option<PathBuf>) -> Result<Passed> {
    let path = loader::find_theme(&config.paths.themes, theme)
        .ok_or_else(|| anyhow!("no theme named {theme:?} in {}", config.paths.themes.display()))?;
    let doc = loader::load_theme(&path)?;
    let target = output.unwrap_or_else(|| config.theme_output_dir(theme).join(ICON_PATH));
    write_icon(&doc, &target).with_context(|| format!("writing {}", target.display()))?;
    println!("Icon {}", target.display());
    Ok(true)
}

fn validate(config: &Config, theme: Option<&str>, fix: bool) -> Result<Passed> {
    let paths = loader::select(&config.paths.themes, theme)?;
    let strict = config.validation.strict_mode;
    let reports = check_themes(&paths, &config.validation, fix);

    for report in &reports {
        print_check(report, strict);
    }
    let passed = reports.iter().filter(|r| r.passed(strict)).count();
    println!("\n{passed} of {} passed", reports.len());
    Ok(passed == reports.len())
}

fn print_check(report: &CheckReport, strict: bool) {
    let name = report
        .path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mark = if report.passed(strict) { '✓' } else { '✗' };
    match &report.result {
        Ok(validated) => {
            let rewritten = if report.rewritten { " (rewritten)" } else { "" };
            println!("{mark} {name}{rewritten}");
            print_issues(&validated.issues);
        }
        Err(err) => println!("{mark} {name}: {err}"),
    }
}

fn package(config: &Config, theme: &str, output: Option<PathBuf>) -> Result<Passed> {
    let dir = built_dir(config, theme)?;
    let packager = Packager::locate(&config.package)?;
    let vsix = packager
        .package(&dir, output.as_deref())
        .with_context(|| format!("packaging {}", dir.display()))?;
    println!("Packaged {}", vsix.display());
    Ok(true)
}

fn list(config: &Config, detailed: bool) -> Result<Passed> {
    let entries = catalog::list_themes(&config.paths.themes, detailed)?;
    if entries.is_empty() {
        println!("No themes in {}", config.paths.themes.display());
        return Ok(true);
    }
    for line in format_list(&entries) {
        println!("{line}");
    }
    Ok(true)
}

/// Pad `text` with spaces to `width` terminal columns.
fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{text}{}", " ".repeat(fill))
}

fn format_list(entries: &[ThemeEntry]) -> Vec<String> {
    let name_width = entries.iter().map(|e| e.name.width()).max().unwrap_or(0);
    let title_width = entries
        .iter()
        .filter_map(|e| e.details.as_ref())
        .map(|d| d.display_name.width())
        .max()
        .unwrap_or(0);

    let mut lines = Vec::new();
    for entry in entries {
        match &entry.details {
            Some(details) => {
                let mut line = format!(
                    "{}  {}  {}",
                    pad(&entry.name, name_width),
                    pad(&details.display_name, title_width),
                    details.version
                );
                if !details.author.is_empty() {
                    line.push_str(&format!("  by {}", details.author));
                }
                lines.push(line.trim_end().to_string());
                if !details.description.is_empty() {
                    lines.push(format!("{}  {}", " ".repeat(name_width), details.description));
                }
            }
            None => lines.push(format!(
                "{}  {}",
                pad(&entry.name, name_width),
                entry.path.display()
            )),
        }
    }
    lines
}

fn clean(config: &Config, scope: CleanScope) -> Result<Passed> {
    let removed = catalog::clean(&config.paths.output, scope)?;
    if removed.is_empty() {
        println!("Nothing to clean");
    }
    for path in removed {
        println!("Removed {}", path.display());
    }
    Ok(true)
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn main() -> ExitCode {
    let cli = Cli::parse();
    install_tracing(cli.verbose, cli.quiet);

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("hueforge: {err:#}");
            ExitCode::from(2)
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────
