//! Command-line interface for vsix-fetch.
//!
//! ```bash
//! # Download an extension and everything it depends on into ./vsix
//! vsix-fetch ms-python.python --output ./vsix
//!
//! # Same, from a marketplace URL, for another platform
//! vsix-fetch "https://marketplace.visualstudio.com/items?itemName=golang.go" --platform darwin-arm64
//!
//! # Only the extension itself, then install it
//! vsix-fetch rust-lang.rust-analyzer --no-deps --install
//!
//! # Show what would be downloaded
//! vsix-fetch ms-vscode-remote.vscode-remote-extensionpack --tree
//! ```
//!
//! Packages are named `<position>-<publisher>-<id>-<version>.vsix`, so
//! installing them in file name order installs dependencies first.

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::constants::NO_PROGRESS_ENV;
use crate::core::VsixError;
use crate::marketplace::{HttpMarketplace, build_client};
use crate::models::ExtensionRef;
use crate::pipeline::{CodeCliInstaller, Installer, Pipeline, PipelineOptions, RunSummary};
use crate::utils::platform::detect_target_platform;

/// Download VS Code marketplace extensions with their dependencies.
#[derive(Parser, Debug)]
#[command(
    name = "vsix-fetch",
    about = "Download VS Code marketplace extensions with their dependencies",
    version,
    long_about = "Resolves an extension's extensionDependencies transitively, then downloads every \
                  .vsix package for the target platform, numbered in install order."
)]
pub struct Cli {
    /// Extension to fetch: `publisher.id` or a marketplace item URL.
    ///
    /// Prompted for on stdin when omitted.
    extension: Option<String>,

    /// Target platform (e.g. `linux-x64`, `darwin-arm64`, `win32-x64`).
    ///
    /// Defaults to the configured platform, then to the running host.
    #[arg(short, long)]
    platform: Option<String>,

    /// Directory receiving the packages.
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Fetch only the named extension, ignoring its dependencies.
    #[arg(long)]
    no_deps: bool,

    /// Accept platform-neutral versions when no platform-specific one exists.
    #[arg(long)]
    allow_universal: bool,

    /// Install the downloaded packages with the editor CLI afterwards.
    #[arg(long)]
    install: bool,

    /// Editor executable used by `--install`.
    #[arg(long, value_name = "PATH")]
    code_bin: Option<String>,

    /// Concurrent marketplace lookups while resolving.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u64).range(1..))]
    max_parallel: Option<u64>,

    /// Retries per download after the first attempt.
    #[arg(long, value_name = "N")]
    retries: Option<u32>,

    /// Print the dependency tree and install order, then exit without downloading.
    #[arg(long)]
    tree: bool,

    /// Enable verbose output (equivalent to `RUST_LOG=debug`).
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors.
    #[arg(short, long)]
    quiet: bool,

    /// Disable progress bars.
    #[arg(long)]
    no_progress: bool,

    /// Path to a configuration file (default `~/.vsix-fetch/config.toml`).
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Settings derived from global flags, applied before anything runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log filter used when `RUST_LOG` is unset
    pub log_level: String,
    /// Draw progress bars
    pub show_progress: bool,
    /// Print informational output on stdout
    pub print_status: bool,
}

impl Cli {
    /// Parse arguments, run, and report.
    ///
    /// Returns `Ok(true)` when every package was fetched (and installed, if
    /// requested), `Ok(false)` when the run completed with failures.
    pub async fn execute(self) -> Result<bool> {
        let config = self.build_config();
        init_logging(&config.log_level);
        self.execute_with_config(config).await
    }

    /// Translate global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            show_progress: !self.no_progress
                && !self.quiet
                && std::env::var_os(NO_PROGRESS_ENV).is_none(),
            print_status: !self.quiet,
        }
    }

    /// Run with an explicit [`CliConfig`].
    pub async fn execute_with_config(self, cli_config: CliConfig) -> Result<bool> {
        let settings = Config::load(self.config.as_deref()).await?;

        let input = match &self.extension {
            Some(input) => input.clone(),
            None => prompt_for_extension().await?,
        };
        let root = ExtensionRef::from_input(&input)?;

        let platform = self
            .platform
            .clone()
            .or_else(|| settings.platform.clone())
            .unwrap_or_else(|| detect_target_platform().to_string());
        let dest_dir =
            self.output.clone().or_else(|| settings.output_dir.clone()).unwrap_or_else(|| ".".into());

        let mut fetch = settings.fetch_config();
        if let Some(retries) = self.retries {
            fetch.max_attempts = retries.saturating_add(1);
        }

        let options = PipelineOptions {
            platform: platform.clone(),
            dest_dir,
            resolve_dependencies: !self.no_deps,
            accept_universal: self.allow_universal,
            max_parallel: self
                .max_parallel
                .map_or(settings.max_parallel, |n| usize::try_from(n).unwrap_or(usize::MAX)),
            fetch,
            show_progress: cli_config.show_progress,
        };

        let client = build_client(settings.request_timeout())?;
        let marketplace =
            HttpMarketplace::new(client.clone(), &settings.marketplace_url, &settings.api_version)
                .with_request_timeout(settings.request_timeout());
        let pipeline = Pipeline::new(marketplace, client, options);

        if cli_config.print_status {
            println!("{} {} for {}", "Resolving".cyan().bold(), root, platform.bold());
        }

        if self.tree {
            let (resolution, order) = pipeline.plan(&root).await?;
            print!("{}", resolution.graph.to_tree_string());
            println!();
            println!("{}", "Install order:".bold());
            for (index, node) in order.iter().enumerate() {
                println!("  {}", node.file_name(index + 1));
            }
            print_resolution_problems(&resolution.report.failures, &resolution.report.warnings);
            return Ok(resolution.report.failures.is_empty());
        }

        let summary = pipeline.run(&root).await?;
        if cli_config.print_status {
            print_summary(&summary, pipeline.dest_dir());
        } else {
            print_resolution_problems(&summary.report.failures, &[]);
            print_failed_downloads(&summary);
        }

        let mut ok = !summary.has_failures();
        if self.install {
            let executable = self.code_bin.as_deref().unwrap_or(&settings.code_executable);
            ok &= install(executable, &summary, cli_config.print_status).await?;
        }
        Ok(ok)
    }
}

/// Install the downloaded packages. Returns whether all of them installed.
async fn install(executable: &str, summary: &RunSummary, print_status: bool) -> Result<bool> {
    let paths = summary.installable_paths();
    if paths.is_empty() {
        return Ok(false);
    }

    let installer = CodeCliInstaller::locate(executable)?;
    match installer.install(&paths).await {
        Ok(count) => {
            if print_status {
                println!("{} {} package(s)", "Installed".green().bold(), count);
            }
            Ok(true)
        }
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            Ok(false)
        }
    }
}

fn print_summary(summary: &RunSummary, dest_dir: &std::path::Path) {
    println!("{} {} package(s):", "Install order".bold(), summary.order.len());
    for record in &summary.records {
        match &record.outcome {
            Ok(path) => println!(
                "  {} {}",
                "✓".green(),
                path.file_name().map_or_else(|| path.display().to_string(), |n| {
                    n.to_string_lossy().into_owned()
                })
            ),
            Err(e) => println!("  {} {} ({})", "✗".red(), record.key, e),
        }
    }

    print_resolution_problems(&summary.report.failures, &summary.report.warnings);

    let succeeded = summary.succeeded().count();
    let failed = summary.failed().count() + summary.report.failures.len();
    println!();
    if summary.has_failures() {
        println!(
            "{} {} downloaded, {} failed, in {}",
            "Finished with errors:".yellow().bold(),
            succeeded,
            failed,
            dest_dir.display()
        );
    } else {
        println!("{} {} downloaded to {}", "Done:".green().bold(), succeeded, dest_dir.display());
    }
}

fn print_failed_downloads(summary: &RunSummary) {
    for record in summary.failed() {
        if let Some(e) = record.error() {
            eprintln!("{} {}: {}", "✗".red(), record.key, e);
        }
    }
}

fn print_resolution_problems(
    failures: &[crate::resolver::ResolutionFailure],
    warnings: &[VsixError],
) {
    for warning in warnings {
        eprintln!("{} {}", "warning:".yellow(), warning);
    }
    for failure in failures {
        eprintln!(
            "{} dependency {} of {} skipped: {}",
            "✗".red(),
            failure.key,
            failure.required_by,
            failure.error
        );
    }
}

async fn prompt_for_extension() -> Result<String> {
    print!("Enter VS Marketplace URL or publisher.id: ");
    std::io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read extension from stdin")?;
    Ok(line.trim().to_string())
}

/// Install the `tracing` subscriber. `RUST_LOG` takes precedence over
/// `default_level`.
fn init_logging(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
