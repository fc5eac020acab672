//! Itamae - workstation provisioning from shell-script plugins.
//!
//! Loads plugin scripts, lets the user choose what to install, and runs the
//! installation with a live dashboard.

use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use itamae::app::{print_summary, InstallOptions, InstallOutcome, Session};
use itamae::install::{list_logs, most_recent_log, parse_presets, UninstallReport};
use itamae::{forms, Config};

/// Provision a Linux workstation from shell-script plugins
#[derive(Parser)]
#[command(name = "itamae")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Install the plugins of one category
    Install {
        /// Category to install (prompted for when omitted)
        #[arg(short, long)]
        category: Option<String>,

        /// Don't confirm before installing
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print plain progress lines instead of the dashboard
        #[arg(long)]
        no_tui: bool,

        /// Pre-resolve a required input (NAME=VALUE)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },

    /// Pick plugins from every category
    Custom {
        /// Don't confirm before installing
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print plain progress lines instead of the dashboard
        #[arg(long)]
        no_tui: bool,

        /// Pre-resolve a required input (NAME=VALUE)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        set: Vec<String>,
    },

    /// Remove installed plugins
    Uninstall {
        /// Only consider this category
        #[arg(short, long)]
        category: Option<String>,
    },

    /// List available plugins
    List {
        /// Only list this category
        #[arg(short, long)]
        category: Option<String>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// List, print, or prune installation logs
    Logs {
        /// Print the most recent log
        #[arg(long)]
        latest: bool,

        /// Delete all but the newest logs
        #[arg(long, conflicts_with = "latest")]
        clean: bool,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

impl Commands {
    /// Whether this command may hand the terminal to the dashboard.
    fn wants_dashboard(&self) -> bool {
        matches!(self, Self::Install { no_tui: false, .. } | Self::Custom { no_tui: false, .. })
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = Config::load()?;

    let dashboard = cli.command.wants_dashboard() && config.ui.dashboard && forms::is_interactive();
    let _guard = init_logging(cli.verbose, dashboard.then(|| &config))?;

    let session = Session::new(config);

    match cli.command {
        Commands::Install { category, yes, no_tui, set } => {
            let opts = InstallOptions {
                category,
                yes,
                no_tui,
                presets: parse_presets(&set)?,
                verbose: cli.verbose,
            };
            cmd_install(&session, &opts, false)
        }
        Commands::Custom { yes, no_tui, set } => {
            let opts = InstallOptions {
                category: None,
                yes,
                no_tui,
                presets: parse_presets(&set)?,
                verbose: cli.verbose,
            };
            cmd_install(&session, &opts, true)
        }
        Commands::Uninstall { category } => cmd_uninstall(&session, category.as_deref()),
        Commands::List { category, format } => {
            cmd_list(&session, category.as_deref(), &format)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Logs { latest, clean } => {
            cmd_logs(session.config(), latest, clean)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Config { path } => {
            cmd_config(session.config(), path)?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Setup logging.
///
/// With a dashboard the terminal belongs to ratatui, so diagnostics go to a
/// file in the log directory instead of stderr.
fn init_logging(verbose: bool, dashboard: Option<&Config>) -> Result<Option<WorkerGuard>> {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    match dashboard {
        Some(config) => {
            let log_dir = config.log_dir();
            std::fs::create_dir_all(&log_dir)
                .with_context(|| format!("Failed to create {}", log_dir.display()))?;
            let file_appender = tracing_appender::rolling::never(&log_dir, "itamae-debug.log");
            let (writer, guard) = tracing_appender::non_blocking(file_appender);
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_ansi(false).with_writer(writer))
                .with(filter)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(false).with_writer(io::stderr))
                .with(filter)
                .init();
            Ok(None)
        }
    }
}

/// Run `install` or `custom`.
fn cmd_install(session: &Session, opts: &InstallOptions, custom: bool) -> Result<ExitCode> {
    let outcome = if custom { session.custom(opts)? } else { session.install(opts)? };

    match outcome {
        InstallOutcome::Cancelled => {
            println!("Installation cancelled");
            Ok(ExitCode::SUCCESS)
        }
        InstallOutcome::NothingSelected => {
            println!("No plugins selected");
            Ok(ExitCode::SUCCESS)
        }
        InstallOutcome::Finished(summary) => {
            print_summary(&mut io::stdout(), &summary)?;
            Ok(if summary.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

/// Run `uninstall`.
fn cmd_uninstall(session: &Session, category: Option<&str>) -> Result<ExitCode> {
    println!("Checking installed plugins...");
    let report: UninstallReport = session.uninstall(category)?;

    println!(
        "\nRemoved {}, failed {}, not installed {}",
        report.removed.len(),
        report.failed.len(),
        report.skipped.len()
    );

    Ok(if report.is_success() { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

/// List available plugins.
fn cmd_list(session: &Session, category: Option<&str>, format: &str) -> Result<()> {
    let plugins = session.list(category)?;

    match format {
        "json" => {
            let json = serde_json::to_string_pretty(&plugins)?;
            println!("{json}");
        }
        _ => {
            let mut current: Option<&str> = None;
            for plugin in &plugins {
                let group = plugin.category.as_deref();
                if group != current {
                    println!("\n{}", group.unwrap_or("uncategorized"));
                    current = group;
                }
                let marker = if plugin.core { "★" } else { " " };
                println!(
                    "  {marker} {} ({}) - {} [{}]",
                    plugin.name,
                    plugin.id,
                    plugin.description,
                    plugin.install_method.display_name()
                );
            }
            println!("\nTotal: {} plugins", plugins.len());
        }
    }

    Ok(())
}

/// List, print, or prune run logs.
fn cmd_logs(config: &Config, latest: bool, clean: bool) -> Result<()> {
    let dir = config.log_dir();

    if latest {
        let Some(path) = most_recent_log(&dir)? else {
            println!("No logs in {}", dir.display());
            return Ok(());
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        io::stdout().write_all(content.as_bytes())?;
        return Ok(());
    }

    if clean {
        let removed = itamae::install::prune_logs(&dir, config.logging.keep)?;
        println!("Removed {} log(s), kept up to {}", removed.len(), config.logging.keep);
        return Ok(());
    }

    let logs = list_logs(&dir)?;
    if logs.is_empty() {
        println!("No logs in {}", dir.display());
        return Ok(());
    }

    for log in &logs {
        let modified: chrono::DateTime<chrono::Local> = log.modified.into();
        println!(
            "{}  {:>8} B  {}",
            modified.format("%Y-%m-%d %H:%M:%S"),
            log.size,
            log.path.display()
        );
    }
    println!("\nTotal: {} logs", logs.len());

    Ok(())
}

/// Show configuration.
fn cmd_config(config: &Config, show_path: bool) -> Result<()> {
    if show_path {
        match Config::locate().or_else(Config::global_path) {
            Some(path) => println!("{}", path.display()),
            None => println!("No configuration directory available"),
        }
        return Ok(());
    }

    println!("{}", config.to_toml()?);
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "itamae", &mut io::stdout());
}
