//! Playbook Analyzer - task breakdown reports for automation playbooks
//!
//! A CLI tool that reads one playbook definition and reports how its
//! tasks are distributed across task types, which of the executable
//! tasks run direct commands versus automations, and which scripts
//! they invoke.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (missing or unreadable playbook, invalid YAML,
//!       missing task fields, bad config)

mod analysis;
mod cli;
mod config;
mod error;
mod models;
mod playbook;
mod report;

use analysis::AnalysisOptions;
use anyhow::{Context, Result};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use models::ReportMetadata;
use std::io::Write;
use std::path::Path;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };

    init_logging(&args, &config);

    debug!("Playbook Analyzer v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    if let Err(e) = run_analysis(&args, &config, &mut std::io::stdout().lock()) {
        error!("Analysis failed: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .pb-analyzer.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings. `RUST_LOG` takes
/// precedence when set.
fn init_logging(args: &Args, config: &Config) {
    let level = if config.general.verbose && !args.quiet {
        tracing::Level::DEBUG
    } else {
        args.log_level()
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Load, analyze, and report on the playbook named by the arguments.
///
/// Nothing is written to `stdout` or the output file unless the whole
/// analysis succeeds.
fn run_analysis<W: Write>(args: &Args, config: &Config, stdout: &mut W) -> Result<()> {
    let playbook_path = args.playbook_path();
    let options = AnalysisOptions {
        content_path: args.content_path(),
        branch_analysis: true,
    };

    info!("Loading playbook: {}", playbook_path.display());
    let playbook = playbook::load_playbook(&playbook_path)?;

    let report = analysis::analyze_playbook(&playbook, &options)
        .with_context(|| format!("Failed to analyze {}", playbook_path.display()))?;

    info!(
        "{} tasks: {} commands, {} automations",
        report.base_tasks,
        report.total_commands(),
        report.total_automations()
    );
    if !report.is_consistent() {
        warn!("Task type counts do not add up to {}", report.base_tasks);
    }

    let output = match config.report.format {
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Markdown => {
            let metadata = ReportMetadata {
                playbook_path: playbook_path.display().to_string(),
                content_path: options.content_path.display().to_string(),
                playbook_name: playbook.name.clone(),
                playbook_id: playbook.id.clone(),
                analysis_date: Utc::now(),
            };
            report::generate_markdown_report(&report, &metadata)
        }
    };

    if config.report.show_paths {
        writeln!(stdout, "Playbook path: {}", playbook_path.display())?;
        writeln!(stdout, "Content path: {}", options.content_path.display())?;
    }

    report::write_report(&output, config.report.output.as_deref(), stdout)?;

    if let Some(ref path) = config.report.output {
        info!("Report saved to: {}", path.display());
    }

    Ok(())
}

/// Load configuration from file or use defaults, then apply CLI overrides.
fn load_config(args: &Args) -> Result<Config> {
    load_config_from(args, Path::new(CONFIG_FILE_NAME))
}

/// Like [`load_config`], with the fallback config file at `default_path`.
/// An explicit `--config` must parse; a broken fallback file is skipped.
fn load_config_from(args: &Args, default_path: &Path) -> Result<Config> {
    let mut config = if let Some(ref config_path) = args.config {
        Config::load(config_path)?
    } else {
        match Config::load_optional(default_path) {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                eprintln!("Warning: ignoring {}: {:#}", default_path.display(), e);
                Config::default()
            }
        }
    };

    config.merge_with_args(args);
    Ok(config)
}
