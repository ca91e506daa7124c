//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Playbook Analyzer - task breakdown reports for automation playbooks
///
/// Counts the tasks in a playbook by type and, for regular and condition
/// tasks, splits them into direct commands and automations with the
/// distinct scripts each one invokes.
///
/// Examples:
///   pb-analyzer -p Playbooks/playbook-Phishing.yml -c ./content
///   pb-analyzer -p playbook.yml -c ./content --format markdown -o report.md
///   pb-analyzer --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Base playbook to analyze
    #[arg(
        short,
        long = "playbook",
        value_name = "PATH",
        required_unless_present = "init_config"
    )]
    pub playbook: Option<PathBuf>,

    /// Content folder (extracted content pack or bundle directory)
    ///
    /// Reserved for sub-playbook resolution. Printed with the report but
    /// not otherwise read.
    #[arg(
        short,
        long = "contentpath",
        value_name = "PATH",
        required_unless_present = "init_config"
    )]
    pub content_path: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format (json, markdown)
    ///
    /// Defaults to json, or the format set in .pb-analyzer.toml.
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .pb-analyzer.toml in the current directory
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Generate a default .pb-analyzer.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Sorted-key, indented JSON (default)
    #[default]
    Json,
    /// Markdown summary
    Markdown,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the playbook path (should be validated first).
    pub fn playbook_path(&self) -> PathBuf {
        self.playbook.clone().unwrap_or_default()
    }

    /// Get the content path (should be validated first).
    pub fn content_path(&self) -> PathBuf {
        self.content_path.clone().unwrap_or_default()
    }

    /// Validate the parsed arguments.
    ///
    /// Whether the playbook exists is left to the loader.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.playbook_path().as_os_str().is_empty() {
            return Err("Playbook path must not be empty".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}
