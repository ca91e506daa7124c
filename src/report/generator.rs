//! Report generation.
//!
//! This module renders an [`AnalysisReport`] as sorted-key JSON or as a
//! Markdown summary.

use crate::error::AnalyzerError;
use crate::models::{AnalysisReport, Breakdown, InvocationKind, ReportMetadata, ScriptTally};
use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;

/// Generate the JSON report.
///
/// Keys are sorted at every level and nested values are indented by two
/// spaces.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String, AnalyzerError> {
    // serde_json::Map is ordered by key unless `preserve_order` is enabled.
    let value = serde_json::to_value(report)?;
    Ok(serde_json::to_string_pretty(&value)?)
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport, metadata: &ReportMetadata) -> String {
    let mut output = String::new();

    output.push_str("# Playbook Analysis Report\n\n");
    output.push_str(&generate_metadata_section(metadata));
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_breakdown_section(report));

    output
}

/// Generate the metadata section.
fn generate_metadata_section(metadata: &ReportMetadata) -> String {
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    if let Some(ref name) = metadata.playbook_name {
        section.push_str(&format!("- **Playbook:** {}\n", name));
    }
    if let Some(ref id) = metadata.playbook_id {
        section.push_str(&format!("- **Playbook ID:** `{}`\n", id));
    }
    section.push_str(&format!("- **Playbook Path:** `{}`\n", metadata.playbook_path));
    section.push_str(&format!("- **Content Path:** `{}`\n", metadata.content_path));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        metadata.analysis_date.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    section.push('\n');

    section
}

/// Generate the task type summary table.
fn generate_summary_section(report: &AnalysisReport) -> String {
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!("**Total Tasks:** {}\n\n", report.base_tasks));

    if report.tasks_by_type.is_empty() {
        section.push_str("The playbook contains no tasks.\n\n");
        return section;
    }

    section.push_str("| Task Type | Count | Commands | Automations |\n");
    section.push_str("|:---|:---:|:---:|:---:|\n");

    for (task_type, tally) in &report.tasks_by_type {
        let (commands, automations) = match tally.breakdown {
            Some(ref b) => (b.commands.count.to_string(), b.automations.count.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        section.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            task_type, tally.count, commands, automations
        ));
    }
    section.push('\n');

    section
}

/// Generate one subsection per executable task type.
fn generate_breakdown_section(report: &AnalysisReport) -> String {
    let executable: Vec<_> = report
        .tasks_by_type
        .iter()
        .filter_map(|(t, tally)| tally.breakdown.as_ref().map(|b| (t, b)))
        .collect();

    if executable.is_empty() {
        return String::new();
    }

    let mut section = String::new();
    section.push_str("## Executable Tasks\n\n");

    for (task_type, breakdown) in executable {
        section.push_str(&generate_type_breakdown(task_type, breakdown));
    }

    section
}

fn generate_type_breakdown(task_type: &str, breakdown: &Breakdown) -> String {
    let mut block = String::new();

    block.push_str(&format!("### {}\n\n", task_type));
    block.push_str(&generate_script_list(
        InvocationKind::Command,
        &breakdown.commands,
    ));
    block.push_str(&generate_script_list(
        InvocationKind::Automation,
        &breakdown.automations,
    ));

    block
}

fn generate_script_list(kind: InvocationKind, tally: &ScriptTally) -> String {
    let mut list = String::new();

    list.push_str(&format!("**{}:** {}\n\n", kind, tally.count));
    for script in &tally.script_set {
        list.push_str(&format!("- `{}`\n", script));
    }
    if !tally.script_set.is_empty() {
        list.push('\n');
    }

    list
}

/// Write a rendered report to a file, or to `stdout` when no path is given.
pub fn write_report<W: Write>(content: &str, path: Option<&Path>, stdout: &mut W) -> Result<()> {
    match path {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_with_newline(&mut file, content)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
        }
        None => write_with_newline(stdout, content).context("Failed to write report")?,
    }

    Ok(())
}

fn write_with_newline<W: Write>(out: &mut W, content: &str) -> std::io::Result<()> {
    out.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    out.flush()
}
