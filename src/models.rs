//! Data models for the playbook analyzer.
//!
//! This module contains the aggregate structures produced by the
//! analysis pass and consumed by the report generators.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Task types whose nested record says whether a command or an automation runs.
pub const EXECUTABLE_TASK_TYPES: &[&str] = &["condition", "regular"];

/// Returns true if the given task type carries a command/automation breakdown.
pub fn is_executable_type(task_type: &str) -> bool {
    EXECUTABLE_TASK_TYPES.contains(&task_type)
}

/// What an executable task invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvocationKind {
    /// A direct integration command.
    Command,
    /// A higher-level automation script.
    Automation,
}

impl InvocationKind {
    /// Maps the playbook's `iscommand` flag to an invocation kind.
    pub fn from_is_command(is_command: bool) -> Self {
        if is_command {
            InvocationKind::Command
        } else {
            InvocationKind::Automation
        }
    }
}

impl fmt::Display for InvocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvocationKind::Command => write!(f, "Commands"),
            InvocationKind::Automation => write!(f, "Automations"),
        }
    }
}

/// Count of invocations of one kind plus the distinct scripts they reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScriptTally {
    pub count: usize,
    pub script_set: BTreeSet<String>,
}

impl ScriptTally {
    /// Records one invocation, optionally naming its script.
    pub fn record(&mut self, script: Option<&str>) {
        self.count += 1;
        if let Some(script) = script {
            self.script_set.insert(script.to_string());
        }
    }
}

/// Command vs automation split for an executable task type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Breakdown {
    pub commands: ScriptTally,
    pub automations: ScriptTally,
}

impl Breakdown {
    /// Returns the tally for the given invocation kind.
    pub fn tally_mut(&mut self, kind: InvocationKind) -> &mut ScriptTally {
        match kind {
            InvocationKind::Command => &mut self.commands,
            InvocationKind::Automation => &mut self.automations,
        }
    }

    /// Total invocations across both kinds.
    pub fn total(&self) -> usize {
        self.commands.count + self.automations.count
    }
}

/// Tally for one task type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeTally {
    pub count: usize,
    /// Present only for executable task types.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<Breakdown>,
}

impl TypeTally {
    /// Creates an empty tally, with a breakdown when the type is executable.
    pub fn for_type(task_type: &str) -> Self {
        Self {
            count: 0,
            breakdown: is_executable_type(task_type).then(Breakdown::default),
        }
    }
}

/// The result of analyzing one playbook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AnalysisReport {
    /// Total number of tasks in the playbook.
    pub base_tasks: usize,
    /// Tallies keyed by task type.
    pub tasks_by_type: BTreeMap<String, TypeTally>,
}

impl AnalysisReport {
    /// Checks that the per-type counts add up to `base_tasks` and that every
    /// breakdown accounts for all tasks of its type.
    pub fn is_consistent(&self) -> bool {
        let type_total: usize = self.tasks_by_type.values().map(|t| t.count).sum();
        if type_total != self.base_tasks {
            return false;
        }

        self.tasks_by_type
            .values()
            .filter_map(|t| t.breakdown.as_ref().map(|b| (t.count, b)))
            .all(|(count, breakdown)| breakdown.total() == count)
    }

    /// Number of tasks that run a direct command, across all executable types.
    pub fn total_commands(&self) -> usize {
        self.tasks_by_type
            .values()
            .filter_map(|t| t.breakdown.as_ref())
            .map(|b| b.commands.count)
            .sum()
    }

    /// Number of tasks that run an automation, across all executable types.
    pub fn total_automations(&self) -> usize {
        self.tasks_by_type
            .values()
            .filter_map(|t| t.breakdown.as_ref())
            .map(|b| b.automations.count)
            .sum()
    }
}

/// Context printed alongside the Markdown report.
#[derive(Debug, Clone)]
pub struct ReportMetadata {
    /// Path of the analyzed playbook.
    pub playbook_path: String,
    /// Content folder passed on the command line.
    pub content_path: String,
    /// Playbook `name` header, if present.
    pub playbook_name: Option<String>,
    /// Playbook `id` header, if present.
    pub playbook_id: Option<String>,
    /// Date and time of the analysis.
    pub analysis_date: DateTime<Utc>,
}
