//! Error types for playbook analysis.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading, analyzing, or rendering a playbook.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The playbook file does not exist.
    #[error("Playbook not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// The playbook file exists but could not be read.
    #[error("Failed to read playbook {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The playbook is not valid YAML.
    #[error("Failed to parse playbook {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A field the analysis depends on is absent.
    #[error("{}", schema_message(task_id.as_deref(), field))]
    Schema {
        task_id: Option<String>,
        field: &'static str,
    },

    /// A field the analysis depends on holds the wrong kind of value.
    #[error("Task '{task_id}' field '{field}' must be {expected}")]
    InvalidField {
        task_id: String,
        field: &'static str,
        expected: &'static str,
    },

    /// The report could not be serialized.
    #[error("Failed to render report: {0}")]
    Render(#[from] serde_json::Error),
}

fn schema_message(task_id: Option<&str>, field: &str) -> String {
    match task_id {
        Some(id) => format!("Task '{}' is missing required field '{}'", id, field),
        None => format!("Playbook is missing required field '{}'", field),
    }
}

impl AnalyzerError {
    /// Shorthand for a missing field on a specific task.
    pub fn missing_task_field(task_id: &str, field: &'static str) -> Self {
        AnalyzerError::Schema {
            task_id: Some(task_id.to_string()),
            field,
        }
    }

    /// Shorthand for a task field with an unexpected value.
    pub fn invalid_task_field(task_id: &str, field: &'static str, expected: &'static str) -> Self {
        AnalyzerError::InvalidField {
            task_id: task_id.to_string(),
            field,
            expected,
        }
    }
}
