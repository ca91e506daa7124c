//! Task classification and aggregation.
//!
//! A single pass over a playbook's tasks that tallies counts per task type
//! and splits executable types into commands and automations.

use crate::error::AnalyzerError;
use crate::models::{AnalysisReport, InvocationKind, TypeTally};
use crate::playbook::{Playbook, RawTask};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Inputs to an analysis run that do not come from the playbook itself.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOptions {
    /// Extracted content pack or bundle directory. Reserved for
    /// sub-playbook resolution; not read by the analysis.
    pub content_path: PathBuf,
    /// Reserved flag for branch analysis; not implemented.
    pub branch_analysis: bool,
}

/// Analyze a loaded playbook.
pub fn analyze_playbook(
    playbook: &Playbook,
    options: &AnalysisOptions,
) -> Result<AnalysisReport, AnalyzerError> {
    debug!(
        content_path = %options.content_path.display(),
        branch_analysis = options.branch_analysis,
        "Starting analysis"
    );

    let tasks = playbook.tasks()?;
    let tasks_by_type = analyze_task_types(tasks)?;

    info!(
        "Analyzed {} tasks across {} types",
        tasks.len(),
        tasks_by_type.len()
    );

    Ok(AnalysisReport {
        base_tasks: tasks.len(),
        tasks_by_type,
    })
}

/// Tally tasks by type, failing on the first malformed task.
pub fn analyze_task_types(
    tasks: &BTreeMap<String, RawTask>,
) -> Result<BTreeMap<String, TypeTally>, AnalyzerError> {
    let mut tasks_by_type: BTreeMap<String, TypeTally> = BTreeMap::new();

    for (task_id, task) in tasks {
        let task_type = resolve_task_type(task_id, task)?;

        let tally = tasks_by_type
            .entry(task_type.to_string())
            .or_insert_with(|| TypeTally::for_type(task_type));
        tally.count += 1;

        if let Some(breakdown) = tally.breakdown.as_mut() {
            let (kind, script) = classify_invocation(task_id, task)?;
            let name = task.name();
            debug!(task_id = %task_id, task_type, name, %kind, script, "Classified task");
            breakdown.tally_mut(kind).record(script);
        } else {
            debug!(task_id = %task_id, task_type, "Counted task");
        }
    }

    Ok(tasks_by_type)
}

fn resolve_task_type<'a>(task_id: &str, task: &'a RawTask) -> Result<&'a str, AnalyzerError> {
    match task.task_type.as_ref() {
        None | Some(Value::Null) => Err(AnalyzerError::missing_task_field(task_id, "type")),
        Some(Value::String(task_type)) => Ok(task_type.as_str()),
        Some(_) => Err(AnalyzerError::invalid_task_field(task_id, "type", "a string")),
    }
}

/// Determine whether an executable task runs a command or an automation,
/// and which script it names.
fn classify_invocation<'a>(
    task_id: &str,
    task: &'a RawTask,
) -> Result<(InvocationKind, Option<&'a str>), AnalyzerError> {
    let detail = task
        .task
        .as_ref()
        .ok_or_else(|| AnalyzerError::missing_task_field(task_id, "task.iscommand"))?;

    if !detail.is_mapping {
        return Err(AnalyzerError::invalid_task_field(task_id, "task", "a mapping"));
    }

    let is_command = match detail.iscommand.as_ref() {
        None => return Err(AnalyzerError::missing_task_field(task_id, "task.iscommand")),
        Some(Value::Bool(is_command)) => *is_command,
        // A null flag counts as an automation.
        Some(Value::Null) => false,
        Some(_) => {
            return Err(AnalyzerError::invalid_task_field(
                task_id,
                "task.iscommand",
                "a boolean",
            ))
        }
    };

    let script = match detail.script.as_ref() {
        None | Some(Value::Null) => None,
        Some(Value::String(script)) => Some(script.as_str()),
        Some(_) => {
            return Err(AnalyzerError::invalid_task_field(
                task_id,
                "task.script",
                "a string",
            ))
        }
    };

    Ok((InvocationKind::from_is_command(is_command), script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playbook::{parse_playbook, RawTaskDetail};

    fn task(task_type: &str) -> RawTask {
        RawTask {
            task_type: Some(Value::String(task_type.to_string())),
            task: None,
        }
    }

    fn executable(task_type: &str, is_command: bool, script: Option<&str>) -> RawTask {
        RawTask {
            task_type: Some(Value::String(task_type.to_string())),
            task: Some(RawTaskDetail {
                is_mapping: true,
                name: None,
                iscommand: Some(Value::Bool(is_command)),
                script: script.map(|s| Value::String(s.to_string())),
            }),
        }
    }

    fn tasks(entries: Vec<(&str, RawTask)>) -> BTreeMap<String, RawTask> {
        entries
            .into_iter()
            .map(|(id, t)| (id.to_string(), t))
            .collect()
    }

    #[test]
    fn test_mixed_playbook() {
        let playbook = Playbook::with_tasks(tasks(vec![
            ("t1", executable("regular", true, Some("foo"))),
            ("t2", executable("regular", false, Some("bar"))),
            ("t3", task("title")),
        ]));

        let report = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.base_tasks, 3);
        assert!(report.is_consistent());

        let regular = &report.tasks_by_type["regular"];
        assert_eq!(regular.count, 2);
        let breakdown = regular.breakdown.as_ref().unwrap();
        assert_eq!(breakdown.commands.count, 1);
        assert_eq!(
            breakdown.commands.script_set.iter().collect::<Vec<_>>(),
            vec!["foo"]
        );
        assert_eq!(breakdown.automations.count, 1);
        assert_eq!(
            breakdown.automations.script_set.iter().collect::<Vec<_>>(),
            vec!["bar"]
        );

        let title = &report.tasks_by_type["title"];
        assert_eq!(title.count, 1);
        assert!(title.breakdown.is_none());
    }

    #[test]
    fn test_duplicate_scripts_counted_once() {
        let tasks = tasks(vec![
            ("a", executable("regular", true, Some("S"))),
            ("b", executable("regular", true, Some("S"))),
            ("c", executable("condition", true, Some("S"))),
        ]);

        let by_type = analyze_task_types(&tasks).unwrap();

        let regular = by_type["regular"].breakdown.as_ref().unwrap();
        assert_eq!(regular.commands.count, 2);
        assert_eq!(regular.commands.script_set.len(), 1);
        assert!(regular.commands.script_set.contains("S"));
        assert_eq!(regular.automations.count, 0);

        let condition = by_type["condition"].breakdown.as_ref().unwrap();
        assert_eq!(condition.commands.count, 1);
    }

    #[test]
    fn test_task_without_script() {
        let tasks = tasks(vec![("a", executable("condition", false, None))]);

        let by_type = analyze_task_types(&tasks).unwrap();
        let breakdown = by_type["condition"].breakdown.as_ref().unwrap();

        assert_eq!(breakdown.automations.count, 1);
        assert!(breakdown.automations.script_set.is_empty());
    }

    #[test]
    fn test_empty_playbook() {
        let playbook = Playbook::with_tasks(BTreeMap::new());
        let report = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.base_tasks, 0);
        assert!(report.tasks_by_type.is_empty());
        assert!(report.is_consistent());
    }

    #[test]
    fn test_no_executable_tasks() {
        let playbook = Playbook::with_tasks(tasks(vec![
            ("0", task("start")),
            ("1", task("title")),
            ("2", task("title")),
        ]));

        let report = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.tasks_by_type["title"].count, 2);
        assert_eq!(report.tasks_by_type["start"].count, 1);
        assert_eq!(report.total_commands(), 0);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_missing_type_fails() {
        let tasks = tasks(vec![
            ("ok", task("title")),
            (
                "broken",
                RawTask {
                    task_type: None,
                    task: None,
                },
            ),
        ]);

        let err = analyze_task_types(&tasks).unwrap_err();
        match err {
            AnalyzerError::Schema { task_id, field } => {
                assert_eq!(task_id.as_deref(), Some("broken"));
                assert_eq!(field, "type");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_iscommand_fails() {
        let mut broken = executable("regular", true, Some("x"));
        broken.task.as_mut().unwrap().iscommand = None;
        let tasks = tasks(vec![("r", broken)]);

        let err = analyze_task_types(&tasks).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::Schema {
                field: "task.iscommand",
                ..
            }
        ));
    }

    #[test]
    fn test_null_iscommand_counts_as_automation() {
        let mut task = executable("regular", true, Some("SetGridField"));
        task.task.as_mut().unwrap().iscommand = Some(Value::Null);
        let tasks = tasks(vec![("r", task)]);

        let by_type = analyze_task_types(&tasks).unwrap();
        let breakdown = by_type["regular"].breakdown.as_ref().unwrap();

        assert_eq!(breakdown.commands.count, 0);
        assert_eq!(breakdown.automations.count, 1);
        assert!(breakdown.automations.script_set.contains("SetGridField"));
    }

    #[test]
    fn test_non_boolean_iscommand_fails() {
        let mut task = executable("condition", true, None);
        task.task.as_mut().unwrap().iscommand = Some(Value::String("yes".to_string()));
        let tasks = tasks(vec![("c", task)]);

        let err = analyze_task_types(&tasks).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Task 'c' field 'task.iscommand' must be a boolean"
        );
    }

    #[test]
    fn test_non_string_type_fails() {
        let tasks = tasks(vec![(
            "n",
            RawTask {
                task_type: Some(Value::Bool(true)),
                task: None,
            },
        )]);

        let err = analyze_task_types(&tasks).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::InvalidField { field: "type", .. }
        ));
    }

    #[test]
    fn test_non_mapping_task_record_on_executable_fails() {
        let playbook =
            parse_playbook("tasks:\n  '0':\n    type: regular\n    task: [a, b]\n").unwrap();

        let err = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            AnalyzerError::InvalidField { field: "task", .. }
        ));
    }

    #[test]
    fn test_malformed_task_record_on_start_task_is_ignored() {
        let playbook = parse_playbook(
            "tasks:\n  '0':\n    type: start\n    task: []\n  '1':\n    type: title\n    task:\n      name: A\n      name: B\n",
        )
        .unwrap();

        let report = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.base_tasks, 2);
        assert_eq!(report.tasks_by_type["start"].count, 1);
        assert_eq!(report.tasks_by_type["title"].count, 1);
        assert!(report.is_consistent());
    }

    #[test]
    fn test_executable_without_task_record_fails() {
        let tasks = tasks(vec![("r", task("regular"))]);
        assert!(analyze_task_types(&tasks).is_err());
    }

    #[test]
    fn test_non_executable_type_ignores_task_record() {
        let tasks = tasks(vec![("p", executable("playbook", true, Some("sub")))]);

        let by_type = analyze_task_types(&tasks).unwrap();
        assert_eq!(by_type["playbook"].count, 1);
        assert!(by_type["playbook"].breakdown.is_none());
    }

    #[test]
    fn test_missing_tasks_key_fails() {
        let playbook = parse_playbook("name: No tasks\n").unwrap();
        let result = analyze_playbook(&playbook, &AnalysisOptions::default());
        assert!(matches!(result, Err(AnalyzerError::Schema { task_id: None, .. })));
    }

    #[test]
    fn test_fixture_missing_type() {
        let content = include_str!("../../fixtures/missing_type.yml");
        let playbook = parse_playbook(content).unwrap();

        let err = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap_err();
        assert_eq!(err.to_string(), "Task '1' is missing required field 'type'");
    }

    #[test]
    fn test_fixture_playbook() {
        let content = include_str!("../../fixtures/phishing_investigation.yml");
        let playbook = parse_playbook(content).unwrap();

        let report = analyze_playbook(&playbook, &AnalysisOptions::default()).unwrap();

        assert_eq!(report.base_tasks, 8);
        assert!(report.is_consistent());
        assert_eq!(report.tasks_by_type["start"].count, 1);
        assert_eq!(report.tasks_by_type["title"].count, 2);
        assert_eq!(report.tasks_by_type["playbook"].count, 1);

        let regular = report.tasks_by_type["regular"].breakdown.as_ref().unwrap();
        assert_eq!(regular.commands.count, 2);
        assert_eq!(regular.automations.count, 1);
        assert_eq!(
            regular.commands.script_set.iter().collect::<Vec<_>>(),
            vec!["|||closeInvestigation", "|||send-mail"]
        );

        let condition = report.tasks_by_type["condition"].breakdown.as_ref().unwrap();
        assert_eq!(condition.automations.count, 1);
        assert!(condition.automations.script_set.is_empty());
        assert_eq!(report.total_commands(), 2);
        assert_eq!(report.total_automations(), 2);
    }
}
