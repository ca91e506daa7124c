//! Playbook loading.
//!
//! This module reads a playbook document from disk and deserializes it
//! without validating its schema. Missing fields are reported later by
//! the aggregator, which knows which task they belong to.

use crate::error::AnalyzerError;
use serde::Deserialize;
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

/// A loaded playbook document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Playbook {
    /// Playbook identifier.
    #[serde(default)]
    pub id: Option<String>,
    /// Display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Tasks keyed by task identifier. `None` when the key is absent or null.
    #[serde(default)]
    tasks: Option<BTreeMap<String, RawTask>>,
}

impl Playbook {
    /// Builds a playbook from an in-memory task mapping.
    #[allow(dead_code)] // Builder utility for callers that already hold tasks
    pub fn with_tasks(tasks: BTreeMap<String, RawTask>) -> Self {
        Self {
            tasks: Some(tasks),
            ..Default::default()
        }
    }

    /// Returns the task mapping, failing if the document has none.
    pub fn tasks(&self) -> Result<&BTreeMap<String, RawTask>, AnalyzerError> {
        self.tasks.as_ref().ok_or(AnalyzerError::Schema {
            task_id: None,
            field: "tasks",
        })
    }
}

/// One entry of the playbook's `tasks` mapping.
///
/// Fields are kept as raw YAML values so that a task whose type is never
/// inspected cannot fail the load.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTask {
    /// Task type tag (`regular`, `condition`, `start`, `title`, ...).
    #[serde(rename = "type", default)]
    pub task_type: Option<Value>,
    /// Nested details of what the task invokes.
    #[serde(default, deserialize_with = "deserialize_task_detail")]
    pub task: Option<RawTaskDetail>,
}

impl RawTask {
    /// Display name from the nested record, when it is a string.
    pub fn name(&self) -> Option<&str> {
        self.task
            .as_ref()
            .and_then(|d| d.name.as_ref())
            .and_then(Value::as_str)
    }
}

/// The nested `task` record of a playbook task, reduced to the fields the
/// analysis reads. Later duplicates of a key win.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTaskDetail {
    /// False when `task` held a scalar or a sequence instead of a mapping.
    pub is_mapping: bool,
    /// Task display name.
    pub name: Option<Value>,
    /// True for a direct command, false for an automation.
    pub iscommand: Option<Value>,
    /// Identifier of the underlying script.
    pub script: Option<Value>,
}

/// Accepts any YAML value for `task`; only mappings contribute fields.
fn deserialize_task_detail<'de, D>(deserializer: D) -> Result<Option<RawTaskDetail>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, IgnoredAny, VariantAccess};

    struct TaskDetail;

    impl TaskDetail {
        fn not_a_mapping<E>() -> Result<Option<RawTaskDetail>, E> {
            Ok(Some(RawTaskDetail::default()))
        }
    }

    impl<'de> de::Visitor<'de> for TaskDetail {
        type Value = Option<RawTaskDetail>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a task record")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_none<E>(self) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(None)
        }

        fn visit_bool<E>(self, _: bool) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Self::not_a_mapping()
        }

        fn visit_i64<E>(self, _: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Self::not_a_mapping()
        }

        fn visit_u64<E>(self, _: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Self::not_a_mapping()
        }

        fn visit_f64<E>(self, _: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Self::not_a_mapping()
        }

        fn visit_str<E>(self, _: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Self::not_a_mapping()
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: de::SeqAccess<'de>,
        {
            while seq.next_element::<IgnoredAny>()?.is_some() {}
            Self::not_a_mapping()
        }

        fn visit_enum<A>(self, data: A) -> Result<Self::Value, A::Error>
        where
            A: de::EnumAccess<'de>,
        {
            let (IgnoredAny, variant) = data.variant::<IgnoredAny>()?;
            variant.newtype_variant::<IgnoredAny>()?;
            Self::not_a_mapping()
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: de::MapAccess<'de>,
        {
            let mut detail = RawTaskDetail {
                is_mapping: true,
                ..Default::default()
            };

            while let Some(key) = map.next_key::<Value>()? {
                let slot = match key.as_str() {
                    Some("name") => &mut detail.name,
                    Some("iscommand") => &mut detail.iscommand,
                    Some("script") => &mut detail.script,
                    _ => {
                        map.next_value::<IgnoredAny>()?;
                        continue;
                    }
                };
                *slot = Some(map.next_value::<Value>()?);
            }

            Ok(Some(detail))
        }
    }

    deserializer.deserialize_any(TaskDetail)
}

/// Load a playbook from a YAML file.
pub fn load_playbook(path: &Path) -> Result<Playbook, AnalyzerError> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AnalyzerError::NotFound {
            path: path.to_path_buf(),
        },
        _ => AnalyzerError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    debug!("Read {} bytes from {}", content.len(), path.display());

    parse_playbook(&content).map_err(|source| AnalyzerError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse a playbook from YAML text.
pub fn parse_playbook(content: &str) -> Result<Playbook, serde_yaml::Error> {
    serde_yaml::from_str(content)
}
