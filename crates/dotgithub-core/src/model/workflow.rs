use super::de;
use super::step::{self, Step};
use crate::paths;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::path::PathBuf;

/// A workflow file under `workflows/`.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    pub file_name: String,
    pub path: PathBuf,
    pub raw: String,
    /// `name:` from the document, or the file name without its extension.
    pub name: String,
    pub env: IndexMap<String, String>,
    pub jobs: IndexMap<String, Job>,
    pub on: WorkflowOn,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WorkflowDocument {
    name: Option<Value>,
    #[serde(deserialize_with = "de::string_map")]
    env: IndexMap<String, String>,
    #[serde(deserialize_with = "de::null_as_default")]
    jobs: IndexMap<String, Job>,
    #[serde(deserialize_with = "de::null_as_default")]
    on: WorkflowOn,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Job {
    #[serde(deserialize_with = "de::scalar")]
    pub name: String,
    #[serde(deserialize_with = "de::scalar")]
    pub uses: String,
    #[serde(rename = "runs-on")]
    pub runs_on: Option<RunsOn>,
    #[serde(deserialize_with = "de::null_as_default")]
    pub steps: Vec<Step>,
    #[serde(deserialize_with = "de::string_map")]
    pub env: IndexMap<String, String>,
    #[serde(deserialize_with = "de::one_or_many")]
    pub needs: Vec<String>,
    #[serde(deserialize_with = "de::string_map")]
    pub outputs: IndexMap<String, String>,
    #[serde(deserialize_with = "de::string_map")]
    pub with: IndexMap<String, String>,
}

/// `runs-on` as a label, a label list, or a runner group mapping.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RunsOn {
    Label(String),
    Labels(Vec<String>),
    Group(Value),
}

/// The triggers that declare inputs. Other events are accepted and ignored.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOn {
    pub workflow_call: Option<WorkflowTrigger>,
    pub workflow_dispatch: Option<WorkflowTrigger>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowTrigger {
    #[serde(deserialize_with = "de::null_as_default")]
    pub inputs: IndexMap<String, WorkflowInput>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct WorkflowInput {
    #[serde(deserialize_with = "de::scalar")]
    pub description: String,
    #[serde(deserialize_with = "de::scalar")]
    pub default: String,
    #[serde(deserialize_with = "de::truthy")]
    pub required: bool,
    #[serde(rename = "type", deserialize_with = "de::scalar")]
    pub kind: String,
}

/// Which trigger declared a workflow input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputPlacement {
    Call,
    Dispatch,
}

impl InputPlacement {
    pub fn as_str(self) -> &'static str {
        match self {
            InputPlacement::Call => "call",
            InputPlacement::Dispatch => "dispatch",
        }
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

impl<'de> Deserialize<'de> for WorkflowOn {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `on: push` and `on: [push, pull_request]` declare no inputs.
        let Value::Mapping(map) = Value::deserialize(deserializer)? else {
            return Ok(WorkflowOn::default());
        };
        let trigger = |key: &str| -> Result<Option<WorkflowTrigger>, D::Error> {
            match map.get(key) {
                None => Ok(None),
                Some(Value::Null) => Ok(Some(WorkflowTrigger::default())),
                Some(value) => WorkflowTrigger::deserialize(value.clone())
                    .map(Some)
                    .map_err(D::Error::custom),
            }
        };
        Ok(WorkflowOn {
            workflow_call: trigger("workflow_call")?,
            workflow_dispatch: trigger("workflow_dispatch")?,
        })
    }
}

impl Workflow {
    /// Decode `raw` into a workflow named after `file_name` unless the
    /// document sets `name:` itself.
    pub fn parse(
        file_name: impl Into<String>,
        path: impl Into<PathBuf>,
        raw: impl Into<String>,
    ) -> Result<Self, serde_yaml::Error> {
        let file_name = file_name.into();
        let raw = raw.into();
        let doc = if raw.trim().is_empty() {
            WorkflowDocument::default()
        } else {
            let value: Value = serde_yaml::from_str(&raw)?;
            if value.is_null() {
                WorkflowDocument::default()
            } else {
                serde_yaml::from_value(value)?
            }
        };
        let name = match doc.name {
            Some(Value::Null) | None => paths::workflow_stem(&file_name).to_string(),
            Some(value) => de::value_to_string(&value),
        };
        Ok(Workflow {
            path: path.into(),
            raw,
            name,
            env: doc.env,
            jobs: doc.jobs,
            on: doc.on,
            file_name,
        })
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs.get(name)
    }

    /// Inputs from `workflow_call` then `workflow_dispatch`.
    pub fn inputs(&self) -> impl Iterator<Item = (InputPlacement, &str, &WorkflowInput)> {
        let call = self
            .on
            .workflow_call
            .iter()
            .flat_map(|t| t.inputs.iter())
            .map(|(n, i)| (InputPlacement::Call, n.as_str(), i));
        let dispatch = self
            .on
            .workflow_dispatch
            .iter()
            .flat_map(|t| t.inputs.iter())
            .map(|(n, i)| (InputPlacement::Dispatch, n.as_str(), i));
        call.chain(dispatch)
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs().any(|(_, n, _)| n == name)
    }
}

impl Job {
    pub fn step(&self, id: &str) -> Option<&Step> {
        step::find_step(&self.steps, id)
    }

    pub fn has_runs_on(&self) -> bool {
        match &self.runs_on {
            None => false,
            Some(RunsOn::Label(label)) => !label.is_empty(),
            Some(RunsOn::Labels(labels)) => !labels.is_empty(),
            Some(RunsOn::Group(value)) => !value.is_null(),
        }
    }
}

impl RunsOn {
    /// Runner labels; for a group mapping, its `labels` entry.
    pub fn labels(&self) -> Vec<&str> {
        match self {
            RunsOn::Label(label) => vec![label.as_str()],
            RunsOn::Labels(labels) => labels.iter().map(String::as_str).collect(),
            RunsOn::Group(value) => match value.get("labels") {
                Some(Value::String(label)) => vec![label.as_str()],
                Some(Value::Sequence(items)) => items.iter().filter_map(Value::as_str).collect(),
                _ => Vec::new(),
            },
        }
    }
}
