use super::de;
use super::step::{self, Step};
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::PathBuf;

/// A reusable action manifest (`action.yml`), local or fetched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Action {
    /// Directory name for local actions, the `uses` reference for external ones.
    #[serde(skip)]
    pub dir_name: String,
    #[serde(skip)]
    pub path: PathBuf,
    #[serde(skip)]
    pub raw: String,

    #[serde(deserialize_with = "de::scalar")]
    pub name: String,
    #[serde(deserialize_with = "de::scalar")]
    pub description: String,
    #[serde(deserialize_with = "de::null_as_default")]
    pub inputs: IndexMap<String, ActionInput>,
    #[serde(deserialize_with = "de::null_as_default")]
    pub outputs: IndexMap<String, ActionOutput>,
    #[serde(deserialize_with = "de::null_as_default")]
    pub runs: ActionRuns,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionInput {
    #[serde(deserialize_with = "de::scalar")]
    pub description: String,
    #[serde(deserialize_with = "de::scalar")]
    pub default: String,
    #[serde(deserialize_with = "de::truthy")]
    pub required: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionOutput {
    #[serde(deserialize_with = "de::scalar")]
    pub description: String,
    #[serde(deserialize_with = "de::scalar")]
    pub value: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActionRuns {
    #[serde(deserialize_with = "de::scalar")]
    pub using: String,
    #[serde(deserialize_with = "de::null_as_default")]
    pub steps: Vec<Step>,
}

impl Action {
    /// Decode `raw` into an action. Blank or comment-only text yields an
    /// action with every field empty.
    pub fn parse(
        dir_name: impl Into<String>,
        path: impl Into<PathBuf>,
        raw: impl Into<String>,
    ) -> Result<Self, serde_yaml::Error> {
        let raw = raw.into();
        let mut action = if raw.trim().is_empty() {
            Action::default()
        } else {
            let value: serde_yaml::Value = serde_yaml::from_str(&raw)?;
            if value.is_null() {
                Action::default()
            } else {
                serde_yaml::from_value(value)?
            }
        };
        action.dir_name = dir_name.into();
        action.path = path.into();
        action.raw = raw;
        Ok(action)
    }

    pub fn steps(&self) -> &[Step] {
        &self.runs.steps
    }

    pub fn has_steps(&self) -> bool {
        !self.runs.steps.is_empty()
    }

    pub fn step(&self, id: &str) -> Option<&Step> {
        step::find_step(&self.runs.steps, id)
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.contains_key(name)
    }

    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_key(name)
    }

    pub fn required_inputs(&self) -> impl Iterator<Item = &str> {
        self.inputs
            .iter()
            .filter(|(_, input)| input.required)
            .map(|(name, _)| name.as_str())
    }
}
