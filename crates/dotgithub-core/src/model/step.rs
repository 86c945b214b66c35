use super::de;
use crate::paths;
use indexmap::IndexMap;
use serde::Deserialize;

/// One entry of a job's or composite action's `steps` list.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Step {
    #[serde(deserialize_with = "de::scalar")]
    pub id: String,
    #[serde(deserialize_with = "de::scalar")]
    pub name: String,
    #[serde(deserialize_with = "de::scalar")]
    pub uses: String,
    #[serde(deserialize_with = "de::string_map")]
    pub with: IndexMap<String, String>,
    #[serde(deserialize_with = "de::string_map")]
    pub env: IndexMap<String, String>,
    #[serde(deserialize_with = "de::scalar")]
    pub run: String,
    #[serde(deserialize_with = "de::scalar")]
    pub shell: String,
}

/// What a step's `uses` points at, before any lexical validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Uses<'a> {
    None,
    Docker(&'a str),
    Local(&'a str),
    External(&'a str),
}

impl Step {
    pub fn uses(&self) -> Uses<'_> {
        let uses = self.uses.as_str();
        if uses.is_empty() {
            Uses::None
        } else if uses.starts_with(paths::DOCKER_PREFIX) {
            Uses::Docker(uses)
        } else if paths::is_local_reference(uses) {
            Uses::Local(uses)
        } else {
            Uses::External(uses)
        }
    }

    /// Text that may carry expressions evaluated for this step: the script,
    /// then `with` values, then `env` values.
    pub fn expression_sources(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.run.as_str())
            .chain(self.with.values().map(String::as_str))
            .chain(self.env.values().map(String::as_str))
    }

    /// A `with` entry counts as provided only when it is non-empty.
    pub fn provides_input(&self, name: &str) -> bool {
        self.with.get(name).is_some_and(|v| !v.is_empty())
    }
}

/// First step in `steps` with the given id.
pub fn find_step<'a>(steps: &'a [Step], id: &str) -> Option<&'a Step> {
    steps.iter().find(|s| !s.id.is_empty() && s.id == id)
}

/// Ids that appear more than once, each reported once, in first-seen order.
pub fn duplicate_step_ids(steps: &[Step]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    let mut duplicates: Vec<&str> = Vec::new();
    for step in steps.iter().filter(|s| !s.id.is_empty()) {
        if seen.contains(&step.id.as_str()) {
            if !duplicates.contains(&step.id.as_str()) {
                duplicates.push(&step.id);
            }
        } else {
            seen.push(&step.id);
        }
    }
    duplicates
}
