//! The lookup surface the rules run against.

use crate::error::Result;
use crate::external::ExternalActionResolver;
use crate::model::{Action, Workflow};
use crate::outputs::{self, OutputLookup};
use indexmap::IndexMap;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Cross-entity lookups used by the rules. Rules never see how entities were
/// loaded; tests build a [`DotGithub`] in memory.
pub trait Repository {
    /// Local actions, ordered by directory name.
    fn actions(&self) -> Vec<&Action>;

    /// Workflows, ordered by file name.
    fn workflows(&self) -> Vec<&Workflow>;

    fn action(&self, name: &str) -> Option<&Action>;

    fn workflow(&self, file_name: &str) -> Option<&Workflow>;

    /// Fetch an external action into the cache if it is not there yet.
    fn download_external_action(&self, reference: &str) -> Result<()>;

    /// A previously downloaded external action, if it exists.
    fn external_action(&self, reference: &str) -> Option<Arc<Action>>;

    fn workflow_job_step_output(
        &self,
        workflow: &str,
        job: &str,
        step: &str,
        output: &str,
    ) -> Result<OutputLookup>;

    fn is_workflow_job_step_output_exist(
        &self,
        workflow: &str,
        job: &str,
        step: &str,
        output: &str,
    ) -> Result<bool> {
        Ok(self.workflow_job_step_output(workflow, job, step, output)? == OutputLookup::Found)
    }

    /// Whether `name` has a non-empty value in the workflow's or the job's `env`.
    fn is_env_exist_in_workflow_or_job(&self, workflow: &str, job: &str, name: &str) -> bool;

    fn has_vars_file(&self) -> bool;

    fn has_secrets_file(&self) -> bool;

    fn var_exists(&self, name: &str) -> bool;

    fn secret_exists(&self, name: &str) -> bool;
}

// ---------------------------------------------------------------------------
// DotGithub
// ---------------------------------------------------------------------------

/// An in-memory `.github` directory.
pub struct DotGithub {
    pub(crate) root: PathBuf,
    actions: BTreeMap<String, Action>,
    workflows: BTreeMap<String, Workflow>,
    vars: Option<HashSet<String>>,
    secrets: Option<HashSet<String>>,
    resolver: ExternalActionResolver,
}

impl DotGithub {
    pub fn new(resolver: ExternalActionResolver) -> Self {
        Self {
            root: PathBuf::new(),
            actions: BTreeMap::new(),
            workflows: BTreeMap::new(),
            vars: None,
            secrets: None,
            resolver,
        }
    }

    /// Directory the entities were loaded from; empty when built in memory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn add_action(&mut self, action: Action) {
        self.actions.insert(action.dir_name.clone(), action);
    }

    pub fn add_workflow(&mut self, workflow: Workflow) {
        self.workflows.insert(workflow.file_name.clone(), workflow);
    }

    pub fn set_vars<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.vars = Some(names.into_iter().collect());
    }

    pub fn set_secrets<I: IntoIterator<Item = String>>(&mut self, names: I) {
        self.secrets = Some(names.into_iter().collect());
    }

    pub fn resolver(&self) -> &ExternalActionResolver {
        &self.resolver
    }
}

impl Repository for DotGithub {
    fn actions(&self) -> Vec<&Action> {
        self.actions.values().collect()
    }

    fn workflows(&self) -> Vec<&Workflow> {
        self.workflows.values().collect()
    }

    fn action(&self, name: &str) -> Option<&Action> {
        self.actions.get(name)
    }

    fn workflow(&self, file_name: &str) -> Option<&Workflow> {
        self.workflows.get(file_name)
    }

    fn download_external_action(&self, reference: &str) -> Result<()> {
        self.resolver.resolve(reference).map(|_| ())
    }

    fn external_action(&self, reference: &str) -> Option<Arc<Action>> {
        self.resolver.cached(reference)
    }

    fn workflow_job_step_output(
        &self,
        workflow: &str,
        job: &str,
        step: &str,
        output: &str,
    ) -> Result<OutputLookup> {
        match self.workflows.get(workflow).and_then(|w| w.job(job)) {
            Some(job) => outputs::step_output(&job.steps, step, output, self),
            None => Ok(OutputLookup::StepNotFound),
        }
    }

    fn is_env_exist_in_workflow_or_job(&self, workflow: &str, job: &str, name: &str) -> bool {
        let Some(w) = self.workflows.get(workflow) else {
            return false;
        };
        let declared =
            |env: &IndexMap<String, String>| env.get(name).is_some_and(|v| !v.is_empty());
        declared(&w.env) || w.job(job).is_some_and(|j| declared(&j.env))
    }

    fn has_vars_file(&self) -> bool {
        self.vars.is_some()
    }

    fn has_secrets_file(&self) -> bool {
        self.secrets.is_some()
    }

    fn var_exists(&self, name: &str) -> bool {
        self.vars.as_ref().is_some_and(|v| v.contains(name))
    }

    fn secret_exists(&self, name: &str) -> bool {
        self.secrets.as_ref().is_some_and(|s| s.contains(name))
    }
}
