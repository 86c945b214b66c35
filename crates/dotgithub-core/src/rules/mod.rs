//! The validation rule catalog and the engine that runs it.
//!
//! Every rule is a plain function over a context. Rules never stop each other:
//! the engine runs all of them and keeps every diagnostic in the order the
//! rules produced it. Only fatal conditions (a failed remote fetch, a
//! malformed remote manifest) come back as `Err`.

// ---------------------------------------------------------------------------
// Helper macro for concise rule lists
// ---------------------------------------------------------------------------

macro_rules! rules {
    ($check:ty; $($id:literal => $f:path),* $(,)?) => {
        vec![$(crate::rules::Rule { id: $id, check: $f as $check }),*]
    };
}

pub mod action;
pub mod job;
pub mod step;
pub mod workflow;

use crate::diagnostic::{Diagnostic, Subject};
use crate::error::Result;
use crate::model::{Action, Job, Step, Workflow};
use crate::repo::Repository;

// ---------------------------------------------------------------------------
// Rule
// ---------------------------------------------------------------------------

/// A fn-pointer rule.
pub struct Rule<F> {
    pub id: &'static str,
    pub check: F,
}

pub type ActionCheck = fn(&ActionContext<'_>) -> Result<Vec<Diagnostic>>;
pub type WorkflowCheck = fn(&WorkflowContext<'_>) -> Result<Vec<Diagnostic>>;
pub type JobCheck = fn(&JobContext<'_>) -> Result<Vec<Diagnostic>>;
pub type StepCheck = fn(&StepContext<'_>) -> Result<Vec<Diagnostic>>;

pub type ActionRule = Rule<ActionCheck>;
pub type WorkflowRule = Rule<WorkflowCheck>;
pub type JobRule = Rule<JobCheck>;
pub type StepRule = Rule<StepCheck>;

// ---------------------------------------------------------------------------
// Contexts
// ---------------------------------------------------------------------------

pub struct ActionContext<'a> {
    pub action: &'a Action,
    pub repo: &'a dyn Repository,
}

impl ActionContext<'_> {
    pub fn subject(&self) -> Subject {
        Subject::Action {
            action: self.action.dir_name.clone(),
        }
    }

    pub fn diagnostic(&self, code: &'static str, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, self.subject(), message)
    }
}

pub struct WorkflowContext<'a> {
    pub workflow: &'a Workflow,
    pub repo: &'a dyn Repository,
}

impl WorkflowContext<'_> {
    pub fn subject(&self) -> Subject {
        Subject::Workflow {
            workflow: self.workflow.file_name.clone(),
        }
    }

    pub fn diagnostic(&self, code: &'static str, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, self.subject(), message)
    }
}

pub struct JobContext<'a> {
    pub workflow: &'a Workflow,
    pub name: &'a str,
    pub job: &'a Job,
    pub repo: &'a dyn Repository,
}

impl JobContext<'_> {
    pub fn subject(&self) -> Subject {
        Subject::Job {
            workflow: self.workflow.file_name.clone(),
            job: self.name.to_string(),
        }
    }

    pub fn diagnostic(&self, code: &'static str, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(code, self.subject(), message)
    }
}

/// Where a step lives. Decides the subject and the code family (`A`/`W`).
#[derive(Clone, Copy)]
pub enum StepScope<'a> {
    Action(&'a Action),
    WorkflowJob {
        workflow: &'a Workflow,
        name: &'a str,
        job: &'a Job,
    },
}

impl StepScope<'_> {
    pub fn pick(&self, action_code: &'static str, workflow_code: &'static str) -> &'static str {
        match self {
            StepScope::Action(_) => action_code,
            StepScope::WorkflowJob { .. } => workflow_code,
        }
    }

    pub fn subject(&self, index: usize) -> Subject {
        match self {
            StepScope::Action(action) => Subject::ActionStep {
                action: action.dir_name.clone(),
                step: index,
            },
            StepScope::WorkflowJob { workflow, name, .. } => Subject::JobStep {
                workflow: workflow.file_name.clone(),
                job: name.to_string(),
                step: index,
            },
        }
    }
}

pub struct StepContext<'a> {
    pub scope: StepScope<'a>,
    pub index: usize,
    pub step: &'a Step,
    pub repo: &'a dyn Repository,
}

impl StepContext<'_> {
    /// Diagnostic coded `action_code` or `workflow_code` depending on scope.
    pub fn diagnostic(
        &self,
        action_code: &'static str,
        workflow_code: &'static str,
        message: impl Into<String>,
    ) -> Diagnostic {
        Diagnostic::new(
            self.scope.pick(action_code, workflow_code),
            self.scope.subject(self.index),
            message,
        )
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

pub struct Engine {
    action_rules: Vec<ActionRule>,
    workflow_rules: Vec<WorkflowRule>,
    job_rules: Vec<JobRule>,
    step_rules: Vec<StepRule>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            action_rules: action::default_rules(),
            workflow_rules: workflow::default_rules(),
            job_rules: job::default_rules(),
            step_rules: step::default_rules(),
        }
    }
}

impl Engine {
    pub fn new(
        action_rules: Vec<ActionRule>,
        workflow_rules: Vec<WorkflowRule>,
        job_rules: Vec<JobRule>,
        step_rules: Vec<StepRule>,
    ) -> Self {
        Self {
            action_rules,
            workflow_rules,
            job_rules,
            step_rules,
        }
    }

    /// Every diagnostic for every action, then every workflow.
    pub fn validate(&self, repo: &dyn Repository) -> Result<Vec<Diagnostic>> {
        let mut out = Vec::new();
        for action in repo.actions() {
            out.extend(self.validate_action(action, repo)?);
        }
        for workflow in repo.workflows() {
            out.extend(self.validate_workflow(workflow, repo)?);
        }
        Ok(out)
    }

    pub fn validate_action(&self, action: &Action, repo: &dyn Repository) -> Result<Vec<Diagnostic>> {
        let mut out = Vec::new();
        let ctx = ActionContext { action, repo };
        for rule in &self.action_rules {
            record(rule.id, (rule.check)(&ctx)?, &mut out);
        }
        for (index, step) in action.steps().iter().enumerate() {
            self.validate_step(StepScope::Action(action), index, step, repo, &mut out)?;
        }
        Ok(out)
    }

    pub fn validate_workflow(
        &self,
        workflow: &Workflow,
        repo: &dyn Repository,
    ) -> Result<Vec<Diagnostic>> {
        let mut out = Vec::new();
        let ctx = WorkflowContext { workflow, repo };
        for rule in &self.workflow_rules {
            record(rule.id, (rule.check)(&ctx)?, &mut out);
        }
        for (name, job) in &workflow.jobs {
            let ctx = JobContext {
                workflow,
                name,
                job,
                repo,
            };
            for rule in &self.job_rules {
                record(rule.id, (rule.check)(&ctx)?, &mut out);
            }
            let scope = StepScope::WorkflowJob {
                workflow,
                name,
                job,
            };
            for (index, step) in job.steps.iter().enumerate() {
                self.validate_step(scope, index, step, repo, &mut out)?;
            }
        }
        Ok(out)
    }

    fn validate_step(
        &self,
        scope: StepScope<'_>,
        index: usize,
        step: &Step,
        repo: &dyn Repository,
        out: &mut Vec<Diagnostic>,
    ) -> Result<()> {
        let ctx = StepContext {
            scope,
            index,
            step,
            repo,
        };
        for rule in &self.step_rules {
            record(rule.id, (rule.check)(&ctx)?, out);
        }
        Ok(())
    }
}

fn record(rule: &'static str, found: Vec<Diagnostic>, out: &mut Vec<Diagnostic>) {
    if !found.is_empty() {
        tracing::trace!(rule, count = found.len(), "rule reported findings");
    }
    out.extend(found);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
