use crate::model::InputPlacement;
use serde::{Serialize, Serializer};
use std::fmt;

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Naming,
    Warning,
}

impl Severity {
    /// The first letter of a code is its severity class.
    pub fn from_code(code: &str) -> Self {
        match code.as_bytes().first() {
            Some(b'N') => Severity::Naming,
            Some(b'W') => Severity::Warning,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Naming => "naming",
            Severity::Warning => "warning",
        };
        write!(f, "{s}")
    }
}

// ---------------------------------------------------------------------------
// Subject
// ---------------------------------------------------------------------------

/// The entity a diagnostic is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    Action {
        action: String,
    },
    ActionInput {
        action: String,
        input: String,
    },
    ActionOutput {
        action: String,
        output: String,
    },
    ActionStep {
        action: String,
        step: usize,
    },
    Workflow {
        workflow: String,
    },
    WorkflowInput {
        workflow: String,
        placement: InputPlacement,
        input: String,
    },
    Job {
        workflow: String,
        job: String,
    },
    JobStep {
        workflow: String,
        job: String,
        step: usize,
    },
}

impl Subject {
    pub fn label(&self) -> String {
        match self {
            Subject::Action { action } => format!("action {action}"),
            Subject::ActionInput { action, input } => format!("action {action} input {input}"),
            Subject::ActionOutput { action, output } => format!("action {action} output {output}"),
            Subject::ActionStep { action, step } => format!("action {action} step {step}"),
            Subject::Workflow { workflow } => format!("workflow {workflow}"),
            Subject::WorkflowInput {
                workflow,
                placement,
                input,
            } => format!("workflow {workflow} {} input {input}", placement.as_str()),
            Subject::Job { workflow, job } => format!("workflow {workflow} job {job}"),
            Subject::JobStep {
                workflow,
                job,
                step,
            } => format!("workflow {workflow} job {job} step {step}"),
        }
    }

    /// Column the label is padded to in text output.
    pub fn width(&self) -> usize {
        match self {
            Subject::Action { .. } => 40,
            Subject::ActionInput { .. }
            | Subject::ActionOutput { .. }
            | Subject::ActionStep { .. }
            | Subject::Job { .. } => 60,
            Subject::Workflow { .. } | Subject::WorkflowInput { .. } | Subject::JobStep { .. } => 80,
        }
    }
}

impl Serialize for Subject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub code: &'static str,
    pub severity: Severity,
    pub subject: Subject,
    pub message: String,
}

impl Diagnostic {
    pub fn new(code: &'static str, subject: Subject, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: Severity::from_code(code),
            subject,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:<width$} {}",
            self.code,
            self.subject.label(),
            self.message,
            width = self.subject.width()
        )
    }
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub errors: usize,
    pub naming: usize,
    pub warnings: usize,
}

impl Summary {
    pub fn of(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Summary::default();
        for d in diagnostics {
            match d.severity {
                Severity::Error => summary.errors += 1,
                Severity::Naming => summary.naming += 1,
                Severity::Warning => summary.warnings += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.errors + self.naming + self.warnings
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} error(s), {} naming issue(s), {} warning(s)",
            self.errors, self.naming, self.warnings
        )
    }
}
