//! Decoded action and workflow manifests.
//!
//! Every collection defaults to empty and maps keep document order. Each
//! document also keeps its raw text, which the expression rules scan.

pub(crate) mod de;

pub mod action;
pub mod step;
pub mod workflow;

pub use action::{Action, ActionInput, ActionOutput, ActionRuns};
pub use step::{Step, Uses};
pub use workflow::{InputPlacement, Job, RunsOn, Workflow, WorkflowInput, WorkflowOn, WorkflowTrigger};
