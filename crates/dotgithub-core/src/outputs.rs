use crate::error::Result;
use crate::expr;
use crate::model::step::{self, Step, Uses};
use crate::paths;
use crate::repo::Repository;

/// Outcome of looking up `steps.<id>.outputs.<name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputLookup {
    Found,
    StepNotFound,
    OutputNotFound,
}

/// Resolve an output of the step with id `step_id` among `steps`.
///
/// Script steps are scanned for `echo "name=..." >> $GITHUB_OUTPUT`; steps
/// that invoke an action are checked against that action's declared outputs.
/// External actions are fetched through the repository's resolver.
pub fn step_output(
    steps: &[Step],
    step_id: &str,
    output: &str,
    repo: &dyn Repository,
) -> Result<OutputLookup> {
    let Some(step) = step::find_step(steps, step_id) else {
        return Ok(OutputLookup::StepNotFound);
    };

    let found = match step.uses() {
        Uses::None => expr::script_outputs(&step.run).any(|name| name == output),
        Uses::Local(uses) if paths::is_local_action_path(uses) => repo
            .action(paths::local_action_name(uses))
            .is_some_and(|a| a.has_output(output)),
        Uses::External(uses) if paths::is_external_action_ref(uses) => {
            repo.download_external_action(uses)?;
            repo.external_action(uses)
                .is_some_and(|a| a.has_output(output))
        }
        _ => false,
    };

    Ok(if found {
        OutputLookup::Found
    } else {
        OutputLookup::OutputNotFound
    })
}
