use super::{StepCheck, StepContext, StepRule, StepScope};
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::expr::{self, Expression};
use crate::model::{Action, Uses};
use crate::outputs::{self, OutputLookup};
use crate::paths;

/// Env names the runner provides to every step.
fn is_runner_env(name: &str) -> bool {
    name == "CI" || name.starts_with("GITHUB_") || name.starts_with("RUNNER_")
}

pub fn default_rules() -> Vec<StepRule> {
    rules![StepCheck;
        "step-env" => env_names,
        "step-uses" => uses,
        "step-called-step-outputs" => called_step_outputs,
        "step-called-env" => called_env,
    ]
}

fn env_names(ctx: &StepContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(ctx
        .step
        .env
        .keys()
        .filter(|name| !paths::is_uppercase_with_underscores(name))
        .map(|name| {
            ctx.diagnostic(
                "NA701",
                "NW701",
                format!("Env variable name '{name}' should contain uppercase alphanumeric characters and underscore only"),
            )
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Invocations
// ---------------------------------------------------------------------------

fn uses(ctx: &StepContext<'_>) -> Result<Vec<Diagnostic>> {
    match ctx.step.uses() {
        Uses::None | Uses::Docker(_) => Ok(Vec::new()),
        Uses::Local(uses) => Ok(local_action(ctx, uses)),
        Uses::External(uses) => external_action(ctx, uses),
    }
}

fn local_action(ctx: &StepContext<'_>, uses: &str) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    if !paths::is_local_action_path(uses) {
        out.push(ctx.diagnostic(
            "EA802",
            "EW802",
            format!("Path to local action '{uses}' is invalid"),
        ));
    }
    match ctx.repo.action(paths::local_action_name(uses)) {
        Some(action) => {
            out.extend(inputs_against(ctx, action, uses, "local", ("EA804", "EW804"), ("EA805", "EW805")));
        }
        None => out.push(ctx.diagnostic(
            "EA803",
            "EW803",
            format!("Call to non-existing local action '{uses}'"),
        )),
    }
    out
}

fn external_action(ctx: &StepContext<'_>, uses: &str) -> Result<Vec<Diagnostic>> {
    if !paths::is_external_action_ref(uses) {
        return Ok(vec![ctx.diagnostic(
            "EA801",
            "EW801",
            format!("Path to external action '{uses}' is invalid"),
        )]);
    }
    ctx.repo.download_external_action(uses)?;
    let Some(action) = ctx.repo.external_action(uses) else {
        return Ok(vec![ctx.diagnostic(
            "EA808",
            "EW808",
            format!("Call to non-existing external action '{uses}'"),
        )]);
    };
    Ok(inputs_against(ctx, &action, uses, "external", ("EA806", "EW806"), ("EA807", "EW807")))
}

/// Required inputs the step leaves out, then `with` keys the action does not
/// declare. `kind` is `local` or `external`; codes are `(action family,
/// workflow family)` pairs.
fn inputs_against(
    ctx: &StepContext<'_>,
    action: &Action,
    uses: &str,
    kind: &str,
    missing: (&'static str, &'static str),
    unknown: (&'static str, &'static str),
) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for name in action.required_inputs() {
        if !ctx.step.provides_input(name) {
            out.push(ctx.diagnostic(
                missing.0,
                missing.1,
                format!("Required input '{name}' missing for {kind} action '{uses}'"),
            ));
        }
    }
    for name in ctx.step.with.keys() {
        if !action.has_input(name) {
            out.push(ctx.diagnostic(
                unknown.0,
                unknown.1,
                format!("Input '{name}' does not exist in {kind} action '{uses}'"),
            ));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Expressions evaluated by a workflow step
// ---------------------------------------------------------------------------

fn called_step_outputs(ctx: &StepContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for source in ctx.step.expression_sources() {
        for e in expr::extract(source) {
            let Expression::StepOutput { step, output } = e else {
                continue;
            };
            let lookup = match ctx.scope {
                StepScope::Action(action) => {
                    outputs::step_output(action.steps(), step, output, ctx.repo)?
                }
                StepScope::WorkflowJob { workflow, name, .. } => ctx
                    .repo
                    .workflow_job_step_output(&workflow.file_name, name, step, output)?,
            };
            match lookup {
                OutputLookup::Found => {}
                OutputLookup::StepNotFound => out.push(ctx.diagnostic(
                    "EA809",
                    "EW809",
                    format!("Called step with id '{step}' does not exist"),
                )),
                OutputLookup::OutputNotFound => out.push(ctx.diagnostic(
                    "EA811",
                    "EW811",
                    format!("Called step with id '{step}' output '{output}' does not exist"),
                )),
            }
        }
    }
    Ok(out)
}

fn called_env(ctx: &StepContext<'_>) -> Result<Vec<Diagnostic>> {
    let StepScope::WorkflowJob { workflow, name, .. } = ctx.scope else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for source in ctx.step.expression_sources() {
        for e in expr::extract(source) {
            let Expression::Env(var) = e else {
                continue;
            };
            if is_runner_env(var)
                || ctx.step.env.get(var).is_some_and(|value| !value.is_empty())
                || ctx
                    .repo
                    .is_env_exist_in_workflow_or_job(&workflow.file_name, name, var)
            {
                continue;
            }
            out.push(Diagnostic::new(
                "WW101",
                ctx.scope.subject(ctx.index),
                format!("Called env var '{var}' not found in global, job or step 'env' block - check it"),
            ));
        }
    }
    Ok(out)
}
