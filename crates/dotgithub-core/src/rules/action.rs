use super::{ActionCheck, ActionContext, ActionRule};
use crate::diagnostic::{Diagnostic, Subject};
use crate::error::Result;
use crate::expr::{self, Expression};
use crate::model::step;
use crate::outputs::{self, OutputLookup};
use crate::paths;

pub fn default_rules() -> Vec<ActionRule> {
    rules![ActionCheck;
        "action-dirname" => dir_name,
        "action-filename-yml-extension" => file_name,
        "action-missing-fields" => missing_fields,
        "action-inputs" => inputs,
        "action-outputs" => outputs,
        "action-called-variable-names" => called_variable_names,
        "action-bare-expressions" => bare_expressions,
        "action-called-inputs" => called_inputs,
        "action-called-step-outputs" => called_step_outputs,
        "action-declared-output-values" => declared_output_values,
        "action-duplicate-step-ids" => duplicate_step_ids,
    ]
}

fn dir_name(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    if paths::is_lowercase_with_hyphens(&ctx.action.dir_name) {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.diagnostic(
        "NA101",
        "Action directory name should contain lowercase alphanumeric characters and hyphens only",
    )])
}

fn file_name(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    if paths::has_yml_extension(&ctx.action.path) {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.diagnostic("NA102", "Action file name should have .yml extension")])
}

fn missing_fields(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    if ctx.action.name.is_empty() {
        out.push(ctx.diagnostic("NA103", "Action name is empty"));
    }
    if ctx.action.description.is_empty() {
        out.push(ctx.diagnostic("NA104", "Action description is empty"));
    }
    Ok(out)
}

fn inputs(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for (name, input) in &ctx.action.inputs {
        let subject = Subject::ActionInput {
            action: ctx.action.dir_name.clone(),
            input: name.clone(),
        };
        if !paths::is_lowercase_with_hyphens(name) {
            out.push(Diagnostic::new(
                "NA301",
                subject.clone(),
                "Action input name should contain lowercase alphanumeric characters and hyphens only",
            ));
        }
        if input.description.is_empty() {
            out.push(Diagnostic::new("NA302", subject, "Action input must have a description"));
        }
    }
    Ok(out)
}

fn outputs(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for (name, output) in &ctx.action.outputs {
        let subject = Subject::ActionOutput {
            action: ctx.action.dir_name.clone(),
            output: name.clone(),
        };
        if !paths::is_lowercase_with_hyphens(name) {
            out.push(Diagnostic::new(
                "NA303",
                subject.clone(),
                "Action output name should contain lowercase alphanumeric characters and hyphens only",
            ));
        }
        if output.description.is_empty() {
            out.push(Diagnostic::new("NA304", subject, "Action output must have a description"));
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Expressions in the whole document
// ---------------------------------------------------------------------------

fn called_variable_names(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::extract(&ctx.action.raw)
        .filter_map(|e| e.variable_name())
        .filter(|name| !paths::is_uppercase_with_underscores(name))
        .map(|name| {
            ctx.diagnostic(
                "NA105",
                format!("Called variable name '{name}' should contain uppercase alphanumeric characters and underscore only"),
            )
        })
        .collect())
}

fn bare_expressions(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::extract(&ctx.action.raw)
        .filter_map(|e| match e {
            Expression::Bare(value) if value != "true" && value != "false" => Some(value),
            _ => None,
        })
        .map(|value| {
            ctx.diagnostic(
                "EA201",
                format!("Called variable '{value}' is invalid"),
            )
        })
        .collect())
}

fn called_inputs(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::extract(&ctx.action.raw)
        .filter_map(|e| match e {
            Expression::Inputs(name) if !ctx.action.has_input(name) => Some(name),
            _ => None,
        })
        .map(|name| ctx.diagnostic("EA202", format!("Called input '{name}' does not exist")))
        .collect())
}

fn called_step_outputs(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for e in expr::extract(&ctx.action.raw) {
        let Expression::StepOutput { step, .. } = e else {
            continue;
        };
        if !ctx.action.has_steps() {
            out.push(ctx.diagnostic(
                "EA203",
                format!("Called step with id '{step}' does not exist"),
            ));
        } else if step::find_step(ctx.action.steps(), step).is_none() {
            out.push(ctx.diagnostic(
                "EA204",
                format!("Called step with id '{step}' does not exist"),
            ));
        }
    }
    Ok(out)
}

/// Declared outputs whose `value` names an existing step but an output that
/// step never sets. References inside steps are checked per step.
fn declared_output_values(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    if !ctx.action.has_steps() {
        return Ok(Vec::new());
    }
    let mut out = Vec::new();
    for declared in ctx.action.outputs.values() {
        for e in expr::extract(&declared.value) {
            let Expression::StepOutput { step, output } = e else {
                continue;
            };
            if outputs::step_output(ctx.action.steps(), step, output, ctx.repo)?
                == OutputLookup::OutputNotFound
            {
                out.push(ctx.diagnostic(
                    "EA205",
                    format!("Called step with id '{step}' output '{output}' does not exist"),
                ));
            }
        }
    }
    Ok(out)
}

fn duplicate_step_ids(ctx: &ActionContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(step::duplicate_step_ids(ctx.action.steps())
        .into_iter()
        .map(|id| ctx.diagnostic("EA206", format!("Step id '{id}' is used more than once")))
        .collect())
}
