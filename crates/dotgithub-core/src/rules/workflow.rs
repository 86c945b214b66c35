use super::{WorkflowCheck, WorkflowContext, WorkflowRule};
use crate::diagnostic::{Diagnostic, Subject};
use crate::error::Result;
use crate::expr::{self, Expression};
use crate::paths;

/// Secrets every workflow may use without an allow-list entry.
const BUILTIN_SECRETS: &[&str] = &["GITHUB_TOKEN"];

pub fn default_rules() -> Vec<WorkflowRule> {
    rules![WorkflowCheck;
        "workflow-filename" => file_name,
        "workflow-filename-yml-extension" => file_extension,
        "workflow-env" => env_names,
        "workflow-missing-fields" => missing_fields,
        "workflow-only-job-main" => only_job_main,
        "workflow-inputs" => inputs,
        "workflow-called-variable-names" => called_variable_names,
        "workflow-bare-expressions" => bare_expressions,
        "workflow-called-inputs" => called_inputs,
        "workflow-needs" => needs,
        "workflow-vars-allow-list" => vars_allow_list,
        "workflow-secrets-allow-list" => secrets_allow_list,
        "workflow-quoted-expressions" => quoted_expressions,
    ]
}

fn file_name(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    if paths::is_valid_workflow_file_name(&ctx.workflow.file_name) {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.diagnostic(
        "NW101",
        "Workflow file name should contain alphanumeric characters and hyphens only",
    )])
}

fn file_extension(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    if ctx.workflow.file_name.ends_with(".yml") {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.diagnostic("NW102", "Workflow file name should have .yml extension")])
}

fn env_names(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(ctx
        .workflow
        .env
        .keys()
        .filter(|name| !paths::is_uppercase_with_underscores(name))
        .map(|name| {
            ctx.diagnostic(
                "NW103",
                format!("Env variable name '{name}' should contain uppercase alphanumeric characters and underscore only"),
            )
        })
        .collect())
}

fn missing_fields(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    if ctx.workflow.name.is_empty() {
        return Ok(vec![ctx.diagnostic("NW104", "Workflow name is empty")]);
    }
    Ok(Vec::new())
}

fn only_job_main(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    let jobs = &ctx.workflow.jobs;
    if jobs.len() == 1 && !jobs.contains_key("main") {
        return Ok(vec![ctx.diagnostic(
            "NW106",
            "When workflow has only one job, it should be named 'main'",
        )]);
    }
    Ok(Vec::new())
}

fn inputs(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for (placement, name, input) in ctx.workflow.inputs() {
        let subject = Subject::WorkflowInput {
            workflow: ctx.workflow.file_name.clone(),
            placement,
            input: name.to_string(),
        };
        if !paths::is_lowercase_with_hyphens(name) {
            out.push(Diagnostic::new(
                "NW108",
                subject.clone(),
                "Workflow input name should contain lowercase alphanumeric characters and hyphens only",
            ));
        }
        if input.description.is_empty() {
            out.push(Diagnostic::new("NW109", subject, "Workflow input must have a description"));
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Expressions in the whole document
// ---------------------------------------------------------------------------

fn called_variable_names(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::extract(&ctx.workflow.raw)
        .filter_map(|e| e.variable_name())
        .filter(|name| !paths::is_uppercase_with_underscores(name))
        .map(|name| {
            ctx.diagnostic(
                "NW107",
                format!("Called variable name '{name}' should contain uppercase alphanumeric characters and underscore only"),
            )
        })
        .collect())
}

fn bare_expressions(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::extract(&ctx.workflow.raw)
        .filter_map(|e| match e {
            Expression::Bare(value) if value != "true" && value != "false" => Some(value),
            _ => None,
        })
        .map(|value| {
            ctx.diagnostic(
                "EW201",
                format!("Called variable '{value}' is invalid"),
            )
        })
        .collect())
}

fn called_inputs(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::extract(&ctx.workflow.raw)
        .filter_map(|e| match e {
            Expression::Inputs(name) if !ctx.workflow.has_input(name) => Some(name),
            _ => None,
        })
        .map(|name| ctx.diagnostic("EW202", format!("Called input '{name}' does not exist")))
        .collect())
}

fn needs(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    let jobs = &ctx.workflow.jobs;
    let mut out = Vec::new();
    for (name, job) in jobs {
        let invalid = job
            .needs
            .iter()
            .filter(|n| n.as_str() == name || !jobs.contains_key(n.as_str()));
        for need in invalid {
            out.push(ctx.diagnostic(
                "EW203",
                format!("Job '{name}' has invalid value '{need}' in 'needs' field"),
            ));
        }
    }
    Ok(out)
}

fn vars_allow_list(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    if !ctx.repo.has_vars_file() {
        return Ok(Vec::new());
    }
    Ok(expr::extract(&ctx.workflow.raw)
        .filter_map(|e| match e {
            Expression::Vars(name) if !ctx.repo.var_exists(name) => Some(name),
            _ => None,
        })
        .map(|name| {
            ctx.diagnostic(
                "EW254",
                format!("Called variable '{name}' does not exist in provided list of available vars"),
            )
        })
        .collect())
}

fn secrets_allow_list(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    if !ctx.repo.has_secrets_file() {
        return Ok(Vec::new());
    }
    Ok(expr::extract(&ctx.workflow.raw)
        .filter_map(|e| match e {
            Expression::Secrets(name)
                if !BUILTIN_SECRETS.contains(&name) && !ctx.repo.secret_exists(name) =>
            {
                Some(name)
            }
            _ => None,
        })
        .map(|name| {
            ctx.diagnostic(
                "EW255",
                format!("Called secret '{name}' does not exist in provided list of available secrets"),
            )
        })
        .collect())
}

fn quoted_expressions(ctx: &WorkflowContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(expr::quoted(&ctx.workflow.raw)
        .map(|inner| {
            ctx.diagnostic(
                "WW201",
                format!("Called variable '{inner}' may not need to be in double quotes"),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workflow;
    use crate::repo::DotGithub;
    use crate::rules::tests::{codes, offline_repo};
    use crate::rules::Engine;

    fn check_in(repo: &DotGithub, file_name: &str, raw: &str) -> Vec<Diagnostic> {
        let workflow = Workflow::parse(file_name, format!("workflows/{file_name}"), raw).unwrap();
        Engine::default().validate_workflow(&workflow, repo).unwrap()
    }

    fn check(file_name: &str, raw: &str) -> Vec<Diagnostic> {
        check_in(&offline_repo(), file_name, raw)
    }

    const GOOD: &str = r#"
name: CI
on:
  workflow_dispatch:
    inputs:
      version:
        description: Version
env:
  REGION: ${{ vars.REGION }}
jobs:
  main:
    runs-on: ubuntu-22.04
    steps:
      - run: deploy ${{ inputs.version }} --region $REGION --token ${{ secrets.DEPLOY_TOKEN }}
"#;

    #[test]
    fn clean_workflow_has_no_findings() {
        assert!(check("ci.yml", GOOD).is_empty());
    }

    #[test]
    fn file_name_rules() {
        assert_eq!(codes(&check("ci.yaml", GOOD)), vec!["NW102"]);
        assert_eq!(codes(&check("Build_CI.yml", GOOD)), vec!["NW101"]);
        assert!(check("_reusable.yml", GOOD).is_empty());
    }

    #[test]
    fn env_names_and_empty_name() {
        let found = check("ci.yml", "name: ''\nenv:\n  lower: x\njobs:\n  main:\n    runs-on: x\n");
        assert_eq!(codes(&found), vec!["NW103", "NW104"]);
    }

    #[test]
    fn single_job_must_be_main() {
        let found = check("ci.yml", "jobs:\n  build:\n    runs-on: ubuntu-22.04\n");
        assert_eq!(codes(&found), vec!["NW106"]);
        let found = check(
            "ci.yml",
            "jobs:\n  build:\n    runs-on: ubuntu-22.04\n  test:\n    runs-on: ubuntu-22.04\n",
        );
        assert!(found.is_empty());
    }

    #[test]
    fn workflow_inputs() {
        let found = check(
            "ci.yml",
            "on:\n  workflow_call:\n    inputs:\n      Env_Name:\n        type: string\njobs:\n  main:\n    runs-on: x\n",
        );
        assert_eq!(codes(&found), vec!["NW108", "NW109"]);
        assert_eq!(found[0].subject.label(), "workflow ci.yml call input Env_Name");
    }

    #[test]
    fn expression_rules() {
        let found = check(
            "ci.yml",
            "jobs:\n  main:\n    runs-on: x\n    if: ${{ always }}\n    steps:\n      - run: echo ${{ inputs.missing }} ${{ vars.lower }}\n",
        );
        assert_eq!(codes(&found), vec!["NW107", "EW201", "EW202"]);
    }

    #[test]
    fn needs_must_exist() {
        let found = check(
            "ci.yml",
            "jobs:\n  build:\n    runs-on: x\n  test:\n    runs-on: x\n    needs: [build, lint]\n",
        );
        assert_eq!(codes(&found), vec!["EW203"]);
        assert!(found[0].message.contains("'lint'"));
    }

    #[test]
    fn job_cannot_need_itself() {
        let found = check(
            "ci.yml",
            "jobs:\n  build:\n    runs-on: x\n    needs: build\n  test:\n    runs-on: x\n    needs: build\n",
        );
        assert_eq!(codes(&found), vec!["EW203"]);
        assert_eq!(
            found[0].message,
            "Job 'build' has invalid value 'build' in 'needs' field"
        );
    }

    #[test]
    fn allow_lists_apply_only_when_loaded() {
        let raw = "jobs:\n  main:\n    runs-on: x\n    steps:\n      - run: x ${{ vars.REGION }} ${{ vars.ZONE }} ${{ secrets.GITHUB_TOKEN }} ${{ secrets.NPM_TOKEN }}\n";
        assert!(check("ci.yml", raw).is_empty());

        let mut repo = offline_repo();
        repo.set_vars(vec!["REGION".to_string()]);
        repo.set_secrets(Vec::new());
        let found = check_in(&repo, "ci.yml", raw);
        assert_eq!(codes(&found), vec!["EW254", "EW255"]);
        assert_eq!(
            found[0].message,
            "Called variable 'ZONE' does not exist in provided list of available vars"
        );
        assert_eq!(
            found[1].message,
            "Called secret 'NPM_TOKEN' does not exist in provided list of available secrets"
        );
    }

    #[test]
    fn quoted_expressions_warn() {
        let found = check(
            "ci.yml",
            "jobs:\n  main:\n    runs-on: x\n    steps:\n      - run: echo \"${{ inputs.name }}\"\n        env:\n          X: \"${{ true }}\"\n",
        );
        let codes = codes(&found);
        assert!(codes.contains(&"WW201"));
        assert!(codes.iter().all(|c| !c.starts_with("WA")));
    }
}
