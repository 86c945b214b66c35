use super::{JobCheck, JobContext, JobRule};
use crate::diagnostic::Diagnostic;
use crate::error::Result;
use crate::expr::{self, Expression};
use crate::model::step;
use crate::outputs::OutputLookup;
use crate::paths;

pub fn default_rules() -> Vec<JobRule> {
    rules![JobCheck;
        "job-name" => name,
        "job-env" => env_names,
        "job-uses-or-runs-on" => uses_or_runs_on,
        "job-runs-on-latest" => runs_on_latest,
        "job-local-workflow" => local_workflow,
        "job-duplicate-step-ids" => duplicate_step_ids,
        "job-outputs" => outputs,
    ]
}

fn name(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    if paths::is_lowercase_with_hyphens(ctx.name) {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.diagnostic(
        "NW501",
        "Workflow job name should contain lowercase alphanumeric characters and hyphens only",
    )])
}

fn env_names(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(ctx
        .job
        .env
        .keys()
        .filter(|name| !paths::is_uppercase_with_underscores(name))
        .map(|name| {
            ctx.diagnostic(
                "NW502",
                format!("Env variable name '{name}' should contain uppercase alphanumeric characters and underscore only"),
            )
        })
        .collect())
}

fn uses_or_runs_on(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    let uses = !ctx.job.uses.is_empty();
    let runs_on = ctx.job.has_runs_on();
    let found = match (uses, runs_on) {
        (false, false) => Some(ctx.diagnostic(
            "EW601",
            "Workflow job should have either 'uses' or 'runs-on'",
        )),
        (true, true) => Some(ctx.diagnostic(
            "EW603",
            "Workflow job should not have both 'uses' and 'runs-on'",
        )),
        _ => None,
    };
    Ok(found.into_iter().collect())
}

fn runs_on_latest(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    let Some(runs_on) = &ctx.job.runs_on else {
        return Ok(Vec::new());
    };
    Ok(runs_on
        .labels()
        .into_iter()
        .filter(|label| label.contains("latest"))
        .map(|label| {
            ctx.diagnostic(
                "EW602",
                format!("Workflow job should not have 'latest' in 'runs-on' ('{label}')"),
            )
        })
        .collect())
}

fn local_workflow(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    let uses = ctx.job.uses.as_str();
    if !paths::is_local_reference(uses) {
        return Ok(Vec::new());
    }
    let exists = uses
        .strip_prefix(paths::LOCAL_WORKFLOW_PREFIX)
        .is_some_and(|file| ctx.repo.workflow(file).is_some());
    if exists {
        return Ok(Vec::new());
    }
    Ok(vec![ctx.diagnostic(
        "EW604",
        format!("Call to non-existing workflow '{uses}'"),
    )])
}

fn duplicate_step_ids(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    Ok(step::duplicate_step_ids(&ctx.job.steps)
        .into_iter()
        .map(|id| ctx.diagnostic("EW605", format!("Step id '{id}' is used more than once")))
        .collect())
}

fn outputs(ctx: &JobContext<'_>) -> Result<Vec<Diagnostic>> {
    let mut out = Vec::new();
    for (name, value) in &ctx.job.outputs {
        for e in expr::extract(value) {
            let Expression::StepOutput { step, output } = e else {
                continue;
            };
            let lookup = ctx.repo.workflow_job_step_output(
                &ctx.workflow.file_name,
                ctx.name,
                step,
                output,
            )?;
            match lookup {
                OutputLookup::Found => {}
                OutputLookup::StepNotFound => out.push(ctx.diagnostic(
                    "EW606",
                    format!("Job output '{name}' refers to step with id '{step}' which does not exist"),
                )),
                OutputLookup::OutputNotFound => out.push(ctx.diagnostic(
                    "EW607",
                    format!("Job output '{name}' refers to step with id '{step}' output '{output}' which does not exist"),
                )),
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Workflow;
    use crate::repo::{DotGithub, Repository};
    use crate::rules::tests::{codes, offline_repo};
    use crate::rules::Engine;

    fn repo(workflows: &[(&str, &str)]) -> DotGithub {
        let mut repo = offline_repo();
        for (file, raw) in workflows {
            repo.add_workflow(Workflow::parse(*file, format!("workflows/{file}"), *raw).unwrap());
        }
        repo
    }

    fn check(raw: &str) -> Vec<Diagnostic> {
        let repo = repo(&[("ci.yml", raw)]);
        let workflow = repo.workflow("ci.yml").unwrap();
        Engine::default().validate_workflow(workflow, &repo).unwrap()
    }

    #[test]
    fn job_name_and_env() {
        let found = check("jobs:\n  Main_Job:\n    runs-on: x\n    env:\n      lower: x\n  other:\n    runs-on: x\n");
        assert_eq!(codes(&found), vec!["NW501", "NW502"]);
        assert_eq!(found[0].subject.label(), "workflow ci.yml job Main_Job");
    }

    #[test]
    fn execution_mode() {
        let found = check("jobs:\n  build-a:\n    steps: []\n  build-b:\n    uses: org/repo/.github/workflows/x.yml@v1\n    runs-on: x\n");
        assert_eq!(codes(&found), vec!["EW601", "EW603"]);
    }

    #[test]
    fn latest_runner_labels() {
        let found = check(
            "jobs:\n  build-a:\n    runs-on: ubuntu-latest\n  build-b:\n    runs-on: [self-hosted, macos-latest, windows-latest]\n",
        );
        assert_eq!(codes(&found), vec!["EW602", "EW602", "EW602"]);
    }

    #[test]
    fn local_reusable_workflows() {
        let repo = repo(&[
            (
                "ci.yml",
                "jobs:\n  call-build:\n    uses: ./.github/workflows/build.yml\n  call-missing:\n    uses: ./.github/workflows/missing.yml\n",
            ),
            ("build.yml", "on: workflow_call\njobs:\n  main:\n    runs-on: x\n"),
        ]);
        let workflow = repo.workflow("ci.yml").unwrap();
        let found = Engine::default().validate_workflow(workflow, &repo).unwrap();
        assert_eq!(codes(&found), vec!["EW604"]);
        assert!(found[0].message.contains("missing.yml"));
    }

    #[test]
    fn duplicate_step_ids() {
        let found = check("jobs:\n  main:\n    runs-on: x\n    steps:\n      - id: a\n        run: x\n      - id: a\n        run: y\n");
        assert_eq!(codes(&found), vec!["EW605"]);
    }

    #[test]
    fn job_outputs_resolve_against_steps() {
        let found = check(
            r#"
jobs:
  main:
    runs-on: x
    outputs:
      tag: ${{ steps.meta.outputs.tag }}
      sha: ${{ steps.meta.outputs.sha }}
      gone: ${{ steps.nothing.outputs.x }}
    steps:
      - id: meta
        run: echo "tag=v1" >> "$GITHUB_OUTPUT"
"#,
        );
        assert_eq!(codes(&found), vec!["EW607", "EW606"]);
        assert!(found[0].message.contains("'sha'"));
    }
}
