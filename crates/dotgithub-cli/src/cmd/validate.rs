use crate::output::{print_diagnostics, print_json};
use anyhow::Context;
use clap::Args;
use dotgithub_core::config::{ValidatorConfig, WarnLevel};
use dotgithub_core::diagnostic::{Diagnostic, Summary};
use dotgithub_core::repo::{DotGithub, Repository};
use dotgithub_core::rules::Engine;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the .github directory
    #[arg(long, short = 'p', env = "GITHUB_ACTIONS_VALIDATOR_PATH")]
    pub path: PathBuf,

    /// Check called variable names against this file (one per line)
    #[arg(long, short = 'z', env = "GITHUB_ACTIONS_VALIDATOR_VARS_FILE")]
    pub vars_file: Option<PathBuf>,

    /// Check called secret names against this file (one per line)
    #[arg(long, short = 's', env = "GITHUB_ACTIONS_VALIDATOR_SECRETS_FILE")]
    pub secrets_file: Option<PathBuf>,

    /// Config file (default: <path>/validator.yaml when present)
    #[arg(long, short = 'c', env = "GITHUB_ACTIONS_VALIDATOR_CONFIG")]
    pub config: Option<PathBuf>,

    /// Timeout in seconds for each external action request (0 disables)
    #[arg(long, value_name = "SECS", env = "GITHUB_ACTIONS_VALIDATOR_FETCH_TIMEOUT")]
    pub fetch_timeout: Option<u64>,

    /// Base URL external action manifests are fetched from
    #[arg(long, value_name = "URL", env = "GITHUB_ACTIONS_VALIDATOR_BASE_URL")]
    pub base_url: Option<String>,

    /// Extra attempts after a failed external action request
    #[arg(long, value_name = "N", env = "GITHUB_ACTIONS_VALIDATOR_FETCH_RETRIES")]
    pub fetch_retries: Option<u32>,
}

#[derive(Serialize)]
struct Report<'a> {
    diagnostics: &'a [Diagnostic],
    summary: Summary,
}

pub fn run(args: &ValidateArgs, json: bool) -> anyhow::Result<()> {
    anyhow::ensure!(
        args.path.is_dir(),
        "{} is not an existing directory",
        args.path.display()
    );

    let config = resolve_config(args)?;
    let mut invalid = Vec::new();
    for w in config.validate() {
        match w.level {
            WarnLevel::Error => invalid.push(w.message),
            WarnLevel::Warning => tracing::warn!("{}", w.message),
        }
    }
    if !invalid.is_empty() {
        anyhow::bail!("invalid configuration: {}", invalid.join("; "));
    }

    let repo = DotGithub::load(&args.path, &config)
        .with_context(|| format!("failed to load {}", args.path.display()))?;
    tracing::debug!(
        actions = repo.actions().len(),
        workflows = repo.workflows().len(),
        "loaded .github directory"
    );

    let diagnostics = Engine::default()
        .validate(&repo)
        .context("validation aborted")?;

    if json {
        print_json(&Report {
            diagnostics: &diagnostics,
            summary: Summary::of(&diagnostics),
        })
    } else {
        print_diagnostics(&diagnostics);
        Ok(())
    }
}

/// Config file first, then flag and environment overrides.
fn resolve_config(args: &ValidateArgs) -> anyhow::Result<ValidatorConfig> {
    let mut config = match &args.config {
        Some(path) => ValidatorConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ValidatorConfig::discover(&args.path).context("failed to load validator.yaml")?,
    };

    if let Some(path) = &args.vars_file {
        config.vars_file = Some(path.clone());
    }
    if let Some(path) = &args.secrets_file {
        config.secrets_file = Some(path.clone());
    }
    if let Some(secs) = args.fetch_timeout {
        config.fetch.timeout_secs = secs;
    }
    if let Some(url) = &args.base_url {
        config.fetch.base_url = url.trim_end_matches('/').to_string();
    }
    if let Some(retries) = args.fetch_retries {
        config.fetch.retries = retries;
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(path: PathBuf) -> ValidateArgs {
        ValidateArgs {
            path,
            vars_file: None,
            secrets_file: None,
            config: None,
            fetch_timeout: None,
            base_url: None,
            fetch_retries: None,
        }
    }

    #[test]
    fn flags_override_discovered_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("validator.yaml"),
            "fetch:\n  timeout_secs: 5\n  retries: 1\nvars_file: vars.txt\n",
        )
        .unwrap();

        let mut args = args(dir.path().to_path_buf());
        args.fetch_timeout = Some(9);
        args.base_url = Some("http://127.0.0.1:8080/".to_string());

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.fetch.timeout_secs, 9);
        assert_eq!(config.fetch.retries, 1);
        assert_eq!(config.fetch.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.vars_file, Some(dir.path().join("vars.txt")));
    }

    #[test]
    fn explicit_config_replaces_discovery() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("validator.yaml"), "fetch:\n  retries: 3\n").unwrap();
        let other = dir.path().join("other.yaml");
        std::fs::write(&other, "secrets_file: secrets.txt\n").unwrap();

        let mut args = args(dir.path().to_path_buf());
        args.config = Some(other);

        let config = resolve_config(&args).unwrap();
        assert_eq!(config.fetch.retries, 0);
        assert_eq!(config.secrets_file, Some(dir.path().join("secrets.txt")));
    }
}
