use crate::config::ValidatorConfig;
use crate::error::{DotGithubError, Result};
use crate::external::ExternalActionResolver;
use crate::model::{Action, Workflow};
use crate::paths;
use crate::repo::DotGithub;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

impl DotGithub {
    /// Load every action and workflow under a `.github` directory, along with
    /// the allow-lists named in `config`.
    pub fn load(root: &Path, config: &ValidatorConfig) -> Result<Self> {
        let resolver = ExternalActionResolver::from_config(&config.fetch)?;
        Self::load_with(root, config, resolver)
    }

    /// Like [`DotGithub::load`] with a caller-supplied resolver.
    pub fn load_with(
        root: &Path,
        config: &ValidatorConfig,
        resolver: ExternalActionResolver,
    ) -> Result<Self> {
        if !root.is_dir() {
            return Err(DotGithubError::NotADirectory(root.to_path_buf()));
        }

        let mut repo = DotGithub::new(resolver);
        repo.root = root.to_path_buf();

        for (dir_name, path) in action_manifests(root)? {
            let raw = read(&path)?;
            let action = Action::parse(dir_name, &path, raw)
                .map_err(|source| DotGithubError::Parse { path, source })?;
            repo.add_action(action);
        }

        for path in workflow_files(root)? {
            let raw = read(&path)?;
            let workflow = Workflow::parse(paths::file_name(&path), &path, raw)
                .map_err(|source| DotGithubError::Parse { path, source })?;
            repo.add_workflow(workflow);
        }

        if let Some(path) = &config.vars_file {
            repo.set_vars(read_allow_list(path)?);
        }
        if let Some(path) = &config.secrets_file {
            repo.set_secrets(read_allow_list(path)?);
        }

        Ok(repo)
    }
}

// ---------------------------------------------------------------------------
// Discovery
// ---------------------------------------------------------------------------

/// `(directory name, manifest path)` for each directory under `actions/`
/// holding an `action.yml` or `action.yaml`. A missing `actions/` is fine.
fn action_manifests(root: &Path) -> Result<Vec<(String, PathBuf)>> {
    let dir = paths::actions_dir(root);
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        let entry_path = entry.path();
        if !entry_path.is_dir() {
            continue;
        }
        let manifest = paths::ACTION_MANIFESTS
            .iter()
            .map(|name| entry_path.join(name))
            .find(|p| p.is_file());
        match manifest {
            Some(path) => {
                found.push((entry.file_name().to_string_lossy().into_owned(), path));
            }
            None => {
                tracing::debug!(dir = %entry_path.display(), "skipping directory without action manifest");
            }
        }
    }
    Ok(found)
}

/// Regular `*.yml`/`*.yaml` files under `workflows/`, which must exist.
fn workflow_files(root: &Path) -> Result<Vec<PathBuf>> {
    let dir = paths::workflows_dir(root);
    if !dir.is_dir() {
        return Err(DotGithubError::NotADirectory(dir));
    }

    let mut found = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let path = entry?.path();
        if path.is_file() && paths::is_yaml_file_name(&paths::file_name(&path)) {
            found.push(path);
        }
    }
    Ok(found)
}

fn read(path: &Path) -> Result<String> {
    tracing::debug!(path = %path.display(), "reading");
    std::fs::read_to_string(path).map_err(|source| DotGithubError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Whitespace-separated names.
fn read_allow_list(path: &Path) -> Result<HashSet<String>> {
    Ok(parse_allow_list(&read(path)?))
}

pub(crate) fn parse_allow_list(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repo::Repository;
    use tempfile::TempDir;

    fn offline() -> ExternalActionResolver {
        let fetcher = |_: &str| -> Result<Option<String>> { Ok(None) };
        ExternalActionResolver::new("https://raw", Box::new(fetcher))
    }

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_actions_and_workflows() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "actions/setup/action.yml", "name: Setup\n");
        write(root, "actions/legacy/action.yaml", "name: Legacy\n");
        write(root, "actions/empty/README.md", "no manifest\n");
        write(root, "actions/stray.yml", "name: not a directory\n");
        write(root, "workflows/ci.yml", "name: CI\njobs: {}\n");
        write(root, "workflows/release.yaml", "jobs: {}\n");
        write(root, "workflows/notes.txt", "ignored\n");

        let repo = DotGithub::load_with(root, &ValidatorConfig::default(), offline()).unwrap();
        let actions: Vec<_> = repo.actions().iter().map(|a| a.dir_name.clone()).collect();
        assert_eq!(actions, vec!["legacy", "setup"]);
        assert!(repo.action("legacy").unwrap().path.ends_with("action.yaml"));

        let workflows: Vec<_> = repo.workflows().iter().map(|w| w.file_name.clone()).collect();
        assert_eq!(workflows, vec!["ci.yml", "release.yaml"]);
        assert_eq!(repo.workflow("release.yaml").unwrap().name, "release");
        assert_eq!(repo.root(), root);
    }

    #[test]
    fn actions_dir_is_optional() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "workflows/ci.yml", "jobs: {}\n");
        let repo = DotGithub::load_with(dir.path(), &ValidatorConfig::default(), offline()).unwrap();
        assert!(repo.actions().is_empty());
    }

    #[test]
    fn workflows_dir_is_required() {
        let dir = TempDir::new().unwrap();
        let err = DotGithub::load_with(dir.path(), &ValidatorConfig::default(), offline())
            .err()
            .unwrap();
        assert!(matches!(err, DotGithubError::NotADirectory(p) if p.ends_with("workflows")));
    }

    #[test]
    fn malformed_workflow_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "workflows/ci.yml", "jobs: [oops\n");
        let err = DotGithub::load_with(dir.path(), &ValidatorConfig::default(), offline())
            .err()
            .unwrap();
        assert!(matches!(err, DotGithubError::Parse { .. }));
    }

    #[test]
    fn reads_allow_lists() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "workflows/ci.yml", "jobs: {}\n");
        write(dir.path(), "vars.txt", "REGION\nCLUSTER  ZONE\n\n");
        let config = ValidatorConfig {
            vars_file: Some(dir.path().join("vars.txt")),
            ..ValidatorConfig::default()
        };
        let repo = DotGithub::load_with(dir.path(), &config, offline()).unwrap();
        assert!(repo.has_vars_file());
        assert!(repo.var_exists("ZONE"));
        assert!(!repo.has_secrets_file());
    }

    #[test]
    fn missing_allow_list_is_fatal() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "workflows/ci.yml", "jobs: {}\n");
        let config = ValidatorConfig {
            secrets_file: Some(dir.path().join("secrets.txt")),
            ..ValidatorConfig::default()
        };
        let err = DotGithub::load_with(dir.path(), &config, offline()).err().unwrap();
        assert!(matches!(err, DotGithubError::Read { .. }));
    }

    #[test]
    fn allow_list_splits_on_whitespace() {
        let names = parse_allow_list("A\tB\r\nC ");
        assert_eq!(names.len(), 3);
        assert!(names.contains("C"));
    }

    #[test]
    fn root_must_be_a_directory() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "").unwrap();
        assert!(matches!(
            DotGithub::load_with(&file, &ValidatorConfig::default(), offline()),
            Err(DotGithubError::NotADirectory(_))
        ));
    }
}
