use crate::error::{DotGithubError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// FetchConfig
// ---------------------------------------------------------------------------

/// How external action manifests are downloaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout; `0` disables it.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra attempts after a transport failure. Status codes are never retried.
    #[serde(default)]
    pub retries: u32,
}

fn default_base_url() -> String {
    paths::DEFAULT_RAW_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: 0,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

// ---------------------------------------------------------------------------
// ValidatorConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    #[serde(default)]
    pub fetch: FetchConfig,
    /// Allow-list of repository variable names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vars_file: Option<PathBuf>,
    /// Allow-list of repository secret names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secrets_file: Option<PathBuf>,
}

impl ValidatorConfig {
    /// Load a config file. Relative allow-list paths are taken relative to
    /// the file's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|source| DotGithubError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut cfg: ValidatorConfig = if data.trim().is_empty() {
            ValidatorConfig::default()
        } else {
            serde_yaml::from_str(&data).map_err(|source| DotGithubError::Parse {
                path: path.to_path_buf(),
                source,
            })?
        };
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        cfg.vars_file = cfg.vars_file.map(|p| base.join(p));
        cfg.secrets_file = cfg.secrets_file.map(|p| base.join(p));
        tracing::debug!(path = %path.display(), "loaded validator config");
        Ok(cfg)
    }

    /// `<root>/validator.yaml` when it exists, defaults otherwise.
    pub fn discover(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        let base = self.fetch.base_url.as_str();
        if !(base.starts_with("https://") || base.starts_with("http://")) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!("fetch.base_url '{base}' is not an http(s) URL"),
            });
        } else if base.starts_with("http://") {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!("fetch.base_url '{base}' is not using https"),
            });
        }

        if self.fetch.timeout_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "fetch.timeout_secs is 0; requests may hang indefinitely".to_string(),
            });
        }

        if self.fetch.retries > 5 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "fetch.retries={} (>5 is unusual)",
                    self.fetch.retries
                ),
            });
        }

        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults() {
        let cfg = ValidatorConfig::default();
        assert_eq!(cfg.fetch.base_url, "https://raw.githubusercontent.com");
        assert_eq!(cfg.fetch.timeout(), Some(Duration::from_secs(30)));
        assert_eq!(cfg.fetch.retries, 0);
        assert!(cfg.validate().is_empty());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("validator.yaml");
        std::fs::write(&path, "fetch:\n  retries: 2\nvars_file: vars.txt\n").unwrap();

        let cfg = ValidatorConfig::load(&path).unwrap();
        assert_eq!(cfg.fetch.retries, 2);
        assert_eq!(cfg.fetch.timeout_secs, 30);
        assert_eq!(cfg.vars_file, Some(dir.path().join("vars.txt")));
        assert_eq!(cfg.secrets_file, None);
    }

    #[test]
    fn discover_without_file_is_default() {
        let dir = TempDir::new().unwrap();
        let cfg = ValidatorConfig::discover(dir.path()).unwrap();
        assert_eq!(cfg, ValidatorConfig::default());
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("validator.yaml");
        std::fs::write(&path, "fetch: [oops\n").unwrap();
        assert!(matches!(
            ValidatorConfig::load(&path),
            Err(DotGithubError::Parse { .. })
        ));
    }

    #[test]
    fn zero_timeout_disables() {
        let fetch = FetchConfig {
            timeout_secs: 0,
            ..FetchConfig::default()
        };
        assert_eq!(fetch.timeout(), None);
    }

    #[test]
    fn validate_flags_suspicious_values() {
        let cfg = ValidatorConfig {
            fetch: FetchConfig {
                base_url: "ftp://mirror".to_string(),
                timeout_secs: 0,
                retries: 20,
            },
            ..ValidatorConfig::default()
        };
        let warnings = cfg.validate();
        assert_eq!(warnings.len(), 3);
        assert_eq!(warnings[0].level, WarnLevel::Error);
        assert!(warnings[2].message.contains("retries=20"));
    }
}
