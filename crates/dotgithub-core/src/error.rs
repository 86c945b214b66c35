use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DotGithubError {
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot read file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("cannot parse external action '{reference}': {source}")]
    RemoteManifest {
        reference: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("cannot build http client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DotGithubError>;
