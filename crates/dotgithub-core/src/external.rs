//! Resolution of `owner/repo[/subdir]@ref` actions.
//!
//! Manifests are fetched from a raw-content host on first use and cached for
//! the lifetime of the resolver. A missing manifest is cached as absent; a
//! transport failure is returned to the caller and leaves the cache untouched
//! so the run aborts instead of reporting a false finding.

use crate::config::FetchConfig;
use crate::error::{DotGithubError, Result};
use crate::model::Action;
use crate::paths;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

// ---------------------------------------------------------------------------
// ActionRef
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRef {
    pub owner: String,
    pub repo: String,
    /// Subdirectory inside the repository, without leading slash.
    pub path: Option<String>,
    pub version: String,
}

impl ActionRef {
    pub fn parse(reference: &str) -> Option<Self> {
        let caps = paths::external_action_re().captures(reference)?;
        let path = caps
            .get(3)
            .map(|m| m.as_str().trim_start_matches('/'))
            .filter(|p| !p.is_empty())
            .map(str::to_string);
        Some(Self {
            owner: caps[1].to_string(),
            repo: caps[2].to_string(),
            path,
            version: caps[4].to_string(),
        })
    }

    /// Candidate manifest URLs under `base_url`, in lookup order.
    pub fn manifest_urls(&self, base_url: &str) -> Vec<String> {
        let mut prefix = format!(
            "{}/{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.version
        );
        if let Some(path) = &self.path {
            prefix.push('/');
            prefix.push_str(path);
        }
        paths::ACTION_MANIFESTS
            .iter()
            .map(|name| format!("{prefix}/{name}"))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Fetching
// ---------------------------------------------------------------------------

/// Downloads one manifest. `Ok(None)` means the server answered with a
/// non-success status.
pub trait ManifestFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Option<String>>;
}

impl<F> ManifestFetcher for F
where
    F: Fn(&str) -> Result<Option<String>> + Send + Sync,
{
    fn fetch(&self, url: &str) -> Result<Option<String>> {
        self(url)
    }
}

pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    retries: u32,
}

impl HttpFetcher {
    pub fn new(timeout: Option<Duration>, retries: u32) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("github-actions-validator/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(DotGithubError::HttpClient)?;
        Ok(Self { client, retries })
    }
}

impl ManifestFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Option<String>> {
        let mut retries = self.retries;
        loop {
            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        tracing::debug!(url, status = status.as_u16(), "manifest not found");
                        return Ok(None);
                    }
                    let body = resp.text().map_err(|source| DotGithubError::Fetch {
                        url: url.to_string(),
                        source,
                    })?;
                    return Ok(Some(body));
                }
                Err(e) => {
                    if retries == 0 {
                        return Err(DotGithubError::Fetch {
                            url: url.to_string(),
                            source: e,
                        });
                    }
                    retries -= 1;
                    tracing::warn!(
                        url,
                        error = %e,
                        retries_remaining = retries,
                        "manifest request failed, retrying"
                    );
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// ExternalActionResolver
// ---------------------------------------------------------------------------

type Cache = HashMap<String, Option<Arc<Action>>>;

pub struct ExternalActionResolver {
    base_url: String,
    fetcher: Box<dyn ManifestFetcher>,
    cache: Mutex<Cache>,
}

impl ExternalActionResolver {
    pub fn new(base_url: impl Into<String>, fetcher: Box<dyn ManifestFetcher>) -> Self {
        Self {
            base_url: base_url.into(),
            fetcher,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Resolver backed by an HTTP client built from `config`.
    pub fn from_config(config: &FetchConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(config.timeout(), config.retries)?;
        Ok(Self::new(config.base_url.clone(), Box::new(fetcher)))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve `reference`, fetching it on first use. The cache lock is held
    /// across the fetch, so each reference is fetched at most once.
    pub fn resolve(&self, reference: &str) -> Result<Option<Arc<Action>>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = cache.get(reference) {
            tracing::debug!(reference, "external action cache hit");
            return Ok(entry.clone());
        }
        let resolved = self.download(reference)?;
        cache.insert(reference.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Cached result for `reference` without fetching. `None` both when the
    /// reference was never resolved and when it resolved as absent.
    pub fn cached(&self, reference: &str) -> Option<Arc<Action>> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        cache.get(reference).cloned().flatten()
    }

    fn download(&self, reference: &str) -> Result<Option<Arc<Action>>> {
        let Some(action_ref) = ActionRef::parse(reference) else {
            tracing::debug!(reference, "not an external action reference");
            return Ok(None);
        };
        for url in action_ref.manifest_urls(&self.base_url) {
            tracing::info!(reference, url = %url, "fetching external action");
            if let Some(body) = self.fetcher.fetch(&url)? {
                let action = Action::parse(reference, url, body).map_err(|source| {
                    DotGithubError::RemoteManifest {
                        reference: reference.to_string(),
                        source,
                    }
                })?;
                return Ok(Some(Arc::new(action)));
            }
        }
        tracing::debug!(reference, "external action has no manifest");
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const CHECKOUT: &str = "name: Checkout\ndescription: Check out a repo\ninputs:\n  ref:\n    description: Ref\noutputs:\n  commit:\n    description: SHA\n";

    /// Fake fetcher serving `body` at URLs ending in `suffix`, counting calls.
    fn counting(
        suffix: &'static str,
        body: &'static str,
    ) -> (Arc<AtomicUsize>, Box<dyn ManifestFetcher>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = move |url: &str| -> Result<Option<String>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(url.ends_with(suffix).then(|| body.to_string()))
        };
        (calls, Box::new(fetcher))
    }

    #[test]
    fn parses_refs() {
        let r = ActionRef::parse("github/codeql-action/init@v3").unwrap();
        assert_eq!(r.owner, "github");
        assert_eq!(r.repo, "codeql-action");
        assert_eq!(r.path.as_deref(), Some("init"));
        assert_eq!(r.version, "v3");
        assert!(ActionRef::parse("actions/checkout@v4").unwrap().path.is_none());
        assert!(ActionRef::parse("./.github/actions/x").is_none());
    }

    #[test]
    fn builds_manifest_urls() {
        let r = ActionRef::parse("owner/repo/sub/dir@v1.2").unwrap();
        assert_eq!(
            r.manifest_urls("https://raw.example.com/"),
            vec![
                "https://raw.example.com/owner/repo/v1.2/sub/dir/action.yml",
                "https://raw.example.com/owner/repo/v1.2/sub/dir/action.yaml",
            ]
        );
    }

    #[test]
    fn fetches_once_then_caches() {
        let (calls, fetcher) = counting("action.yml", CHECKOUT);
        let resolver = ExternalActionResolver::new("https://raw", fetcher);

        let first = resolver.resolve("actions/checkout@v4").unwrap().unwrap();
        assert_eq!(first.name, "Checkout");
        assert_eq!(first.dir_name, "actions/checkout@v4");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let second = resolver.resolve("actions/checkout@v4").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(resolver.cached("actions/checkout@v4").is_some());
    }

    #[test]
    fn falls_back_to_action_yaml() {
        let (calls, fetcher) = counting("action.yaml", CHECKOUT);
        let resolver = ExternalActionResolver::new("https://raw", fetcher);
        assert!(resolver.resolve("actions/checkout@v4").unwrap().is_some());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn absence_is_cached() {
        let (calls, fetcher) = counting("never", "");
        let resolver = ExternalActionResolver::new("https://raw", fetcher);
        assert!(resolver.resolve("nobody/nothing@v1").unwrap().is_none());
        assert!(resolver.resolve("nobody/nothing@v1").unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(resolver.cached("nobody/nothing@v1").is_none());
    }

    #[test]
    fn unparseable_reference_is_absent_without_fetch() {
        let (calls, fetcher) = counting("action.yml", CHECKOUT);
        let resolver = ExternalActionResolver::new("https://raw", fetcher);
        assert!(resolver.resolve("checkout").unwrap().is_none());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn transport_errors_are_not_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let fetcher = move |_: &str| -> Result<Option<String>> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(DotGithubError::Io(std::io::Error::other("connection reset")))
        };
        let resolver = ExternalActionResolver::new("https://raw", Box::new(fetcher));
        assert!(resolver.resolve("actions/checkout@v4").is_err());
        assert!(resolver.resolve("actions/checkout@v4").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn malformed_remote_manifest_is_fatal() {
        let (_, fetcher) = counting("action.yml", "inputs: [broken\n");
        let resolver = ExternalActionResolver::new("https://raw", fetcher);
        assert!(matches!(
            resolver.resolve("actions/checkout@v4"),
            Err(DotGithubError::RemoteManifest { .. })
        ));
    }

    #[test]
    fn http_fetcher_against_server() {
        let mut server = mockito::Server::new();
        let found = server
            .mock("GET", "/actions/checkout/v4/action.yml")
            .with_status(404)
            .create();
        let fallback = server
            .mock("GET", "/actions/checkout/v4/action.yaml")
            .with_status(200)
            .with_body(CHECKOUT)
            .create();

        let fetcher = HttpFetcher::new(Some(Duration::from_secs(5)), 0).unwrap();
        let resolver = ExternalActionResolver::new(server.url(), Box::new(fetcher));
        let action = resolver.resolve("actions/checkout@v4").unwrap().unwrap();
        assert!(action.has_output("commit"));

        found.assert();
        fallback.assert();
    }

    #[test]
    fn http_fetcher_transport_failure() {
        let fetcher = HttpFetcher::new(Some(Duration::from_secs(2)), 1).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/action.yml").unwrap_err();
        assert!(matches!(err, DotGithubError::Fetch { .. }));
    }
}
