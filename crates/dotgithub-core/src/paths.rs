use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ACTIONS_DIR: &str = "actions";
pub const WORKFLOWS_DIR: &str = "workflows";

/// Manifest names looked up inside an action directory, in priority order.
pub const ACTION_MANIFESTS: [&str; 2] = ["action.yml", "action.yaml"];

pub const CONFIG_FILE: &str = "validator.yaml";

pub const LOCAL_ACTION_PREFIX: &str = "./.github/actions/";
pub const LOCAL_WORKFLOW_PREFIX: &str = "./.github/workflows/";
pub const DOCKER_PREFIX: &str = "docker://";

pub const DEFAULT_RAW_BASE_URL: &str = "https://raw.githubusercontent.com";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn actions_dir(root: &Path) -> PathBuf {
    root.join(ACTIONS_DIR)
}

pub fn workflows_dir(root: &Path) -> PathBuf {
    root.join(WORKFLOWS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

/// File name of `path` as a string, empty when it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub fn has_yml_extension(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "yml")
}

pub fn is_yaml_file_name(name: &str) -> bool {
    name.ends_with(".yml") || name.ends_with(".yaml")
}

/// Strip `.yml`/`.yaml` from a workflow file name.
pub fn workflow_stem(file_name: &str) -> &str {
    file_name
        .strip_suffix(".yaml")
        .or_else(|| file_name.strip_suffix(".yml"))
        .unwrap_or(file_name)
}

// ---------------------------------------------------------------------------
// Lexical patterns
// ---------------------------------------------------------------------------

static LOWER_HYPHEN_RE: OnceLock<Regex> = OnceLock::new();
static UPPER_UNDERSCORE_RE: OnceLock<Regex> = OnceLock::new();
static WORKFLOW_FILE_RE: OnceLock<Regex> = OnceLock::new();
static LOCAL_ACTION_RE: OnceLock<Regex> = OnceLock::new();
static EXTERNAL_ACTION_RE: OnceLock<Regex> = OnceLock::new();

fn lower_hyphen_re() -> &'static Regex {
    LOWER_HYPHEN_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]+$").unwrap())
}

fn upper_underscore_re() -> &'static Regex {
    UPPER_UNDERSCORE_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9_]+$").unwrap())
}

fn workflow_file_re() -> &'static Regex {
    WORKFLOW_FILE_RE.get_or_init(|| Regex::new(r"^_?[a-z0-9][a-z0-9\-]+\.ya?ml$").unwrap())
}

fn local_action_re() -> &'static Regex {
    LOCAL_ACTION_RE.get_or_init(|| Regex::new(r"^\./\.github/actions/[a-z0-9\-]+$").unwrap())
}

/// `owner/repo[/sub/dir]@ref`, capturing owner, repo, subdirectory and ref.
pub(crate) fn external_action_re() -> &'static Regex {
    EXTERNAL_ACTION_RE.get_or_init(|| {
        Regex::new(
            r"^([A-Za-z0-9_.\-]+)/([A-Za-z0-9_.\-]+)((?:/[A-Za-z0-9_.\-]+)*)@([A-Za-z0-9_.\-/]+)$",
        )
        .unwrap()
    })
}

/// Action directory, input, output and job names.
pub fn is_lowercase_with_hyphens(name: &str) -> bool {
    lower_hyphen_re().is_match(name)
}

/// Env, var and secret names.
pub fn is_uppercase_with_underscores(name: &str) -> bool {
    upper_underscore_re().is_match(name)
}

pub fn is_valid_workflow_file_name(name: &str) -> bool {
    workflow_file_re().is_match(name)
}

pub fn is_local_action_path(uses: &str) -> bool {
    local_action_re().is_match(uses)
}

pub fn is_external_action_ref(uses: &str) -> bool {
    external_action_re().is_match(uses)
}

pub fn is_local_reference(uses: &str) -> bool {
    uses.starts_with("./")
}

/// Name of the local action a `uses: ./.github/actions/<name>` points at.
pub fn local_action_name(uses: &str) -> &str {
    uses.strip_prefix(LOCAL_ACTION_PREFIX)
        .unwrap_or(uses)
        .trim_end_matches('/')
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
