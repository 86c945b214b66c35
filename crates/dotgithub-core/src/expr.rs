//! Template expression extraction.
//!
//! Finds `${{ ... }}` expressions in raw document text and classifies the ones
//! that reference something the validator can resolve. Expressions are never
//! evaluated; anything that is not a plain dotted path (`github.sha`,
//! `inputs.a == 'b'`, `fromJSON(...)`) is skipped.

use regex::Regex;
use std::sync::OnceLock;

/// A classified template expression, borrowing its names from the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expression<'a> {
    Env(&'a str),
    Vars(&'a str),
    Secrets(&'a str),
    Inputs(&'a str),
    StepOutput { step: &'a str, output: &'a str },
    /// A lone identifier: `true`, `false`, or a mistyped reference.
    Bare(&'a str),
}

impl<'a> Expression<'a> {
    fn classify(path: &'a str) -> Option<Self> {
        let parts: Vec<&'a str> = path.split('.').collect();
        match parts.as_slice() {
            [name] => Some(Expression::Bare(name)),
            ["env", name] => Some(Expression::Env(name)),
            ["vars", name] => Some(Expression::Vars(name)),
            ["secrets", name] => Some(Expression::Secrets(name)),
            ["inputs", name] => Some(Expression::Inputs(name)),
            ["steps", step, "outputs", output] => Some(Expression::StepOutput { step, output }),
            _ => None,
        }
    }

    /// Name of an `env`, `vars` or `secrets` reference.
    pub fn variable_name(&self) -> Option<&'a str> {
        match *self {
            Expression::Env(n) | Expression::Vars(n) | Expression::Secrets(n) => Some(n),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

static EXPRESSION_RE: OnceLock<Regex> = OnceLock::new();
static QUOTED_RE: OnceLock<Regex> = OnceLock::new();
static SCRIPT_OUTPUT_RE: OnceLock<Regex> = OnceLock::new();

fn expression_re() -> &'static Regex {
    EXPRESSION_RE.get_or_init(|| {
        Regex::new(r"\$\{\{[ \t]*([A-Za-z0-9_\-]+(?:\.[A-Za-z0-9_\-]+)*)[ \t]*\}\}").unwrap()
    })
}

fn quoted_re() -> &'static Regex {
    QUOTED_RE.get_or_init(|| Regex::new(r#""\$\{\{[ \t]*([A-Za-z0-9_.\-]+)[ \t]*\}\}""#).unwrap())
}

fn script_output_re() -> &'static Regex {
    SCRIPT_OUTPUT_RE.get_or_init(|| {
        Regex::new(r#"echo[ \t]+"([A-Za-z0-9_\-]+)=[^\n]*>>[ \t]*"?\$\{?GITHUB_OUTPUT"#).unwrap()
    })
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Every classifiable expression in `text`, in source order.
pub fn extract(text: &str) -> impl Iterator<Item = Expression<'_>> {
    expression_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).and_then(|m| Expression::classify(m.as_str())))
}

/// Inner text of every expression written as `"${{ ... }}"`.
pub fn quoted(text: &str) -> impl Iterator<Item = &str> {
    quoted_re()
        .captures_iter(text)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

/// Output names a shell script writes with `echo "name=..." >> $GITHUB_OUTPUT`.
pub fn script_outputs(script: &str) -> impl Iterator<Item = &str> {
    script_output_re()
        .captures_iter(script)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
