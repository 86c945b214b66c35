use dotgithub_core::diagnostic::{Diagnostic, Summary};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// One finding per line on stdout, summary on stderr.
pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    for d in diagnostics {
        println!("{d}");
    }
    let summary = Summary::of(diagnostics);
    if summary.total() > 0 {
        eprintln!("{summary}");
    }
}
