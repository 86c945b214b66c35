mod cmd;
mod output;

use clap::{Parser, Subcommand};
use cmd::validate::ValidateArgs;

#[derive(Parser)]
#[command(
    name = "github-actions-validator",
    about = "Validates the actions and workflows of a GitHub Actions .github directory",
    version,
    propagate_version = true
)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log debug output to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run every rule over a .github directory and print the findings
    Validate(ValidateArgs),

    /// Print the version
    Version,
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Validate(args) => cmd::validate::run(args, cli.json),
        Commands::Version => cmd::version::run(cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
