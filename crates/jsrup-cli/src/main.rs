#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

mod commands;
mod logging;

use clap::Parser;
use jsrup_core::Config;
use miette::Result;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "jsrup")]
#[command(author, version, about = "Migrate deno.land URL imports to JSR packages and an import map", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Rewrite URL imports in the project and generate an import map
    Migrate {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Analyze and report without writing any files
        #[arg(long)]
        dry_run: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    // Build config
    let config = Config::new(cwd)
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Migrate { yes, dry_run }) => {
            let span = tracing::info_span!("migrate", cmd = "migrate", cwd = %config.cwd.display());
            let _guard = span.enter();
            commands::migrate::run(&config, yes, dry_run)
        }
    }
}
