mod args;
mod cmd;
mod root;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "life",
    about = "Declarative job CLI — dispatch YAML job definitions to the lorchestra execution engine",
    version,
    propagate_version = true
)]
struct Cli {
    /// Job definitions directory (default: auto-detect from jobs/ or ~/.life/jobs)
    #[arg(long, global = true, env = "LIFE_JOBS_DIR")]
    definitions_dir: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a job by id with key=value payload arguments
    Run {
        /// Job id to run
        job_id: String,

        /// key=value payload arguments
        args: Vec<String>,

        /// Output format: table, json, or csv (default: the definition's renderer)
        #[arg(long, short = 'f')]
        format: Option<String>,

        /// Print the execution envelope without invoking the engine
        #[arg(long)]
        dry_run: bool,
    },

    /// List available job definitions
    Jobs,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let defs_dir = root::resolve_definitions_dir(cli.definitions_dir.as_deref());

    let result = match cli.command {
        Commands::Run {
            job_id,
            args,
            format,
            dry_run,
        } => cmd::run::run(&defs_dir, &job_id, &args, format.as_deref(), dry_run),
        Commands::Jobs => cmd::jobs::run(&defs_dir, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        let code = e
            .downcast_ref::<cmd::run::RunExit>()
            .map_or(1, cmd::run::RunExit::exit_code);
        std::process::exit(code);
    }
}
