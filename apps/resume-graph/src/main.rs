mod acquisition;
mod commands;
mod config;
mod errors;
mod extraction;
mod graph;
mod llm_client;
mod models;
mod pipeline;
mod scoring;
mod search;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::compare::CompareArgs;
use crate::commands::graph::GraphArgs;
use crate::commands::search::SearchArgs;
use crate::config::Config;
use crate::errors::AppError;

#[derive(Parser)]
#[command(name = "resume-graph", about = "Resume similarity graph builder")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every pair of members and write the similarity graph
    Graph(GraphArgs),
    /// Score two resumes and print a similarity report
    Compare(CompareArgs),
    /// List members whose extracted attributes contain a term
    Search(SearchArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration errors are reported before logging is set up.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            let err = AppError::Config(format!("{e:#}"));
            eprintln!("{err}");
            return exit_code(&err);
        }
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resume-graph v{}", env!("CARGO_PKG_VERSION"));

    let result = match cli.command {
        Commands::Graph(args) => commands::graph::run(args, &config).await,
        Commands::Compare(args) => commands::compare::run(args, &config).await,
        Commands::Search(args) => commands::search::run(args, &config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            exit_code(&e)
        }
    }
}

fn exit_code(err: &AppError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}
