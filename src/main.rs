//! Unified ipmark CLI.
//!
//! This binary provides a unified interface to the ipmark components:
//! - `ipmark gen` - Compile the route classification table
//!
//! The generator can also be run as the standalone `ipmark-gen` binary.

use std::process::ExitCode;

use clap::{Parser, Subcommand};

/// ipmark unified CLI.
#[derive(Parser)]
#[command(
    name = "ipmark",
    version,
    about = "IPv4 route classification table compiler",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the route classification table.
    #[command(name = "gen", alias = "generate")]
    Gen(ipmark_gen::GenArgs),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Gen(args) => ipmark_gen::cli::run(args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
