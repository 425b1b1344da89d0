//! Facet CLI - automated dataset profiling.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            file,
            output,
            columns,
            target,
            buckets,
            no_charts,
            strict,
            no_open,
        } => commands::report::run(
            file,
            output,
            columns,
            target,
            buckets,
            no_charts,
            strict,
            no_open,
            cli.verbose,
        ),

        Commands::Stats { file, column, json } => {
            commands::stats::run(file, column, json, cli.verbose)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
