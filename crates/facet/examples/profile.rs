//! Example: Profile a tabular data file with Facet.
//!
//! Usage:
//!   cargo run --example profile -- <file_path> [output_dir]
//!
//! Example:
//!   cargo run --example profile -- test_data/measurements.csv profile_out

use std::env;
use std::path::Path;

use facet::{Profiler, ProfilerConfig};

fn main() -> facet::Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: cargo run --example profile -- <file_path> [output_dir]");
        eprintln!("\nExample:");
        eprintln!("  cargo run --example profile -- test_data/measurements.csv profile_out");
        std::process::exit(1);
    }

    let file_path = &args[1];
    let path = Path::new(file_path);

    if !path.exists() {
        eprintln!("Error: File not found: {}", file_path);
        std::process::exit(1);
    }

    let separator = "=".repeat(80);
    println!("{}", separator);
    println!("Facet Profile: {}", file_path);
    println!("{}", separator);
    println!();

    let config = ProfilerConfig {
        output: args.get(2).map(|dir| dir.into()),
        ..ProfilerConfig::default()
    };

    let summary = Profiler::with_config(config).profile_file(path)?;

    println!("{}", separator);
    println!("## Summary");
    if let Some(source) = &summary.source {
        println!("  File: {}", source.file);
        println!("  Format: {}", source.format);
        println!("  Rows: {}", source.row_count);
        println!("  Columns: {}", source.column_count);
    }
    println!("  Profiled: {}", summary.columns_profiled.len());
    println!("  Skipped: {}", summary.columns_skipped.len());
    for (column, reason) in &summary.columns_skipped {
        println!("    {} ({})", column, reason);
    }
    println!("  Relationship charts: {}", summary.pairs_rendered);
    if let Some(path) = &summary.report_path {
        println!("  Report: {}", path.display());
    }

    Ok(())
}
