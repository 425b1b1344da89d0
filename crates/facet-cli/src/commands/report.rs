//! Report command - profile a file and build the HTML report.

use std::path::PathBuf;

use colored::Colorize;
use facet::{Profiler, ProfilerConfig};

#[allow(clippy::too_many_arguments)]
pub fn run(
    file: PathBuf,
    output: Option<PathBuf>,
    columns: Option<Vec<String>>,
    target: Option<String>,
    buckets: usize,
    no_charts: bool,
    strict: bool,
    no_open: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    println!(
        "{} {}",
        "Profiling".cyan().bold(),
        file.display().to_string().white()
    );

    let config = ProfilerConfig {
        columns,
        target,
        target_buckets: buckets,
        output: output.clone(),
        isolate_errors: !strict,
        render_charts: !no_charts,
        quiet: false,
    };

    let summary = Profiler::with_config(config).profile_file(&file)?;

    if verbose {
        if let Some(source) = &summary.source {
            println!();
            println!("{}", "Source:".yellow().bold());
            println!("  format    {}", source.format);
            println!("  rows      {}", source.row_count);
            println!("  columns   {}", source.column_count);
            println!("  hash      {}", source.hash);
        }
    }

    println!();
    println!(
        "Profiled {} columns ({} skipped), {} relationship charts",
        summary.columns_profiled.len().to_string().white().bold(),
        summary.columns_skipped.len().to_string().yellow(),
        summary.pairs_rendered.to_string().white().bold()
    );

    for (column, reason) in &summary.columns_skipped {
        println!("  {} {}: {}", "skipped".yellow(), column, reason);
    }

    if let Some(path) = &summary.report_path {
        println!();
        println!(
            "{} {}",
            "Report saved to".green().bold(),
            path.display().to_string().white()
        );

        if !no_open {
            let _ = open::that(path);
        }
    }

    Ok(())
}
