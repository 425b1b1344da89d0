//! Stats command - quick per-column summary without a report.

use std::path::PathBuf;

use colored::Colorize;
use facet::classify;
use facet::input::Parser;
use facet::ops::{StatContext, stat_ops};
use facet::report::{format_cell, format_console};

pub fn run(
    file: PathBuf,
    column: Option<String>,
    json: bool,
    verbose: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("File not found: {}", file.display()).into());
    }

    let parser = Parser::new();
    let (dataset, source) = parser.parse_file(&file)?;

    if verbose && !json {
        println!(
            "{} {} ({} rows, {} columns)",
            "Loaded".cyan().bold(),
            source.file.white(),
            source.row_count,
            source.column_count
        );
        println!();
    }

    let selected: Vec<&str> = match &column {
        Some(name) => {
            if dataset.column(name).is_none() {
                return Err(format!("Unknown column: '{}'", name).into());
            }
            vec![name.as_str()]
        }
        None => dataset.column_names(),
    };

    let mut json_output = serde_json::Map::new();

    for name in selected {
        let Some(col) = dataset.column(name) else {
            continue;
        };
        let semantic = classify(col);

        let Some(ops) = stat_ops(semantic) else {
            if json {
                json_output.insert(name.to_string(), serde_json::Value::Null);
            } else {
                println!(
                    "{} data type ({}) cannot be parsed.",
                    name,
                    col.storage_type()
                );
            }
            continue;
        };

        let ctx = StatContext {
            column: col,
            semantic,
        };

        if json {
            let mut table = serde_json::Map::new();
            for (metric, op) in ops {
                let value = op(&ctx)?;
                table.insert(
                    metric.to_string(),
                    serde_json::Value::String(format_cell(&value)),
                );
            }
            json_output.insert(name.to_string(), serde_json::Value::Object(table));
        } else {
            println!("========== {} ==========", name.cyan().bold());
            for (metric, op) in ops {
                let value = op(&ctx)?;
                println!("{:<20}: {}", metric, format_console(&value));
            }
            println!();
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::Value::Object(json_output))?
        );
    }

    Ok(())
}
