//! CSV/TSV parser with delimiter detection and typed column conversion.

use std::fs::File;
use std::io::{BufRead, Read};
use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};

use super::column::{Column, ColumnData, Dataset};
use super::source::{SourceMetadata, is_missing_value};
use crate::error::{FacetError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Distinct non-missing values at or below this become dictionary-encoded.
const CATEGORICAL_THRESHOLD: usize = 20;

// Date patterns compiled once on first use.
static DATE_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap(), // ISO date
        Regex::new(r"^\d{2}/\d{2}/\d{4}").unwrap(), // US date
        Regex::new(r"^\d{2}-\d{2}-\d{4}").unwrap(), // European date
        Regex::new(r"^\d{4}/\d{2}/\d{2}").unwrap(), // Alt ISO
    ]
});

/// Parser configuration.
#[derive(Debug, Clone)]
pub struct ParserConfig {
    /// Delimiter to use (None = auto-detect).
    pub delimiter: Option<u8>,
    /// Whether the file has a header row.
    pub has_header: bool,
    /// Maximum rows to read (None = all).
    pub max_rows: Option<usize>,
    /// Quote character.
    pub quote: u8,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: true,
            max_rows: None,
            quote: b'"',
        }
    }
}

/// Parses tabular data files into typed datasets.
pub struct Parser {
    config: ParserConfig,
}

impl Parser {
    /// Create a new parser with default configuration.
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: ParserConfig) -> Self {
        Self { config }
    }

    /// Parse a file and return the typed dataset and source metadata.
    pub fn parse_file(&self, path: impl AsRef<Path>) -> Result<(Dataset, SourceMetadata)> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| FacetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let metadata = file.metadata().map_err(|e| FacetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let size_bytes = metadata.len();

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).map_err(|e| FacetError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        let delimiter = match self.config.delimiter {
            Some(d) => d,
            None => detect_delimiter(&contents)?,
        };

        let (headers, rows) = self.parse_bytes(&contents, delimiter)?;
        let dataset = build_dataset(headers, rows)?;

        let format = match delimiter {
            b'\t' => "tsv",
            b',' => "csv",
            b';' => "csv-semicolon",
            b'|' => "psv",
            _ => "delimited",
        }
        .to_string();

        let source_metadata = SourceMetadata::new(
            path.to_path_buf(),
            hash,
            size_bytes,
            format,
            dataset.row_count(),
            dataset.column_count(),
        );

        Ok((dataset, source_metadata))
    }

    /// Parse raw bytes into headers and string rows.
    fn parse_bytes(&self, bytes: &[u8], delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(self.config.has_header)
            .quote(self.config.quote)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = if self.config.has_header {
            reader.headers()?.iter().map(|s| s.to_string()).collect()
        } else {
            match reader.records().next() {
                Some(Ok(record)) => (0..record.len())
                    .map(|i| format!("column_{}", i + 1))
                    .collect(),
                Some(Err(e)) => return Err(e.into()),
                None => return Err(FacetError::EmptyData("No data rows found".to_string())),
            }
        };

        if headers.is_empty() {
            return Err(FacetError::EmptyData("No columns found".to_string()));
        }

        let expected_cols = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut row: Vec<String> = record.iter().map(|s| s.to_string()).collect();
            // Pad short rows (and drop stragglers) so every column has a cell.
            row.resize(expected_cols, String::new());
            rows.push(row);

            if let Some(max) = self.config.max_rows {
                if rows.len() >= max {
                    break;
                }
            }
        }

        if rows.is_empty() {
            return Err(FacetError::EmptyData("No data rows found".to_string()));
        }

        Ok((headers, rows))
    }
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

/// Detect the most likely delimiter by scoring consistency across lines.
fn detect_delimiter(contents: &[u8]) -> Result<u8> {
    let sample: Vec<String> = contents
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.is_empty())
        .collect();

    if sample.is_empty() {
        return Err(FacetError::EmptyData("File is empty".to_string()));
    }

    let mut best = (b',', 0usize);
    for &delim in DELIMITERS {
        let counts: Vec<usize> = sample
            .iter()
            .map(|line| line.bytes().filter(|&b| b == delim).count())
            .collect();

        let first = counts[0];
        // Delimiter must appear and split every sampled line the same way.
        if first > 0 && counts.iter().all(|&c| c == first) && first > best.1 {
            best = (delim, first);
        }
    }

    if best.1 == 0 {
        // Single-column file; any delimiter works.
        return Ok(b',');
    }
    Ok(best.0)
}

// =============================================================================
// TYPED CONVERSION
// =============================================================================
// A column only gets numeric/bool/date storage when every non-missing cell
// agrees; one incompatible cell demotes the whole column to text, matching
// how dataframe libraries assign a single dtype per column.

/// Candidate type detected for a single raw cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellType {
    Int,
    Float,
    Bool,
    Date,
    Text,
}

/// Detect the type of a single non-missing value.
fn detect_cell_type(value: &str) -> CellType {
    let trimmed = value.trim();

    if matches!(
        trimmed.to_lowercase().as_str(),
        "true" | "false" | "yes" | "no"
    ) {
        return CellType::Bool;
    }

    if trimmed.parse::<i64>().is_ok() {
        return CellType::Int;
    }

    if trimmed.parse::<f64>().is_ok() {
        return CellType::Float;
    }

    if DATE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
        return CellType::Date;
    }

    CellType::Text
}

/// Decide the storage type for a whole column of raw cells.
fn decide_storage(cells: &[&str]) -> CellType {
    let mut saw_int = false;
    let mut saw_float = false;
    let mut saw_bool = false;
    let mut saw_date = false;
    let mut saw_text = false;
    let mut non_missing = 0usize;

    for &cell in cells {
        if is_missing_value(cell) {
            continue;
        }
        non_missing += 1;
        match detect_cell_type(cell) {
            CellType::Int => saw_int = true,
            CellType::Float => saw_float = true,
            CellType::Bool => saw_bool = true,
            CellType::Date => saw_date = true,
            CellType::Text => saw_text = true,
        }
    }

    if non_missing == 0 || saw_text {
        return CellType::Text;
    }
    if saw_bool {
        return if saw_int || saw_float || saw_date {
            CellType::Text
        } else {
            CellType::Bool
        };
    }
    if saw_date {
        return if saw_int || saw_float {
            CellType::Text
        } else {
            CellType::Date
        };
    }
    // Mixed int/float promotes to float.
    if saw_float {
        return CellType::Float;
    }
    CellType::Int
}

/// Build a typed dataset from headers and string rows.
fn build_dataset(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Dataset> {
    let mut dataset = Dataset::new();

    for (col_idx, name) in headers.iter().enumerate() {
        let cells: Vec<&str> = rows.iter().map(|r| r[col_idx].as_str()).collect();
        let data = convert_column(&cells);
        dataset.add_column(Column::new(name.clone(), data))?;
    }

    Ok(dataset)
}

/// Convert raw cells into typed storage.
fn convert_column(cells: &[&str]) -> ColumnData {
    match decide_storage(cells) {
        CellType::Int => ColumnData::Int(
            cells
                .iter()
                .map(|c| {
                    if is_missing_value(c) {
                        None
                    } else {
                        c.trim().parse::<i64>().ok()
                    }
                })
                .collect(),
        ),
        CellType::Float => ColumnData::Float(
            cells
                .iter()
                .map(|c| {
                    if is_missing_value(c) {
                        None
                    } else {
                        c.trim().parse::<f64>().ok()
                    }
                })
                .collect(),
        ),
        CellType::Bool => ColumnData::Bool(
            cells
                .iter()
                .map(|c| {
                    if is_missing_value(c) {
                        None
                    } else {
                        match c.trim().to_lowercase().as_str() {
                            "true" | "yes" => Some(true),
                            "false" | "no" => Some(false),
                            _ => None,
                        }
                    }
                })
                .collect(),
        ),
        CellType::Date => ColumnData::Date(
            cells
                .iter()
                .map(|c| {
                    if is_missing_value(c) {
                        None
                    } else {
                        Some(c.trim().to_string())
                    }
                })
                .collect(),
        ),
        CellType::Text => text_or_categorical(cells),
    }
}

/// Low-cardinality text becomes dictionary-encoded categorical storage.
fn text_or_categorical(cells: &[&str]) -> ColumnData {
    let mut dictionary: Vec<String> = Vec::new();
    let mut codes: Vec<Option<u32>> = Vec::with_capacity(cells.len());

    for &cell in cells {
        if is_missing_value(cell) {
            codes.push(None);
            continue;
        }
        let value = cell.trim();
        let code = match dictionary.iter().position(|d| d == value) {
            Some(pos) => pos as u32,
            None => {
                dictionary.push(value.to_string());
                (dictionary.len() - 1) as u32
            }
        };
        codes.push(Some(code));
    }

    if dictionary.len() <= CATEGORICAL_THRESHOLD && !dictionary.is_empty() {
        ColumnData::Categorical { dictionary, codes }
    } else {
        ColumnData::Text(
            cells
                .iter()
                .map(|c| {
                    if is_missing_value(c) {
                        None
                    } else {
                        Some(c.trim().to_string())
                    }
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::StorageType;

    fn parse_str(content: &str) -> Dataset {
        let parser = Parser::new();
        let (headers, rows) = parser.parse_bytes(content.as_bytes(), b',').unwrap();
        build_dataset(headers, rows).unwrap()
    }

    #[test]
    fn test_integer_storage() {
        let ds = parse_str("count\n1\n2\n3\n100\n");
        assert_eq!(ds.column("count").unwrap().storage_type(), StorageType::Int);
    }

    #[test]
    fn test_float_promotion() {
        let ds = parse_str("value\n1\n2.5\n3\n");
        assert_eq!(
            ds.column("value").unwrap().storage_type(),
            StorageType::Float
        );
    }

    #[test]
    fn test_bool_storage() {
        let ds = parse_str("active\ntrue\nfalse\nyes\n");
        assert_eq!(
            ds.column("active").unwrap().storage_type(),
            StorageType::Bool
        );
    }

    #[test]
    fn test_date_storage() {
        let ds = parse_str("when\n2023-01-05\n2023-02-06\n");
        assert_eq!(ds.column("when").unwrap().storage_type(), StorageType::Date);
    }

    #[test]
    fn test_mixed_demotes_to_text() {
        let ds = parse_str("v\n1\nabc\n3\n");
        let st = ds.column("v").unwrap().storage_type();
        assert!(st == StorageType::Text || st == StorageType::Categorical);
    }

    #[test]
    fn test_missing_cells_preserved() {
        let ds = parse_str("metric\n5.1\n4.9\n\n4.6\n");
        let col = ds.column("metric").unwrap();
        assert_eq!(col.storage_type(), StorageType::Float);
        assert_eq!(col.row_count(), 4);
        assert_eq!(col.missing_count(), 1);
    }

    #[test]
    fn test_low_cardinality_text_is_categorical() {
        let ds = parse_str("cat\na\nb\na\nc\n");
        assert_eq!(
            ds.column("cat").unwrap().storage_type(),
            StorageType::Categorical
        );
    }

    #[test]
    fn test_delimiter_detection_tsv() {
        let content = b"a\tb\n1\t2\n3\t4\n";
        assert_eq!(detect_delimiter(content).unwrap(), b'\t');
    }

    #[test]
    fn test_delimiter_detection_csv() {
        let content = b"a,b\n1,2\n3,4\n";
        assert_eq!(detect_delimiter(content).unwrap(), b',');
    }
}
