//! Input handling: parsing and typed column storage.

mod column;
mod parser;
mod source;

pub use column::{Column, ColumnData, Dataset, StorageType};
pub use parser::{Parser, ParserConfig};
pub use source::{SourceMetadata, is_missing_value};
