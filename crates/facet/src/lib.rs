//! Facet: automated profiling and visualization for tabular datasets.
//!
//! Facet reads a delimited file (or an in-memory dataset), infers a
//! semantic type for every column, computes a fixed battery of summary
//! statistics, fits candidate probability distributions, and selects
//! per-column and pairwise visualizations. Results stream to the console
//! and, when an output directory is given, accumulate into a static HTML
//! report.
//!
//! # Example
//!
//! ```no_run
//! use facet::{Profiler, ProfilerConfig};
//!
//! let config = ProfilerConfig {
//!     output: Some("profile_out".into()),
//!     ..ProfilerConfig::default()
//! };
//! let summary = Profiler::with_config(config)
//!     .profile_file("measurements.csv")
//!     .unwrap();
//!
//! println!("Profiled {} columns", summary.columns_profiled.len());
//! ```

pub mod cardinality;
pub mod classify;
pub mod distfit;
pub mod error;
pub mod input;
pub mod ops;
pub mod pairwise;
pub mod render;
pub mod report;
pub mod stats;
pub mod visuals;

mod profile;

pub use classify::{SemanticType, classify};
pub use error::{FacetError, Result};
pub use input::{Column, ColumnData, Dataset, Parser, SourceMetadata, StorageType};
pub use profile::{ColumnOutcome, Profiler, ProfilerConfig, RunSummary, auto_eda};
