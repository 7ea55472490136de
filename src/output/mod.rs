//! Output module for persisting harvested articles
//!
//! This module handles:
//! - The `ArticleSink` interface the crawl writes through
//! - Per-account CSV files, flushed row by row
//! - The end-of-run summary

mod csv_output;
mod summary;
mod traits;

pub use csv_output::{output_path_for, CsvArticleSink, CSV_HEADER};
pub use summary::{print_summary, RunSummary};
pub use traits::{ArticleSink, MemorySink, OutputError, OutputResult};
