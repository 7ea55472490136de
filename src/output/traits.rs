//! Output sink trait and error types
//!
//! This module defines the interface the crawl writes articles through.

use crate::crawler::ArticleRecord;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Append-only destination for one account's articles
///
/// Each record must be durable before `write_article` returns, so an
/// interrupted run keeps every row written so far.
pub trait ArticleSink {
    /// Appends one fully-populated record
    fn write_article(&mut self, record: &ArticleRecord) -> OutputResult<()>;

    /// Number of records written so far
    fn rows_written(&self) -> usize;
}

/// In-memory sink, useful for callers that post-process records
#[derive(Debug, Default)]
pub struct MemorySink {
    pub records: Vec<ArticleRecord>,
}

impl ArticleSink for MemorySink {
    fn write_article(&mut self, record: &ArticleRecord) -> OutputResult<()> {
        self.records.push(record.clone());
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.records.len()
    }
}
