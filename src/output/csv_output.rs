//! CSV output: one file per account with a `title,link,content` header

use crate::crawler::ArticleRecord;
use crate::output::traits::{ArticleSink, OutputResult};
use csv::{Writer, WriterBuilder};
use std::fs::File;
use std::path::{Path, PathBuf};

/// Column header written when the file is opened
pub const CSV_HEADER: [&str; 3] = ["title", "link", "content"];

/// CSV sink that flushes after every row
pub struct CsvArticleSink {
    writer: Writer<File>,
    rows: usize,
}

impl CsvArticleSink {
    /// Creates (or truncates) `path` and writes the header immediately
    pub fn create(path: &Path) -> OutputResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        // Header is written by hand so it lands on disk before the first row
        let mut writer = WriterBuilder::new().has_headers(false).from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        writer.flush()?;

        tracing::info!("Writing articles to {}", path.display());
        Ok(Self {
            writer,
            rows: 0,
        })
    }
}

impl ArticleSink for CsvArticleSink {
    fn write_article(&mut self, record: &ArticleRecord) -> OutputResult<()> {
        self.writer
            .write_record([&record.title, &record.link, &record.content])?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    fn rows_written(&self) -> usize {
        self.rows
    }
}

/// Output file for an account: `<dir>/<display name>.csv`
///
/// Path separators and other characters that are unsafe in file names are
/// replaced with `_`.
pub fn output_path_for(dir: &Path, account: &str) -> PathBuf {
    let name: String = account
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    dir.join(format!("{}.csv", name))
}
