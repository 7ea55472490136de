use serde::Serialize;
use std::fmt;

/// Number of articles requested per listing page
pub const PAGE_SIZE: usize = 5;

/// Number of candidates requested from the account directory
pub const SEARCH_COUNT: usize = 5;

/// One article as written to the output
///
/// `content` is filled in after listing, independently of the other fields; a
/// failed fetch leaves it empty without dropping the record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ArticleRecord {
    pub title: String,
    pub link: String,
    pub content: String,
}

impl ArticleRecord {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            content: String::new(),
        }
    }
}

/// One listing page: metadata-only records plus the reported total
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub articles: Vec<ArticleRecord>,
    pub total_count: u64,
}

/// How the crawl of one account ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountOutcome {
    /// Pagination finished or the budget was reached
    Completed { saved: usize },
    /// The directory search returned no candidates
    NoMatch,
    /// The operator declined to pick a candidate
    Cancelled,
    /// The account was abandoned; rows already written stay on disk
    Failed { saved: usize, reason: String },
}

impl AccountOutcome {
    pub fn saved(&self) -> usize {
        match self {
            Self::Completed { saved } | Self::Failed { saved, .. } => *saved,
            Self::NoMatch | Self::Cancelled => 0,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

impl fmt::Display for AccountOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed { saved } => write!(f, "completed ({} articles)", saved),
            Self::NoMatch => write!(f, "no matching account"),
            Self::Cancelled => write!(f, "selection cancelled"),
            Self::Failed { saved, reason } => {
                write!(f, "failed after {} articles: {}", saved, reason)
            }
        }
    }
}
