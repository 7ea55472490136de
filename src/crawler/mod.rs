//! Crawler module for account resolution and article harvesting
//!
//! This module contains the core crawling logic, including:
//! - Token and account id resolution
//! - Operator selection among search candidates
//! - Listing pagination and the article budget
//! - Article content fetching and conversion
//! - Request pacing
//! - Overall run coordination

mod article;
mod coordinator;
mod identity;
mod pacing;
mod pagination;
mod selector;
mod types;

pub use article::{extract_article_text, fetch_content};
pub use coordinator::Harvester;
pub use identity::{resolve_account_id, resolve_token, Resolution};
pub use pacing::Pacer;
pub use pagination::{decode_publish_page, fetch_page, harvest_pages};
pub use selector::{
    render_candidates, stdin_selector, AccountSelector, FixedSelector, PromptSelector,
};
pub use types::{AccountOutcome, ArticleRecord, Page, PAGE_SIZE, SEARCH_COUNT};
