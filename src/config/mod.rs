//! Configuration module for mp-harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Command-line arguments and environment variables are layered on top in `main`.
//!
//! # Example
//!
//! ```no_run
//! use mp_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawling {} accounts", config.crawl.accounts.len());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    BrowserConfig, Config, CrawlConfig, DelayConfig, HttpConfig, LoginConfig, PathsConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_account_list, parse_config};
pub use validation::validate;
