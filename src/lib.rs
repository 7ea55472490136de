//! mp-harvest: article harvester for QR-login protected publishing platforms
//!
//! This crate logs into the platform once through a controlled browser, keeps the
//! resulting session on disk, and walks the paginated article listing of each
//! configured account, writing every article as a CSV row as soon as it is fetched.

pub mod api;
pub mod config;
pub mod crawler;
pub mod login;
pub mod output;
pub mod session;

use thiserror::Error;

/// Main error type for mp-harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Unexpected HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("API error (ret {ret}): {message}")]
    Api { ret: i64, message: String },

    #[error("Malformed {layer} payload: {source}")]
    Decode {
        layer: &'static str,
        source: serde_json::Error,
    },

    #[error("No token found in the resolved home page URL")]
    TokenUnavailable,

    #[error("No valid session and QR login did not complete")]
    NoSession,

    #[error("Browser never set cookies {missing:?} after {attempts} attempts")]
    CookieTimeout { attempts: u32, missing: Vec<String> },

    #[error("QR login not confirmed within {waited_secs}s")]
    LoginTimeout { waited_secs: u64 },

    #[error("Login failed: {0}")]
    LoginFailed(String),

    #[error("Invalid login transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: login::LoginState,
        to: login::LoginState,
    },

    #[error("Session error: {0}")]
    Session(#[from] session::SessionError),

    #[error("Browser error: {0}")]
    Browser(#[from] login::BrowserError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for mp-harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use api::MpClient;
pub use config::Config;
pub use crawler::{AccountOutcome, ArticleRecord, Harvester};
pub use login::{ChromeLauncher, LoginState, QrLogin};
pub use output::RunSummary;
pub use session::{Credentials, JsonFileStore, LiveSession, SessionStore};
