use crate::config::types::{Config, CrawlConfig, DelayConfig, HttpConfig, LoginConfig, PathsConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_paths_config(&config.paths)?;
    validate_http_config(&config.http)?;
    validate_login_config(&config.login)?;
    validate_delay_config(&config.delays)?;
    Ok(())
}

/// Validates the account list
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.accounts.is_empty() {
        return Err(ConfigError::Validation(
            "at least one account must be configured".to_string(),
        ));
    }

    if let Some(blank) = config.accounts.iter().position(|a| a.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "account #{} is blank",
            blank + 1
        )));
    }

    Ok(())
}

/// Validates file locations
fn validate_paths_config(config: &PathsConfig) -> Result<(), ConfigError> {
    if config.cookie_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "cookie_file cannot be empty".to_string(),
        ));
    }

    if config.qrcode_file.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "qrcode_file cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates the upstream endpoint and header set
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "https" && url.scheme() != "http" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.article_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "article_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates QR login timing
fn validate_login_config(config: &LoginConfig) -> Result<(), ConfigError> {
    if config.cookie_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "cookie_attempts must be >= 1, got {}",
            config.cookie_attempts
        )));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "login timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.required_cookies.is_empty() {
        return Err(ConfigError::Validation(
            "required_cookies cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates request pacing
fn validate_delay_config(config: &DelayConfig) -> Result<(), ConfigError> {
    if config.article_min_ms > config.article_max_ms {
        return Err(ConfigError::Validation(format!(
            "article_min_ms ({}) must not exceed article_max_ms ({})",
            config.article_min_ms, config.article_max_ms
        )));
    }

    Ok(())
}
