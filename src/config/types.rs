use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure for mp-harvest
///
/// Every section and field has a default, so an empty TOML file (or no file at
/// all) yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub browser: BrowserConfig,
    pub paths: PathsConfig,
    pub http: HttpConfig,
    pub login: LoginConfig,
    pub delays: DelayConfig,
}

/// Which accounts to crawl and how much of each
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Display names of the accounts to crawl, in order
    pub accounts: Vec<String>,

    /// Crawl budget: maximum number of articles written per account
    #[serde(rename = "max-articles")]
    pub max_articles: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            accounts: vec!["极客时间".to_string()],
            max_articles: 10,
        }
    }
}

/// Controlled browser settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Path of the Chrome/Chromium executable; auto-detected when absent
    pub executable: Option<PathBuf>,

    /// Run the browser without a window
    pub headless: bool,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
        }
    }
}

/// Local file locations
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// JSON record holding the current session cookies
    #[serde(rename = "cookie-file")]
    pub cookie_file: PathBuf,

    /// Where the login QR image is written for the operator
    #[serde(rename = "qrcode-file")]
    pub qrcode_file: PathBuf,

    /// Directory receiving one CSV file per account
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            cookie_file: PathBuf::from("account_cookie.txt"),
            qrcode_file: PathBuf::from("qrcode.png"),
            output_dir: PathBuf::from("."),
        }
    }
}

/// Upstream endpoint and the browser-identifying header set
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub accept: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    /// Timeout for a single article page request (seconds)
    #[serde(rename = "article-timeout-secs")]
    pub article_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: "https://mp.weixin.qq.com".to_string(),
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/129.0.0.0 Safari/537.36".to_string(),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8".to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
            article_timeout_secs: 20,
        }
    }
}

impl HttpConfig {
    pub fn article_timeout(&self) -> Duration {
        Duration::from_secs(self.article_timeout_secs)
    }
}

/// QR login timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginConfig {
    /// How many times the browser cookie jar is polled for the preliminary cookies
    #[serde(rename = "cookie-attempts")]
    pub cookie_attempts: u32,

    #[serde(rename = "cookie-poll-interval-ms")]
    pub cookie_poll_interval_ms: u64,

    #[serde(rename = "status-poll-interval-ms")]
    pub status_poll_interval_ms: u64,

    /// Wall-clock bound on waiting for the operator to scan and confirm
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Pause after confirmation before the final cookies are harvested
    #[serde(rename = "settle-delay-ms")]
    pub settle_delay_ms: u64,

    /// Cookie names that must be present before a QR code can be requested
    #[serde(rename = "required-cookies")]
    pub required_cookies: Vec<String>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            cookie_attempts: 10,
            cookie_poll_interval_ms: 3000,
            status_poll_interval_ms: 2000,
            timeout_secs: 120,
            settle_delay_ms: 4000,
            required_cookies: vec!["ua_id".to_string(), "uuid".to_string(), "_clck".to_string()],
        }
    }
}

impl LoginConfig {
    pub fn cookie_poll_interval(&self) -> Duration {
        Duration::from_millis(self.cookie_poll_interval_ms)
    }

    pub fn status_poll_interval(&self) -> Duration {
        Duration::from_millis(self.status_poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }
}

/// Fixed pacing between requests (milliseconds)
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Lower bound of the randomized pause after each article
    #[serde(rename = "article-min-ms")]
    pub article_min_ms: u64,

    /// Upper bound of the randomized pause after each article
    #[serde(rename = "article-max-ms")]
    pub article_max_ms: u64,

    /// Pause between two listing pages
    #[serde(rename = "page-ms")]
    pub page_ms: u64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            article_min_ms: 2000,
            article_max_ms: 4000,
            page_ms: 2000,
        }
    }
}

impl DelayConfig {
    /// No pacing at all, used by tests
    pub fn none() -> Self {
        Self {
            article_min_ms: 0,
            article_max_ms: 0,
            page_ms: 0,
        }
    }
}
