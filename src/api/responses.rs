//! JSON shapes returned by the platform's `cgi-bin` endpoints

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::sync::OnceLock;

/// Top-level status block carried by most responses
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BaseResp {
    #[serde(default)]
    pub ret: i64,
    #[serde(default)]
    pub err_msg: String,
}

/// Reply of the QR status poll (`scanloginqrcode?action=ask`)
#[derive(Debug, Clone, Deserialize)]
pub struct QrStatusResponse {
    #[serde(default)]
    pub status: Option<i64>,
}

/// Login progress reported by the status poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QrStatus {
    /// QR code not scanned yet (status 0)
    Waiting,
    /// Scanned, waiting for the operator to confirm on the phone (status 4)
    Scanned,
    /// Login confirmed (status 1)
    Confirmed,
    /// Any other or missing status; treated as not yet confirmed
    Unknown(Option<i64>),
}

impl QrStatus {
    pub fn from_code(code: Option<i64>) -> Self {
        match code {
            Some(0) => Self::Waiting,
            Some(4) => Self::Scanned,
            Some(1) => Self::Confirmed,
            other => Self::Unknown(other),
        }
    }
}

impl QrStatusResponse {
    pub fn status(&self) -> QrStatus {
        QrStatus::from_code(self.status)
    }
}

/// Reply of the account directory search (`searchbiz`)
#[derive(Debug, Clone, Deserialize)]
pub struct SearchBizResponse {
    #[serde(default)]
    pub base_resp: Option<BaseResp>,
    #[serde(default)]
    pub list: Vec<AccountCandidate>,
}

/// One search hit for an account query
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountCandidate {
    #[serde(rename = "nickname", default = "unknown_name")]
    pub display_name: String,

    /// Internal account identifier required by the listing endpoint
    #[serde(rename = "fakeid", default)]
    pub id: String,

    #[serde(default, deserialize_with = "truthy")]
    pub verified: bool,

    #[serde(rename = "signature", default)]
    pub description: String,
}

fn unknown_name() -> String {
    "(unknown)".to_string()
}

/// Accepts `true`, non-zero numbers, and non-empty strings other than "0"
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        Value::String(s) => !s.is_empty() && s != "0",
        _ => false,
    })
}

/// Outer reply of the article listing (`appmsgpublish`)
///
/// `publish_page` is itself a JSON document serialized into a string.
#[derive(Debug, Clone, Deserialize)]
pub struct PublishResponse {
    #[serde(default)]
    pub base_resp: Option<BaseResp>,
    #[serde(default)]
    pub publish_page: Option<String>,
}

/// Second layer: decoded `publish_page`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishPage {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub publish_list: Vec<Option<PublishEnvelope>>,
}

/// One publish event; `publish_info` is yet another serialized JSON document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishEnvelope {
    #[serde(default)]
    pub publish_info: Option<String>,
}

/// Third layer: decoded `publish_info`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PublishInfo {
    #[serde(default)]
    pub appmsgex: Vec<AppMsg>,
}

/// Article metadata inside a publish event
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppMsg {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub link: String,
}

/// Extracts the numeric API token from a `token=` query parameter
pub fn extract_token(url: &str) -> Option<String> {
    static TOKEN_RE: OnceLock<regex::Regex> = OnceLock::new();
    let re = TOKEN_RE.get_or_init(|| regex::Regex::new(r"token=(\d+)").expect("valid regex"));
    re.captures(url).map(|c| c[1].to_string())
}
