//! HTTP transport for the platform APIs
//!
//! Every request carries the shared browser-identifying header set and the
//! session cookies as an explicit `Cookie` header. Cookies the server sets in
//! response are handed back to the caller, who decides whether to merge and
//! persist them.

use crate::api::endpoints::Endpoints;
use crate::api::responses::{PublishResponse, QrStatusResponse, SearchBizResponse};
use crate::config::HttpConfig;
use crate::session::Credentials;
use crate::{ConfigError, HarvestError};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, COOKIE, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use url::Url;

/// Upper bound on any single request
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Query parameters shared by the JSON endpoints
const JSON_PARAMS: [(&str, &str); 3] = [("lang", "zh_CN"), ("f", "json"), ("ajax", "1")];

/// A decoded reply plus the transport-level facts callers need
#[derive(Debug)]
pub struct Reply<T> {
    pub body: T,
    /// URL after following redirects
    pub final_url: Url,
    /// Cookies set by the server on this response
    pub rotated: Credentials,
}

/// Builds an HTTP client with the platform's browser-identifying headers
///
/// Redirects are followed (the home page redirect is how the token is minted).
pub fn build_http_client(config: &HttpConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, header_value("user_agent", &config.user_agent)?);
    headers.insert(ACCEPT, header_value("accept", &config.accept)?);
    headers.insert(
        ACCEPT_LANGUAGE,
        header_value("accept_language", &config.accept_language)?,
    );

    Ok(Client::builder()
        .default_headers(headers)
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()?)
}

fn header_value(field: &str, value: &str) -> Result<HeaderValue, ConfigError> {
    HeaderValue::from_str(value)
        .map_err(|e| ConfigError::Validation(format!("invalid {} header: {}", field, e)))
}

/// Maps a transport failure to a timeout or a generic HTTP error
fn classify_error(url: &str, error: reqwest::Error) -> HarvestError {
    if error.is_timeout() {
        HarvestError::Timeout {
            url: url.to_string(),
        }
    } else {
        HarvestError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}

fn rotated_cookies(response: &Response) -> Credentials {
    response
        .cookies()
        .map(|c| (c.name().to_string(), c.value().to_string()))
        .collect()
}

/// Client for the platform's cookie-authenticated endpoints
#[derive(Debug, Clone)]
pub struct MpClient {
    client: Client,
    endpoints: Endpoints,
    article_timeout: Duration,
}

impl MpClient {
    pub fn new(config: &HttpConfig) -> Result<Self, HarvestError> {
        Ok(Self {
            client: build_http_client(config)?,
            endpoints: Endpoints::for_base(&config.base_url)?,
            article_timeout: config.article_timeout(),
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    fn get(&self, url: &Url, credentials: &Credentials) -> RequestBuilder {
        let builder = self.client.get(url.clone());
        if credentials.is_empty() {
            builder
        } else {
            builder.header(COOKIE, credentials.cookie_header())
        }
    }

    async fn send(&self, url: &str, builder: RequestBuilder) -> Result<Response, HarvestError> {
        tracing::debug!("GET {}", url);
        let response = builder.send().await.map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn json<T: DeserializeOwned>(
        &self,
        layer: &'static str,
        url: &str,
        builder: RequestBuilder,
    ) -> Result<Reply<T>, HarvestError> {
        let response = self.send(url, builder).await?;
        let final_url = response.url().clone();
        let rotated = rotated_cookies(&response);
        let text = response.text().await.map_err(|e| classify_error(url, e))?;
        let body = serde_json::from_str(&text)
            .map_err(|source| HarvestError::Decode { layer, source })?;
        Ok(Reply {
            body,
            final_url,
            rotated,
        })
    }

    /// Requests the home page and reports where the redirects ended
    pub async fn resolve_home(&self, credentials: &Credentials) -> Result<Reply<()>, HarvestError> {
        let url = &self.endpoints.home;
        let response = self.send(url.as_str(), self.get(url, credentials)).await?;
        Ok(Reply {
            final_url: response.url().clone(),
            rotated: rotated_cookies(&response),
            body: (),
        })
    }

    /// Downloads the login QR image using the preliminary browser cookies
    pub async fn fetch_qrcode(&self, credentials: &Credentials) -> Result<Vec<u8>, HarvestError> {
        let url = &self.endpoints.scan_login;
        let random = chrono::Utc::now().timestamp_millis().to_string();
        let builder = self
            .get(url, credentials)
            .query(&[("action", "getqrcode"), ("random", random.as_str())]);

        let response = self.send(url.as_str(), builder).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| classify_error(url.as_str(), e))?;
        Ok(bytes.to_vec())
    }

    /// Polls the scan/confirm status of the issued QR code
    ///
    /// `timeout` bounds this request, capped at `REQUEST_TIMEOUT`.
    pub async fn ask_login_status(
        &self,
        credentials: &Credentials,
        timeout: Duration,
    ) -> Result<QrStatusResponse, HarvestError> {
        let url = &self.endpoints.scan_login;
        let builder = self
            .get(url, credentials)
            .query(&[("action", "ask"), ("token", "")])
            .query(&JSON_PARAMS)
            .timeout(timeout.min(REQUEST_TIMEOUT));

        let reply = self.json("login status", url.as_str(), builder).await?;
        Ok(reply.body)
    }

    /// Searches the account directory for `query`
    pub async fn search_accounts(
        &self,
        query: &str,
        token: &str,
        count: usize,
        credentials: &Credentials,
    ) -> Result<Reply<SearchBizResponse>, HarvestError> {
        let url = &self.endpoints.search_biz;
        let count = count.to_string();
        let builder = self
            .get(url, credentials)
            .query(&[
                ("action", "search_biz"),
                ("begin", "0"),
                ("count", count.as_str()),
                ("query", query),
                ("token", token),
            ])
            .query(&JSON_PARAMS);

        self.json("search", url.as_str(), builder).await
    }

    /// Requests one page of published articles starting at `offset`
    pub async fn list_published(
        &self,
        account_id: &str,
        token: &str,
        offset: usize,
        count: usize,
        credentials: &Credentials,
    ) -> Result<Reply<PublishResponse>, HarvestError> {
        let url = &self.endpoints.publish_list;
        let begin = offset.to_string();
        let count = count.to_string();
        let builder = self
            .get(url, credentials)
            .query(&[
                ("sub", "list"),
                ("begin", begin.as_str()),
                ("count", count.as_str()),
                ("query", ""),
                ("fakeid", account_id),
                ("type", "101_1"),
                ("free_publish_type", "1"),
                ("sub_action", "list_ex"),
                ("token", token),
            ])
            .query(&JSON_PARAMS);

        self.json("listing", url.as_str(), builder).await
    }

    /// Downloads an article page and decodes the body as UTF-8
    ///
    /// Escaped path separators (`\/`) in the link are normalized first.
    pub async fn fetch_article_html(
        &self,
        link: &str,
        credentials: &Credentials,
    ) -> Result<String, HarvestError> {
        let link = link.replace("\\/", "/");
        let url = Url::parse(&link)?;
        let builder = self
            .get(&url, credentials)
            .header("Upgrade-Insecure-Requests", "1")
            .timeout(self.article_timeout);

        let response = self.send(&link, builder).await?;
        let bytes = response.bytes().await.map_err(|e| classify_error(&link, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}
