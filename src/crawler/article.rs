//! Article content fetching and HTML-to-text conversion
//!
//! The rendered article page holds the body in a single `.rich_media_content`
//! element. That element is converted to Markdown-flavoured text, keeping link
//! and image references and dropping `<script>`/`<style>` subtrees.

use crate::api::MpClient;
use crate::session::Credentials;
use crate::HarvestError;
use htmd::HtmlToMarkdown;
use scraper::{Html, Selector};

/// Structural marker of the article body
const CONTENT_SELECTOR: &str = ".rich_media_content";

/// Fetches an article page and returns its body as text
///
/// Never fails: a timeout, transport error, missing content region, or
/// conversion error is logged and yields an empty string.
pub async fn fetch_content(client: &MpClient, link: &str, credentials: &Credentials) -> String {
    let html = match client.fetch_article_html(link, credentials).await {
        Ok(html) => html,
        Err(HarvestError::Timeout { .. }) => {
            tracing::error!("Article request timed out: {}", link);
            return String::new();
        }
        Err(e) => {
            tracing::error!("Article request failed: {}", e);
            return String::new();
        }
    };

    match extract_article_text(&html) {
        Ok(Some(text)) => text,
        Ok(None) => {
            tracing::error!("No article content found: {}", link);
            String::new()
        }
        Err(e) => {
            tracing::error!("Failed to convert article content {}: {}", link, e);
            String::new()
        }
    }
}

/// Converts the content region of an article page to text
///
/// # Returns
///
/// * `Ok(Some(text))` - Content region found and converted (trimmed)
/// * `Ok(None)` - The page has no content region
/// * `Err(io::Error)` - The converter rejected the markup
pub fn extract_article_text(html: &str) -> std::io::Result<Option<String>> {
    let document = Html::parse_document(html);

    let Ok(selector) = Selector::parse(CONTENT_SELECTOR) else {
        return Ok(None);
    };

    let Some(region) = document.select(&selector).next() else {
        return Ok(None);
    };

    let converter = HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style"])
        .build();

    let text = converter.convert(&region.html())?;
    Ok(Some(text.trim().to_string()))
}
