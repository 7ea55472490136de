//! Article listing pagination
//!
//! The listing endpoint returns its payload as JSON nested inside JSON strings:
//!
//! ```text
//! { base_resp, publish_page: "<json>" }
//!                  └─ { total_count, publish_list: [ { publish_info: "<json>" } ] }
//!                                                         └─ { appmsgex: [ { title, link } ] }
//! ```
//!
//! `harvest_pages` walks the pages `PAGE_SIZE` at a time, fetching content for
//! each listed article and writing it to the sink before moving on, until the
//! article budget is spent or the listing runs out.

use super::article::fetch_content;
use super::pacing::Pacer;
use super::types::{ArticleRecord, Page, PAGE_SIZE};
use crate::api::{MpClient, PublishInfo, PublishPage, PublishResponse};
use crate::output::ArticleSink;
use crate::session::LiveSession;
use crate::HarvestError;

/// Decodes all three layers of a listing response into a `Page`
///
/// Missing or empty inner layers decode as empty; malformed ones are errors.
pub fn decode_publish_page(response: &PublishResponse) -> Result<Page, HarvestError> {
    let raw_page = match response.publish_page.as_deref() {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(Page::default()),
    };

    let page: PublishPage =
        serde_json::from_str(raw_page).map_err(|source| HarvestError::Decode {
            layer: "publish_page",
            source,
        })?;

    let mut articles = Vec::new();
    for envelope in page.publish_list.iter().flatten() {
        let raw_info = match envelope.publish_info.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => continue,
        };

        let info: PublishInfo =
            serde_json::from_str(raw_info).map_err(|source| HarvestError::Decode {
                layer: "publish_info",
                source,
            })?;

        articles.extend(
            info.appmsgex
                .into_iter()
                .map(|msg| ArticleRecord::new(msg.title, msg.link)),
        );
    }

    Ok(Page {
        articles,
        total_count: page.total_count,
    })
}

/// Requests and decodes one listing page starting at `offset`
///
/// A non-zero `base_resp.ret` is returned as `HarvestError::Api`; the caller
/// stops paginating the account on any error.
pub async fn fetch_page(
    client: &MpClient,
    account_id: &str,
    token: &str,
    offset: usize,
    session: &mut LiveSession<'_>,
) -> Result<Page, HarvestError> {
    let reply = client
        .list_published(account_id, token, offset, PAGE_SIZE, session.credentials())
        .await?;
    session.absorb(&reply.rotated)?;

    if let Some(base) = &reply.body.base_resp {
        if base.ret != 0 {
            return Err(HarvestError::Api {
                ret: base.ret,
                message: base.err_msg.clone(),
            });
        }
    }

    let page = decode_publish_page(&reply.body)?;
    tracing::debug!(
        "Listing page at offset {}: {} articles of {}",
        offset,
        page.articles.len(),
        page.total_count
    );
    for article in &page.articles {
        tracing::info!("Listed: {}", article.title);
    }
    Ok(page)
}

/// Whether an empty page means the listing is exhausted
///
/// An empty page inside the reported total can happen when published items
/// were deleted, so only an empty page at or past the end stops pagination.
fn listing_exhausted(page: &Page, offset: usize) -> bool {
    page.articles.is_empty() && (offset + PAGE_SIZE) as u64 >= page.total_count
}

/// Crawls an account's listing into `sink`, writing at most `budget` records
///
/// Every record is written as soon as its content fetch finishes, so an error
/// part-way leaves earlier rows in place. No request is issued once `budget`
/// records have been written.
pub async fn harvest_pages(
    client: &MpClient,
    account_id: &str,
    token: &str,
    budget: usize,
    pacer: &Pacer,
    session: &mut LiveSession<'_>,
    sink: &mut dyn ArticleSink,
) -> Result<(), HarvestError> {
    let mut offset = 0;

    'pages: loop {
        if sink.rows_written() >= budget {
            tracing::info!("Reached the article limit ({})", budget);
            break;
        }

        let page = fetch_page(client, account_id, token, offset, session).await?;
        if listing_exhausted(&page, offset) {
            tracing::info!("No more articles after offset {}", offset);
            break;
        }

        for mut article in page.articles {
            article.content = fetch_content(client, &article.link, session.credentials()).await;
            sink.write_article(&article)?;
            tracing::info!(
                "Saved article {}/{}: {}",
                sink.rows_written(),
                budget,
                article.title
            );

            // No pause once the last allowed article is written
            if sink.rows_written() >= budget {
                tracing::info!("Reached the article limit ({})", budget);
                break 'pages;
            }
            pacer.after_article().await;
        }

        offset += PAGE_SIZE;
        pacer.after_page().await;
    }

    Ok(())
}
