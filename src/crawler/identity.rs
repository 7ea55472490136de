//! Token and account identity resolution
//!
//! Every authenticated call needs the per-session `token`, which the platform
//! only reveals as a query parameter of the URL the home page redirects to.
//! Account display names are resolved to internal ids through the directory
//! search, with the final choice left to an `AccountSelector`.

use super::selector::AccountSelector;
use super::types::SEARCH_COUNT;
use crate::api::{extract_token, AccountCandidate, MpClient};
use crate::session::LiveSession;
use crate::HarvestError;

/// Result of resolving a display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Selected(AccountCandidate),
    NoMatch,
    Cancelled,
}

/// Follows the home page redirect and returns the session token
///
/// Cookies set along the way are merged into `session` and persisted.
pub async fn resolve_token(
    client: &MpClient,
    session: &mut LiveSession<'_>,
) -> Result<String, HarvestError> {
    let reply = client.resolve_home(session.credentials()).await?;
    session.absorb(&reply.rotated)?;

    match extract_token(reply.final_url.as_str()) {
        Some(token) => {
            tracing::debug!("Resolved session token");
            Ok(token)
        }
        None => {
            tracing::error!("No token in redirect target {}", reply.final_url);
            Err(HarvestError::TokenUnavailable)
        }
    }
}

/// Searches the directory for `query` and lets `selector` pick a candidate
///
/// Cookies rotated by the search response are merged into `session` and
/// persisted before returning.
pub async fn resolve_account_id(
    client: &MpClient,
    query: &str,
    token: &str,
    session: &mut LiveSession<'_>,
    selector: &mut dyn AccountSelector,
) -> Result<Resolution, HarvestError> {
    let reply = client
        .search_accounts(query, token, SEARCH_COUNT, session.credentials())
        .await?;
    session.absorb(&reply.rotated)?;

    let response = reply.body;
    if let Some(base) = &response.base_resp {
        if base.ret != 0 {
            return Err(HarvestError::Api {
                ret: base.ret,
                message: base.err_msg.clone(),
            });
        }
    }

    if response.list.is_empty() {
        tracing::error!("No account matches '{}'", query);
        return Ok(Resolution::NoMatch);
    }

    let Some(index) = selector.select(query, &response.list) else {
        tracing::info!("No account selected for '{}'", query);
        return Ok(Resolution::Cancelled);
    };

    match response.list.into_iter().nth(index) {
        Some(candidate) => {
            tracing::info!(
                "Selected account {} ({})",
                candidate.display_name,
                candidate.id
            );
            Ok(Resolution::Selected(candidate))
        }
        None => {
            tracing::warn!("Selector returned out-of-range index {}", index);
            Ok(Resolution::Cancelled)
        }
    }
}
