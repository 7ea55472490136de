//! Session module: credentials, their durable record, and validity checks
//!
//! # Components
//!
//! - `Credentials`: the cookie map threaded through every API call
//! - `SessionStore`: load/save of the single "current session" record
//! - `LiveSession`: the credentials in use plus write-back of rotated cookies
//! - `validate`: one cheap authenticated request deciding whether a stored
//!   session can be reused

mod credentials;
mod store;

pub use credentials::Credentials;
pub use store::{JsonFileStore, SessionError, SessionResult, SessionStore};

use crate::api::{extract_token, MpClient};

/// Credentials in use during a run, bound to the store they persist to
///
/// Calls that may rotate cookies hand the rotated values to `absorb`, which
/// merges them and writes the union back before the next request is made.
pub struct LiveSession<'a> {
    credentials: Credentials,
    store: &'a dyn SessionStore,
}

impl<'a> LiveSession<'a> {
    pub fn new(credentials: Credentials, store: &'a dyn SessionStore) -> Self {
        Self { credentials, store }
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Merges cookies set by a response and persists the result
    pub fn absorb(&mut self, rotated: &Credentials) -> SessionResult<()> {
        if rotated.is_empty() {
            return Ok(());
        }

        self.credentials.absorb(rotated);
        self.store.save(&self.credentials)?;
        tracing::info!("Updated stored session with {} rotated cookies", rotated.len());
        Ok(())
    }
}

/// Checks whether `credentials` still authenticate
///
/// Requests the home page and follows redirects; the session is valid when the
/// resolved URL carries a `token=` query parameter. Transport errors count as
/// invalid.
pub async fn validate(client: &MpClient, credentials: &Credentials) -> bool {
    check_home(client, credentials).await.is_some()
}

/// Like `validate`, but returns the cookies rotated by a successful check
async fn check_home(client: &MpClient, credentials: &Credentials) -> Option<Credentials> {
    match client.resolve_home(credentials).await {
        Ok(reply) => {
            if extract_token(reply.final_url.as_str()).is_some() {
                tracing::info!("Stored session is still valid");
                Some(reply.rotated)
            } else {
                tracing::info!("Stored session has expired");
                None
            }
        }
        Err(e) => {
            tracing::error!("Failed to validate stored session: {}", e);
            None
        }
    }
}

/// Loads the stored session and returns it only if it still validates
///
/// Cookies rotated by the validation request are merged in and written back
/// to `store`.
pub async fn load_valid<S: SessionStore + ?Sized>(
    client: &MpClient,
    store: &S,
) -> Option<Credentials> {
    let mut credentials = match store.load() {
        Ok(Some(c)) => c,
        Ok(None) => {
            tracing::info!("No stored session found");
            return None;
        }
        Err(e) => {
            tracing::error!("Failed to read stored session: {}", e);
            return None;
        }
    };

    let rotated = check_home(client, &credentials).await?;
    if credentials.absorb(&rotated) {
        match store.save(&credentials) {
            Ok(()) => tracing::info!("Updated stored session with {} rotated cookies", rotated.len()),
            Err(e) => tracing::error!("Failed to save rotated cookies: {}", e),
        }
    }
    Some(credentials)
}
