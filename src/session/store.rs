//! Durable storage of the current session record

use crate::session::Credentials;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or saving the session record
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Corrupt session record {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for session store operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Trait for session record backends
///
/// There is exactly one record, "the current session". `save` replaces it
/// wholesale; callers merge rotated cookies before saving.
pub trait SessionStore {
    /// Loads the current record, or `None` if nothing has been saved yet
    fn load(&self) -> SessionResult<Option<Credentials>>;

    /// Overwrites the current record
    fn save(&self, credentials: &Credentials) -> SessionResult<()>;
}

/// Session record kept as a single JSON object in a local file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> SessionResult<Option<Credentials>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SessionError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let credentials =
            serde_json::from_str(&content).map_err(|source| SessionError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!("Loaded session record from {}", self.path.display());
        Ok(Some(credentials))
    }

    fn save(&self, credentials: &Credentials) -> SessionResult<()> {
        let json = serde_json::to_string(credentials)?;
        std::fs::write(&self.path, json).map_err(|source| SessionError::Io {
            path: self.path.clone(),
            source,
        })?;

        #[cfg(unix)]
        {
            // Session cookies grant account access; owner-only
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.path, perms).map_err(|source| SessionError::Io {
                path: self.path.clone(),
                source,
            })?;
        }

        tracing::debug!(
            "Saved {} session cookies to {}",
            credentials.len(),
            self.path.display()
        );
        Ok(())
    }
}
