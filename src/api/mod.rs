//! Platform API module
//!
//! This module contains the HTTP side of the harvester:
//! - Endpoint URLs derived from the configured base URL
//! - The cookie-injecting client with rotated-cookie capture
//! - Response shapes for the QR, search, and listing endpoints

mod client;
mod endpoints;
mod responses;

pub use client::{build_http_client, MpClient, Reply};
pub use endpoints::Endpoints;
pub use responses::{
    extract_token, AccountCandidate, AppMsg, BaseResp, PublishEnvelope, PublishInfo, PublishPage,
    PublishResponse, QrStatus, QrStatusResponse, SearchBizResponse,
};
