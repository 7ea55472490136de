/// QR login state definitions
///
/// This module defines every state of the QR login flow and which moves between
/// them are legal.
use std::fmt;

/// Represents the current state of a QR login attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LoginState {
    // ===== Browser Phase =====
    /// Controlled browser is being launched
    BrowserStarting,

    /// Browser is on the home page; polling its cookie jar
    AwaitingPrelimCookies,

    // ===== QR Phase =====
    /// Preliminary cookies are complete; QR image is being fetched
    QrIssued,

    /// QR image is on disk; waiting for the operator to scan it
    AwaitingScan,

    /// Scanned; waiting for the operator to confirm on the phone
    ScannedAwaitingConfirm,

    /// Login confirmed by the platform
    Confirmed,

    // ===== Terminal States =====
    /// Final cookies harvested and persisted
    CookiesCaptured,

    /// The attempt failed; reachable from every other state
    Failed,
}

impl LoginState {
    /// Returns true if no further transition is possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::CookiesCaptured | Self::Failed)
    }

    /// Returns true if the attempt succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, Self::CookiesCaptured)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: LoginState) -> bool {
        use LoginState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (BrowserStarting, AwaitingPrelimCookies)
                | (AwaitingPrelimCookies, QrIssued)
                | (QrIssued, AwaitingScan)
                | (AwaitingScan, ScannedAwaitingConfirm)
                | (AwaitingScan, Confirmed)
                | (ScannedAwaitingConfirm, Confirmed)
                | (Confirmed, CookiesCaptured)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BrowserStarting => "browser_starting",
            Self::AwaitingPrelimCookies => "awaiting_prelim_cookies",
            Self::QrIssued => "qr_issued",
            Self::AwaitingScan => "awaiting_scan",
            Self::ScannedAwaitingConfirm => "scanned_awaiting_confirm",
            Self::Confirmed => "confirmed",
            Self::CookiesCaptured => "cookies_captured",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for LoginState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
