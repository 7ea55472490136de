//! Login module for acquiring a fresh session through a QR scan
//!
//! # Components
//!
//! - `LoginState`: the states of a login attempt and their legal transitions
//! - `LoginBrowser` / `BrowserLauncher`: the controlled browser seam
//! - `ChromeLauncher`: DevTools-protocol implementation of the seam
//! - `QrLogin`: the state machine driving one attempt

mod browser;
mod machine;
mod state;

pub use browser::{BrowserError, BrowserLauncher, ChromeBrowser, ChromeLauncher, LoginBrowser};
pub use machine::QrLogin;
pub use state::LoginState;
