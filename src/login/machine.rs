//! QR login state machine
//!
//! Drives one controlled browser through the platform's QR login:
//!
//! 1. Launch the browser and open the home page
//! 2. Poll the browser cookie jar until the preliminary cookies exist
//! 3. Download the QR image for the operator
//! 4. Poll the status endpoint until the login is confirmed or times out
//! 5. Re-open the home page and harvest the final cookie set
//!
//! The browser is shut down on every exit path.

use crate::api::{MpClient, QrStatus};
use crate::config::LoginConfig;
use crate::login::browser::{BrowserLauncher, LoginBrowser};
use crate::login::state::LoginState;
use crate::session::{Credentials, SessionStore};
use crate::HarvestError;
use std::path::{Path, PathBuf};
use tokio::time::{sleep, Instant};

/// One QR login attempt
pub struct QrLogin<'a, L: BrowserLauncher, S: SessionStore + ?Sized> {
    client: &'a MpClient,
    launcher: &'a L,
    store: &'a S,
    settings: &'a LoginConfig,
    qrcode_path: PathBuf,
    state: LoginState,
}

impl<'a, L: BrowserLauncher, S: SessionStore + ?Sized> QrLogin<'a, L, S> {
    pub fn new(
        client: &'a MpClient,
        launcher: &'a L,
        store: &'a S,
        settings: &'a LoginConfig,
        qrcode_path: &Path,
    ) -> Self {
        Self {
            client,
            launcher,
            store,
            settings,
            qrcode_path: qrcode_path.to_path_buf(),
            state: LoginState::BrowserStarting,
        }
    }

    /// Current state of the attempt
    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Runs the whole login flow
    ///
    /// Returns the captured (and already persisted) credentials, or `None` if
    /// any step failed. Failures are logged, never propagated.
    pub async fn run(&mut self) -> Option<Credentials> {
        self.state = LoginState::BrowserStarting;

        match self.attempt().await {
            Ok(credentials) => {
                tracing::info!("QR login succeeded, {} cookies captured", credentials.len());
                Some(credentials)
            }
            Err(e) => {
                tracing::error!("QR login failed in state {}: {}", self.state, e);
                self.state = LoginState::Failed;
                None
            }
        }
    }

    async fn attempt(&mut self) -> Result<Credentials, HarvestError> {
        tracing::info!("Starting browser for QR login");
        let mut browser = self.launcher.launch().await?;

        let result = self.drive(&mut browser).await;

        if let Err(e) = browser.quit().await {
            tracing::warn!("Failed to shut down browser cleanly: {}", e);
        }

        result
    }

    async fn drive(&mut self, browser: &mut L::Browser) -> Result<Credentials, HarvestError> {
        let home = self.client.endpoints().home.to_string();

        browser.navigate(&home).await?;
        self.advance(LoginState::AwaitingPrelimCookies)?;

        let prelim = self.wait_for_cookies(browser).await?;
        self.advance(LoginState::QrIssued)?;

        self.issue_qrcode(&prelim).await?;
        self.advance(LoginState::AwaitingScan)?;

        self.wait_for_confirmation(&prelim).await?;

        // Cookies are not complete at the moment of confirmation
        sleep(self.settings.settle_delay()).await;
        browser.navigate(&home).await?;

        let credentials = browser.cookies().await?;
        if credentials.is_empty() {
            return Err(HarvestError::LoginFailed(
                "browser returned no cookies after confirmation".to_string(),
            ));
        }

        self.store.save(&credentials)?;
        self.advance(LoginState::CookiesCaptured)?;
        Ok(credentials)
    }

    fn advance(&mut self, next: LoginState) -> Result<(), HarvestError> {
        if !self.state.can_transition_to(next) {
            return Err(HarvestError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::info!("Login state: {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Polls the browser cookie jar until every required cookie is present
    ///
    /// Every other attempt reloads the page to coax the server into setting them.
    async fn wait_for_cookies(
        &mut self,
        browser: &mut L::Browser,
    ) -> Result<Credentials, HarvestError> {
        let attempts = self.settings.cookie_attempts;
        let required = &self.settings.required_cookies;
        let mut missing = required.clone();

        for attempt in 0..attempts {
            let cookies = browser.cookies().await?;
            missing = cookies.missing(required).into_iter().map(String::from).collect();

            if missing.is_empty() {
                tracing::info!("All required cookies present");
                return Ok(cookies);
            }

            tracing::info!(
                "Attempt {}/{}: still missing cookies {:?}",
                attempt + 1,
                attempts,
                missing
            );

            if attempt % 2 == 0 {
                browser.refresh().await?;
            }
            sleep(self.settings.cookie_poll_interval()).await;
        }

        Err(HarvestError::CookieTimeout { attempts, missing })
    }

    async fn issue_qrcode(&self, prelim: &Credentials) -> Result<(), HarvestError> {
        let image = self.client.fetch_qrcode(prelim).await?;
        std::fs::write(&self.qrcode_path, image)?;
        tracing::info!(
            "QR code saved to {}, scan it to log in",
            self.qrcode_path.display()
        );
        Ok(())
    }

    /// Polls the status endpoint until confirmed or the login timeout elapses
    async fn wait_for_confirmation(&mut self, prelim: &Credentials) -> Result<(), HarvestError> {
        let timeout = self.settings.timeout();
        let deadline = Instant::now() + timeout;

        while Instant::now() < deadline {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.client.ask_login_status(prelim, remaining).await {
                Ok(reply) => match reply.status() {
                    QrStatus::Waiting => tracing::info!("Waiting for QR scan..."),
                    QrStatus::Scanned => {
                        if self.state == LoginState::AwaitingScan {
                            self.advance(LoginState::ScannedAwaitingConfirm)?;
                        }
                        tracing::info!("QR scanned, waiting for confirmation...");
                    }
                    QrStatus::Confirmed => {
                        self.advance(LoginState::Confirmed)?;
                        return Ok(());
                    }
                    QrStatus::Unknown(code) => {
                        tracing::warn!("Unrecognized login status: {:?}", code);
                    }
                },
                Err(e) => tracing::error!("Failed to poll login status: {}", e),
            }

            sleep(self.settings.status_poll_interval()).await;
        }

        Err(HarvestError::LoginTimeout {
            waited_secs: timeout.as_secs(),
        })
    }
}
