//! Crawl coordinator - run-level orchestration
//!
//! A run establishes one session (reusing the stored one when it still
//! validates, otherwise through the QR login), then crawls each configured
//! account in order. Every account ends in an `AccountOutcome`; a failure in
//! one account never prevents the next one from being attempted.

use super::identity::{resolve_account_id, resolve_token, Resolution};
use super::pacing::Pacer;
use super::pagination::harvest_pages;
use super::selector::AccountSelector;
use super::types::AccountOutcome;
use crate::api::MpClient;
use crate::config::Config;
use crate::login::{BrowserLauncher, QrLogin};
use crate::output::{output_path_for, ArticleSink, CsvArticleSink, RunSummary};
use crate::session::{self, Credentials, JsonFileStore, LiveSession};
use crate::HarvestError;

/// Main harvester structure
pub struct Harvester<L: BrowserLauncher> {
    config: Config,
    client: MpClient,
    store: JsonFileStore,
    launcher: L,
    pacer: Pacer,
}

impl<L: BrowserLauncher> Harvester<L> {
    /// Creates a harvester for `config`
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `launcher` - Starts the browser used for QR login when needed
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config, launcher: L) -> Result<Self, HarvestError> {
        let client = MpClient::new(&config.http)?;
        let store = JsonFileStore::new(config.paths.cookie_file.clone());
        let pacer = Pacer::new(&config.delays);

        Ok(Self {
            config,
            client,
            store,
            launcher,
            pacer,
        })
    }

    pub fn client(&self) -> &MpClient {
        &self.client
    }

    pub fn store(&self) -> &JsonFileStore {
        &self.store
    }

    pub fn launcher(&self) -> &L {
        &self.launcher
    }

    /// Returns usable credentials, logging in through the browser if needed
    pub async fn ensure_session(&self) -> Option<Credentials> {
        if let Some(credentials) = session::load_valid(&self.client, &self.store).await {
            tracing::info!("Reusing stored session");
            return Some(credentials);
        }

        tracing::info!("Starting QR login");
        let mut login = QrLogin::new(
            &self.client,
            &self.launcher,
            &self.store,
            &self.config.login,
            &self.config.paths.qrcode_file,
        );
        login.run().await
    }

    /// Runs the harvest for every configured account
    ///
    /// Fails only when no session can be established; per-account failures
    /// are recorded in the returned summary.
    pub async fn run(&self, selector: &mut dyn AccountSelector) -> Result<RunSummary, HarvestError> {
        let credentials = self.ensure_session().await.ok_or(HarvestError::NoSession)?;
        let mut session = LiveSession::new(credentials, &self.store);
        let mut summary = RunSummary::new();
        let start_time = std::time::Instant::now();

        for account in &self.config.crawl.accounts {
            let outcome = self.crawl_account(account, &mut session, selector).await;
            match &outcome {
                AccountOutcome::Completed { .. } => tracing::info!("{}: {}", account, outcome),
                AccountOutcome::Failed { .. } => tracing::error!("{}: {}", account, outcome),
                _ => tracing::warn!("{}: {}", account, outcome),
            }
            summary.record(account, outcome);
        }

        tracing::info!(
            "Harvest completed: {} articles from {} accounts in {:?}",
            summary.total_saved(),
            summary.accounts.len(),
            start_time.elapsed()
        );

        Ok(summary)
    }

    /// Crawls one account by display name
    ///
    /// The output file is only created once the account has been resolved, so
    /// a failed lookup leaves nothing on disk.
    pub async fn crawl_account(
        &self,
        account: &str,
        session: &mut LiveSession<'_>,
        selector: &mut dyn AccountSelector,
    ) -> AccountOutcome {
        tracing::info!("Starting account '{}'", account);

        let token = match resolve_token(&self.client, session).await {
            Ok(token) => token,
            Err(e) => return failed(0, e),
        };

        let candidate =
            match resolve_account_id(&self.client, account, &token, session, selector).await {
                Ok(Resolution::Selected(candidate)) => candidate,
                Ok(Resolution::NoMatch) => return AccountOutcome::NoMatch,
                Ok(Resolution::Cancelled) => return AccountOutcome::Cancelled,
                Err(e) => return failed(0, e),
            };

        let path = output_path_for(&self.config.paths.output_dir, account);
        let mut sink = match CsvArticleSink::create(&path) {
            Ok(sink) => sink,
            Err(e) => return failed(0, e.into()),
        };

        let result = harvest_pages(
            &self.client,
            &candidate.id,
            &token,
            self.config.crawl.max_articles,
            &self.pacer,
            session,
            &mut sink,
        )
        .await;

        let saved = sink.rows_written();
        match result {
            Ok(()) => AccountOutcome::Completed { saved },
            Err(e) => failed(saved, e),
        }
    }
}

fn failed(saved: usize, error: HarvestError) -> AccountOutcome {
    AccountOutcome::Failed {
        saved,
        reason: error.to_string(),
    }
}
