//! Controlled browser used for the QR login
//!
//! The login flow only needs four operations from a browser: navigate, refresh,
//! read the cookie jar, and quit. `ChromeLauncher` provides them through the
//! Chrome DevTools protocol.

use crate::config::BrowserConfig;
use crate::session::Credentials;
use chromiumoxide::browser::{Browser, BrowserConfig as CdpBrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::path::PathBuf;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Errors raised by the controlled browser
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to configure browser: {0}")]
    Config(String),

    #[error("Browser protocol error: {0}")]
    Cdp(#[from] CdpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running browser session driven by the login flow
#[allow(async_fn_in_trait)]
pub trait LoginBrowser {
    /// Loads `url` in the working tab
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError>;

    /// Reloads the working tab
    async fn refresh(&mut self) -> Result<(), BrowserError>;

    /// Reads the current cookie jar as name/value pairs
    async fn cookies(&mut self) -> Result<Credentials, BrowserError>;

    /// Shuts the browser down; the value must not be used afterwards
    async fn quit(self) -> Result<(), BrowserError>;
}

/// Starts one browser instance per login attempt
#[allow(async_fn_in_trait)]
pub trait BrowserLauncher {
    type Browser: LoginBrowser;

    async fn launch(&self) -> Result<Self::Browser, BrowserError>;
}

/// Launches a headless Chrome/Chromium over the DevTools protocol
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
    headless: bool,
}

impl ChromeLauncher {
    pub fn new(config: &BrowserConfig) -> Self {
        Self {
            executable: config.executable.clone(),
            headless: config.headless,
        }
    }
}

impl BrowserLauncher for ChromeLauncher {
    type Browser = ChromeBrowser;

    async fn launch(&self) -> Result<ChromeBrowser, BrowserError> {
        let mut builder = CdpBrowserConfig::builder()
            .no_sandbox()
            .window_size(1920, 1080)
            .arg("--disable-dev-shm-usage")
            .arg("--disable-gpu");

        if !self.headless {
            builder = builder.with_head();
        }

        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(BrowserError::Config)?;

        match &self.executable {
            Some(path) => tracing::info!("Launching browser {}", path.display()),
            None => tracing::info!("Launching auto-detected browser"),
        }

        let (browser, mut handler) = Browser::launch(config).await?;

        // The handler must be polled for any CDP command to make progress
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                let mut browser = browser;
                let _ = browser.close().await;
                handler_task.abort();
                return Err(e.into());
            }
        };

        Ok(ChromeBrowser {
            browser,
            page,
            handler_task,
        })
    }
}

/// One headless Chrome process with a single working tab
pub struct ChromeBrowser {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl LoginBrowser for ChromeBrowser {
    async fn navigate(&mut self, url: &str) -> Result<(), BrowserError> {
        self.page.goto(url).await?;
        Ok(())
    }

    async fn refresh(&mut self) -> Result<(), BrowserError> {
        self.page.reload().await?;
        Ok(())
    }

    async fn cookies(&mut self) -> Result<Credentials, BrowserError> {
        let cookies = self.page.get_cookies().await?;
        Ok(cookies.into_iter().map(|c| (c.name, c.value)).collect())
    }

    async fn quit(mut self) -> Result<(), BrowserError> {
        let closed = self.browser.close().await;
        let waited = self.browser.wait().await;
        self.handler_task.abort();
        tracing::debug!("Browser shut down");
        closed?;
        waited?;
        Ok(())
    }
}
