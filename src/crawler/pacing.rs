//! Politeness delays between requests
//!
//! A jittered pause follows every article fetch and a fixed pause follows every
//! listing page, so the request rate stays well below what the platform
//! throttles.

use crate::config::DelayConfig;
use rand::Rng;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Pacer {
    article_min: Duration,
    article_max: Duration,
    page: Duration,
}

impl Pacer {
    pub fn new(config: &DelayConfig) -> Self {
        Self {
            article_min: Duration::from_millis(config.article_min_ms),
            article_max: Duration::from_millis(config.article_max_ms.max(config.article_min_ms)),
            page: Duration::from_millis(config.page_ms),
        }
    }

    /// Pacer that never sleeps
    pub fn immediate() -> Self {
        Self::new(&DelayConfig::none())
    }

    /// Picks the next article delay uniformly in `[min, max]`
    pub fn article_delay(&self) -> Duration {
        if self.article_max.is_zero() {
            return Duration::ZERO;
        }
        let millis = rand::thread_rng()
            .gen_range(self.article_min.as_millis() as u64..=self.article_max.as_millis() as u64);
        Duration::from_millis(millis)
    }

    pub async fn after_article(&self) {
        let delay = self.article_delay();
        if !delay.is_zero() {
            tracing::debug!("Sleeping {:?} before the next article", delay);
            tokio::time::sleep(delay).await;
        }
    }

    pub async fn after_page(&self) {
        if !self.page.is_zero() {
            tracing::debug!("Sleeping {:?} before the next page", self.page);
            tokio::time::sleep(self.page).await;
        }
    }
}
