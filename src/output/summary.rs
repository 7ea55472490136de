//! Per-run summary of account outcomes

use crate::crawler::AccountOutcome;

/// Outcome of every account attempted in one run, in crawl order
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub accounts: Vec<(String, AccountOutcome)>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, account: &str, outcome: AccountOutcome) {
        self.accounts.push((account.to_string(), outcome));
    }

    /// Total articles written across all accounts
    pub fn total_saved(&self) -> usize {
        self.accounts.iter().map(|(_, o)| o.saved()).sum()
    }

    /// Number of accounts that completed
    pub fn succeeded(&self) -> usize {
        self.accounts.iter().filter(|(_, o)| o.is_success()).count()
    }

    pub fn outcome(&self, account: &str) -> Option<&AccountOutcome> {
        self.accounts
            .iter()
            .find(|(name, _)| name == account)
            .map(|(_, o)| o)
    }
}

/// Prints the summary to stdout
pub fn print_summary(summary: &RunSummary) {
    println!("=== Harvest Summary ===\n");

    for (account, outcome) in &summary.accounts {
        println!("  {}: {}", account, outcome);
    }
    println!();

    println!(
        "{} / {} accounts completed, {} articles saved",
        summary.succeeded(),
        summary.accounts.len(),
        summary.total_saved()
    );
}
