//! Choosing one account among directory search candidates
//!
//! A display name can match several accounts and nothing identifies the right
//! one automatically, so the choice goes through an `AccountSelector`: an
//! interactive prompt by default, or a pre-supplied index for unattended runs.

use crate::api::AccountCandidate;
use std::io::{BufRead, Write};

/// Picks one candidate, or `None` for "no selection"
pub trait AccountSelector {
    /// Returns the zero-based index of the chosen candidate
    fn select(&mut self, query: &str, candidates: &[AccountCandidate]) -> Option<usize>;
}

/// Renders the candidate table shown to the operator
pub fn render_candidates(candidates: &[AccountCandidate]) -> String {
    let mut out = String::new();
    out.push_str("\nNo.   Name                 Verified    Description\n");
    out.push_str(&"-".repeat(60));
    out.push('\n');

    for (idx, candidate) in candidates.iter().enumerate() {
        let verified = if candidate.verified {
            "verified"
        } else {
            "unverified"
        };
        out.push_str(&format!(
            "{:<5} {:<20} {:<11} {}\n",
            idx + 1,
            candidate.display_name,
            verified,
            candidate.description
        ));
    }
    out
}

/// Interactive selection over any reader/writer pair
///
/// Re-asks on non-numeric or out-of-range input; `q` (or end of input) quits.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self) -> std::io::Result<Option<String>> {
        write!(self.output, "\nEnter the number of the account to crawl (q to quit): ")?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn say(&mut self, message: &str) {
        if let Err(e) = writeln!(self.output, "{}", message) {
            tracing::warn!("Failed to write prompt output: {}", e);
        }
    }
}

/// Prompt on the process's stdin/stdout
pub fn stdin_selector() -> PromptSelector<std::io::StdinLock<'static>, std::io::Stdout> {
    PromptSelector::new(std::io::stdin().lock(), std::io::stdout())
}

impl<R: BufRead, W: Write> AccountSelector for PromptSelector<R, W> {
    fn select(&mut self, query: &str, candidates: &[AccountCandidate]) -> Option<usize> {
        let table = render_candidates(candidates);
        self.say(&format!(
            "Found {} accounts matching '{}':{}",
            candidates.len(),
            query,
            table
        ));

        loop {
            let answer = match self.ask() {
                Ok(Some(answer)) => answer,
                Ok(None) => {
                    tracing::info!("Input closed, selection cancelled");
                    return None;
                }
                Err(e) => {
                    tracing::error!("Failed to read selection: {}", e);
                    return None;
                }
            };

            if answer.eq_ignore_ascii_case("q") {
                return None;
            }

            match answer.parse::<usize>() {
                Ok(n) if (1..=candidates.len()).contains(&n) => return Some(n - 1),
                Ok(_) => self.say("Invalid number, please try again"),
                Err(_) => self.say("Please enter a valid number"),
            }
        }
    }
}

/// Non-interactive selection of a fixed one-based index
///
/// An index outside the candidate list means "no selection".
#[derive(Debug, Clone, Copy)]
pub struct FixedSelector {
    index: usize,
}

impl FixedSelector {
    pub fn new(one_based: usize) -> Self {
        Self { index: one_based }
    }
}

impl AccountSelector for FixedSelector {
    fn select(&mut self, query: &str, candidates: &[AccountCandidate]) -> Option<usize> {
        if (1..=candidates.len()).contains(&self.index) {
            Some(self.index - 1)
        } else {
            tracing::warn!(
                "Preselected index {} is out of range for '{}' ({} candidates)",
                self.index,
                query,
                candidates.len()
            );
            None
        }
    }
}
