//! mp-harvest main entry point
//!
//! This is the command-line interface for the mp-harvest article harvester.

use clap::Parser;
use mp_harvest::config::{load_config, parse_account_list, validate, Config};
use mp_harvest::crawler::{stdin_selector, AccountSelector, FixedSelector, Harvester};
use mp_harvest::login::ChromeLauncher;
use mp_harvest::output::print_summary;
use mp_harvest::session;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// mp-harvest: article harvester for QR-login publishing platforms
///
/// mp-harvest logs in once by QR code through a controlled browser, keeps the
/// session on disk, and saves the published articles of each configured
/// account to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "mp-harvest")]
#[command(version = "1.0.0")]
#[command(about = "QR-login article harvester", long_about = None)]
struct Cli {
    /// Path to an optional TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated account display names to crawl
    #[arg(long, env = "ACCOUNT_LIST", value_name = "NAMES")]
    accounts: Option<String>,

    /// Maximum number of articles saved per account
    #[arg(long, env = "MAX_ARTICLES", value_name = "N")]
    max_articles: Option<usize>,

    /// Chrome/Chromium executable used for the QR login
    #[arg(long, env = "CHROME_PATH", value_name = "PATH")]
    chrome_path: Option<PathBuf>,

    /// Directory the per-account CSV files are written to
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Pick the N-th search candidate instead of prompting (1-based)
    #[arg(long, value_name = "N")]
    select: Option<usize>,

    /// Show the browser window during login
    #[arg(long)]
    headed: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without crawling
    #[arg(long, conflicts_with = "check_session")]
    dry_run: bool,

    /// Check whether the stored session is still valid and exit
    #[arg(long, conflicts_with = "dry_run")]
    check_session: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // `.env` values take precedence over the ambient environment
    let dotenv = dotenvy::dotenv_override();

    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config = match build_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.check_session {
        handle_check_session(&config).await?;
    } else {
        handle_harvest(config, cli.select).await?;
    }

    Ok(())
}

/// Builds the effective configuration
///
/// The TOML file (or built-in defaults) is loaded first, then command-line and
/// environment overrides are applied, then the result is validated.
fn build_config(cli: &Cli) -> Result<Config, mp_harvest::ConfigError> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)?
        }
        None => Config::default(),
    };

    if let Some(raw) = &cli.accounts {
        config.crawl.accounts = parse_account_list(raw);
    }
    if let Some(max) = cli.max_articles {
        config.crawl.max_articles = max;
    }
    if let Some(path) = &cli.chrome_path {
        config.browser.executable = Some(path.clone());
    }
    if let Some(dir) = &cli.output_dir {
        config.paths.output_dir = dir.clone();
    }
    if cli.headed {
        config.browser.headless = false;
    }

    validate(&config)?;
    Ok(config)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mp_harvest=info,warn"),
            1 => EnvFilter::new("mp_harvest=debug,info"),
            2 => EnvFilter::new("mp_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== mp-harvest Dry Run ===\n");

    println!("Accounts ({}):", config.crawl.accounts.len());
    for account in &config.crawl.accounts {
        println!("  - {}", account);
    }
    println!("Max articles per account: {}", config.crawl.max_articles);

    println!("\nBrowser:");
    match &config.browser.executable {
        Some(path) => println!("  Executable: {}", path.display()),
        None => println!("  Executable: auto-detect"),
    }
    println!("  Headless: {}", config.browser.headless);

    println!("\nPaths:");
    println!("  Session: {}", config.paths.cookie_file.display());
    println!("  QR code: {}", config.paths.qrcode_file.display());
    println!("  Output: {}", config.paths.output_dir.display());

    println!("\nHTTP:");
    println!("  Base URL: {}", config.http.base_url);
    println!("  Article timeout: {}s", config.http.article_timeout_secs);

    println!("\nLogin:");
    println!(
        "  Cookie attempts: {} every {}ms",
        config.login.cookie_attempts, config.login.cookie_poll_interval_ms
    );
    println!("  Timeout: {}s", config.login.timeout_secs);

    println!("\nDelays:");
    println!(
        "  Between articles: {}-{}ms",
        config.delays.article_min_ms, config.delays.article_max_ms
    );
    println!("  Between pages: {}ms", config.delays.page_ms);

    println!("\n✓ Configuration is valid");
}

/// Handles the --check-session mode: validates the stored session only
async fn handle_check_session(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let harvester = Harvester::new(config.clone(), ChromeLauncher::new(&config.browser))?;

    match session::load_valid(harvester.client(), harvester.store()).await {
        Some(credentials) => {
            println!(
                "✓ Stored session at {} is valid ({} cookies)",
                config.paths.cookie_file.display(),
                credentials.len()
            );
        }
        None => {
            println!(
                "✗ No valid session at {}; the next harvest will ask for a QR login",
                config.paths.cookie_file.display()
            );
        }
    }

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(
    config: Config,
    select: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Harvesting {} accounts, up to {} articles each",
        config.crawl.accounts.len(),
        config.crawl.max_articles
    );

    let launcher = ChromeLauncher::new(&config.browser);
    let harvester = Harvester::new(config, launcher)?;

    let mut fixed;
    let mut prompt;
    let selector: &mut dyn AccountSelector = match select {
        Some(index) => {
            fixed = FixedSelector::new(index);
            &mut fixed
        }
        None => {
            prompt = stdin_selector();
            &mut prompt
        }
    };

    match harvester.run(selector).await {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e.into())
        }
    }
}
