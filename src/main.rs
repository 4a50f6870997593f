//! Site-Recce main entry point
//!
//! This is the command-line interface for Site-Recce: it runs one
//! crawl-and-capture task for a seed address and prints its report.

use anyhow::{bail, Context};
use clap::Parser;
use site_recce::capture::ChromeDriver;
use site_recce::config::{load_config_with_hash, validate, Config};
use site_recce::output::{format_task_report, write_task_report};
use site_recce::storage::LocalObjectStore;
use site_recce::{normalize_url, Orchestrator, TaskStatus, TaskStore};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Site-Recce: sitemap and screenshots for one site
///
/// Site-Recce discovers up to a bounded number of same-origin pages from a
/// seed address, renders each one in headless Chromium, stores a full-page
/// screenshot per page and records the API calls the pages make.
#[derive(Parser, Debug)]
#[command(name = "site-recce")]
#[command(version)]
#[command(about = "Crawl a site, screenshot its pages, list its API calls", long_about = None)]
struct Cli {
    /// Seed address to start from
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would run without crawling
    #[arg(long)]
    dry_run: bool,

    /// Also write the Markdown report to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Interval between task status polls (milliseconds)
    #[arg(long, default_value_t = 500, value_parser = clap::value_parser!(u64).range(1..))]
    poll_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;

    if cli.dry_run {
        handle_dry_run(&cli, &config)
    } else {
        handle_task(&cli, config).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_recce=info,warn"),
            1 => EnvFilter::new("site_recce=debug,info"),
            2 => EnvFilter::new("site_recce=trace,debug"),
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

/// Loads the configuration file, or validated defaults without one
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let Some(path) = &cli.config else {
        tracing::info!("No configuration file given, using defaults");
        let config = Config::default();
        validate(&config)?;
        return Ok(config);
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Handles the --dry-run mode: validates inputs and shows what would run
fn handle_dry_run(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let seed = normalize_url(&cli.url).context("invalid seed address")?;

    println!("=== Site-Recce Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  User agent: {}", config.crawler.user_agent);

    println!("\nCapture:");
    println!("  Navigation timeout: {}s", config.capture.navigation_timeout_secs);
    println!("  Settle timeout: {}s", config.capture.settle_timeout_secs);
    println!(
        "  Wait selector: {} ({}s, best-effort)",
        config.capture.wait_selector, config.capture.selector_timeout_secs
    );
    println!("  Scroll pause: {}ms", config.capture.scroll_pause_ms);
    println!(
        "  Window: {}x{}",
        config.capture.window_width, config.capture.window_height
    );
    println!("  Sandbox: {}", config.capture.sandbox);

    println!("\nStorage:");
    println!("  Directory: {}", config.storage.root_dir);
    println!("  Bucket: {}", config.storage.bucket);
    println!("  Links: {} (valid {}s)", config.storage.public_base_url, config.storage.link_expiry_secs);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl up to {} pages from {} and capture each one",
        config.crawler.max_pages, seed
    );

    Ok(())
}

/// Handles the main operation: runs one task and reports on it
async fn handle_task(cli: &Cli, config: Config) -> anyhow::Result<()> {
    let tasks = Arc::new(TaskStore::new());
    let driver = Arc::new(ChromeDriver::new(config.capture.clone()));
    let object_store = Arc::new(LocalObjectStore::from_config(&config.storage));
    let orchestrator = Orchestrator::new(&config, tasks, driver, object_store)?;

    let id = orchestrator.start_task(&cli.url);

    // Poll like any other client would, logging transitions and progress
    let mut ticker = tokio::time::interval(Duration::from_millis(cli.poll_ms));
    let mut last_status: Option<TaskStatus> = None;
    let mut last_captures = 0;
    loop {
        ticker.tick().await;

        let Some(task) = orchestrator.get_task_status(&id) else {
            bail!("task {} disappeared", id);
        };

        if last_status != Some(task.status) {
            tracing::info!("Task {}: {}", id, task.status);
            last_status = Some(task.status);
        }
        if task.captures.len() != last_captures {
            last_captures = task.captures.len();
            tracing::debug!("Task {}: {} screenshots so far", id, last_captures);
        }
        if task.is_finished() {
            break;
        }
    }

    let task = orchestrator.wait_for(&id).await?;
    let sitemap = orchestrator.render_sitemap_links(&id).unwrap_or_default();
    let api_calls = orchestrator.render_api_calls(&id).unwrap_or_default();

    println!("{}", format_task_report(&task, &sitemap, &api_calls));

    if let Some(path) = &cli.report {
        write_task_report(&task, &sitemap, &api_calls, path)
            .with_context(|| format!("failed to write {}", path.display()))?;
        tracing::info!("Report written to {}", path.display());
    }

    if task.status == TaskStatus::Failed {
        bail!(
            "task {} failed: {}",
            id,
            task.error.as_deref().unwrap_or("unknown error")
        );
    }

    Ok(())
}
