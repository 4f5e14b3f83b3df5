//! Vitrine main entry point
//!
//! This is the command-line interface for the Vitrine product crawler.

use clap::Parser;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;
use vitrine::config::{load_config_with_hash, validate, Config};
use vitrine::crawler::crawl;
use vitrine::output::print_report;

/// Vitrine: a single-domain product crawler
///
/// Vitrine crawls one e-commerce site breadth-first, respecting robots.txt
/// and a URL blacklist, and writes the name, title and URL of every
/// product page it finds to a CSV file.
#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(version)]
#[command(about = "A single-domain product crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Number of workers, overriding the configuration
    #[arg(short, long, value_name = "N")]
    workers: Option<usize>,

    /// Output CSV path, overriding the configuration
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging depends on the config (log file), so load it first
    let loaded = match &cli.config {
        Some(path) => Some((path, load_config_with_hash(path))),
        None => None,
    };
    let (mut config, config_hash) = match loaded {
        Some((_, Ok((config, hash)))) => (config, Some(hash)),
        Some((path, Err(e))) => {
            eprintln!("Failed to load configuration from {}: {}", path.display(), e);
            return Err(e.into());
        }
        None => (Config::default(), None),
    };

    if let Some(workers) = cli.workers {
        config.crawler.workers = workers;
    }
    if let Some(output) = &cli.output {
        config.output.csv_path = output.display().to_string();
    }

    setup_logging(cli.verbose, cli.quiet, config.output.log_path.as_deref())?;

    match (&cli.config, &config_hash) {
        (Some(path), Some(hash)) => tracing::info!(
            "Configuration loaded from {} (hash: {})",
            path.display(),
            hash
        ),
        _ => tracing::info!("No configuration file given, using defaults"),
    }

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.dry_run {
        handle_dry_run(&config);
    } else {
        handle_crawl(&config).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// With `log_path` set, log lines go to that file instead of stdout.
fn setup_logging(
    verbose: u8,
    quiet: bool,
    log_path: Option<&str>,
) -> Result<(), std::io::Error> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("vitrine=info,warn"),
            1 => EnvFilter::new("vitrine=debug,info"),
            2 => EnvFilter::new("vitrine=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false);

    match log_path {
        Some(path) => {
            let path = Path::new(path);
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = File::create(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.init(),
    }

    Ok(())
}

/// Handles the --dry-run mode: shows the effective settings
fn handle_dry_run(config: &Config) {
    println!("=== Vitrine Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Accept invalid certs: {}", config.crawler.accept_invalid_certs);
    println!("  Link base: {:?}", config.crawler.link_base);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nSite:");
    println!("  Domain: {}", config.site.domain);
    println!("  Seed: {}", config.site.seed_url);
    println!("  Blacklist: {}", config.site.blacklist_pattern);
    if let Some(fallback) = &config.site.robots_fallback_path {
        println!("  Robots fallback: {}", fallback);
    }

    println!("\nExtraction:");
    println!("  Product pages: {}", config.extraction.product_page_pattern);
    println!("  Not-found marker: {}", config.extraction.not_found_marker);
    println!("  Product name class: {}", config.extraction.product_name_class);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.csv_path);
    if let Some(log) = &config.output.log_path {
        println!("  Log: {}", log);
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Crawling {} from {} with {} workers",
        config.site.domain,
        config.site.seed_url,
        config.crawler.workers
    );

    match crawl(config).await {
        Ok(report) => {
            tracing::info!("Crawl completed, results in {}", config.output.csv_path);
            print_report(&report);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
