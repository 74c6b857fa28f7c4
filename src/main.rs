//! StarPlan main entry point
//!
//! Command-line interface for the admissions-catalog scraper: list the
//! institutions behind an entry URL, or run a full scrape with an optional
//! institution filter and watch its progress.

use anyhow::Context;
use clap::Parser;
use starplan::config::load_config;
use starplan::crawler::get_universities;
use starplan::{Config, JobRegistry, RunRequest};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// StarPlan: a scraper for a legacy university-admissions catalog
#[derive(Parser, Debug)]
#[command(name = "starplan")]
#[command(version = "1.0.0")]
#[command(about = "Extract admissions records from the StarPlan catalog", long_about = None)]
struct Cli {
    /// Entry URL of the admissions catalog
    #[arg(value_name = "ENTRY_URL")]
    entry_url: String,

    /// List discovered institutions and exit
    #[arg(long, conflicts_with_all = ["target", "output"])]
    list: bool,

    /// Restrict the run to institutions with these exact names (repeatable)
    #[arg(long = "target", value_name = "NAME")]
    target: Vec<String>,

    /// Path of the exported CSV file
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, or fall back to the built-in policy defaults
    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path).with_context(|| format!("loading {}", path.display()))?
        }
        None => Config::default(),
    };

    if cli.list {
        handle_list(&config, &cli.entry_url).await
    } else {
        handle_run(config, cli).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("starplan=info,warn"),
            1 => EnvFilter::new("starplan=debug,info"),
            2 => EnvFilter::new("starplan=trace,debug"),
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

/// Handles the --list mode: discovers and prints the institution list
async fn handle_list(config: &Config, entry_url: &str) -> anyhow::Result<()> {
    let institutions = get_universities(config, entry_url).await?;

    if institutions.is_empty() {
        println!("No institutions found at {entry_url}");
        return Ok(());
    }

    println!("Found {} institutions:\n", institutions.len());
    for institution in &institutions {
        println!("  [{}] {}  {}", institution.code, institution.name, institution.url);
    }

    Ok(())
}

/// Handles a full scrape run, polling progress until the job is terminal
async fn handle_run(config: Config, cli: Cli) -> anyhow::Result<()> {
    let registry = JobRegistry::new(config);

    let request = RunRequest {
        entry_url: cli.entry_url,
        targets: (!cli.target.is_empty()).then_some(cli.target),
        export_path: cli.output,
    };

    let id = registry.start(request)?;
    let handle = registry
        .get(&id)
        .expect("job registered by start");

    // Forward Ctrl-C to the run's cooperative stop flag.
    let stopper = handle.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            stopper.stop();
        }
    });

    // Poll the progress snapshot; the run owns its state, we just read it.
    let mut last_message = String::new();
    loop {
        let progress = handle.progress();
        if progress.message != last_message {
            tracing::info!("[{:>3}%] {}", progress.percent(), progress.message);
            last_message = progress.message;
        }
        if handle.status().is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(300)).await;
    }

    match handle.status() {
        starplan::JobStatus::Completed => {
            let elapsed = handle
                .finished_at()
                .map(|end| end - handle.started_at())
                .map(|d| format!("{}s", d.num_seconds()))
                .unwrap_or_else(|| "?".to_string());
            tracing::info!(
                "Run completed: {} records in {}",
                handle.results().len(),
                elapsed
            );
            if let Some(path) = handle.export_path() {
                println!("Exported {} records to {}", handle.results().len(), path.display());
            }
            Ok(())
        }
        status => {
            let message = handle.error().unwrap_or_else(|| status.to_string());
            anyhow::bail!("Run failed: {message}")
        }
    }
}
