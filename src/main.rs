// Property records harvester CLI
//
// Reads a lead list, scrapes each address with a bounded pool of browser
// sessions and writes a timestamped spreadsheet report.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use property_harvest::utils::constants::{
    DEFAULT_MAX_CONCURRENT_LEADS, EMAIL_ENV_VAR, PASSWORD_ENV_VAR,
};
use property_harvest::{ChannelProgress, Credentials, HarvestConfig, HarvestEvent, RowOrder};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LeadOrder {
    /// Rows appear as leads finish
    Completion,
    /// Rows follow the lead list
    List,
}

impl From<LeadOrder> for RowOrder {
    fn from(order: LeadOrder) -> Self {
        match order {
            LeadOrder::Completion => Self::Completion,
            LeadOrder::List => Self::LeadIndex,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "property-harvest", about = "Scrape property records for a list of addresses")]
struct Cli {
    /// Spreadsheet or CSV whose first column lists the addresses
    leads: PathBuf,

    /// Directory that receives the report
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    #[arg(long, env = EMAIL_ENV_VAR)]
    email: String,

    #[arg(long, env = PASSWORD_ENV_VAR, hide_env_values = true)]
    password: String,

    /// Leads processed at once (one browser each)
    #[arg(short = 'j', long, default_value_t = DEFAULT_MAX_CONCURRENT_LEADS)]
    concurrency: usize,

    /// Show the browser windows
    #[arg(long)]
    headed: bool,

    #[arg(long, value_enum, default_value = "completion")]
    lead_order: LeadOrder,

    /// Give up on a lead after this many search-page refreshes (default: never)
    #[arg(long)]
    max_refreshes: Option<u32>,

    /// Skip the reader-like scroll before extraction
    #[arg(long)]
    no_scroll: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let config = HarvestConfig::builder()
        .lead_source(&cli.leads)
        .output_dir(&cli.output_dir)
        .credentials(Credentials::new(cli.email, cli.password))
        .max_concurrent_leads(cli.concurrency)
        .headless(!cli.headed)
        .row_order(cli.lead_order.into())
        .max_search_refreshes(cli.max_refreshes)
        .humanized_scroll(!cli.no_scroll)
        .build()
        .context("Invalid configuration")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; finishing in-flight leads");
            ctrl_c.cancel();
        }
    });

    let (progress, mut events) = ChannelProgress::new();
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] {bar:40} {pos}/{len} {msg}")
            .context("Invalid progress template")?,
    );
    let ui = {
        let bar = bar.clone();
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match &event {
                    HarvestEvent::RunStarted { total, .. } => bar.set_length(*total as u64),
                    HarvestEvent::Progress { completed, .. } => bar.set_position(*completed as u64),
                    HarvestEvent::LeadStarted { address, .. } => bar.set_message(address.clone()),
                    HarvestEvent::LeadSkipped { .. } | HarvestEvent::LeadFailed { .. } => {
                        bar.println(event.log_line());
                    }
                    _ => {}
                }
            }
        })
    };

    let result = property_harvest::harvest(config, Arc::new(progress), cancel).await;
    bar.finish_and_clear();
    // The sender lives in the run; once it returns the channel drains
    join_display(ui).await;

    let summary = result.context("Harvest failed")?;
    info!(
        "{} saved, {} skipped, {} failed of {} in {:.1}s",
        summary.committed,
        summary.skipped,
        summary.failed,
        summary.total,
        summary.elapsed.as_secs_f64()
    );
    println!("Report written to {}", summary.output_path.display());
    Ok(())
}

/// Wait for the progress display to drain; returns whether it ended cleanly
async fn join_display(ui: tokio::task::JoinHandle<()>) -> bool {
    match ui.await {
        Ok(()) => true,
        Err(e) => {
            warn!("Progress display task failed: {e}");
            false
        }
    }
}
