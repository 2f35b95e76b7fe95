pub mod browser_profile;
pub mod browser_setup;
pub mod config;
pub mod errors;
pub mod events;
pub mod harvester;
pub mod leads;
pub mod pipeline;
pub mod runtime;
pub mod scheduler;
pub mod schema;
pub mod session;
pub mod store;
pub mod utils;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub use browser_setup::{LaunchOptions, download_managed_browser, find_browser_executable};
pub use config::{Credentials, HarvestConfig, HarvestConfigBuilder, PipelineTiming, SiteLocators};
pub use errors::{HarvestError, HarvestResult, LeadError, LeadOutcome, LeadResult, SessionError};
pub use events::{ChannelProgress, HarvestEvent, NoOpProgress, ProgressReporter, TracingProgress};
pub use leads::{Lead, clean_address, read_leads};
pub use pipeline::{ExtractionPipeline, LeadStage, PipelineContext};
pub use scheduler::{RunSummary, Scheduler};
pub use schema::{ColumnRange, SchemaRegistry, SectionId};
pub use session::{
    ChromiumSessionFactory, ClickOutcome, Locator, PageSession, SessionFactory, TableCapture,
};
pub use store::{AggregationStore, RowId, RowOrder};

/// Harvest every lead in the configured source into a fresh report
///
/// Each lead runs in its own Chromium session. Cancelling `cancel` stops
/// leads that have not started and interrupts in-flight waits; whatever was
/// committed is still persisted.
pub async fn harvest(
    config: HarvestConfig,
    progress: Arc<dyn ProgressReporter>,
    cancel: CancellationToken,
) -> HarvestResult<RunSummary> {
    let source = config.lead_source().to_path_buf();
    let leads = tokio::task::spawn_blocking(move || read_leads(&source)).await??;
    info!("Loaded {} leads from {}", leads.len(), config.lead_source().display());

    let factory = Arc::new(ChromiumSessionFactory::new(LaunchOptions {
        headless: config.headless(),
        ..LaunchOptions::default()
    }));
    Scheduler::new(Arc::new(config), factory, progress)
        .run(leads, cancel)
        .await
}
