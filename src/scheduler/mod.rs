//! Lead scheduling for a harvesting run
//!
//! Leads are dispatched in list order onto at most `max_concurrent_leads`
//! concurrent pipelines. Each pipeline owns a fresh browser session, so one
//! lead's failure (or panic) never touches another's state. The shared
//! [`AggregationStore`] is the only thing pipelines write to.

use futures::FutureExt;
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::HarvestConfig;
use crate::errors::{HarvestResult, LeadError, LeadOutcome};
use crate::events::ProgressReporter;
use crate::leads::Lead;
use crate::pipeline::{ExtractionPipeline, LeadFailure, LeadStage, PipelineContext};
use crate::schema::SchemaRegistry;
use crate::session::SessionFactory;
use crate::store::{AggregationStore, RowId};

/// Outcome counts of a finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub committed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub elapsed: Duration,
    pub output_path: PathBuf,
}

/// Counters shared by the lead tasks of one run
#[derive(Debug, Default)]
struct RunCounters {
    completed: AtomicUsize,
    committed: AtomicUsize,
    skipped: AtomicUsize,
    failed: AtomicUsize,
}

/// What a lead task hands back to the scheduler
type LeadReport = Result<RowId, LeadFailure>;

/// Runs a lead list against a session factory
pub struct Scheduler {
    config: Arc<HarvestConfig>,
    factory: Arc<dyn SessionFactory>,
    progress: Arc<dyn ProgressReporter>,
    schema: Arc<SchemaRegistry>,
}

impl Scheduler {
    pub fn new(
        config: Arc<HarvestConfig>,
        factory: Arc<dyn SessionFactory>,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            config,
            factory,
            progress,
            schema: Arc::new(SchemaRegistry::standard()),
        }
    }

    /// Replace the report layout
    #[must_use]
    pub fn with_schema(mut self, schema: SchemaRegistry) -> Self {
        self.schema = Arc::new(schema);
        self
    }

    /// Process every lead, persisting to a fresh timestamped report
    ///
    /// Returns an error only when the output cannot be initialized or the
    /// final persist fails; per-lead failures are counted in the summary.
    pub async fn run(
        &self,
        leads: Vec<Lead>,
        cancel: CancellationToken,
    ) -> HarvestResult<RunSummary> {
        let output_path = self.config.output_path();
        self.run_to(leads, output_path, cancel).await
    }

    /// [`run`](Self::run) with an explicit report path
    pub async fn run_to(
        &self,
        leads: Vec<Lead>,
        output_path: PathBuf,
        cancel: CancellationToken,
    ) -> HarvestResult<RunSummary> {
        let started = Instant::now();
        let total = leads.len();

        let store = Arc::new(AggregationStore::new(
            Arc::clone(&self.schema),
            self.config.row_order(),
        ));
        store.initialize(&output_path).await?;
        self.progress.report_run_started(total, &output_path);

        let pipeline = Arc::new(ExtractionPipeline::new(
            Arc::clone(&store),
            PipelineContext::new(Arc::clone(&self.config), cancel.clone()),
            output_path.clone(),
            Arc::clone(&self.progress),
        ));
        let counters = Arc::new(RunCounters::default());

        let concurrency = self.config.max_concurrent_leads();
        let semaphore = Arc::new(Semaphore::new(concurrency));
        let mut active_tasks = FuturesUnordered::new();

        for lead in leads {
            // Dispatch in list order; waits here while all slots are busy
            let permit = if let Ok(p) = Arc::clone(&semaphore).acquire_owned().await {
                p
            } else {
                error!("Semaphore closed unexpectedly");
                break;
            };

            let factory = Arc::clone(&self.factory);
            let progress = Arc::clone(&self.progress);
            let pipeline = Arc::clone(&pipeline);
            let counters = Arc::clone(&counters);
            let cancel = cancel.clone();

            active_tasks.push(tokio::spawn(async move {
                let _permit = permit;
                info!(lead = lead.index(), "Processing {lead}");
                // Factory and reporter faults end this lead only
                let report = AssertUnwindSafe(async {
                    progress.report_lead_started(&lead);
                    process_lead(&*factory, &pipeline, &lead, &cancel).await
                })
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(panicked(&lead, panic.as_ref())));
                record_outcome(&*progress, &counters, &lead, &report, total);
                report.map(|_| ())
            }));
        }

        while let Some(joined) = active_tasks.next().await {
            log_join(joined);
        }

        store.persist(&output_path).await?;

        let summary = RunSummary {
            total,
            committed: counters.committed.load(Ordering::Relaxed),
            skipped: counters.skipped.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            elapsed: started.elapsed(),
            output_path,
        };
        self.progress.report_run_completed(&summary);
        Ok(summary)
    }
}

/// Open a session, run the pipeline, and always close the session
///
/// A panic inside the pipeline is contained here and reported as an
/// unexpected fault of this lead only.
async fn process_lead(
    factory: &dyn SessionFactory,
    pipeline: &ExtractionPipeline,
    lead: &Lead,
    cancel: &CancellationToken,
) -> LeadReport {
    if cancel.is_cancelled() {
        return Err(LeadFailure::new(LeadStage::Init, LeadError::Cancelled));
    }

    let mut session = factory
        .open()
        .await
        .map_err(|e| LeadFailure::new(LeadStage::Init, e.into()))?;

    let result = AssertUnwindSafe(pipeline.run(session.as_mut(), lead))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(panicked(lead, panic.as_ref())));

    if let Err(e) = session.close().await {
        warn!("Failed to close session for {lead}: {e}");
    }
    result
}

fn panicked(lead: &Lead, payload: &(dyn std::any::Any + Send)) -> LeadFailure {
    let message = panic_message(payload);
    error!("Processing {lead} panicked: {message}");
    LeadFailure::new(
        LeadStage::Init,
        LeadError::Unexpected(format!("panic: {message}")),
    )
}

/// Count the lead, then tell the reporter
///
/// Counters move before any reporter call, so a panicking reporter cannot
/// lose the lead from the summary.
fn record_outcome(
    progress: &dyn ProgressReporter,
    counters: &RunCounters,
    lead: &Lead,
    report: &LeadReport,
    total: usize,
) {
    let counter = match report {
        Ok(_) => &counters.committed,
        Err(failure) => match failure.error.outcome() {
            LeadOutcome::Skipped => &counters.skipped,
            LeadOutcome::Failed => &counters.failed,
        },
    };
    counter.fetch_add(1, Ordering::Relaxed);
    let completed = counters.completed.fetch_add(1, Ordering::Relaxed) + 1;

    match report {
        Ok(row) => progress.report_lead_committed(lead, *row),
        Err(failure) => match failure.error.outcome() {
            LeadOutcome::Skipped => {
                info!("Skipping {lead}: {}", failure.error);
                progress.report_lead_skipped(lead, &failure.error);
            }
            LeadOutcome::Failed => {
                warn!("Lead {lead} failed after {}: {}", failure.stage, failure.error);
                progress.report_lead_failed(lead, failure.stage, &failure.error);
            }
        },
    }
    progress.report_progress(completed, total);
}

fn log_join(joined: Result<Result<(), LeadFailure>, tokio::task::JoinError>) {
    match joined {
        Ok(Ok(())) => {}
        Ok(Err(failure)) => debug!("Lead task ended at {}", failure.stage),
        Err(e) => error!("Lead task aborted: {e}"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
