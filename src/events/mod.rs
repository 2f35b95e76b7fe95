//! Run progress reporting
//!
//! The scheduler reports every lifecycle step through a
//! [`ProgressReporter`]. A control surface subscribes through
//! [`ChannelProgress`] and receives [`HarvestEvent`]s; headless runs use
//! [`TracingProgress`], and [`NoOpProgress`] discards everything.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::info;

use crate::errors::LeadError;
use crate::leads::Lead;
use crate::pipeline::LeadStage;
use crate::scheduler::RunSummary;
use crate::store::RowId;

/// Trait for reporting run progress at key lifecycle events
///
/// Implementations must not block: they are called from worker tasks.
pub trait ProgressReporter: Send + Sync {
    /// The output is initialized and leads are about to start
    fn report_run_started(&self, total: usize, output_path: &Path);

    fn report_lead_started(&self, lead: &Lead);

    /// The lead's row is in the table
    fn report_lead_committed(&self, lead: &Lead, row: RowId);

    /// The portal does not know the address
    fn report_lead_skipped(&self, lead: &Lead, reason: &LeadError);

    fn report_lead_failed(&self, lead: &Lead, stage: LeadStage, reason: &LeadError);

    /// Called once per terminal lead with the running count
    fn report_progress(&self, completed: usize, total: usize);

    /// The table was written to disk
    fn report_checkpoint(&self, rows: usize, output_path: &Path);

    fn report_run_completed(&self, summary: &RunSummary);
}

/// Progress reporter that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpProgress;

impl ProgressReporter for NoOpProgress {
    #[inline(always)]
    fn report_run_started(&self, _total: usize, _output_path: &Path) {}

    #[inline(always)]
    fn report_lead_started(&self, _lead: &Lead) {}

    #[inline(always)]
    fn report_lead_committed(&self, _lead: &Lead, _row: RowId) {}

    #[inline(always)]
    fn report_lead_skipped(&self, _lead: &Lead, _reason: &LeadError) {}

    #[inline(always)]
    fn report_lead_failed(&self, _lead: &Lead, _stage: LeadStage, _reason: &LeadError) {}

    #[inline(always)]
    fn report_progress(&self, _completed: usize, _total: usize) {}

    #[inline(always)]
    fn report_checkpoint(&self, _rows: usize, _output_path: &Path) {}

    #[inline(always)]
    fn report_run_completed(&self, _summary: &RunSummary) {}
}

/// Writes run-level milestones to the log
///
/// Per-lead outcome lines are already logged by the scheduler, so this
/// only adds the run boundaries and the running count.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingProgress;

impl ProgressReporter for TracingProgress {
    fn report_run_started(&self, total: usize, output_path: &Path) {
        info!("Processing {total} leads into {}", output_path.display());
    }

    fn report_lead_started(&self, _lead: &Lead) {}

    fn report_lead_committed(&self, _lead: &Lead, _row: RowId) {}

    fn report_lead_skipped(&self, _lead: &Lead, _reason: &LeadError) {}

    fn report_lead_failed(&self, _lead: &Lead, _stage: LeadStage, _reason: &LeadError) {}

    fn report_progress(&self, completed: usize, total: usize) {
        info!("Processed {completed}/{total} leads");
    }

    fn report_checkpoint(&self, _rows: usize, _output_path: &Path) {}

    fn report_run_completed(&self, summary: &RunSummary) {
        info!(
            committed = summary.committed,
            skipped = summary.skipped,
            failed = summary.failed,
            "Run finished in {:.1}s",
            summary.elapsed.as_secs_f64()
        );
    }
}

/// Event types emitted during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum HarvestEvent {
    RunStarted {
        total: usize,
        output_path: PathBuf,
        timestamp: DateTime<Utc>,
    },
    LeadStarted {
        index: usize,
        address: String,
        timestamp: DateTime<Utc>,
    },
    LeadCommitted {
        index: usize,
        address: String,
        row: usize,
        timestamp: DateTime<Utc>,
    },
    LeadSkipped {
        index: usize,
        address: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    LeadFailed {
        index: usize,
        address: String,
        stage: LeadStage,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    Progress {
        completed: usize,
        total: usize,
    },
    Checkpointed {
        rows: usize,
        output_path: PathBuf,
        timestamp: DateTime<Utc>,
    },
    RunCompleted {
        total: usize,
        committed: usize,
        skipped: usize,
        failed: usize,
        duration: Duration,
        timestamp: DateTime<Utc>,
    },
}

impl HarvestEvent {
    /// Human-readable log line for this event
    #[must_use]
    pub fn log_line(&self) -> String {
        match self {
            Self::RunStarted { total, output_path, .. } => {
                format!("Starting {total} leads -> {}", output_path.display())
            }
            Self::LeadStarted { address, .. } => format!("Processing: {address}"),
            Self::LeadCommitted { address, .. } => format!("Saved: {address}"),
            Self::LeadSkipped { address, reason, .. } => format!("Skipped {address}: {reason}"),
            Self::LeadFailed { address, stage, reason, .. } => {
                format!("Failed {address} at {stage}: {reason}")
            }
            Self::Progress { completed, total } => format!("Processed {completed}/{total}"),
            Self::Checkpointed { rows, .. } => format!("Saved table ({rows} rows)"),
            Self::RunCompleted { committed, skipped, failed, duration, .. } => format!(
                "Finished in {:.1}s: {committed} saved, {skipped} skipped, {failed} failed",
                duration.as_secs_f64()
            ),
        }
    }
}

/// Forwards every report as a [`HarvestEvent`] over an unbounded channel
///
/// Sending never blocks; events are dropped once the receiver is gone.
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    tx: UnboundedSender<HarvestEvent>,
}

impl ChannelProgress {
    #[must_use]
    pub fn new() -> (Self, UnboundedReceiver<HarvestEvent>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }

    fn send(&self, event: HarvestEvent) {
        // A closed receiver means nobody is watching
        let _ = self.tx.send(event);
    }
}

impl ProgressReporter for ChannelProgress {
    fn report_run_started(&self, total: usize, output_path: &Path) {
        self.send(HarvestEvent::RunStarted {
            total,
            output_path: output_path.to_path_buf(),
            timestamp: Utc::now(),
        });
    }

    fn report_lead_started(&self, lead: &Lead) {
        self.send(HarvestEvent::LeadStarted {
            index: lead.index(),
            address: lead.address().to_string(),
            timestamp: Utc::now(),
        });
    }

    fn report_lead_committed(&self, lead: &Lead, row: RowId) {
        self.send(HarvestEvent::LeadCommitted {
            index: lead.index(),
            address: lead.address().to_string(),
            row: row.0,
            timestamp: Utc::now(),
        });
    }

    fn report_lead_skipped(&self, lead: &Lead, reason: &LeadError) {
        self.send(HarvestEvent::LeadSkipped {
            index: lead.index(),
            address: lead.address().to_string(),
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn report_lead_failed(&self, lead: &Lead, stage: LeadStage, reason: &LeadError) {
        self.send(HarvestEvent::LeadFailed {
            index: lead.index(),
            address: lead.address().to_string(),
            stage,
            reason: reason.to_string(),
            timestamp: Utc::now(),
        });
    }

    fn report_progress(&self, completed: usize, total: usize) {
        self.send(HarvestEvent::Progress { completed, total });
    }

    fn report_checkpoint(&self, rows: usize, output_path: &Path) {
        self.send(HarvestEvent::Checkpointed {
            rows,
            output_path: output_path.to_path_buf(),
            timestamp: Utc::now(),
        });
    }

    fn report_run_completed(&self, summary: &RunSummary) {
        self.send(HarvestEvent::RunCompleted {
            total: summary.total,
            committed: summary.committed,
            skipped: summary.skipped,
            failed: summary.failed,
            duration: summary.elapsed,
            timestamp: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_forwards_events_in_order() {
        let (progress, mut rx) = ChannelProgress::new();
        let lead = Lead::new(4, "9 Birch Rd");
        progress.report_lead_started(&lead);
        progress.report_lead_skipped(&lead, &LeadError::NoSuchProperty);
        progress.report_progress(1, 5);

        assert!(matches!(rx.try_recv(), Ok(HarvestEvent::LeadStarted { index: 4, .. })));
        match rx.try_recv() {
            Ok(event @ HarvestEvent::LeadSkipped { .. }) => {
                assert_eq!(event.log_line(), "Skipped 9 Birch Rd: Property not found");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(matches!(
            rx.try_recv(),
            Ok(HarvestEvent::Progress { completed: 1, total: 5 })
        ));
    }

    #[test]
    fn sending_after_receiver_drop_is_silent() {
        let (progress, rx) = ChannelProgress::new();
        drop(rx);
        progress.report_progress(1, 1);
    }

    #[test]
    fn events_serialize() {
        let event = HarvestEvent::LeadFailed {
            index: 0,
            address: "1 Elm".into(),
            stage: LeadStage::Searched,
            reason: "timeout".into(),
            timestamp: Utc::now(),
        };
        let json = serde_json::to_string(&event).expect("serialize");
        assert!(json.contains("LeadFailed"));
        assert!(json.contains("Searched"));
    }
}
