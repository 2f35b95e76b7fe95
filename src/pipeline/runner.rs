//! Drives one lead through every stage

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    LeadFailure, LeadStage, PipelineContext, PropertyRecord, auth, features, records, search,
    summary,
};
use crate::errors::LeadError;
use crate::events::ProgressReporter;
use crate::leads::Lead;
use crate::session::PageSession;
use crate::store::{AggregationStore, RowId};

/// Current stage of one lead, with logged transitions
struct StageCursor<'a> {
    lead: &'a Lead,
    stage: LeadStage,
}

impl<'a> StageCursor<'a> {
    fn new(lead: &'a Lead) -> Self {
        Self {
            lead,
            stage: LeadStage::Init,
        }
    }

    fn advance(&mut self, to: LeadStage) {
        debug_assert!(self.stage.can_transition_to(to), "{} -> {to}", self.stage);
        debug!(lead = self.lead.index(), from = %self.stage, %to, "Stage transition");
        self.stage = to;
    }

    fn fail(&self, error: LeadError) -> LeadFailure {
        debug!(lead = self.lead.index(), stage = %self.stage, "Lead failed: {error}");
        LeadFailure::new(self.stage, error)
    }
}

/// Per-run pipeline, shared by all leads
pub struct ExtractionPipeline {
    store: Arc<AggregationStore>,
    context: PipelineContext,
    output_path: PathBuf,
    progress: Arc<dyn ProgressReporter>,
}

impl ExtractionPipeline {
    pub fn new(
        store: Arc<AggregationStore>,
        context: PipelineContext,
        output_path: PathBuf,
        progress: Arc<dyn ProgressReporter>,
    ) -> Self {
        Self {
            store,
            context,
            output_path,
            progress,
        }
    }

    #[must_use]
    pub fn context(&self) -> &PipelineContext {
        &self.context
    }

    /// Run `lead` to a terminal state on `session`
    ///
    /// No row is allocated before the house features are read, so a lead
    /// failing earlier leaves the table untouched. Once the row exists it is
    /// kept and the lead commits, even if a later record panel breaks or the
    /// run is cancelled.
    pub async fn run(
        &self,
        session: &mut dyn PageSession,
        lead: &Lead,
    ) -> Result<RowId, LeadFailure> {
        let ctx = &self.context;
        let mut cursor = StageCursor::new(lead);

        auth::sign_in(session, ctx).await.map_err(|e| cursor.fail(e))?;
        cursor.advance(LeadStage::Authenticated);

        search::search(session, ctx, lead.address())
            .await
            .map_err(|e| cursor.fail(e))?;
        cursor.advance(LeadStage::Searched);

        if ctx.config().humanized_scroll() {
            summary::humanized_scroll(session, ctx)
                .await
                .map_err(|e| cursor.fail(e))?;
        }

        let estimated_value = summary::estimated_value(session, ctx)
            .await
            .map_err(|e| cursor.fail(e))?;
        cursor.advance(LeadStage::ValueExtracted);

        let house_features = features::house_features(session, ctx)
            .await
            .map_err(|e| cursor.fail(e))?;
        cursor.advance(LeadStage::FeaturesExtracted);

        let general = summary::general_info(session, ctx)
            .await
            .map_err(|e| cursor.fail(e))?;

        let record = PropertyRecord {
            estimated_value,
            house_features,
            general,
        };
        let row = record.commit(&self.store, lead);

        // The row exists from here on, so the lead ends committed even when
        // the run is cancelled mid-panel
        match records::capture_records(session, ctx, &self.store, &row).await {
            Ok(written) => debug!(lead = lead.index(), written, "Captured record panels"),
            Err(LeadError::Cancelled) => {
                info!("Cancelled during record panels of {lead}; keeping its row");
            }
            Err(e) => warn!("Record panels of {lead} incomplete: {e}"),
        }
        cursor.advance(LeadStage::RecordsCaptured);

        self.checkpoint().await;
        cursor.advance(LeadStage::Committed);
        info!("Committed {lead} to row {}", row.id().0 + 1);
        Ok(row.id())
    }

    /// Persist the table so far; a failure is logged and the lead still commits
    async fn checkpoint(&self) {
        match self.store.persist(&self.output_path).await {
            Ok(()) => self
                .progress
                .report_checkpoint(self.store.row_count(), &self.output_path),
            Err(e) => warn!("Checkpoint to {} failed: {e}", self.output_path.display()),
        }
    }
}
