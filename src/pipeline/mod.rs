//! Per-lead extraction pipeline
//!
//! One pipeline drives one browser session through a fixed sequence of
//! stages (see [`LeadStage`]). Each stage is a free function over
//! `&mut dyn PageSession` and a shared [`PipelineContext`], so stages can be
//! exercised against scripted sessions without a browser.

pub mod auth;
pub mod features;
pub mod records;
pub mod runner;
pub mod search;
pub mod state;
pub mod summary;

pub use runner::ExtractionPipeline;
pub use state::LeadStage;
pub use summary::GeneralInfo;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

use crate::config::{HarvestConfig, PipelineTiming, SiteLocators};
use crate::errors::{LeadError, LeadResult, SessionError};
use crate::leads::Lead;
use crate::schema::SectionId;
use crate::session::{Locator, PageSession};
use crate::store::{AggregationStore, RowHandle};

/// Field titles of the general-info section written by the pipeline
pub mod fields {
    pub const ESTIMATED_VALUE: &str = "Lowest Estimated Value";
    pub const ACTIVITY: &str = "Activity";
    pub const PARCEL_NUMBER: &str = "Parcel Number";
    pub const OWNER: &str = "Owner";
}

/// Read-only state shared by every stage of a lead
#[derive(Debug, Clone)]
pub struct PipelineContext {
    config: Arc<HarvestConfig>,
    cancel: CancellationToken,
}

impl PipelineContext {
    #[must_use]
    pub fn new(config: Arc<HarvestConfig>, cancel: CancellationToken) -> Self {
        Self { config, cancel }
    }

    #[must_use]
    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    #[must_use]
    pub fn locators(&self) -> &SiteLocators {
        self.config.locators()
    }

    #[must_use]
    pub fn timing(&self) -> &PipelineTiming {
        self.config.timing()
    }

    #[must_use]
    pub fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }
}

/// Text at `locator`, or `None` if nothing matches
pub async fn read_optional(
    session: &mut dyn PageSession,
    locator: &Locator,
) -> LeadResult<Option<String>> {
    if !session.exists(locator).await? {
        return Ok(None);
    }
    // The element can vanish between the probe and the read
    match session.read_text(locator).await {
        Ok(text) => Ok(Some(text)),
        Err(SessionError::NotFound(_)) => {
            trace!(%locator, "Element vanished before read");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Everything read from a property page before the row is allocated
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyRecord {
    /// Raw estimated value, possibly the "no closed price" sentinel
    pub estimated_value: String,
    pub house_features: Vec<(String, String)>,
    pub general: GeneralInfo,
}

impl PropertyRecord {
    /// Allocate the lead's row and write the summary facts into it
    ///
    /// Fields whose titles are not in the schema are dropped.
    pub fn commit(&self, store: &AggregationStore, lead: &Lead) -> RowHandle {
        let row = store.allocate_row(lead);
        let general = SectionId::GeneralInfo;

        store.set_section_field(
            &row,
            general,
            fields::ESTIMATED_VALUE,
            summary::display_value(&self.estimated_value),
        );
        store.set_section_field(&row, general, fields::ACTIVITY, self.general.activity.trim());
        store.set_section_field(
            &row,
            general,
            fields::PARCEL_NUMBER,
            self.general.parcel_number.trim(),
        );
        if let Some(owner) = &self.general.owner_name {
            store.set_section_field(&row, general, fields::OWNER, owner.as_str());
        }
        for (label, value) in &self.general.owner_facts {
            store.set_section_field(&row, general, label, value.as_str());
        }
        for (label, value) in &self.house_features {
            store.set_section_field(&row, SectionId::HouseFeatures, label, value.as_str());
        }
        row
    }
}

/// Why a lead stopped, and where
#[derive(Debug)]
pub struct LeadFailure {
    /// Last stage the lead completed before failing
    pub stage: LeadStage,
    pub error: LeadError,
}

impl LeadFailure {
    #[must_use]
    pub fn new(stage: LeadStage, error: LeadError) -> Self {
        Self { stage, error }
    }
}
