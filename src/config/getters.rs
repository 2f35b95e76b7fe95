//! Getter methods for `HarvestConfig`

use std::path::Path;

use super::types::{Credentials, HarvestConfig, PipelineTiming, SiteLocators};
use crate::store::RowOrder;

impl HarvestConfig {
    #[must_use]
    pub fn lead_source(&self) -> &Path {
        &self.lead_source
    }

    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn max_concurrent_leads(&self) -> usize {
        self.max_concurrent_leads
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn row_order(&self) -> RowOrder {
        self.row_order
    }

    #[must_use]
    pub fn max_search_refreshes(&self) -> Option<u32> {
        self.max_search_refreshes
    }

    #[must_use]
    pub fn record_panel_count(&self) -> usize {
        self.record_panel_count
    }

    #[must_use]
    pub fn humanized_scroll(&self) -> bool {
        self.humanized_scroll
    }

    #[must_use]
    pub fn locators(&self) -> &SiteLocators {
        &self.locators
    }

    #[must_use]
    pub fn timing(&self) -> &PipelineTiming {
        &self.timing
    }
}
