//! Type-safe builder for `HarvestConfig` using the typestate pattern
//!
//! The lead source, output directory and credentials must be supplied, in
//! that order, before `build()` becomes available. Everything else has a
//! default and can be set in any state.

use std::marker::PhantomData;
use std::path::PathBuf;

use super::types::{Credentials, HarvestConfig, PipelineTiming, SiteLocators};
use crate::errors::HarvestResult;
use crate::store::RowOrder;
use crate::utils::constants::{DEFAULT_MAX_CONCURRENT_LEADS, RECORD_PANEL_COUNT};

// Type states for the builder
pub struct WithLeadSource;
pub struct WithOutputDir;
pub struct Complete;

/// Settings with defaults, carried unchanged across state transitions
#[derive(Debug, Clone)]
struct Options {
    max_concurrent_leads: usize,
    headless: bool,
    row_order: RowOrder,
    max_search_refreshes: Option<u32>,
    record_panel_count: usize,
    humanized_scroll: bool,
    locators: SiteLocators,
    timing: PipelineTiming,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_concurrent_leads: DEFAULT_MAX_CONCURRENT_LEADS,
            headless: true,
            row_order: RowOrder::default(),
            max_search_refreshes: None,
            record_panel_count: RECORD_PANEL_COUNT,
            humanized_scroll: true,
            locators: SiteLocators::default(),
            timing: PipelineTiming::default(),
        }
    }
}

pub struct HarvestConfigBuilder<State = ()> {
    lead_source: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    credentials: Option<Credentials>,
    options: Options,
    _phantom: PhantomData<State>,
}

impl Default for HarvestConfigBuilder<()> {
    fn default() -> Self {
        Self {
            lead_source: None,
            output_dir: None,
            credentials: None,
            options: Options::default(),
            _phantom: PhantomData,
        }
    }
}

impl HarvestConfig {
    /// Create a builder for configuring a `HarvestConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> HarvestConfigBuilder<()> {
        HarvestConfigBuilder::default()
    }
}

impl<State> HarvestConfigBuilder<State> {
    fn transition<Next>(self) -> HarvestConfigBuilder<Next> {
        HarvestConfigBuilder {
            lead_source: self.lead_source,
            output_dir: self.output_dir,
            credentials: self.credentials,
            options: self.options,
            _phantom: PhantomData,
        }
    }

    /// Number of leads processed at once (one browser each)
    #[must_use]
    pub fn max_concurrent_leads(mut self, limit: usize) -> Self {
        self.options.max_concurrent_leads = limit;
        self
    }

    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.options.headless = headless;
        self
    }

    #[must_use]
    pub fn row_order(mut self, order: RowOrder) -> Self {
        self.options.row_order = order;
        self
    }

    /// Give up on a lead after this many search-page refreshes
    #[must_use]
    pub fn max_search_refreshes(mut self, limit: Option<u32>) -> Self {
        self.options.max_search_refreshes = limit;
        self
    }

    #[must_use]
    pub fn record_panel_count(mut self, count: usize) -> Self {
        self.options.record_panel_count = count;
        self
    }

    /// Scroll the details page like a reader before extracting
    #[must_use]
    pub fn humanized_scroll(mut self, enabled: bool) -> Self {
        self.options.humanized_scroll = enabled;
        self
    }

    #[must_use]
    pub fn locators(mut self, locators: SiteLocators) -> Self {
        self.options.locators = locators;
        self
    }

    #[must_use]
    pub fn timing(mut self, timing: PipelineTiming) -> Self {
        self.options.timing = timing;
        self
    }
}

impl HarvestConfigBuilder<()> {
    pub fn lead_source(mut self, path: impl Into<PathBuf>) -> HarvestConfigBuilder<WithLeadSource> {
        self.lead_source = Some(path.into());
        self.transition()
    }
}

impl HarvestConfigBuilder<WithLeadSource> {
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> HarvestConfigBuilder<WithOutputDir> {
        self.output_dir = Some(dir.into());
        self.transition()
    }
}

impl HarvestConfigBuilder<WithOutputDir> {
    pub fn credentials(mut self, credentials: Credentials) -> HarvestConfigBuilder<Complete> {
        self.credentials = Some(credentials);
        self.transition()
    }
}

// Build method only available when all required fields are set
impl HarvestConfigBuilder<Complete> {
    pub fn build(self) -> HarvestResult<HarvestConfig> {
        let missing = |field: &str| crate::errors::HarvestError::Config(format!("{field} is required"));
        let Options {
            max_concurrent_leads,
            headless,
            row_order,
            max_search_refreshes,
            record_panel_count,
            humanized_scroll,
            locators,
            timing,
        } = self.options;

        let config = HarvestConfig {
            lead_source: self.lead_source.ok_or_else(|| missing("lead_source"))?,
            output_dir: self.output_dir.ok_or_else(|| missing("output_dir"))?,
            credentials: self.credentials.ok_or_else(|| missing("credentials"))?,
            max_concurrent_leads,
            headless,
            row_order,
            max_search_refreshes,
            record_panel_count,
            humanized_scroll,
            locators,
            timing,
        };
        config.validate()?;
        Ok(config)
    }
}
