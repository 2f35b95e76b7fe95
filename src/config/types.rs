//! Core configuration types for a harvesting run
//!
//! `HarvestConfig` is built once at startup and shared read-only by every
//! pipeline of the run. Nothing here is global: credentials, site locators
//! and timings are all injected through the builder.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::errors::{HarvestError, HarvestResult};
use crate::runtime::PollPolicy;
use crate::session::Locator;
use crate::store::RowOrder;
use crate::utils::constants::{
    DEFAULT_DIALOG_SETTLE_MS, DEFAULT_FEATURE_TIMEOUT_SECS, DEFAULT_INTERSTITIAL_SETTLE_MS,
    DEFAULT_LOGIN_SETTLE_MS, DEFAULT_NAVIGATION_SETTLE_MS,
    DEFAULT_PAGE_READY_TIMEOUT_SECS, DEFAULT_SEARCH_SETTLE_MS, DEFAULT_SEARCH_SOFT_DEADLINE_SECS,
    DEFAULT_TAB_SETTLE_MS,
};

/// Portal login
///
/// The password is never serialized and never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    email: String,
    #[serde(skip_serializing, default)]
    password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

const DETAILS_TAB: &str = "/html/body/rpr-app/rpr-layout/main/rpr-property-details/div[2]/div[5]/rpr-property-details-info-tab";
const SEARCH_FORM: &str =
    "/html/body/rpr-app/rpr-layout/main/rpr-home/div[1]/div/rpr-property-search-form/form/div";
const OVERLAY_DIALOG_ID: &str = "mat-mdc-dialog-0";

/// Placeholder substituted with the panel index in record-panel templates
pub const PANEL_INDEX_PLACEHOLDER: &str = "{index}";

/// Locators of one tabbed record panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPanelLocators {
    pub tab: Locator,
    pub label: Locator,
    pub show_more: Locator,
    pub table: Locator,
}

/// Every URL and element locator the pipeline touches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteLocators {
    pub sign_in_url: String,
    /// Dialog that sometimes covers the sign-in page on first load
    pub interstitial_dialog: Locator,
    pub email_input: Locator,
    pub password_input: Locator,
    pub sign_in_button: Locator,
    pub search_input: Locator,
    pub search_button: Locator,
    /// Message area under the search input ("NO LOCATION FOUND")
    pub search_message: Locator,
    /// Modal status dialog that can intercept clicks
    pub overlay_dialog: Locator,
    pub overlay_close_button: Locator,
    /// Estimated value, in priority order
    pub estimated_value: Vec<Locator>,
    pub house_features: Locator,
    pub activity: Locator,
    pub parcel_number: Locator,
    pub owner_name: Locator,
    /// Container of the owner panel's `ul/li` fact lists
    pub owner_facts: Locator,
    pub record_tab: String,
    pub record_tab_label: String,
    pub record_show_more: String,
    pub record_table: String,
}

impl Default for SiteLocators {
    fn default() -> Self {
        let summary = format!(
            "{DETAILS_TAB}/div[1]/div[2]/rpr-property-details-summary-panel/div/div"
        );
        let details = format!("{DETAILS_TAB}/div[2]/div[2]/div");

        Self {
            sign_in_url: "https://auth.narrpr.com/auth/sign-in".to_string(),
            interstitial_dialog: Locator::xpath(format!("//*[@id=\"{OVERLAY_DIALOG_ID}\"]/div/div")),
            email_input: Locator::xpath("//*[@id=\"SignInEmail\"]"),
            password_input: Locator::xpath("//*[@id=\"SignInPassword\"]"),
            sign_in_button: Locator::xpath("//*[@id=\"SignInBtn\"]"),
            search_input: Locator::xpath(format!("{SEARCH_FORM}/div[1]/div[2]/input")),
            search_button: Locator::xpath(format!("{SEARCH_FORM}/div[3]/div/button")),
            search_message: Locator::xpath(format!("{SEARCH_FORM}/div[1]/div[2]/div/div/div[1]")),
            overlay_dialog: Locator::xpath(format!("//*[@id=\"{OVERLAY_DIALOG_ID}\"]")),
            overlay_close_button: Locator::xpath(format!(
                "//*[@id=\"{OVERLAY_DIALOG_ID}\"]/div/div/rpr-status-dialog/div/div/div[2]/div/div/button"
            )),
            estimated_value: vec![
                Locator::xpath(format!(
                    "{summary}/div[4]/rpr-property-estimate-details/section/section[1]/section[1]/div/div[1]/span[1]"
                )),
                Locator::xpath(format!("{summary}/div[2]/section/div[2]")),
                Locator::xpath(format!(
                    "{summary}/div[4]/rpr-property-estimate-details/section/section[1]/section[1]/div/div[1]"
                )),
            ],
            house_features: Locator::xpath(format!(
                "{details}/rpr-property-details-facts/rpr-collapsible-panel/section/div/div/div/form/rpr-details-table/div/div[2]/table"
            )),
            activity: Locator::xpath(format!(
                "{details}/rpr-sales-and-financing/rpr-chart-card/rpr-collapsible-panel/section/div/div/rpr-details-table/div/div[2]/table"
            )),
            parcel_number: Locator::xpath(format!(
                "{details}/rpr-property-details-two-column-details[2]/div/rpr-collapsible-panel/section/div/div/div/ul[1]/li[1]/div[2]/span"
            )),
            owner_name: Locator::xpath(
                "//li[contains(@class,'basic-fact')]//div[contains(text(),'Owner Name')]/following-sibling::*[1]",
            ),
            owner_facts: Locator::xpath(format!(
                "{details}/rpr-property-details-two-column-details[3]/div/rpr-collapsible-panel/section/div/div/div"
            )),
            record_tab: "//*[@id=\"mat-tab-group-0-label-{index}\"]".to_string(),
            record_tab_label: "//*[@id=\"mat-tab-group-0-label-{index}\"]/span[2]/span".to_string(),
            record_show_more: "//*[@id=\"mat-tab-group-0-content-{index}\"]/div/rpr-details-table/button"
                .to_string(),
            record_table:
                "//*[@id=\"mat-tab-group-0-content-{index}\"]/div/rpr-details-table/div[1]/div[2]/table"
                    .to_string(),
        }
    }
}

impl SiteLocators {
    /// Locators of the record panel at `index` (0-based)
    #[must_use]
    pub fn record_panel(&self, index: usize) -> RecordPanelLocators {
        let fill = |template: &str| {
            Locator::xpath(template.replace(PANEL_INDEX_PLACEHOLDER, &index.to_string()))
        };
        RecordPanelLocators {
            tab: fill(&self.record_tab),
            label: fill(&self.record_tab_label),
            show_more: fill(&self.record_show_more),
            table: fill(&self.record_table),
        }
    }
}

/// Waits and pauses used by the pipeline stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineTiming {
    /// Bound on every `document.readyState` wait
    pub page_ready_timeout: Duration,
    /// Search input absent this long triggers a page refresh
    pub search_soft_deadline: Duration,
    /// Hard limit on house-feature extraction
    pub feature_timeout: Duration,
    /// Probe schedule for element-presence polling
    pub poll: PollPolicy,
    pub navigation_settle: Duration,
    pub interstitial_settle: Duration,
    pub login_settle: Duration,
    pub refresh_settle: Duration,
    pub search_settle: Duration,
    pub tab_settle: Duration,
    /// Lower and upper bound of the jittered pause between overlay dismissals
    pub dialog_settle_min: Duration,
    pub dialog_settle_max: Duration,
    pub scroll_step: Duration,
    pub scroll_settle: Duration,
}

impl Default for PipelineTiming {
    fn default() -> Self {
        Self {
            page_ready_timeout: Duration::from_secs(DEFAULT_PAGE_READY_TIMEOUT_SECS),
            search_soft_deadline: Duration::from_secs(DEFAULT_SEARCH_SOFT_DEADLINE_SECS),
            feature_timeout: Duration::from_secs(DEFAULT_FEATURE_TIMEOUT_SECS),
            poll: PollPolicy::default(),
            navigation_settle: Duration::from_millis(DEFAULT_NAVIGATION_SETTLE_MS),
            interstitial_settle: Duration::from_millis(DEFAULT_INTERSTITIAL_SETTLE_MS),
            login_settle: Duration::from_millis(DEFAULT_LOGIN_SETTLE_MS),
            refresh_settle: Duration::from_millis(DEFAULT_LOGIN_SETTLE_MS),
            search_settle: Duration::from_millis(DEFAULT_SEARCH_SETTLE_MS),
            tab_settle: Duration::from_millis(DEFAULT_TAB_SETTLE_MS),
            dialog_settle_min: Duration::from_millis(DEFAULT_DIALOG_SETTLE_MS - 100),
            dialog_settle_max: Duration::from_millis(DEFAULT_DIALOG_SETTLE_MS + 100),
            scroll_step: Duration::from_millis(200),
            scroll_settle: Duration::from_secs(2),
        }
    }
}

impl PipelineTiming {
    /// Millisecond-scale timings for driving a scripted session
    #[must_use]
    pub fn immediate() -> Self {
        let tick = Duration::from_millis(1);
        Self {
            page_ready_timeout: Duration::from_millis(200),
            search_soft_deadline: Duration::from_millis(20),
            feature_timeout: Duration::from_millis(200),
            poll: PollPolicy::fixed(tick),
            navigation_settle: Duration::ZERO,
            interstitial_settle: Duration::ZERO,
            login_settle: Duration::ZERO,
            refresh_settle: Duration::ZERO,
            search_settle: Duration::ZERO,
            tab_settle: Duration::ZERO,
            dialog_settle_min: Duration::ZERO,
            dialog_settle_max: Duration::ZERO,
            scroll_step: Duration::ZERO,
            scroll_settle: Duration::ZERO,
        }
    }
}

/// Main configuration of one harvesting run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarvestConfig {
    pub(crate) lead_source: PathBuf,
    pub(crate) output_dir: PathBuf,
    pub(crate) credentials: Credentials,
    pub(crate) max_concurrent_leads: usize,
    pub(crate) headless: bool,
    pub(crate) row_order: RowOrder,
    /// `None` keeps refreshing until the search input appears
    pub(crate) max_search_refreshes: Option<u32>,
    pub(crate) record_panel_count: usize,
    pub(crate) humanized_scroll: bool,
    pub(crate) locators: SiteLocators,
    pub(crate) timing: PipelineTiming,
}

impl HarvestConfig {
    /// Report file name for a run started at `started`
    #[must_use]
    pub fn output_file_name(started: DateTime<Local>) -> String {
        format!("output_{}.xlsx", started.format("%Y-%m-%d_%H-%M-%S"))
    }

    /// Report path for a run started at `started`
    #[must_use]
    pub fn output_path_at(&self, started: DateTime<Local>) -> PathBuf {
        self.output_dir.join(Self::output_file_name(started))
    }

    /// Report path for a run starting now
    #[must_use]
    pub fn output_path(&self) -> PathBuf {
        self.output_path_at(Local::now())
    }

    pub(crate) fn validate(&self) -> HarvestResult<()> {
        use crate::utils::constants::MAX_CONCURRENT_LEADS_LIMIT;

        if self.max_concurrent_leads == 0 || self.max_concurrent_leads > MAX_CONCURRENT_LEADS_LIMIT {
            return Err(HarvestError::Config(format!(
                "max_concurrent_leads must be between 1 and {MAX_CONCURRENT_LEADS_LIMIT}, got {}",
                self.max_concurrent_leads
            )));
        }
        if self.credentials.email().trim().is_empty() {
            return Err(HarvestError::Config("login e-mail is empty".to_string()));
        }
        if self.locators.estimated_value.is_empty() {
            return Err(HarvestError::Config(
                "at least one estimated-value locator is required".to_string(),
            ));
        }
        if self.lead_source.as_os_str().is_empty() {
            return Err(HarvestError::Config("lead source path is empty".to_string()));
        }
        Ok(())
    }
}
