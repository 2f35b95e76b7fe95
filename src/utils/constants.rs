//! Shared configuration constants for property_harvest
//!
//! This module contains default values and configuration constants used
//! throughout the codebase to ensure consistency and avoid magic numbers.

/// Default number of leads processed concurrently
///
/// Each in-flight lead owns a full browser process, so this is bounded by
/// memory more than by CPU. Nine browsers fit comfortably on a 16GB machine.
pub const DEFAULT_MAX_CONCURRENT_LEADS: usize = 9;

/// Upper bound accepted by the config builder for concurrency
pub const MAX_CONCURRENT_LEADS_LIMIT: usize = 64;

/// Seconds to wait for `document.readyState == "complete"`
pub const DEFAULT_PAGE_READY_TIMEOUT_SECS: u64 = 25;

/// Seconds without a search input before the page is refreshed
pub const DEFAULT_SEARCH_SOFT_DEADLINE_SECS: u64 = 30;

/// Hard limit in seconds for the house-features extraction sub-task
pub const DEFAULT_FEATURE_TIMEOUT_SECS: u64 = 40;

/// Delay between element-presence probes
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 500;

/// Pause after the first sign-in navigation
pub const DEFAULT_NAVIGATION_SETTLE_MS: u64 = 2_000;

/// Pause after re-navigating past an interstitial dialog
pub const DEFAULT_INTERSTITIAL_SETTLE_MS: u64 = 3_000;

/// Pause after submitting credentials
pub const DEFAULT_LOGIN_SETTLE_MS: u64 = 1_000;

/// Pause after submitting a search before checking for "no location found"
pub const DEFAULT_SEARCH_SETTLE_MS: u64 = 1_000;

/// Pause after clicking a record tab
pub const DEFAULT_TAB_SETTLE_MS: u64 = 200;

/// Pause between overlay-dismissal clicks
pub const DEFAULT_DIALOG_SETTLE_MS: u64 = 400;

/// Number of tabbed record panels inspected per lead
pub const RECORD_PANEL_COUNT: usize = 4;

/// Row of the merged section headers (1-based, spreadsheet convention)
pub const SECTION_HEADER_ROW: u32 = 1;

/// Row holding the field titles
pub const FIELD_TITLE_ROW: u32 = 2;

/// First row that holds lead data
pub const DATA_START_ROW: u32 = 3;

/// Column reserved for the lead's address label
pub const ADDRESS_COLUMN: usize = 1;

/// Fill color of the address cell (light green)
pub const ADDRESS_FILL_RGB: u32 = 0x00CC_FFCC;

/// Text the site shows when no estimate exists
pub const NO_CLOSED_PRICE_SENTINEL: &str = "No closed price available.";

/// What the report shows in place of [`NO_CLOSED_PRICE_SENTINEL`]
pub const PRICE_NOT_AVAILABLE: &str = "RPR price is not available";

/// Placeholder text of a panel that has not finished loading
pub const LOADING_PLACEHOLDER: &str = "Loading...";

/// Header line prepended to the house-features table text
pub const FEATURES_TABLE_HEADER: &str = "Name Public Facts Your Changes";

/// Marker inside the search form when the address is unknown
pub const NO_LOCATION_FOUND: &str = "NO LOCATION FOUND";

/// Record tab that never carries deed/mortgage/distress data
pub const TAX_PANEL_TITLE: &str = "Tax";

/// Environment variable holding the portal login e-mail
pub const EMAIL_ENV_VAR: &str = "RPR_EMAIL";

/// Environment variable holding the portal password
pub const PASSWORD_ENV_VAR: &str = "RPR_PASSWORD";

/// Chrome user agent string for stealth mode
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
