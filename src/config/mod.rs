//! Configuration module for harvesting runs
//!
//! This module provides the `HarvestConfig` struct and its type-safe builder
//! for configuring a run with validation and sensible defaults.

// Sub-modules
pub mod builder;
pub mod getters;
pub mod types;

// Re-exports for public API
pub use builder::{Complete, HarvestConfigBuilder, WithLeadSource, WithOutputDir};
pub use types::{Credentials, HarvestConfig, PipelineTiming, RecordPanelLocators, SiteLocators};
