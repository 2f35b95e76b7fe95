//! Page session capability
//!
//! The pipeline never talks to a browser directly. It drives a
//! [`PageSession`], which one concrete adapter ([`chromium`]) implements on
//! top of chromiumoxide and which tests replace with a scripted fake.
//!
//! Every session belongs to exactly one pipeline run and is closed when
//! that run reaches a terminal state.

pub mod chromium;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::errors::SessionError;

pub use chromium::{ChromiumSession, ChromiumSessionFactory};

/// Result type alias for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// XPath expression addressing one element on the page
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Locator(String);

impl Locator {
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self(expression.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Locator for a descendant path below this one
    #[must_use]
    pub fn join(&self, suffix: &str) -> Self {
        Self(format!("{}/{}", self.0, suffix.trim_start_matches('/')))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Locator {
    fn from(value: &str) -> Self {
        Self::xpath(value)
    }
}

/// What happened when the session tried to click an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Clicked,
    /// Another element (usually a modal overlay) would receive the click
    Intercepted,
}

/// Text content of an on-page table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableCapture {
    /// Header cells (`thead th`), trimmed
    pub header: Vec<String>,
    /// Body rows (`tbody tr td`), trimmed
    pub rows: Vec<Vec<String>>,
}

impl TableCapture {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.header.is_empty() && self.rows.is_empty()
    }

    /// Row-major grid with the header as row 0
    #[must_use]
    pub fn into_grid(self) -> Vec<Vec<String>> {
        let mut grid = Vec::with_capacity(self.rows.len() + 1);
        grid.push(self.header);
        grid.extend(self.rows);
        grid
    }
}

/// One live, interactive connection to the target site
///
/// Implementations report a missing element as [`SessionError::NotFound`]
/// from `read_text`, `click`, `send_keys` and `read_table`; `exists` never
/// fails for a missing element.
#[async_trait]
pub trait PageSession: Send {
    async fn navigate(&mut self, url: &str) -> SessionResult<()>;

    /// Wait until the document reports it has finished loading
    async fn wait_until_ready(&mut self, timeout: Duration) -> SessionResult<()>;

    async fn exists(&mut self, locator: &Locator) -> SessionResult<bool>;

    /// Rendered text of the element
    async fn read_text(&mut self, locator: &Locator) -> SessionResult<String>;

    async fn click(&mut self, locator: &Locator) -> SessionResult<ClickOutcome>;

    /// Clear the input, then type `text` into it
    async fn send_keys(&mut self, locator: &Locator, text: &str) -> SessionResult<()>;

    /// Header cells and body rows of the table at `locator`
    async fn read_table(&mut self, locator: &Locator) -> SessionResult<TableCapture>;

    /// Reload the current page
    async fn refresh(&mut self) -> SessionResult<()>;

    /// Scroll the viewport vertically by `delta_px` (negative scrolls up)
    async fn scroll_by(&mut self, _delta_px: i64) -> SessionResult<()> {
        Ok(())
    }

    /// Release the session's resources; called once at the end of a lead
    async fn close(&mut self) -> SessionResult<()> {
        Ok(())
    }
}

/// Opens a fresh, independent session for each lead
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> SessionResult<Box<dyn PageSession>>;
}
