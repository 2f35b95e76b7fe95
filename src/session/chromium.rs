//! chromiumoxide-backed [`PageSession`]
//!
//! Element lookups go through `document.evaluate` with XPath, so every
//! [`Locator`] is resolved in the page exactly like a locator written for
//! the site would be. One browser process (with its own profile) backs one
//! session.

use anyhow::Context;
use async_trait::async_trait;
use chromiumoxide::{Browser, Page};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ClickOutcome, Locator, PageSession, SessionFactory, SessionResult, TableCapture};
use crate::browser_profile::{BrowserProfile, create_unique_profile};
use crate::browser_setup::{LaunchOptions, launch_browser, mask_automation};
use crate::errors::SessionError;

const READY_PROBE_INTERVAL: Duration = Duration::from_millis(250);

/// JS expression resolving `xpath` to its first matching node (or null)
fn node_expr(locator: &Locator) -> String {
    // JSON string literals are valid JS string literals
    let literal = serde_json::to_string(locator.as_str()).unwrap_or_else(|_| "\"\"".to_string());
    format!(
        "document.evaluate({literal}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue"
    )
}

fn exists_script(locator: &Locator) -> String {
    format!("(() => {} !== null)()", node_expr(locator))
}

fn text_script(locator: &Locator) -> String {
    format!(
        "(() => {{ const n = {}; return n === null ? null : (n.innerText ?? n.textContent ?? ''); }})()",
        node_expr(locator)
    )
}

/// Clicks only if the element itself is topmost at its centre point
fn click_script(locator: &Locator) -> String {
    format!(
        r"(() => {{
            const n = {};
            if (n === null) return 'missing';
            n.scrollIntoView({{ block: 'center', inline: 'center' }});
            const r = n.getBoundingClientRect();
            const hit = document.elementFromPoint(r.left + r.width / 2, r.top + r.height / 2);
            if (hit !== null && hit !== n && !n.contains(hit)) return 'intercepted';
            n.click();
            return 'clicked';
        }})()",
        node_expr(locator)
    )
}

fn clear_script(locator: &Locator) -> String {
    format!(
        r"(() => {{
            const n = {};
            if (n === null) return false;
            n.focus();
            n.value = '';
            n.dispatchEvent(new Event('input', {{ bubbles: true }}));
            return true;
        }})()",
        node_expr(locator)
    )
}

fn table_script(locator: &Locator) -> String {
    format!(
        r"(() => {{
            const t = {};
            if (t === null) return null;
            const text = (c) => (c.innerText ?? c.textContent ?? '').trim();
            return {{
                header: Array.from(t.querySelectorAll(':scope > thead > tr > th')).map(text),
                rows: Array.from(t.querySelectorAll(':scope > tbody > tr')).map(
                    (tr) => Array.from(tr.querySelectorAll(':scope > td')).map(text)
                ),
            }};
        }})()",
        node_expr(locator)
    )
}

#[derive(Debug, Deserialize)]
struct RawTable {
    header: Vec<String>,
    rows: Vec<Vec<String>>,
}

/// Launches one browser per [`open`](SessionFactory::open) call
#[derive(Debug, Clone, Default)]
pub struct ChromiumSessionFactory {
    options: LaunchOptions,
}

impl ChromiumSessionFactory {
    #[must_use]
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }
}

#[async_trait]
impl SessionFactory for ChromiumSessionFactory {
    async fn open(&self) -> SessionResult<Box<dyn PageSession>> {
        let profile = create_unique_profile()?;
        let (browser, handler) = launch_browser(&self.options, profile.path()).await?;
        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to open page")?;

        Ok(Box::new(ChromiumSession {
            browser,
            handler,
            page,
            profile: Some(profile),
            closed: false,
        }))
    }
}

/// A live browser tab plus the process and profile behind it
pub struct ChromiumSession {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
    profile: Option<BrowserProfile>,
    closed: bool,
}

impl ChromiumSession {
    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> SessionResult<T> {
        let result = self
            .page
            .evaluate(script)
            .await
            .context("Script evaluation failed")?;
        // CDP omits the value entirely for a JS `null`
        let raw = result.value().cloned().unwrap_or(serde_json::Value::Null);
        let value = serde_json::from_value(raw).context("Unexpected script result")?;
        Ok(value)
    }
}

#[async_trait]
impl PageSession for ChromiumSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        debug!("Navigating to {url}");
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Navigation to {url} failed"))?;
        if let Err(e) = mask_automation(&self.page).await {
            debug!("{e:#}");
        }
        Ok(())
    }

    async fn wait_until_ready(&mut self, timeout: Duration) -> SessionResult<()> {
        let started = Instant::now();
        loop {
            let state: String = self.eval("document.readyState".to_string()).await?;
            if state == "complete" {
                return Ok(());
            }
            if started.elapsed() >= timeout {
                return Err(SessionError::Timeout {
                    operation: "page ready".to_string(),
                    after: timeout,
                });
            }
            tokio::time::sleep(READY_PROBE_INTERVAL).await;
        }
    }

    async fn exists(&mut self, locator: &Locator) -> SessionResult<bool> {
        self.eval(exists_script(locator)).await
    }

    async fn read_text(&mut self, locator: &Locator) -> SessionResult<String> {
        let text: Option<String> = self.eval(text_script(locator)).await?;
        text.ok_or_else(|| SessionError::NotFound(locator.to_string()))
    }

    async fn click(&mut self, locator: &Locator) -> SessionResult<ClickOutcome> {
        let outcome: String = self.eval(click_script(locator)).await?;
        match outcome.as_str() {
            "clicked" => Ok(ClickOutcome::Clicked),
            "intercepted" => Ok(ClickOutcome::Intercepted),
            _ => Err(SessionError::NotFound(locator.to_string())),
        }
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> SessionResult<()> {
        let cleared: bool = self.eval(clear_script(locator)).await?;
        if !cleared {
            return Err(SessionError::NotFound(locator.to_string()));
        }
        let element = self
            .page
            .find_xpath(locator.as_str())
            .await
            .map_err(|_| SessionError::NotFound(locator.to_string()))?;
        element
            .type_str(text)
            .await
            .context("Typing into input failed")?;
        Ok(())
    }

    async fn read_table(&mut self, locator: &Locator) -> SessionResult<TableCapture> {
        let raw: Option<RawTable> = self.eval(table_script(locator)).await?;
        let raw = raw.ok_or_else(|| SessionError::NotFound(locator.to_string()))?;
        Ok(TableCapture {
            header: raw.header,
            rows: raw.rows,
        })
    }

    async fn refresh(&mut self) -> SessionResult<()> {
        self.page.reload().await.context("Page reload failed")?;
        Ok(())
    }

    async fn scroll_by(&mut self, delta_px: i64) -> SessionResult<()> {
        let _: serde_json::Value = self
            .eval(format!("(() => {{ window.scrollBy(0, {delta_px}); return null; }})()"))
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> SessionResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        // Close the browser before the handler loses its CDP connection
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to wait for browser exit: {e}");
        }
        self.handler.abort();
        // Profile goes only after the process has exited
        self.profile.take();
        Ok(())
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        if !self.closed {
            warn!("Browser session dropped without close(); aborting handler");
        }
        self.handler.abort();
    }
}
