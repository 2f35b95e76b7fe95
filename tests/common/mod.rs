//! Scripted page sessions for driving the pipeline without a browser
//!
//! A [`FakeSite`] describes what the portal shows: which addresses have a
//! property page, what each locator reads, and how overlays behave. Every
//! [`FakeSession`] opened by [`FakeFactory`] walks that site the way the
//! pipeline expects a real page to respond.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use property_harvest::config::{Credentials, HarvestConfig, PipelineTiming, SiteLocators};
use property_harvest::errors::SessionError;
use property_harvest::session::{
    ClickOutcome, Locator, PageSession, SessionFactory, SessionResult, TableCapture,
};

pub const FEATURES_TEXT: &str =
    "Facts\nName Public Facts Your Changes\nProperty Type\nSingle Family\nBedrooms*\n3\nTotal Baths\n2";

/// Overlay dialog covering the search form
#[derive(Debug, Clone, Copy)]
pub enum Overlay {
    /// Goes away after this many close clicks
    Dismissable(usize),
    /// Close button is itself blocked
    Stuck,
}

/// What the details page of one address shows
#[derive(Debug, Clone, Default)]
pub struct PropertyPage {
    texts: HashMap<String, String>,
    tables: HashMap<String, TableCapture>,
    /// Table locator -> (show-more locator, table once expanded)
    expanded_tables: HashMap<String, (String, TableCapture)>,
    /// How long the search takes to open this page
    load_delay: Duration,
    panics: bool,
}

impl PropertyPage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value, features, activity, parcel, owner and one deed panel
    pub fn standard(locators: &SiteLocators, value: &str) -> Self {
        Self::new()
            .text(&locators.estimated_value[0], value)
            .text(&locators.house_features, FEATURES_TEXT)
            .text(&locators.activity, "Off Market")
            .text(&locators.parcel_number, "042-118-07")
            .text(&locators.owner_name, " Jordan Doe ")
            .owner_fact(locators, 1, "Owner Occupied", "Yes")
            .panel(
                locators,
                0,
                "Tax",
                TableCapture {
                    header: vec!["Tax Year".into(), "2023".into()],
                    rows: vec![],
                },
            )
            .panel(
                locators,
                1,
                "Deed",
                TableCapture {
                    header: vec!["Document #".into(), "D-1001".into()],
                    rows: vec![vec!["Contract Date".into(), "01/02/2020".into()]],
                },
            )
    }

    pub fn text(mut self, locator: &Locator, text: &str) -> Self {
        self.texts.insert(locator.to_string(), text.to_string());
        self
    }

    pub fn without(mut self, locator: &Locator) -> Self {
        self.texts.remove(locator.as_str());
        self
    }

    pub fn table(mut self, locator: &Locator, table: TableCapture) -> Self {
        self.tables.insert(locator.to_string(), table);
        self
    }

    /// Tab `index` labelled `title` with `table` as its content
    pub fn panel(self, locators: &SiteLocators, index: usize, title: &str, table: TableCapture) -> Self {
        let panel = locators.record_panel(index);
        self.text(&panel.tab, title)
            .text(&panel.label, title)
            .table(&panel.table, table)
    }

    /// Like [`panel`](Self::panel), but only `collapsed` shows until
    /// "show more" is clicked
    pub fn expandable_panel(
        mut self,
        locators: &SiteLocators,
        index: usize,
        title: &str,
        collapsed: TableCapture,
        expanded: TableCapture,
    ) -> Self {
        let panel = locators.record_panel(index);
        self.expanded_tables
            .insert(panel.table.to_string(), (panel.show_more.to_string(), expanded));
        self.panel(locators, index, title, collapsed)
            .text(&panel.show_more, "Show more")
    }

    pub fn load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = delay;
        self
    }

    /// Item `item` of the first owner fact list
    pub fn owner_fact(self, locators: &SiteLocators, item: usize, label: &str, value: &str) -> Self {
        let base = &locators.owner_facts;
        let list = base.join("ul[1]");
        let entry = list.join(&format!("li[{item}]"));
        self.text(base, "")
            .text(&list, "")
            .text(&entry, "")
            .text(&entry.join("div[1]"), label)
            .text(&entry.join("div[2]/span"), value)
    }

    /// Searching for this address panics the pipeline
    pub fn panicking(mut self) -> Self {
        self.panics = true;
        self
    }
}

/// The portal as the fake sessions see it
#[derive(Debug, Clone)]
pub struct FakeSite {
    pub locators: SiteLocators,
    properties: HashMap<String, PropertyPage>,
    overlay: Option<Overlay>,
    intercept_search_input: bool,
    /// Refreshes needed before the search input renders
    search_input_after_refreshes: u32,
    /// Delay of every navigation, so concurrent leads overlap
    navigation_delay: Duration,
    /// The sign-in page opens behind a dialog on the first load
    interstitial_on_first_load: bool,
    /// Cancelled when a record tab is clicked
    cancel_on_record_tab: Option<CancellationToken>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self {
            locators: SiteLocators::default(),
            properties: HashMap::new(),
            overlay: None,
            intercept_search_input: false,
            search_input_after_refreshes: 0,
            navigation_delay: Duration::from_millis(2),
            interstitial_on_first_load: false,
            cancel_on_record_tab: None,
        }
    }

    pub fn property(mut self, address: &str, page: PropertyPage) -> Self {
        self.properties.insert(address.to_string(), page);
        self
    }

    /// Standard page for `address`
    pub fn standard_property(self, address: &str) -> Self {
        let page = PropertyPage::standard(&self.locators, "$412,000");
        self.property(address, page)
    }

    pub fn overlay(mut self, overlay: Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }

    pub fn intercept_search_input(mut self) -> Self {
        self.intercept_search_input = true;
        self
    }

    pub fn search_input_after_refreshes(mut self, refreshes: u32) -> Self {
        self.search_input_after_refreshes = refreshes;
        self
    }

    pub fn navigation_delay(mut self, delay: Duration) -> Self {
        self.navigation_delay = delay;
        self
    }

    pub fn interstitial_on_first_load(mut self) -> Self {
        self.interstitial_on_first_load = true;
        self
    }

    pub fn cancel_on_record_tab(mut self, cancel: CancellationToken) -> Self {
        self.cancel_on_record_tab = Some(cancel);
        self
    }

    fn is_record_tab(&self, locator: &Locator) -> bool {
        (0..4).any(|index| self.locators.record_panel(index).tab == *locator)
    }
}

/// Open/close bookkeeping across every session of a factory
#[derive(Debug, Default)]
pub struct SessionStats {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    live: AtomicUsize,
    pub peak: AtomicUsize,
    pub typed: Mutex<Vec<String>>,
    pub navigated: Mutex<Vec<String>>,
    pub clicked: Mutex<Vec<String>>,
}

impl SessionStats {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigated.lock().iter().filter(|u| *u == url).count()
    }

    pub fn was_clicked(&self, locator: &Locator) -> bool {
        self.clicked.lock().iter().any(|l| l == locator.as_str())
    }
}

pub struct FakeSession {
    site: Arc<FakeSite>,
    stats: Arc<SessionStats>,
    overlay_clicks_left: usize,
    refreshes: u32,
    navigations: usize,
    clicked: Vec<String>,
    typed: String,
    searched: Option<String>,
    closed: bool,
}

impl FakeSession {
    pub fn new(site: Arc<FakeSite>, stats: Arc<SessionStats>) -> Self {
        let overlay_clicks_left = match site.overlay {
            Some(Overlay::Dismissable(clicks)) => clicks,
            _ => 0,
        };
        Self {
            site,
            stats,
            overlay_clicks_left,
            refreshes: 0,
            navigations: 0,
            clicked: Vec::new(),
            typed: String::new(),
            searched: None,
            closed: false,
        }
    }

    fn locators(&self) -> &SiteLocators {
        &self.site.locators
    }

    fn overlay_open(&self) -> bool {
        matches!(self.site.overlay, Some(Overlay::Stuck)) || self.overlay_clicks_left > 0
    }

    fn page(&self) -> Option<&PropertyPage> {
        self.searched
            .as_ref()
            .and_then(|address| self.site.properties.get(address))
    }

    fn is_sign_in_element(&self, locator: &Locator) -> bool {
        let l = self.locators();
        [&l.email_input, &l.password_input, &l.sign_in_button].contains(&locator)
    }

    fn no_location(&self) -> bool {
        self.searched.is_some() && self.page().is_none()
    }
}

#[async_trait]
impl PageSession for FakeSession {
    async fn navigate(&mut self, url: &str) -> SessionResult<()> {
        tokio::time::sleep(self.site.navigation_delay).await;
        self.navigations += 1;
        self.stats.navigated.lock().push(url.to_string());
        Ok(())
    }

    async fn wait_until_ready(&mut self, _timeout: Duration) -> SessionResult<()> {
        Ok(())
    }

    async fn exists(&mut self, locator: &Locator) -> SessionResult<bool> {
        let l = self.locators();
        if self.is_sign_in_element(locator) || *locator == l.search_button {
            return Ok(true);
        }
        if *locator == l.search_input {
            return Ok(self.refreshes >= self.site.search_input_after_refreshes);
        }
        if *locator == l.overlay_dialog {
            return Ok(self.overlay_open());
        }
        if *locator == l.interstitial_dialog {
            return Ok(self.site.interstitial_on_first_load && self.navigations == 1);
        }
        if *locator == l.search_message {
            return Ok(self.no_location());
        }
        Ok(self.page().is_some_and(|page| {
            page.texts.contains_key(locator.as_str()) || page.tables.contains_key(locator.as_str())
        }))
    }

    async fn read_text(&mut self, locator: &Locator) -> SessionResult<String> {
        if *locator == self.locators().search_message && self.no_location() {
            return Ok("NO LOCATION FOUND".to_string());
        }
        self.page()
            .and_then(|page| page.texts.get(locator.as_str()).cloned())
            .ok_or_else(|| SessionError::NotFound(locator.to_string()))
    }

    async fn click(&mut self, locator: &Locator) -> SessionResult<ClickOutcome> {
        let l = self.locators().clone();
        if *locator == l.search_input {
            if self.site.intercept_search_input || self.overlay_open() {
                return Ok(ClickOutcome::Intercepted);
            }
            return Ok(ClickOutcome::Clicked);
        }
        if *locator == l.overlay_close_button {
            return match self.site.overlay {
                Some(Overlay::Stuck) => Ok(ClickOutcome::Intercepted),
                _ if self.overlay_clicks_left > 0 => {
                    self.overlay_clicks_left -= 1;
                    Ok(ClickOutcome::Clicked)
                }
                _ => Err(SessionError::NotFound(locator.to_string())),
            };
        }
        if *locator == l.search_button {
            self.searched = Some(self.typed.clone());
            if self.page().is_some_and(|page| page.panics) {
                panic!("scripted panic for {}", self.typed);
            }
            if let Some(delay) = self.page().map(|page| page.load_delay) {
                tokio::time::sleep(delay).await;
            }
            return Ok(ClickOutcome::Clicked);
        }
        if self.is_sign_in_element(locator) {
            return Ok(ClickOutcome::Clicked);
        }
        if !self
            .page()
            .is_some_and(|page| page.texts.contains_key(locator.as_str()))
        {
            return Err(SessionError::NotFound(locator.to_string()));
        }
        self.stats.clicked.lock().push(locator.to_string());
        self.clicked.push(locator.to_string());
        if let Some(cancel) = &self.site.cancel_on_record_tab
            && self.site.is_record_tab(locator)
        {
            cancel.cancel();
        }
        Ok(ClickOutcome::Clicked)
    }

    async fn send_keys(&mut self, locator: &Locator, text: &str) -> SessionResult<()> {
        if *locator == self.locators().search_input {
            self.typed = text.to_string();
            self.stats.typed.lock().push(text.to_string());
            return Ok(());
        }
        if self.is_sign_in_element(locator) {
            return Ok(());
        }
        Err(SessionError::NotFound(locator.to_string()))
    }

    async fn read_table(&mut self, locator: &Locator) -> SessionResult<TableCapture> {
        let page = self
            .page()
            .ok_or_else(|| SessionError::NotFound(locator.to_string()))?;
        if let Some((show_more, expanded)) = page.expanded_tables.get(locator.as_str())
            && self.clicked.contains(show_more)
        {
            return Ok(expanded.clone());
        }
        page.tables
            .get(locator.as_str())
            .cloned()
            .ok_or_else(|| SessionError::NotFound(locator.to_string()))
    }

    async fn refresh(&mut self) -> SessionResult<()> {
        self.refreshes += 1;
        Ok(())
    }

    async fn close(&mut self) -> SessionResult<()> {
        if !self.closed {
            self.closed = true;
            self.stats.live.fetch_sub(1, Ordering::SeqCst);
            self.stats.closed.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

pub struct FakeFactory {
    site: Arc<FakeSite>,
    pub stats: Arc<SessionStats>,
}

impl FakeFactory {
    pub fn new(site: FakeSite) -> Self {
        Self {
            site: Arc::new(site),
            stats: Arc::new(SessionStats::default()),
        }
    }

    pub fn session(&self) -> FakeSession {
        self.stats.opened.fetch_add(1, Ordering::SeqCst);
        let live = self.stats.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.peak.fetch_max(live, Ordering::SeqCst);
        FakeSession::new(Arc::clone(&self.site), Arc::clone(&self.stats))
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    async fn open(&self) -> SessionResult<Box<dyn PageSession>> {
        Ok(Box::new(self.session()))
    }
}

/// Run configuration with millisecond timings
pub fn test_config(dir: &Path, concurrency: usize) -> HarvestConfig {
    HarvestConfig::builder()
        .lead_source(dir.join("leads.csv"))
        .output_dir(dir)
        .credentials(Credentials::new("agent@example.com", "hunter2"))
        .max_concurrent_leads(concurrency)
        .timing(PipelineTiming::immediate())
        .build()
        .expect("valid test config")
}
