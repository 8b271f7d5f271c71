//! Scripted in-memory pages for tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::browser::{ACCESSIBLE_LABEL, BrowserSession, ElementHandle, PageHandle, Selector};
use crate::error::{AppError, Result};

/// A fake element with fixed attributes, text and children.
#[derive(Clone, Default)]
pub struct FakeElement {
    attrs: HashMap<String, String>,
    text: String,
    children: HashMap<String, Vec<FakeElement>>,
    broken: bool,
    clicks: Arc<AtomicUsize>,
}

impl FakeElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labelled(label: &str) -> Self {
        Self::new().attr(ACCESSIBLE_LABEL, label)
    }

    pub fn link(label: &str, href: &str) -> Self {
        Self::labelled(label).attr("href", href)
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn child(mut self, selector: &str, element: FakeElement) -> Self {
        self.children
            .entry(selector.to_string())
            .or_default()
            .push(element);
        self
    }

    /// Text reads fail as if the element was detached.
    pub fn broken(mut self) -> Self {
        self.broken = true;
        self
    }

    /// Number of clicks on this element and its clones.
    pub fn clicks(&self) -> usize {
        self.clicks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ElementHandle for FakeElement {
    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self.attrs.get(name).cloned())
    }

    async fn text(&self) -> Result<String> {
        if self.broken {
            return Err(AppError::browser("node is detached from document"));
        }
        Ok(self.text.clone())
    }

    async fn click(&self) -> Result<()> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>> {
        Ok(boxed(self.children.get(selector.as_str())))
    }
}

fn boxed(elements: Option<&Vec<FakeElement>>) -> Vec<Box<dyn ElementHandle>> {
    elements
        .into_iter()
        .flatten()
        .map(|e| Box::new(e.clone()) as Box<dyn ElementHandle>)
        .collect()
}

#[derive(Default)]
struct PageState {
    urls: VecDeque<String>,
    elements: HashMap<String, Vec<FakeElement>>,
    lazy: HashMap<String, VecDeque<FakeElement>>,
    failing: HashSet<String>,
    panics: bool,
    lookups: HashMap<String, usize>,
    visited: Vec<String>,
    scrolls: usize,
    closed: bool,
}

/// A fake page driven by a URL script and a selector table.
///
/// `current_url` walks through the scripted URLs one call at a time and then
/// stays on the last one. Elements registered with `with_lazy` appear one per
/// scroll step.
#[derive(Clone, Default)]
pub struct FakePage {
    state: Arc<Mutex<PageState>>,
}

impl FakePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_urls<I, S>(self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lock().urls = urls.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_elements(self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.lock()
            .elements
            .entry(selector.to_string())
            .or_default()
            .extend(elements);
        self
    }

    pub fn with_lazy(self, selector: &str, elements: Vec<FakeElement>) -> Self {
        self.lock()
            .lazy
            .entry(selector.to_string())
            .or_default()
            .extend(elements);
        self
    }

    /// Lookups of `selector` fail as if the page crashed.
    pub fn failing(self, selector: &str) -> Self {
        self.lock().failing.insert(selector.to_string());
        self
    }

    /// Reading the current URL panics.
    pub fn panicking(self) -> Self {
        self.lock().panics = true;
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.lock().visited.clone()
    }

    pub fn scrolls(&self) -> usize {
        self.lock().scrolls
    }

    pub fn lookups(&self, selector: &str) -> usize {
        self.lock().lookups.get(selector).copied().unwrap_or(0)
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, PageState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl PageHandle for FakePage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut state = self.lock();
        state.visited.push(url.to_string());
        if state.urls.is_empty() {
            state.urls.push_back(url.to_string());
        }
        Ok(())
    }

    async fn current_url(&self) -> Result<String> {
        let mut state = self.lock();
        if state.panics {
            drop(state);
            panic!("renderer crashed");
        }
        let url = if state.urls.len() > 1 {
            state.urls.pop_front()
        } else {
            state.urls.front().cloned()
        };
        Ok(url.unwrap_or_else(|| "about:blank".to_string()))
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>> {
        let mut state = self.lock();
        *state.lookups.entry(selector.to_string()).or_default() += 1;
        if state.failing.contains(selector.as_str()) {
            return Err(AppError::browser("target closed"));
        }
        Ok(boxed(state.elements.get(selector.as_str())))
    }

    async fn scroll_by(&self, _dx: f64, _dy: f64) -> Result<()> {
        let mut state = self.lock();
        state.scrolls += 1;

        let PageState { lazy, elements, .. } = &mut *state;
        for (selector, pending) in lazy.iter_mut() {
            if let Some(element) = pending.pop_front() {
                elements.entry(selector.clone()).or_default().push(element);
            }
        }
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.lock().closed = true;
        Ok(())
    }
}

/// A fake browser that hands out pages by the first URL they navigate to.
///
/// Unknown URLs get a page that stays on that URL with no elements.
#[derive(Clone, Default)]
pub struct FakeBrowser {
    routes: Arc<HashMap<String, FakePage>>,
    opened: Arc<AtomicUsize>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, page: FakePage) -> Self {
        Arc::make_mut(&mut self.routes).insert(url.to_string(), page);
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrowserSession for FakeBrowser {
    async fn open_page(&self) -> Result<Box<dyn PageHandle>> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RoutedPage {
            routes: Arc::clone(&self.routes),
            active: Mutex::new(None),
        }))
    }
}

struct RoutedPage {
    routes: Arc<HashMap<String, FakePage>>,
    active: Mutex<Option<FakePage>>,
}

impl RoutedPage {
    fn page(&self) -> FakePage {
        self.active.lock().unwrap().clone().unwrap_or_default()
    }
}

#[async_trait]
impl PageHandle for RoutedPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = {
            let mut active = self.active.lock().unwrap();
            active
                .get_or_insert_with(|| self.routes.get(url).cloned().unwrap_or_default())
                .clone()
        };
        page.navigate(url).await
    }

    async fn current_url(&self) -> Result<String> {
        self.page().current_url().await
    }

    async fn find_all(&self, selector: &Selector) -> Result<Vec<Box<dyn ElementHandle>>> {
        self.page().find_all(selector).await
    }

    async fn scroll_by(&self, dx: f64, dy: f64) -> Result<()> {
        self.page().scroll_by(dx, dy).await
    }

    async fn close(&self) -> Result<()> {
        self.page().close().await
    }
}
