//! In-memory surface for exercising flows without a browser.
//!
//! Pages are described up front as lists of [`FakeElement`]s; clicks may
//! navigate to another page or emit a download. Every mutating call is
//! recorded so tests can assert on what a flow did.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    errors::ActionError,
    surface::Surface,
    types::{Locator, Role, TextMatch},
};

/// What happens when an element is clicked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickEffect {
    None,
    Navigate(String),
    Download(String),
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    pub role: Option<Role>,
    pub name: String,
    pub label: Option<String>,
    pub selector: Option<String>,
    pub visible: bool,
    pub on_click: ClickEffect,
    pub value: String,
    pub checked: bool,
}

impl FakeElement {
    pub fn new(role: Option<Role>, name: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            label: None,
            selector: None,
            visible: true,
            on_click: ClickEffect::None,
            value: String::new(),
            checked: false,
        }
    }

    pub fn heading(name: impl Into<String>) -> Self {
        Self::new(Some(Role::Heading), name)
    }

    pub fn button(name: impl Into<String>) -> Self {
        Self::new(Some(Role::Button), name)
    }

    pub fn link(name: impl Into<String>) -> Self {
        Self::new(Some(Role::Link), name)
    }

    /// Radio button labelled `name`; matches both role and label queries.
    pub fn radio(name: impl Into<String>) -> Self {
        let name = name.into();
        Self::new(Some(Role::Radio), name.clone()).with_label(name)
    }

    /// Text input associated with `label`.
    pub fn input(label: impl Into<String>) -> Self {
        let label = label.into();
        Self::new(Some(Role::Textbox), label.clone()).with_label(label)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn navigates_to(mut self, url: impl Into<String>) -> Self {
        self.on_click = ClickEffect::Navigate(url.into());
        self
    }

    pub fn downloads(mut self, filename: impl Into<String>) -> Self {
        self.on_click = ClickEffect::Download(filename.into());
        self
    }

    fn matches(&self, locator: &Locator) -> bool {
        match locator {
            Locator::Role { role, name } => self.role == Some(*role) && name.matches(&self.name),
            Locator::Label { label } => self
                .label
                .as_deref()
                .map(|l| label.matches(l))
                .unwrap_or(false),
            Locator::Css { selector } => self.selector.as_deref() == Some(selector.as_str()),
            Locator::CssWithText { selector, text } => {
                self.selector.as_deref() == Some(selector.as_str())
                    && TextMatch::contains(text.as_str()).matches(&self.name)
            }
            Locator::DescriptionValue { .. } | Locator::Body => false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    pub url: String,
    pub elements: Vec<FakeElement>,
    pub body_text: String,
    pub definitions: Vec<(String, String)>,
}

impl FakePage {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_elements(mut self, elements: Vec<FakeElement>) -> Self {
        self.elements.extend(elements);
        self
    }

    pub fn with_element(mut self, element: FakeElement) -> Self {
        self.elements.push(element);
        self
    }

    pub fn with_body_text(mut self, text: impl Into<String>) -> Self {
        self.body_text = text.into();
        self
    }

    pub fn with_definition(mut self, term: impl Into<String>, value: impl Into<String>) -> Self {
        self.definitions.push((term.into(), value.into()));
        self
    }

    fn definition(&self, term: &str) -> Option<&str> {
        let needle = TextMatch::contains(term);
        self.definitions
            .iter()
            .find(|(t, _)| needle.matches(t))
            .map(|(_, v)| v.as_str())
    }

    fn count(&self, locator: &Locator) -> usize {
        match locator {
            Locator::Body => 1,
            Locator::DescriptionValue { term } => usize::from(self.definition(term).is_some()),
            other => self.elements.iter().filter(|e| e.matches(other)).count(),
        }
    }

    fn first_mut(&mut self, locator: &Locator) -> Option<&mut FakeElement> {
        self.elements.iter_mut().find(|e| e.matches(locator))
    }
}

/// Recorded interaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceEvent {
    Goto(String),
    Click(String),
    Fill(String, String),
    Check(String),
    Snapshot,
    Content,
}

#[derive(Default)]
struct State {
    pages: HashMap<String, FakePage>,
    current: String,
    events: Vec<SurfaceEvent>,
    pending_download: Option<PathBuf>,
    fail_captures: bool,
    closed: bool,
}

pub struct ScriptedSurface {
    state: Mutex<State>,
    download_dir: PathBuf,
}

impl ScriptedSurface {
    pub fn new(download_dir: impl Into<PathBuf>) -> Self {
        Self {
            state: Mutex::new(State::default()),
            download_dir: download_dir.into(),
        }
    }

    pub fn add_page(&self, page: FakePage) {
        let mut state = self.state.lock();
        state.pages.insert(page.url.clone(), page);
    }

    /// Switch the rendered page without recording an interaction, as an
    /// automatic redirect would.
    pub fn force_navigate(&self, url: &str) {
        let mut state = self.state.lock();
        if !state.pages.contains_key(url) {
            state.pages.insert(url.to_string(), FakePage::new(url));
        }
        state.current = url.to_string();
    }

    /// Make snapshot and content capture fail from now on.
    pub fn fail_captures(&self, fail: bool) {
        self.state.lock().fail_captures = fail;
    }

    pub fn events(&self) -> Vec<SurfaceEvent> {
        self.state.lock().events.clone()
    }

    pub fn clicks(&self) -> Vec<String> {
        self.state
            .lock()
            .events
            .iter()
            .filter_map(|e| match e {
                SurfaceEvent::Click(target) => Some(target.clone()),
                _ => None,
            })
            .collect()
    }

    /// Value of the first element on `url` matching `locator`.
    pub fn value_on(&self, url: &str, locator: &Locator) -> Option<String> {
        let state = self.state.lock();
        state
            .pages
            .get(url)?
            .elements
            .iter()
            .find(|e| e.matches(locator))
            .map(|e| e.value.clone())
    }

    pub fn is_checked_on(&self, url: &str, locator: &Locator) -> bool {
        let state = self.state.lock();
        state
            .pages
            .get(url)
            .and_then(|p| p.elements.iter().find(|e| e.matches(locator)))
            .map(|e| e.checked)
            .unwrap_or(false)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn with_current<T>(
        &self,
        f: impl FnOnce(&mut State, &str) -> Result<T, ActionError>,
    ) -> Result<T, ActionError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(ActionError::CdpIo("surface closed".into()));
        }
        let current = state.current.clone();
        f(&mut state, &current)
    }
}

fn not_found(locator: &Locator) -> ActionError {
    ActionError::SelectorNotFound(locator.to_string())
}

#[async_trait]
impl Surface for ScriptedSurface {
    async fn goto(&self, url: &str) -> Result<(), ActionError> {
        self.force_navigate(url);
        self.state
            .lock()
            .events
            .push(SurfaceEvent::Goto(url.to_string()));
        Ok(())
    }

    async fn current_identity(&self) -> String {
        self.state.lock().current.clone()
    }

    async fn wait_for_settled(&self) -> Result<(), ActionError> {
        Ok(())
    }

    async fn count(&self, locator: &Locator) -> Result<usize, ActionError> {
        self.with_current(|state, current| {
            Ok(state.pages.get(current).map(|p| p.count(locator)).unwrap_or(0))
        })
    }

    async fn is_visible(&self, locator: &Locator) -> Result<bool, ActionError> {
        self.with_current(|state, current| {
            let page = state.pages.get(current);
            Ok(match locator {
                Locator::Body | Locator::DescriptionValue { .. } => {
                    page.map(|p| p.count(locator) > 0).unwrap_or(false)
                }
                other => page
                    .and_then(|p| p.elements.iter().find(|e| e.matches(other)))
                    .map(|e| e.visible)
                    .unwrap_or(false),
            })
        })
    }

    async fn click(&self, locator: &Locator) -> Result<(), ActionError> {
        let download_dir = self.download_dir.clone();
        self.with_current(|state, current| {
            let page = state
                .pages
                .get_mut(current)
                .ok_or_else(|| not_found(locator))?;
            let element = page.first_mut(locator).ok_or_else(|| not_found(locator))?;
            if !element.visible {
                return Err(ActionError::NotInteractable(locator.to_string()));
            }
            if matches!(element.role, Some(Role::Radio) | Some(Role::Checkbox)) {
                element.checked = true;
            }
            let effect = element.on_click.clone();
            state.events.push(SurfaceEvent::Click(locator.to_string()));
            match effect {
                ClickEffect::None => {}
                ClickEffect::Navigate(url) => {
                    if !state.pages.contains_key(&url) {
                        state.pages.insert(url.clone(), FakePage::new(url.clone()));
                    }
                    state.current = url;
                }
                ClickEffect::Download(filename) => {
                    let path = download_dir.join(filename);
                    std::fs::write(&path, b"%PDF-1.4\n%scripted\n")
                        .map_err(|err| ActionError::DownloadFailed(err.to_string()))?;
                    state.pending_download = Some(path);
                }
            }
            Ok(())
        })
    }

    async fn fill(&self, locator: &Locator, value: &str) -> Result<(), ActionError> {
        self.with_current(|state, current| {
            let element = state
                .pages
                .get_mut(current)
                .and_then(|p| p.first_mut(locator))
                .ok_or_else(|| not_found(locator))?;
            element.value = value.to_string();
            state
                .events
                .push(SurfaceEvent::Fill(locator.to_string(), value.to_string()));
            Ok(())
        })
    }

    async fn check(&self, locator: &Locator) -> Result<(), ActionError> {
        self.with_current(|state, current| {
            let element = state
                .pages
                .get_mut(current)
                .and_then(|p| p.first_mut(locator))
                .ok_or_else(|| not_found(locator))?;
            element.checked = true;
            state.events.push(SurfaceEvent::Check(locator.to_string()));
            Ok(())
        })
    }

    async fn inner_text(&self, locator: &Locator) -> Result<String, ActionError> {
        self.with_current(|state, current| {
            let page = state.pages.get(current).ok_or_else(|| not_found(locator))?;
            match locator {
                Locator::Body => Ok(page.body_text.clone()),
                Locator::DescriptionValue { term } => page
                    .definition(term)
                    .map(str::to_string)
                    .ok_or_else(|| not_found(locator)),
                other => page
                    .elements
                    .iter()
                    .find(|e| e.matches(other))
                    .map(|e| e.name.clone())
                    .ok_or_else(|| not_found(locator)),
            }
        })
    }

    async fn capture_snapshot(&self) -> Result<Vec<u8>, ActionError> {
        let mut state = self.state.lock();
        if state.fail_captures {
            return Err(ActionError::CdpIo("snapshot unavailable".into()));
        }
        state.events.push(SurfaceEvent::Snapshot);
        Ok(b"\x89PNG scripted".to_vec())
    }

    async fn capture_content(&self) -> Result<String, ActionError> {
        let mut state = self.state.lock();
        if state.fail_captures {
            return Err(ActionError::CdpIo("content unavailable".into()));
        }
        state.events.push(SurfaceEvent::Content);
        let current = state.current.clone();
        let page = state.pages.get(&current).cloned().unwrap_or_default();
        let mut html = format!("<html><!-- {} --><body>", page.url);
        for element in &page.elements {
            let role = element.role.map(Role::as_str).unwrap_or("generic");
            html.push_str(&format!("<div role=\"{role}\">{}</div>", element.name));
        }
        html.push_str("</body></html>");
        Ok(html)
    }

    async fn await_download_artifact(&self, timeout: Duration) -> Result<PathBuf, ActionError> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if let Some(path) = self.state.lock().pending_download.take() {
                return Ok(path);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(ActionError::DownloadFailed(format!(
                    "no download within {}ms",
                    timeout.as_millis()
                )));
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    async fn close(&self) -> Result<(), ActionError> {
        self.state.lock().closed = true;
        Ok(())
    }
}
