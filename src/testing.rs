//! In-memory [`PageDriver`] for exercising the engine without a browser.
//!
//! [`MockPage`] parses HTML with `scraper` into a flat arena of element nodes and keeps form state
//! (values, checked flags, selections, attached files) beside it. select2 and flatpickr are
//! simulated: the select2 change hook only works when jQuery is enabled, the calendar API only
//! when the date API is enabled. Submit clicks can navigate, replace the document, or do nothing.

use crate::core::{DomEvent, PageDriver, SearchRoot, SettleSignal};
use crate::dom::{ElementHandle, ElementProfile, OptionInfo, PageTextProcessor};
use crate::errors::{FormAgentError, Result};
use crate::form::{CandidateQuery, Locator, TagScope};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

static ANY_ELEMENT: Lazy<Selector> = Lazy::new(|| Selector::parse("*").expect("static selector"));
static OPTION: Lazy<Selector> = Lazy::new(|| Selector::parse("option").expect("static selector"));

const CALENDAR_DAY: &str = "2025-01-01";

#[derive(Debug, Clone)]
struct Node {
    handle: ElementHandle,
    doc: usize,
    /// Position among the document's elements, in `select("*")` order.
    pos: usize,
    tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    parent: Option<usize>,
    form: Option<usize>,
    label: Option<String>,
    hidden: bool,
    value: String,
    checked: bool,
    files: Vec<String>,
    options: Vec<OptionInfo>,
}

impl Node {
    fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|c| c.split_whitespace().any(|x| x == class))
            .unwrap_or(false)
    }

    fn key(&self) -> String {
        self.attr("name")
            .or_else(|| self.attr("id"))
            .map(|s| s.to_string())
            .unwrap_or_else(|| self.handle.to_string())
    }

    fn is_enhanced(&self) -> bool {
        self.tag == "select"
            && (self.has_class("select2-hidden-accessible")
                || self.attr("data-select2-id").is_some())
    }

    fn has_date_widget(&self) -> bool {
        let class = self.attr("class").unwrap_or_default();
        class.contains("flatpickr-input")
            || class.contains("datepicker")
            || class.contains("hasDatepicker")
    }

    fn input_type(&self) -> &str {
        self.attr("type").unwrap_or("text")
    }
}

#[derive(Debug, Clone)]
struct Doc {
    /// Page url for the top document, `src` for frames.
    location: String,
    html: String,
}

#[derive(Debug, Clone)]
enum SubmitEffect {
    Navigate { url: String, html: String },
    Replace { html: String },
}

#[derive(Debug)]
struct State {
    docs: Vec<Doc>,
    nodes: Vec<Node>,
    generation: usize,
    badges: HashMap<usize, Vec<String>>,
    events: Vec<String>,
    pending: Option<SettleSignal>,
    jquery: bool,
    date_api: bool,
    calendar: bool,
    locked_values: bool,
    on_submit: Option<SubmitEffect>,
    reveals: Vec<(String, String)>,
}

pub struct MockPage {
    state: Mutex<State>,
}

impl MockPage {
    pub fn new(html: &str) -> Self {
        let mut state = State {
            docs: vec![Doc {
                location: "https://example.test/apply".to_string(),
                html: html.to_string(),
            }],
            nodes: Vec::new(),
            generation: 0,
            badges: HashMap::new(),
            events: Vec::new(),
            pending: None,
            jquery: true,
            date_api: true,
            calendar: true,
            locked_values: false,
            on_submit: None,
            reveals: Vec::new(),
        };
        state.rebuild();
        Self {
            state: Mutex::new(state),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn state_mut(&mut self) -> &mut State {
        self.state.get_mut().unwrap_or_else(|e| e.into_inner())
    }

    /// Add an inline frame with the given `src`.
    pub fn with_frame(mut self, src: &str, html: &str) -> Self {
        let state = self.state_mut();
        state.docs.push(Doc {
            location: src.to_string(),
            html: html.to_string(),
        });
        state.rebuild();
        self
    }

    /// Whether `jQuery(el).trigger('change.select2')` is available.
    pub fn with_jquery(mut self, enabled: bool) -> Self {
        self.state_mut().jquery = enabled;
        self
    }

    /// Whether date inputs expose `_flatpickr.setDate`.
    pub fn with_date_api(mut self, enabled: bool) -> Self {
        self.state_mut().date_api = enabled;
        self
    }

    /// Whether clicking a date input opens a calendar with a selectable day.
    pub fn with_calendar(mut self, enabled: bool) -> Self {
        self.state_mut().calendar = enabled;
        self
    }

    /// Direct value writes are reverted by the page's scripts.
    pub fn with_locked_values(mut self, locked: bool) -> Self {
        self.state_mut().locked_values = locked;
        self
    }

    pub fn navigate_on_submit(mut self, url: &str, html: &str) -> Self {
        self.state_mut().on_submit = Some(SubmitEffect::Navigate {
            url: url.to_string(),
            html: html.to_string(),
        });
        self
    }

    /// Submitting re-renders the document in place (client-side validation).
    pub fn error_on_submit(mut self, html: &str) -> Self {
        self.state_mut().on_submit = Some(SubmitEffect::Replace {
            html: html.to_string(),
        });
        self
    }

    /// Clicking the element with id `trigger` un-hides the element with id `target`.
    pub fn reveal_on_click(mut self, trigger: &str, target: &str) -> Self {
        self.state_mut()
            .reveals
            .push((trigger.to_string(), target.to_string()));
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Current value of the element whose `name` or `id` is `key`.
    pub fn value_of(&self, key: &str) -> Option<String> {
        let state = self.lock();
        state.find_by_key(key).map(|i| state.nodes[i].value.clone())
    }

    pub fn value_by_placeholder(&self, placeholder: &str) -> Option<String> {
        let state = self.lock();
        state
            .nodes
            .iter()
            .find(|n| n.attr("placeholder") == Some(placeholder))
            .map(|n| n.value.clone())
    }

    pub fn checked_of(&self, key: &str) -> Option<bool> {
        let state = self.lock();
        state.find_by_key(key).map(|i| state.nodes[i].checked)
    }

    pub fn selected_labels(&self, key: &str) -> Vec<String> {
        let state = self.lock();
        state
            .find_by_key(key)
            .map(|i| {
                state.nodes[i]
                    .options
                    .iter()
                    .filter(|o| o.selected)
                    .map(|o| o.label.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn badges(&self, key: &str) -> Vec<String> {
        let state = self.lock();
        state
            .find_by_key(key)
            .and_then(|i| state.badges.get(&i).cloned())
            .unwrap_or_default()
    }

    pub fn files_of(&self, key: &str) -> Vec<String> {
        let state = self.lock();
        state
            .find_by_key(key)
            .map(|i| state.nodes[i].files.clone())
            .unwrap_or_default()
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_hidden_markup(el: &ElementRef) -> bool {
    let value = el.value();
    let style = value
        .attr("style")
        .map(|s| s.to_lowercase().replace(' ', ""))
        .unwrap_or_default();
    value.attr("hidden").is_some()
        || style.contains("display:none")
        || style.contains("visibility:hidden")
}

impl State {
    fn rebuild(&mut self) {
        self.generation += 1;
        self.nodes.clear();
        self.badges.clear();


        for (doc_index, doc) in self.docs.iter().enumerate() {
            let html = Html::parse_document(&doc.html);
            let mut index = HashMap::new();
            let mut labels_for: HashMap<String, String> = HashMap::new();

            for el in html.select(&ANY_ELEMENT) {
                if el.value().name() == "label" {
                    if let Some(target) = el.value().attr("for") {
                        let text = normalize(&el.text().collect::<String>());
                        labels_for.insert(target.to_string(), text);
                    }
                }
            }

            for (pos, el) in html.select(&ANY_ELEMENT).enumerate() {
                let tag = el.value().name().to_lowercase();
                if matches!(tag.as_str(), "html" | "head" | "body") {
                    continue;
                }
                let arena_index = self.nodes.len();
                index.insert(el.id(), arena_index);

                let ancestors: Vec<usize> = el
                    .ancestors()
                    .filter_map(ElementRef::wrap)
                    .filter_map(|a| index.get(&a.id()).copied())
                    .collect();
                let parent = ancestors.first().copied();
                let form = ancestors
                    .iter()
                    .copied()
                    .find(|&i| self.nodes[i].tag == "form");
                let wrapping_label = ancestors
                    .iter()
                    .copied()
                    .find(|&i| self.nodes[i].tag == "label")
                    .and_then(|i| self.nodes[i].text.clone());

                let attrs: Vec<(String, String)> = el
                    .value()
                    .attrs()
                    .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                    .collect();
                let element_id = el.value().attr("id").map(|s| s.to_string());
                let label = element_id
                    .as_ref()
                    .and_then(|id| labels_for.get(id).cloned())
                    .or(wrapping_label);

                let is_control = matches!(tag.as_str(), "input" | "select" | "textarea");
                let text = if is_control {
                    None
                } else {
                    Some(normalize(&el.text().collect::<String>())).filter(|t| !t.is_empty())
                };

                let value = match tag.as_str() {
                    "textarea" => el.text().collect::<String>(),
                    "input" => el.value().attr("value").unwrap_or_default().to_string(),
                    _ => String::new(),
                };

                let options = if tag == "select" {
                    el.select(&OPTION)
                        .map(|o| {
                            let label = normalize(&o.text().collect::<String>());
                            OptionInfo {
                                value: o
                                    .value()
                                    .attr("value")
                                    .map(|v| v.to_string())
                                    .unwrap_or_else(|| label.clone()),
                                label,
                                selected: o.value().attr("selected").is_some(),
                            }
                        })
                        .collect()
                } else {
                    Vec::new()
                };

                self.nodes.push(Node {
                    handle: ElementHandle::new(format!("mock-{}-{}", self.generation, arena_index)),
                    doc: doc_index,
                    pos,
                    tag,
                    checked: el.value().attr("checked").is_some(),
                    attrs,
                    text,
                    parent,
                    form,
                    label,
                    hidden: is_hidden_markup(&el),
                    value,
                    files: Vec::new(),
                    options,
                });
            }
        }

        for i in 0..self.nodes.len() {
            if self.nodes[i].is_enhanced() {
                let selected = selected_option_labels(&self.nodes[i]);
                self.badges.insert(i, selected);
            }
        }
    }

    fn find_by_key(&self, key: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.attr("name") == Some(key) || n.attr("id") == Some(key))
    }

    fn resolve(&self, handle: &ElementHandle) -> Result<usize> {
        let stale = || FormAgentError::StaleElement(handle.to_string());
        let mut parts = handle.as_str().strip_prefix("mock-").ok_or_else(stale)?.split('-');
        let generation: usize = parts.next().and_then(|g| g.parse().ok()).ok_or_else(stale)?;
        let index: usize = parts.next().and_then(|i| i.parse().ok()).ok_or_else(stale)?;
        if generation != self.generation || index >= self.nodes.len() {
            return Err(stale());
        }
        Ok(index)
    }

    fn doc_for(&self, root: &SearchRoot) -> Result<usize> {
        match root {
            SearchRoot::Page => Ok(0),
            SearchRoot::Frame { hint } => self
                .docs
                .iter()
                .enumerate()
                .skip(1)
                .find(|(_, d)| d.location.contains(hint.as_str()))
                .map(|(i, _)| i)
                .ok_or_else(|| FormAgentError::ElementNotFound(format!("frame {}", hint))),
        }
    }

    fn is_visible(&self, index: usize) -> bool {
        let node = &self.nodes[index];
        if node.tag == "input" && node.input_type().eq_ignore_ascii_case("hidden") {
            return false;
        }
        // select2 hides the native select it renders over.
        if node.hidden && !node.is_enhanced() {
            return false;
        }
        let mut current = node.parent;
        while let Some(i) = current {
            if self.nodes[i].hidden {
                return false;
            }
            current = self.nodes[i].parent;
        }
        true
    }

    fn profile(&self, index: usize) -> ElementProfile {
        let node = &self.nodes[index];
        let mut profile = node
            .attrs
            .iter()
            .fold(ElementProfile::new(node.tag.clone()), |p, (k, v)| {
                p.with_attribute(k, v)
            });
        if let Some(label) = &node.label {
            profile = profile.with_label(label.clone());
        }
        if let Some(text) = &node.text {
            profile = profile.with_text_content(text.clone());
        }
        profile.value = node.value.clone();
        profile.is_visible = self.is_visible(index);
        profile.is_checked = node.checked;
        profile.is_enhanced_select = node.is_enhanced();
        profile.has_date_widget = node.has_date_widget();
        profile.file_count = node.files.len();
        profile.has_form_owner = node.form.is_some();
        profile
    }

    fn css_matches(&self, doc: usize, css: &str) -> Result<HashSet<usize>> {
        let selector =
            Selector::parse(css).map_err(|_| FormAgentError::InvalidSelector(css.to_string()))?;
        let html = Html::parse_document(&self.docs[doc].html);
        Ok(html
            .select(&ANY_ELEMENT)
            .enumerate()
            .filter(|(_, el)| selector.matches(el))
            .map(|(pos, _)| pos)
            .collect())
    }

    fn log(&mut self, event: &str, index: usize) {
        let key = self.nodes[index].key();
        self.events.push(format!("{}:{}", event, key));
    }

    fn refresh_badges(&mut self, index: usize) {
        let selected = selected_option_labels(&self.nodes[index]);
        self.badges.insert(index, selected);
    }

    fn click(&mut self, index: usize) {
        self.log("click", index);

        let id = self.nodes[index].attr("id").map(|s| s.to_string());
        if let Some(id) = id {
            let targets: Vec<String> = self
                .reveals
                .iter()
                .filter(|(trigger, _)| *trigger == id)
                .map(|(_, target)| target.clone())
                .collect();
            if !targets.is_empty() {
                for target in targets {
                    if let Some(t) = self.find_by_key(&target) {
                        self.nodes[t].hidden = false;
                    }
                }
                return;
            }
        }

        let profile = self.profile(index);
        if !TagScope::Button.admits(&profile) {
            return;
        }
        match self.on_submit.clone() {
            Some(SubmitEffect::Navigate { url, html }) => {
                self.docs = vec![Doc {
                    location: url,
                    html,
                }];
                self.rebuild();
                self.pending = Some(SettleSignal::Navigated);
            }
            Some(SubmitEffect::Replace { html }) => {
                let doc = self.nodes[index].doc;
                self.docs[doc].html = html;
                self.rebuild();
                self.pending = Some(SettleSignal::Settled);
            }
            None => {}
        }
    }
}

fn selected_option_labels(node: &Node) -> Vec<String> {
    node.options
        .iter()
        .filter(|o| o.selected)
        .map(|o| o.label.clone())
        .collect()
}

#[async_trait]
impl PageDriver for MockPage {
    async fn query(&self, root: &SearchRoot, query: &CandidateQuery) -> Result<Vec<ElementHandle>> {
        let state = self.lock();
        let doc = state.doc_for(root)?;
        let css = match &query.locator {
            Locator::Css(css) => Some(state.css_matches(doc, css)?),
            _ => None,
        };

        Ok(state
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.doc == doc)
            .filter(|(_, n)| css.as_ref().map(|set| set.contains(&n.pos)).unwrap_or(true))
            .filter(|(i, _)| query.accepts(&state.profile(*i)))
            .map(|(_, n)| n.handle.clone())
            .collect())
    }

    async fn inspect(&self, element: &ElementHandle) -> Result<ElementProfile> {
        let state = self.lock();
        let index = state.resolve(element)?;
        Ok(state.profile(index))
    }

    async fn set_text(&self, element: &ElementHandle, text: &str) -> Result<()> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if !state.locked_values {
            state.nodes[index].value = text.to_string();
        }
        Ok(())
    }

    async fn read_value(&self, element: &ElementHandle) -> Result<String> {
        let state = self.lock();
        let index = state.resolve(element)?;
        Ok(state.nodes[index].value.clone())
    }

    async fn select_options(
        &self,
        element: &ElementHandle,
        wanted: &[String],
    ) -> Result<Vec<OptionInfo>> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        let node = &mut state.nodes[index];
        if node.tag != "select" {
            return Err(FormAgentError::JavaScriptFailed("not a select".to_string()));
        }

        if node.attr("multiple").is_some() {
            for option in node.options.iter_mut() {
                if wanted.iter().any(|w| option.matches(w)) {
                    option.selected = true;
                }
            }
        } else if let Some(first) = node
            .options
            .iter()
            .position(|o| wanted.iter().any(|w| o.matches(w)))
        {
            for (i, option) in node.options.iter_mut().enumerate() {
                option.selected = i == first;
            }
        }
        Ok(node.options.clone())
    }

    async fn options(&self, element: &ElementHandle) -> Result<Vec<OptionInfo>> {
        let state = self.lock();
        let index = state.resolve(element)?;
        Ok(state.nodes[index].options.clone())
    }

    async fn dispatch(&self, element: &ElementHandle, event: DomEvent) -> Result<()> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if event == DomEvent::FrameworkChange {
            if !state.jquery {
                return Err(FormAgentError::JavaScriptFailed(
                    "jQuery is not defined".to_string(),
                ));
            }
            if state.nodes[index].is_enhanced() {
                state.refresh_badges(index);
            }
        }
        state.log(event.as_str(), index);
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        state.click(index);
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.lock().events.push(format!("key:{}", key));
        Ok(())
    }

    async fn set_input_files(&self, element: &ElementHandle, files: &[PathBuf]) -> Result<()> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if state.nodes[index].input_type() != "file" {
            return Err(FormAgentError::JavaScriptFailed("not a file input".to_string()));
        }
        state.nodes[index].files = files.iter().map(|f| f.display().to_string()).collect();
        state.log("files", index);
        Ok(())
    }

    async fn set_checked(&self, element: &ElementHandle, checked: bool) -> Result<()> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if state.nodes[index].checked != checked {
            state.nodes[index].checked = checked;
            state.log(if checked { "check" } else { "uncheck" }, index);
        }
        Ok(())
    }

    async fn checkbox_scope(
        &self,
        root: &SearchRoot,
        element: &ElementHandle,
    ) -> Result<Vec<ElementHandle>> {
        let state = self.lock();
        let index = state.resolve(element)?;
        let doc = state.doc_for(root)?;
        let form = state.nodes[index].form;

        Ok(state
            .nodes
            .iter()
            .filter(|n| n.doc == doc && n.tag == "input" && n.input_type() == "checkbox")
            .filter(|n| form.is_none() || n.form == form)
            .map(|n| n.handle.clone())
            .collect())
    }

    async fn enhanced_badges(&self, element: &ElementHandle) -> Result<Vec<String>> {
        let state = self.lock();
        let index = state.resolve(element)?;
        Ok(state.badges.get(&index).cloned().unwrap_or_default())
    }

    async fn enhanced_pick(&self, element: &ElementHandle, label: &str) -> Result<bool> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if !state.nodes[index].is_enhanced() {
            return Ok(false);
        }
        let Some(option) = state.nodes[index]
            .options
            .iter_mut()
            .find(|o| o.label.trim().eq_ignore_ascii_case(label.trim()))
        else {
            return Ok(false);
        };
        option.selected = true;
        state.refresh_badges(index);
        state.log(&format!("pick:{}", label), index);
        Ok(true)
    }

    async fn call_date_setter(&self, element: &ElementHandle, value: &str) -> Result<bool> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if !state.date_api || !state.nodes[index].has_date_widget() {
            return Ok(false);
        }
        state.nodes[index].value = value.to_string();
        state.log("setDate", index);
        Ok(true)
    }

    async fn force_value(&self, element: &ElementHandle, value: &str) -> Result<()> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        state.nodes[index].attrs.retain(|(k, _)| k != "readonly");
        if !state.locked_values {
            state.nodes[index].value = value.to_string();
        }
        Ok(())
    }

    async fn pick_calendar_day(&self, element: &ElementHandle) -> Result<bool> {
        let mut state = self.lock();
        let index = state.resolve(element)?;
        if !state.calendar || !state.nodes[index].has_date_widget() {
            return Ok(false);
        }
        state.nodes[index].value = CALENDAR_DAY.to_string();
        state.log("day", index);
        Ok(true)
    }

    async fn frame_sources(&self) -> Result<Vec<String>> {
        let state = self.lock();
        Ok(state.docs.iter().skip(1).map(|d| d.location.clone()).collect())
    }

    async fn page_text(&self, root: &SearchRoot) -> Result<String> {
        let html = self.page_html(root).await?;
        Ok(PageTextProcessor::new(&[]).visible_text(&html))
    }

    async fn page_html(&self, root: &SearchRoot) -> Result<String> {
        let state = self.lock();
        let doc = state.doc_for(root)?;
        Ok(state.docs[doc].html.clone())
    }

    async fn wait_for_settle(&self, timeout_ms: u64) -> Result<SettleSignal> {
        let pending = self.lock().pending.take();
        match pending {
            Some(signal) => Ok(signal),
            None => {
                tokio::time::sleep(Duration::from_millis(timeout_ms)).await;
                Ok(SettleSignal::TimedOut)
            }
        }
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let generation = self.lock().generation as u8;
        Ok(vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, generation])
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.lock().docs[0].location.clone())
    }
}

pub struct TestHelper;

impl TestHelper {
    /// Smallest form containing one element that satisfies `query`.
    pub fn fixture_for(query: &CandidateQuery) -> String {
        let (tag, mut base) = match query.scope {
            TagScope::TextEntry | TagScope::Control => ("input", String::new()),
            TagScope::TextArea => ("textarea", String::new()),
            TagScope::Select => ("select", String::new()),
            TagScope::File => ("input", r#" type="file""#.to_string()),
            TagScope::Checkbox => ("input", r#" type="checkbox""#.to_string()),
            TagScope::Button => ("button", r#" type="button""#.to_string()),
        };

        let attr = |k: &str, v: &str| format!(r#" {}="{}""#, k, v.replace('"', "&quot;"));
        let mut label = String::new();
        let mut inner = String::new();

        let attrs = match &query.locator {
            Locator::Name(v) => attr("name", v),
            Locator::NameContains(v) => attr("name", &format!("applicant_{}", v)),
            Locator::Id(v) => attr("id", v),
            Locator::IdContains(v) => attr("id", &format!("applicant-{}", v)),
            Locator::Placeholder(v) => attr("placeholder", v),
            Locator::PlaceholderContains(v) => attr("placeholder", &format!("Your {}", v)),
            Locator::AriaLabelContains(v) => attr("aria-label", &format!("Your {}", v)),
            Locator::InputType(v) => {
                base.clear();
                if tag == "button" {
                    inner = "Go".to_string();
                }
                attr("type", v)
            }
            Locator::LabelContains(v) => {
                label = format!(r#"<label for="fixture-field">{}</label>"#, v);
                attr("id", "fixture-field")
            }
            Locator::ClassContains(v) => attr("class", v),
            Locator::AttrContains { attr: a, value } => attr(a, value),
            Locator::TextContains(v) => {
                inner = v.clone();
                String::new()
            }
            Locator::AnyInScope | Locator::Css(_) => String::new(),
        };

        if tag == "select" {
            inner = r#"<option value="1">One</option>"#.to_string();
        }

        let element = if tag == "input" {
            format!("<input{}{}>", base, attrs)
        } else {
            format!("<{tag}{}{}>{}</{tag}>", base, attrs, inner, tag = tag)
        };
        format!("<form>{}{}</form>", label, element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_tracks_visibility_and_labels() {
        let page = MockPage::new(
            r#"<div style="display: none"><input name="a"></div>
               <label>Phone <input name="b"></label>
               <label for="c">City</label><input id="c">
               <input type="hidden" name="d">"#,
        );
        let query = CandidateQuery::new(Locator::AnyInScope, TagScope::TextEntry);
        let handles = page.query(&SearchRoot::Page, &query).await.unwrap();
        assert_eq!(handles.len(), 3);

        let a = page.inspect(&handles[0]).await.unwrap();
        let b = page.inspect(&handles[1]).await.unwrap();
        let c = page.inspect(&handles[2]).await.unwrap();
        assert!(!a.is_visible);
        assert_eq!(b.label.as_deref(), Some("Phone"));
        assert_eq!(c.label.as_deref(), Some("City"));
    }

    #[tokio::test]
    async fn test_handles_go_stale_after_navigation() {
        let page = MockPage::new(r#"<button id="go">Submit</button>"#)
            .navigate_on_submit("https://example.test/done", "<p>done</p>");
        let query = CandidateQuery::new(Locator::AnyInScope, TagScope::Button);
        let handles = page.query(&SearchRoot::Page, &query).await.unwrap();
        page.click(&handles[0]).await.unwrap();

        assert!(matches!(
            page.inspect(&handles[0]).await,
            Err(FormAgentError::StaleElement(_))
        ));
        assert_eq!(page.current_url().await.unwrap(), "https://example.test/done");
        assert_eq!(
            page.wait_for_settle(10).await.unwrap(),
            SettleSignal::Navigated
        );
    }

    #[tokio::test]
    async fn test_css_locator_and_invalid_selector() {
        let page = MockPage::new(r#"<input id="one"><input id="two" class="x">"#);
        let query = CandidateQuery::new(Locator::Css("input.x".into()), TagScope::TextEntry);
        let handles = page.query(&SearchRoot::Page, &query).await.unwrap();
        assert_eq!(handles.len(), 1);
        assert_eq!(
            page.inspect(&handles[0]).await.unwrap().element_id.as_deref(),
            Some("two")
        );

        let bad = CandidateQuery::new(Locator::Css("input[".into()), TagScope::TextEntry);
        assert!(matches!(
            page.query(&SearchRoot::Page, &bad).await,
            Err(FormAgentError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_fixture_shapes() {
        let q = CandidateQuery::new(Locator::LabelContains("cv".into()), TagScope::File);
        assert_eq!(
            TestHelper::fixture_for(&q),
            r#"<form><label for="fixture-field">cv</label><input type="file" id="fixture-field"></form>"#
        );
        let q = CandidateQuery::new(Locator::InputType("submit".into()), TagScope::Button);
        assert_eq!(
            TestHelper::fixture_for(&q),
            r#"<form><button type="submit">Go</button></form>"#
        );
    }
}
