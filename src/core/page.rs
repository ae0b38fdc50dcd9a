use crate::dom::{ElementHandle, ElementProfile, OptionInfo};
use crate::errors::Result;
use crate::form::CandidateQuery;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where a search runs: the top-level document or an embedded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchRoot {
    Page,
    /// Inline frame whose source url contains `hint`.
    Frame { hint: String },
}

impl SearchRoot {
    pub fn frame(hint: impl Into<String>) -> Self {
        SearchRoot::Frame { hint: hint.into() }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self, SearchRoot::Frame { .. })
    }
}

impl std::fmt::Display for SearchRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchRoot::Page => f.write_str("page"),
            SearchRoot::Frame { hint } => write!(f, "frame[{}]", hint),
        }
    }
}

/// Synthetic notifications an adapter may fire on an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomEvent {
    Input,
    Change,
    /// Widget library change hook (`change.select2` through jQuery).
    FrameworkChange,
}

impl DomEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomEvent::Input => "input",
            DomEvent::Change => "change",
            DomEvent::FrameworkChange => "change.select2",
        }
    }
}

/// How a post-action wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettleSignal {
    /// The document url changed.
    Navigated,
    /// Same document, loading finished.
    Settled,
    /// The navigation wait gave up.
    TimedOut,
    /// The caller's fixed bound elapsed first.
    BoundElapsed,
}

impl SettleSignal {
    pub fn navigated(&self) -> bool {
        matches!(self, SettleSignal::Navigated)
    }
}

/// DOM control surface the form engine consumes.
///
/// Every element handle is valid only within the page state it was obtained from; a navigation
/// invalidates all of them. Implementations must be object safe so adapters can take
/// `&dyn PageDriver`.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// All elements in `root` accepted by `query`, in document order.
    async fn query(&self, root: &SearchRoot, query: &CandidateQuery) -> Result<Vec<ElementHandle>>;

    async fn inspect(&self, element: &ElementHandle) -> Result<ElementProfile>;

    /// Replace the element's text content as a select-all plus type would.
    async fn set_text(&self, element: &ElementHandle, text: &str) -> Result<()>;

    async fn read_value(&self, element: &ElementHandle) -> Result<String>;

    /// Mark matching options selected, leaving other selections untouched. Returns the options
    /// after the change.
    async fn select_options(
        &self,
        element: &ElementHandle,
        wanted: &[String],
    ) -> Result<Vec<OptionInfo>>;

    async fn options(&self, element: &ElementHandle) -> Result<Vec<OptionInfo>>;

    async fn dispatch(&self, element: &ElementHandle, event: DomEvent) -> Result<()>;

    async fn click(&self, element: &ElementHandle) -> Result<()>;

    /// Press a key on whatever currently has focus.
    async fn press_key(&self, key: &str) -> Result<()>;

    async fn set_input_files(&self, element: &ElementHandle, files: &[PathBuf]) -> Result<()>;

    async fn set_checked(&self, element: &ElementHandle, checked: bool) -> Result<()>;

    /// Checkboxes sharing the element's form, or every checkbox in `root` without one.
    async fn checkbox_scope(
        &self,
        root: &SearchRoot,
        element: &ElementHandle,
    ) -> Result<Vec<ElementHandle>>;

    /// Labels of the selection badges an enhanced select currently renders.
    async fn enhanced_badges(&self, element: &ElementHandle) -> Result<Vec<String>>;

    /// Open the overlay, type `label` into its search box and click the matching result.
    async fn enhanced_pick(&self, element: &ElementHandle, label: &str) -> Result<bool>;

    /// Call the attached calendar widget's own setter. `false` when no widget API is reachable.
    async fn call_date_setter(&self, element: &ElementHandle, value: &str) -> Result<bool>;

    /// Drop `readonly` and write the value straight into the element.
    async fn force_value(&self, element: &ElementHandle, value: &str) -> Result<()>;

    /// Click the first enabled in-month day of an open calendar overlay.
    async fn pick_calendar_day(&self, element: &ElementHandle) -> Result<bool>;

    /// Source urls of every inline frame on the top-level page.
    async fn frame_sources(&self) -> Result<Vec<String>>;

    /// Rendered text of the root's body.
    async fn page_text(&self, root: &SearchRoot) -> Result<String>;

    async fn page_html(&self, root: &SearchRoot) -> Result<String>;

    /// Wait until the page navigates or finishes loading, up to `timeout_ms`.
    async fn wait_for_settle(&self, timeout_ms: u64) -> Result<SettleSignal>;

    async fn screenshot(&self) -> Result<Vec<u8>>;

    async fn current_url(&self) -> Result<String>;
}
