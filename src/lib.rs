//! Adaptive filling and submission of third-party job-application forms.
//!
//! The engine resolves each requested field through an ordered list of candidate locators,
//! fills it with the adapter that matches the widget it found, clicks the submit control and
//! classifies what the page shows afterwards. Everything runs against the [`PageDriver`] seam,
//! so the same code drives Chrome ([`ScriptedPage`]) or an in-memory page ([`MockPage`]).

pub mod browser;
pub mod core;
pub mod dom;
pub mod errors;
pub mod form;
pub mod testing;
pub mod types;
pub mod utils;
pub mod widgets;

#[cfg(feature = "chrome")]
pub use browser::ChromeBrowser;
pub use browser::{run_isolated, ApplicationSession, ScriptedPage};
pub use core::{
    BrowserTrait, Config, PageDriver, ProxyConfig, SearchRoot, SessionTrait, SettleSignal,
};
pub use errors::{FormAgentError, Result};
pub use form::{
    CandidateCatalog, FieldIntent, FieldMap, FieldValue, FillReport, FillResult, FormRunner,
    OutcomeClassifier, SubmissionOutcome, SubmitAttempt,
};
pub use testing::MockPage;
pub use types::*;
pub use utils::ScreenshotManager;
pub use widgets::{AdapterRegistry, WidgetAdapter, WidgetKind};
