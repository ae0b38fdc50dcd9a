use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormAgentError {
    #[error("Browser launch failed: {0}")]
    LaunchFailed(String),

    #[error("Browser not launched")]
    BrowserNotLaunched,

    #[error("Tab creation failed: {0}")]
    TabCreationFailed(String),

    #[error("No active tab")]
    NoActiveTab,

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Navigation timeout after {0}ms")]
    NavigationTimeout(u64),

    #[error("JavaScript execution failed: {0}")]
    JavaScriptFailed(String),

    #[error("JavaScript execution timeout")]
    JavaScriptTimeout,

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Stale element handle: {0}")]
    StaleElement(String),

    #[error("Invalid selector: {0}")]
    InvalidSelector(String),

    #[error("No visible control for field '{0}'")]
    FieldNotFound(String),

    #[error("Widget adapter '{adapter}' failed: {reason}")]
    AdapterError { adapter: String, reason: String },

    #[error("No usable submit control")]
    SubmitControlNotFound,

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chrome error: {0}")]
    ChromeError(String),

    #[error("Anyhow error: {0}")]
    AnyhowError(String),
}

pub type Result<T> = std::result::Result<T, FormAgentError>;

// Convert anyhow::Error to FormAgentError
impl From<anyhow::Error> for FormAgentError {
    fn from(err: anyhow::Error) -> Self {
        FormAgentError::AnyhowError(err.to_string())
    }
}

impl FormAgentError {
    pub fn adapter(adapter: &str, reason: impl Into<String>) -> Self {
        FormAgentError::AdapterError {
            adapter: adapter.to_string(),
            reason: reason.into(),
        }
    }

    /// Resource-level faults are the only ones allowed to end a session.
    pub fn is_resource_fault(&self) -> bool {
        matches!(
            self,
            FormAgentError::LaunchFailed(_)
                | FormAgentError::BrowserNotLaunched
                | FormAgentError::TabCreationFailed(_)
                | FormAgentError::NoActiveTab
                | FormAgentError::NavigationFailed(_)
                | FormAgentError::ChromeError(_)
        )
    }
}
