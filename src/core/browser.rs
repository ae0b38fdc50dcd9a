use crate::errors::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::path::PathBuf;

#[async_trait]
pub trait BrowserTrait: Send + Sync {
    type TabHandle: Send + Sync;

    /// Launch a new browser instance
    async fn launch(&mut self, config: &crate::core::Config) -> Result<()>;

    /// Create a new tab/page
    async fn new_tab(&self) -> Result<Self::TabHandle>;

    /// Navigate to a URL and wait for the load to finish
    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()>;

    /// Execute JavaScript in the browser
    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value>;

    /// Execute JavaScript whose result is a promise, resolving it first
    async fn execute_async_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value>;

    /// Trusted mouse click on the first element matching a CSS selector
    async fn click_selector(&self, tab: &Self::TabHandle, selector: &str) -> Result<()>;

    /// Trusted key press on the focused element
    async fn press_key(&self, tab: &Self::TabHandle, key: &str) -> Result<()>;

    /// Attach files to the `<input type=file>` matching a CSS selector
    async fn set_input_files(
        &self,
        tab: &Self::TabHandle,
        selector: &str,
        files: &[PathBuf],
    ) -> Result<()>;

    /// Take a full-page screenshot
    async fn take_screenshot(&self, tab: &Self::TabHandle) -> Result<Vec<u8>>;

    /// Get current URL
    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String>;

    /// Get page title
    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String>;

    /// What this backend can do
    fn capabilities(&self) -> BrowserCapabilities;

    /// Check if browser is still running
    fn is_running(&self) -> bool;

    /// Close the browser
    async fn close(&mut self) -> Result<()>;
}

/// Browser capabilities that can be queried
#[derive(Debug, Clone)]
pub struct BrowserCapabilities {
    pub supports_javascript: bool,
    pub supports_screenshots: bool,
    pub supports_file_upload: bool,
    /// Files can be attached to inputs inside inline frames.
    pub supports_frame_upload: bool,
}
