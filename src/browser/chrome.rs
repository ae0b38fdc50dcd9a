use crate::core::{BrowserCapabilities, BrowserTrait, Config};
use crate::errors::{FormAgentError, Result};
use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions, Tab};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Chrome browser implementation
pub struct ChromeBrowser {
    browser: Option<Browser>,
    capabilities: BrowserCapabilities,
    default_timeout: Duration,
}

impl ChromeBrowser {
    pub fn new() -> Self {
        Self {
            browser: None,
            capabilities: BrowserCapabilities {
                supports_javascript: true,
                supports_screenshots: true,
                supports_file_upload: true,
                supports_frame_upload: false,
            },
            default_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for ChromeBrowser {
    fn default() -> Self {
        Self::new()
    }
}

/// Chrome command-line switches derived from the browser config.
fn launch_args(config: &Config) -> Vec<String> {
    let browser = &config.browser;
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-dev-shm-usage".to_string(),
        format!(
            "--window-size={},{}",
            browser.viewport.width, browser.viewport.height
        ),
    ];

    if let Some(ua) = &browser.user_agent {
        args.push(format!("--user-agent={}", ua));
    }

    if browser.disable_images {
        args.push("--blink-settings=imagesEnabled=false".to_string());
    }

    if browser.ignore_https_errors {
        args.push("--ignore-certificate-errors".to_string());
    }

    if let Some(proxy) = &browser.proxy {
        args.push(format!("--proxy-server={}", proxy.server));
        if !proxy.bypass.is_empty() {
            args.push(format!("--proxy-bypass-list={}", proxy.bypass.join(";")));
        }
    }

    args.extend(browser.args.iter().cloned());
    args
}

#[async_trait]
impl BrowserTrait for ChromeBrowser {
    type TabHandle = Arc<Tab>;

    async fn launch(&mut self, config: &Config) -> Result<()> {
        let args = launch_args(config);
        let args: Vec<&OsStr> = args.iter().map(OsStr::new).collect();

        if let Some(proxy) = &config.browser.proxy {
            if proxy.has_credentials() {
                warn!(
                    "Proxy {} requires credentials; Chrome cannot take them on the command line",
                    proxy.server
                );
            }
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(config.browser.headless)
            .ignore_certificate_errors(config.browser.ignore_https_errors)
            .args(args)
            .build()
            .map_err(|e| FormAgentError::LaunchFailed(e.to_string()))?;

        let browser =
            Browser::new(launch_options).map_err(|e| FormAgentError::LaunchFailed(e.to_string()))?;

        self.default_timeout = Duration::from_millis(config.browser.timeout_ms);
        self.browser = Some(browser);
        Ok(())
    }

    async fn new_tab(&self) -> Result<Self::TabHandle> {
        let browser = self
            .browser
            .as_ref()
            .ok_or(FormAgentError::BrowserNotLaunched)?;

        let tab = browser
            .new_tab()
            .map_err(|e| FormAgentError::TabCreationFailed(e.to_string()))?;
        tab.set_default_timeout(self.default_timeout);

        Ok(tab)
    }

    async fn navigate(&self, tab: &Self::TabHandle, url: &str) -> Result<()> {
        tab.navigate_to(url)
            .map_err(|e| FormAgentError::NavigationFailed(e.to_string()))?;

        tab.wait_until_navigated()
            .map_err(|e| FormAgentError::NavigationFailed(e.to_string()))?;

        Ok(())
    }

    async fn execute_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        let result = tab
            .evaluate(script, false)
            .map_err(|e| FormAgentError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn execute_async_script(&self, tab: &Self::TabHandle, script: &str) -> Result<Value> {
        let result = tab
            .evaluate(script, true)
            .map_err(|e| FormAgentError::JavaScriptFailed(e.to_string()))?;

        Ok(result.value.unwrap_or(Value::Null))
    }

    async fn click_selector(&self, tab: &Self::TabHandle, selector: &str) -> Result<()> {
        let element = tab
            .find_element(selector)
            .map_err(|e| FormAgentError::ElementNotFound(format!("{}: {}", selector, e)))?;
        element
            .click()
            .map_err(|e| FormAgentError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn press_key(&self, tab: &Self::TabHandle, key: &str) -> Result<()> {
        tab.press_key(key)
            .map_err(|e| FormAgentError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn set_input_files(
        &self,
        tab: &Self::TabHandle,
        selector: &str,
        files: &[PathBuf],
    ) -> Result<()> {
        let paths: Vec<String> = files.iter().map(|f| f.display().to_string()).collect();
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        debug!("Attaching {:?} to {}", paths, selector);

        let element = tab
            .find_element(selector)
            .map_err(|e| FormAgentError::ElementNotFound(format!("{}: {}", selector, e)))?;
        element
            .set_input_files(&paths)
            .map_err(|e| FormAgentError::JavaScriptFailed(e.to_string()))?;
        Ok(())
    }

    async fn take_screenshot(&self, tab: &Self::TabHandle) -> Result<Vec<u8>> {
        let screenshot = tab
            .capture_screenshot(
                headless_chrome::protocol::cdp::Page::CaptureScreenshotFormatOption::Png,
                None,
                None,
                true,
            )
            .map_err(|e| FormAgentError::ScreenshotFailed(e.to_string()))?;

        Ok(screenshot)
    }

    async fn get_url(&self, tab: &Self::TabHandle) -> Result<String> {
        Ok(tab.get_url())
    }

    async fn get_title(&self, tab: &Self::TabHandle) -> Result<String> {
        let result = self.execute_script(tab, "document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    fn capabilities(&self) -> BrowserCapabilities {
        self.capabilities.clone()
    }

    fn is_running(&self) -> bool {
        self.browser.is_some()
    }

    async fn close(&mut self) -> Result<()> {
        self.browser = None;
        Ok(())
    }
}
