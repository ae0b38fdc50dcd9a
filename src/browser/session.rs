use crate::core::{BrowserTrait, Config, SessionTrait};
use crate::errors::{FormAgentError, Result};
use crate::form::{AtsPlatform, CandidateCatalog, FormRunner};
use crate::types::{ApplicationReport, ApplicationRequest};
use async_trait::async_trait;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::navigation::{NavigationManager, NavigationResult};
use super::page::ScriptedPage;

/// One browser, one tab, one application at a time.
pub struct ApplicationSession<B: BrowserTrait> {
    browser: B,
    tab: Option<B::TabHandle>,
    config: Config,
    catalog: CandidateCatalog,
    session_id: String,
}

impl<B: BrowserTrait> ApplicationSession<B> {
    pub async fn new(mut browser: B, config: Config) -> Result<Self> {
        browser.launch(&config).await?;
        let tab = browser.new_tab().await?;
        let session_id = uuid::Uuid::new_v4().to_string();
        info!("Session {} launched (headless: {})", session_id, config.browser.headless);

        Ok(Self {
            browser,
            tab: Some(tab),
            config,
            catalog: CandidateCatalog::default(),
            session_id,
        })
    }

    /// Candidate overrides applied to every application in this session.
    pub fn with_catalog(mut self, catalog: CandidateCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    fn tab(&self) -> Result<&B::TabHandle> {
        self.tab.as_ref().ok_or(FormAgentError::NoActiveTab)
    }

    /// Navigate, wait for the load, then give client-side forms time to render.
    /// A load that outlasts the timeout is logged and the page is used as-is.
    pub async fn navigate(&self, url: &str) -> Result<Option<NavigationResult>> {
        let tab = self.tab()?;
        info!("Opening {} ({})", url, AtsPlatform::detect(url));

        self.browser.navigate(tab, url).await?;

        let loaded = match NavigationManager::wait_for_load(
            &self.browser,
            tab,
            self.config.session.navigation_timeout_ms,
        )
        .await
        {
            Ok(result) => {
                info!("Loaded {} in {}ms", result.url, result.duration_ms);
                Some(result)
            }
            Err(FormAgentError::NavigationTimeout(ms)) => {
                warn!("Page did not finish loading within {}ms; continuing", ms);
                None
            }
            Err(e) => return Err(e),
        };

        tokio::time::sleep(Duration::from_millis(self.config.session.post_load_pause_ms)).await;
        Ok(loaded)
    }
}

#[async_trait]
impl<B: BrowserTrait> SessionTrait<B> for ApplicationSession<B> {
    async fn new(browser: B, config: Config) -> Result<Self> {
        Self::new(browser, config).await
    }

    async fn open(&mut self, url: &str) -> Result<()> {
        self.navigate(url).await?;
        Ok(())
    }

    async fn apply(&mut self, request: &ApplicationRequest) -> Result<ApplicationReport> {
        self.navigate(&request.url).await?;

        let tab = self.tab()?;
        let page = ScriptedPage::new(&self.browser, tab)
            .with_script_timeout(self.config.browser.timeout_ms)
            .with_frame_upload(self.browser.capabilities().supports_frame_upload);
        let runner = FormRunner::new(&page, &self.config).with_catalog(self.catalog.clone());

        Ok(runner.run(&self.session_id, request).await)
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        let tab = self.tab()?;
        self.browser.take_screenshot(tab).await
    }

    async fn current_url(&self) -> Result<String> {
        let tab = self.tab()?;
        self.browser.get_url(tab).await
    }

    async fn close(&mut self) -> Result<()> {
        self.tab = None;
        self.browser.close().await?;
        info!("Session {} closed", self.session_id);
        Ok(())
    }
}

/// Run every request in its own browser on its own task. Results come back in request order.
pub async fn run_isolated<B, F>(
    requests: Vec<ApplicationRequest>,
    config: Config,
    make_browser: F,
) -> Vec<Result<ApplicationReport>>
where
    B: BrowserTrait + 'static,
    B::TabHandle: 'static,
    F: Fn() -> B,
{
    let mut tasks = JoinSet::new();

    for (index, request) in requests.iter().cloned().enumerate() {
        let browser = make_browser();
        let config = config.clone();
        tasks.spawn(async move {
            let result = async {
                let mut session = ApplicationSession::new(browser, config).await?;
                let report = session.apply(&request).await;
                if let Err(e) = session.close().await {
                    warn!("Closing session for {} failed: {}", request.url, e);
                }
                report
            }
            .await;
            (index, result)
        });
    }

    let mut results: Vec<Option<Result<ApplicationReport>>> =
        requests.iter().map(|_| None).collect();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => results[index] = Some(result),
            Err(e) => warn!("Session task aborted: {}", e),
        }
    }

    results
        .into_iter()
        .zip(requests.iter())
        .map(|(result, request)| {
            result.unwrap_or_else(|| {
                Err(FormAgentError::LaunchFailed(format!(
                    "session task for {} did not complete",
                    request.url
                )))
            })
        })
        .collect()
}

#[cfg(feature = "chrome")]
impl ApplicationSession<crate::browser::ChromeBrowser> {
    /// Launch Chrome with the given config.
    pub async fn with_config(config: Config) -> Result<Self> {
        let browser = crate::browser::ChromeBrowser::new();
        Self::new(browser, config).await
    }
}
