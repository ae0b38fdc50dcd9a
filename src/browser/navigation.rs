use crate::core::{BrowserTrait, SettleSignal};
use crate::errors::{FormAgentError, Result};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

/// Global set by every scripted page call. A fresh document does not carry it.
pub const DOCUMENT_MARKER: &str = "__formRagentMarker";

const POLL_INTERVAL_MS: u64 = 100;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DocumentProbe {
    url: String,
    marked: bool,
    ready_state: String,
}

impl DocumentProbe {
    fn is_loaded(&self) -> bool {
        self.ready_state == "complete" || self.ready_state == "interactive"
    }
}

pub struct NavigationManager;

impl NavigationManager {
    fn probe_script() -> String {
        format!(
            r#"(function() {{
    return JSON.stringify({{
        url: window.location.href,
        marked: !!window.{marker},
        readyState: document.readyState
    }});
}})()"#,
            marker = DOCUMENT_MARKER
        )
    }

    async fn probe<B: BrowserTrait>(browser: &B, tab: &B::TabHandle) -> Result<DocumentProbe> {
        let reply = browser.execute_script(tab, &Self::probe_script()).await?;
        let raw = reply.as_str().ok_or_else(|| {
            FormAgentError::JavaScriptFailed(format!("unexpected probe reply: {}", reply))
        })?;
        Ok(serde_json::from_str(raw)?)
    }

    /// Poll until the document reports it has loaded.
    pub async fn wait_for_load<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        timeout_ms: u64,
    ) -> Result<NavigationResult> {
        let start_time = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);

        while start_time.elapsed() < timeout {
            // Scripts fail while a navigation swaps documents; keep polling.
            if let Ok(probe) = Self::probe(browser, tab).await {
                if probe.ready_state == "complete" {
                    return Ok(NavigationResult {
                        url: probe.url,
                        ready_state: probe.ready_state,
                        duration_ms: start_time.elapsed().as_millis() as u64,
                    });
                }
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        Err(FormAgentError::NavigationTimeout(timeout_ms))
    }

    /// Poll for a document swap or url change since the last scripted call.
    pub async fn wait_for_settle<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        timeout_ms: u64,
    ) -> Result<SettleSignal> {
        let start_time = Instant::now();
        let timeout = Duration::from_millis(timeout_ms);
        let start_url = browser.get_url(tab).await.unwrap_or_default();

        while start_time.elapsed() < timeout {
            match Self::probe(browser, tab).await {
                Ok(probe) => {
                    let swapped = !probe.marked || probe.url != start_url;
                    if swapped && probe.is_loaded() {
                        debug!(
                            "Navigation to {} settled after {}ms",
                            probe.url,
                            start_time.elapsed().as_millis()
                        );
                        return Ok(SettleSignal::Navigated);
                    }
                }
                Err(e) => debug!("Settle probe failed mid-navigation: {}", e),
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }

        Ok(SettleSignal::TimedOut)
    }
}

#[derive(Debug, Clone)]
pub struct NavigationResult {
    pub url: String,
    pub ready_state: String,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_script_reads_marker() {
        let script = NavigationManager::probe_script();
        assert!(script.contains(&format!("!!window.{}", DOCUMENT_MARKER)));
        assert!(script.contains("JSON.stringify"));
    }

    #[test]
    fn test_probe_parses() {
        let probe: DocumentProbe = serde_json::from_str(
            r#"{"url":"https://jobs.example/thanks","marked":false,"readyState":"interactive"}"#,
        )
        .unwrap();
        assert!(probe.is_loaded());
        assert!(!probe.marked);
    }
}
