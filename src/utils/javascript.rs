use crate::core::BrowserTrait;
use crate::errors::{FormAgentError, Result};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

pub struct JavaScriptRunner;

impl JavaScriptRunner {
    pub async fn execute_with_timeout<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        script: &str,
        timeout_ms: u64,
    ) -> Result<Value> {
        let execution = browser.execute_script(tab, script);

        tokio::time::timeout(Duration::from_millis(timeout_ms), execution)
            .await
            .map_err(|_| FormAgentError::JavaScriptTimeout)?
    }

    /// Run `body` (a function body that may `return`) inside a try/catch that replies with a JSON
    /// string `{"ok": value}` or `{"error": message}`, and unwrap the reply.
    pub async fn call<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        prelude: &str,
        body: &str,
        timeout_ms: u64,
    ) -> Result<Value> {
        let script = Self::envelope(prelude, body);
        let reply = Self::execute_with_timeout(browser, tab, &script, timeout_ms).await?;
        Self::unwrap_reply(reply)
    }

    pub fn envelope(prelude: &str, body: &str) -> String {
        format!(
            r#"(function() {{
    try {{
        {prelude}
        const __result = (function() {{ {body} }})();
        return JSON.stringify({{ ok: __result === undefined ? null : __result }});
    }} catch (e) {{
        return JSON.stringify({{ error: String((e && e.message) || e) }});
    }}
}})()"#,
            prelude = prelude,
            body = body
        )
    }

    /// Like [`call`](Self::call), but `body` may `await` and the reply promise is resolved.
    pub async fn call_async<B: BrowserTrait>(
        browser: &B,
        tab: &B::TabHandle,
        prelude: &str,
        body: &str,
        timeout_ms: u64,
    ) -> Result<Value> {
        let script = Self::async_envelope(prelude, body);
        let execution = browser.execute_async_script(tab, &script);
        let reply = tokio::time::timeout(Duration::from_millis(timeout_ms), execution)
            .await
            .map_err(|_| FormAgentError::JavaScriptTimeout)??;
        Self::unwrap_reply(reply)
    }

    pub fn async_envelope(prelude: &str, body: &str) -> String {
        format!(
            r#"(async function() {{
    try {{
        {prelude}
        const __result = await (async function() {{ {body} }})();
        return JSON.stringify({{ ok: __result === undefined ? null : __result }});
    }} catch (e) {{
        return JSON.stringify({{ error: String((e && e.message) || e) }});
    }}
}})()"#,
            prelude = prelude,
            body = body
        )
    }

    pub fn unwrap_reply(reply: Value) -> Result<Value> {
        let raw = reply.as_str().ok_or_else(|| {
            FormAgentError::JavaScriptFailed(format!("unexpected script reply: {}", reply))
        })?;
        let mut parsed: Value = serde_json::from_str(raw)?;

        if let Some(error) = parsed.get("error").and_then(|e| e.as_str()) {
            return Err(classify_script_error(error));
        }
        Ok(parsed.get_mut("ok").map(Value::take).unwrap_or(Value::Null))
    }

    /// Embed any serializable value as a JS literal.
    pub fn literal<T: Serialize + ?Sized>(value: &T) -> Result<String> {
        Ok(serde_json::to_string(value)?)
    }
}

fn classify_script_error(message: &str) -> FormAgentError {
    if let Some(handle) = message.strip_prefix("stale:") {
        FormAgentError::StaleElement(handle.trim().to_string())
    } else if let Some(selector) = message.strip_prefix("selector:") {
        FormAgentError::InvalidSelector(selector.trim().to_string())
    } else {
        FormAgentError::JavaScriptFailed(message.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unwrap_ok_reply() {
        let value = JavaScriptRunner::unwrap_reply(json!(r#"{"ok":[1,2]}"#)).unwrap();
        assert_eq!(value, json!([1, 2]));
        let null = JavaScriptRunner::unwrap_reply(json!(r#"{"ok":null}"#)).unwrap();
        assert!(null.is_null());
    }

    #[test]
    fn test_unwrap_error_reply_maps_variants() {
        let stale = JavaScriptRunner::unwrap_reply(json!(r#"{"error":"stale: fr-3"}"#));
        assert!(matches!(stale, Err(FormAgentError::StaleElement(h)) if h == "fr-3"));

        let other = JavaScriptRunner::unwrap_reply(json!(r#"{"error":"jQuery is not defined"}"#));
        assert!(matches!(other, Err(FormAgentError::JavaScriptFailed(_))));

        assert!(JavaScriptRunner::unwrap_reply(json!(42)).is_err());
    }

    #[test]
    fn test_literal_escapes_quotes() {
        let literal = JavaScriptRunner::literal(r#"it's "quoted""#).unwrap();
        assert_eq!(literal, r#""it's \"quoted\"""#);
    }

    #[test]
    fn test_envelope_wraps_body() {
        let script = JavaScriptRunner::envelope("const a = 1;", "return a + 1;");
        assert!(script.contains("const a = 1;"));
        assert!(script.contains("return a + 1;"));
        assert!(script.contains("JSON.stringify"));

        let script = JavaScriptRunner::async_envelope("", "return 1;");
        assert!(script.starts_with("(async function()"));
        assert!(script.contains("await (async function()"));
    }
}
