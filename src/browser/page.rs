use crate::browser::navigation::NavigationManager;
use crate::core::{BrowserTrait, DomEvent, PageDriver, SearchRoot, SettleSignal};
use crate::dom::{ElementHandle, ElementProfile, OptionInfo};
use crate::errors::{FormAgentError, Result};
use crate::form::{CandidateQuery, Locator};
use crate::utils::JavaScriptRunner;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Helpers shared by every page script. Handles are `data-fr-id` attributes stamped on first
/// sight; lookups search the top document and every same-origin frame.
const PRELUDE: &str = r#"
window.__formRagentMarker = true;
const __root = (hint) => {
    if (hint === null) return document;
    for (const f of document.querySelectorAll('iframe')) {
        const src = f.getAttribute('src') || f.src || '';
        if (src.includes(hint)) {
            let doc = null;
            try { doc = f.contentDocument; } catch (e) {}
            if (doc) return doc;
            throw new Error('frame not accessible: ' + hint);
        }
    }
    throw new Error('frame not found: ' + hint);
};
const __docs = () => {
    const docs = [document];
    for (const f of document.querySelectorAll('iframe')) {
        try { if (f.contentDocument) docs.push(f.contentDocument); } catch (e) {}
    }
    return docs;
};
const __handle = (el) => {
    let id = el.getAttribute('data-fr-id');
    if (!id) {
        window.__frSeq = (window.__frSeq || 0) + 1;
        id = 'fr-' + window.__frSeq;
        el.setAttribute('data-fr-id', id);
    }
    return id;
};
const __el = (h) => {
    for (const d of __docs()) {
        const el = d.querySelector('[data-fr-id="' + h + '"]');
        if (el) return el;
    }
    throw new Error('stale: ' + h);
};
const __setValue = (el, v) => {
    const desc = Object.getOwnPropertyDescriptor(Object.getPrototypeOf(el), 'value');
    if (desc && desc.set) desc.set.call(el, v); else el.value = v;
};
const __visible = (el) => {
    if (el.classList.contains('select2-hidden-accessible')) return true;
    if ((el.getAttribute('type') || '').toLowerCase() === 'hidden') return false;
    const s = el.ownerDocument.defaultView.getComputedStyle(el);
    if (s.display === 'none' || s.visibility === 'hidden') return false;
    const r = el.getBoundingClientRect();
    return r.width > 0 && r.height > 0;
};
const __label = (el) => {
    if (el.id) {
        const l = el.ownerDocument.querySelector('label[for="' + CSS.escape(el.id) + '"]');
        if (l) return l.textContent.trim();
    }
    const wrap = el.closest('label');
    return wrap ? wrap.textContent.trim() : null;
};
const __options = (el) => Array.from(el.options || []).map(o => ({
    value: o.value, label: o.text.trim(), selected: o.selected
}));
const __profile = (el) => {
    const tag = el.tagName.toLowerCase();
    const attrs = {};
    for (const a of el.attributes) {
        if (a.name !== 'data-fr-id') attrs[a.name.toLowerCase()] = a.value;
    }
    const cls = el.getAttribute('class') || '';
    const control = tag === 'input' || tag === 'select' || tag === 'textarea';
    return {
        tagName: tag,
        inputType: el.getAttribute('type') ? el.getAttribute('type').toLowerCase() : null,
        name: el.getAttribute('name'),
        elementId: el.id || null,
        placeholder: el.getAttribute('placeholder'),
        ariaLabel: el.getAttribute('aria-label'),
        label: __label(el),
        className: cls || null,
        textContent: control ? null : ((el.innerText || el.textContent || '').trim() || null),
        attributes: attrs,
        value: control ? String(el.value == null ? '' : el.value) : '',
        isVisible: __visible(el),
        isDisabled: !!el.disabled,
        isReadonly: !!el.readOnly,
        isMultiple: !!el.multiple,
        isChecked: !!el.checked,
        isEnhancedSelect: tag === 'select' && (el.classList.contains('select2-hidden-accessible') || el.hasAttribute('data-select2-id')),
        hasDateWidget: !!el._flatpickr || /flatpickr-input|datepicker|hasDatepicker/.test(cls),
        fileCount: el.files ? el.files.length : 0,
        hasFormOwner: !!el.form
    };
};
"#;

#[derive(Debug, Deserialize)]
struct Found {
    handle: ElementHandle,
    profile: ElementProfile,
}

/// [`PageDriver`] over a browser tab, driving the DOM through injected scripts.
pub struct ScriptedPage<'a, B: BrowserTrait> {
    browser: &'a B,
    tab: &'a B::TabHandle,
    script_timeout_ms: u64,
    supports_frame_upload: bool,
}

impl<'a, B: BrowserTrait> ScriptedPage<'a, B> {
    pub fn new(browser: &'a B, tab: &'a B::TabHandle) -> Self {
        Self {
            browser,
            tab,
            script_timeout_ms: 10000,
            supports_frame_upload: false,
        }
    }

    pub fn with_script_timeout(mut self, timeout_ms: u64) -> Self {
        self.script_timeout_ms = timeout_ms;
        self
    }

    pub fn with_frame_upload(mut self, supported: bool) -> Self {
        self.supports_frame_upload = supported;
        self
    }

    async fn run(&self, body: &str) -> Result<Value> {
        JavaScriptRunner::call(self.browser, self.tab, PRELUDE, body, self.script_timeout_ms).await
    }

    async fn run_async(&self, body: &str) -> Result<Value> {
        JavaScriptRunner::call_async(self.browser, self.tab, PRELUDE, body, self.script_timeout_ms)
            .await
    }

    fn hint(root: &SearchRoot) -> Result<String> {
        match root {
            SearchRoot::Page => Ok("null".to_string()),
            SearchRoot::Frame { hint } => JavaScriptRunner::literal(hint),
        }
    }

    fn handle(element: &ElementHandle) -> Result<String> {
        JavaScriptRunner::literal(element.as_str())
    }

    fn selector(element: &ElementHandle) -> String {
        format!("[data-fr-id=\"{}\"]", element.as_str())
    }

    /// Elements of the top document can take trusted CDP input; frame content cannot.
    async fn in_top_document(&self, element: &ElementHandle) -> Result<bool> {
        let body = format!(
            "const el = __el({}); el.scrollIntoView({{ block: 'center' }}); return el.ownerDocument === document;",
            Self::handle(element)?
        );
        Ok(self.run(&body).await?.as_bool().unwrap_or(false))
    }

    fn parse<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T> {
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl<'a, B: BrowserTrait> PageDriver for ScriptedPage<'a, B> {
    async fn query(&self, root: &SearchRoot, query: &CandidateQuery) -> Result<Vec<ElementHandle>> {
        let css = match &query.locator {
            Locator::Css(css) => css.as_str(),
            _ => query.scope.css(),
        };
        let body = format!(
            r#"const d = __root({hint});
const css = {css};
let list;
try {{ list = d.querySelectorAll(css); }} catch (e) {{ throw new Error('selector: ' + css); }}
return Array.from(list).map(el => ({{ handle: __handle(el), profile: __profile(el) }}));"#,
            hint = Self::hint(root)?,
            css = JavaScriptRunner::literal(css)?
        );

        let found: Vec<Found> = Self::parse(self.run(&body).await?)?;
        Ok(found
            .into_iter()
            .filter(|f| query.accepts(&f.profile))
            .map(|f| f.handle)
            .collect())
    }

    async fn inspect(&self, element: &ElementHandle) -> Result<ElementProfile> {
        let body = format!("return __profile(__el({}));", Self::handle(element)?);
        Self::parse(self.run(&body).await?)
    }

    async fn set_text(&self, element: &ElementHandle, text: &str) -> Result<()> {
        let body = format!(
            "const el = __el({}); el.focus(); if (el.select) el.select(); __setValue(el, {}); return null;",
            Self::handle(element)?,
            JavaScriptRunner::literal(text)?
        );
        self.run(&body).await?;
        Ok(())
    }

    async fn read_value(&self, element: &ElementHandle) -> Result<String> {
        let body = format!(
            "const el = __el({}); return String(el.value == null ? '' : el.value);",
            Self::handle(element)?
        );
        Ok(self.run(&body).await?.as_str().unwrap_or_default().to_string())
    }

    async fn select_options(
        &self,
        element: &ElementHandle,
        wanted: &[String],
    ) -> Result<Vec<OptionInfo>> {
        let body = format!(
            r#"const el = __el({h});
if (el.tagName.toLowerCase() !== 'select') throw new Error('not a select');
const wanted = {w}.map(w => w.trim());
const hit = (o) => wanted.some(w => o.value === w || o.text.trim().toLowerCase() === w.toLowerCase());
if (el.multiple) {{
    for (const o of el.options) if (hit(o)) o.selected = true;
}} else {{
    const o = Array.from(el.options).find(hit);
    if (o) el.value = o.value;
}}
return __options(el);"#,
            h = Self::handle(element)?,
            w = JavaScriptRunner::literal(wanted)?
        );
        Self::parse(self.run(&body).await?)
    }

    async fn options(&self, element: &ElementHandle) -> Result<Vec<OptionInfo>> {
        let body = format!("return __options(__el({}));", Self::handle(element)?);
        Self::parse(self.run(&body).await?)
    }

    async fn dispatch(&self, element: &ElementHandle, event: DomEvent) -> Result<()> {
        let body = dispatch_script(&Self::handle(element)?, event);
        self.run(&body).await?;
        Ok(())
    }

    async fn click(&self, element: &ElementHandle) -> Result<()> {
        if self.in_top_document(element).await? {
            match self
                .browser
                .click_selector(self.tab, &Self::selector(element))
                .await
            {
                Ok(()) => return Ok(()),
                Err(e) => debug!("Trusted click on {} failed, falling back: {}", element, e),
            }
        }
        let body = format!("__el({}).click(); return null;", Self::handle(element)?);
        self.run(&body).await?;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> Result<()> {
        self.browser.press_key(self.tab, key).await
    }

    async fn set_input_files(&self, element: &ElementHandle, files: &[PathBuf]) -> Result<()> {
        if !self.in_top_document(element).await? && !self.supports_frame_upload {
            return Err(FormAgentError::adapter(
                "file-input",
                "this backend cannot attach files inside frames",
            ));
        }
        self.browser
            .set_input_files(self.tab, &Self::selector(element), files)
            .await
    }

    async fn set_checked(&self, element: &ElementHandle, checked: bool) -> Result<()> {
        let body = format!(
            r#"const el = __el({h});
const want = {c};
if (el.checked !== want) el.click();
if (el.checked !== want) {{
    el.checked = want;
    el.dispatchEvent(new Event('change', {{ bubbles: true }}));
}}
return el.checked;"#,
            h = Self::handle(element)?,
            c = checked
        );
        self.run(&body).await?;
        Ok(())
    }

    async fn checkbox_scope(
        &self,
        root: &SearchRoot,
        element: &ElementHandle,
    ) -> Result<Vec<ElementHandle>> {
        let body = format!(
            r#"const el = __el({h});
const scope = el.form || el.closest('form') || __root({hint});
return Array.from(scope.querySelectorAll('input[type=checkbox]')).map(__handle);"#,
            h = Self::handle(element)?,
            hint = Self::hint(root)?
        );
        Self::parse(self.run(&body).await?)
    }

    async fn enhanced_badges(&self, element: &ElementHandle) -> Result<Vec<String>> {
        let body = format!(
            r#"const el = __el({});
const c = el.nextElementSibling;
if (!c || !c.classList.contains('select2')) return [];
const badges = Array.from(c.querySelectorAll('.select2-selection__choice'))
    .map(b => (b.getAttribute('title') || b.textContent).replace('×', '').trim())
    .filter(t => t.length > 0);
if (badges.length === 0 && !el.multiple) {{
    const r = c.querySelector('.select2-selection__rendered');
    const t = r ? (r.getAttribute('title') || '').trim() : '';
    if (t) badges.push(t);
}}
return badges;"#,
            Self::handle(element)?
        );
        Self::parse(self.run(&body).await?)
    }

    async fn enhanced_pick(&self, element: &ElementHandle, label: &str) -> Result<bool> {
        let body = format!(
            r#"const el = __el({h});
const label = {l};
const c = el.nextElementSibling;
if (!c || !c.classList.contains('select2')) return false;
const d = el.ownerDocument;
const opener = c.querySelector('.select2-selection');
if (!opener) return false;
opener.dispatchEvent(new MouseEvent('mousedown', {{ bubbles: true }}));
opener.click();
await new Promise(r => setTimeout(r, 150));
const search = d.querySelector('.select2-container--open .select2-search__field') || c.querySelector('.select2-search__field');
if (search) {{
    search.focus();
    search.value = label;
    search.dispatchEvent(new Event('input', {{ bubbles: true }}));
    search.dispatchEvent(new KeyboardEvent('keyup', {{ bubbles: true }}));
    await new Promise(r => setTimeout(r, 300));
}}
const want = label.trim().toLowerCase();
const hit = Array.from(d.querySelectorAll('.select2-container--open .select2-results__option'))
    .find(o => o.textContent.trim().toLowerCase() === want);
if (!hit) {{
    if (search) search.dispatchEvent(new KeyboardEvent('keydown', {{ key: 'Escape', bubbles: true }}));
    return false;
}}
hit.dispatchEvent(new MouseEvent('mouseup', {{ bubbles: true }}));
return true;"#,
            h = Self::handle(element)?,
            l = JavaScriptRunner::literal(label)?
        );
        Ok(self.run_async(&body).await?.as_bool().unwrap_or(false))
    }

    async fn call_date_setter(&self, element: &ElementHandle, value: &str) -> Result<bool> {
        let body = format!(
            r#"const el = __el({h});
const v = {v};
if (el._flatpickr) {{ el._flatpickr.setDate(v, true); return true; }}
const jq = el.ownerDocument.defaultView.jQuery;
if (jq && jq.fn && jq.fn.datepicker && el.classList.contains('hasDatepicker')) {{
    jq(el).datepicker('setDate', v);
    jq(el).trigger('change');
    return true;
}}
return false;"#,
            h = Self::handle(element)?,
            v = JavaScriptRunner::literal(value)?
        );
        Ok(self.run(&body).await?.as_bool().unwrap_or(false))
    }

    async fn force_value(&self, element: &ElementHandle, value: &str) -> Result<()> {
        let body = format!(
            "const el = __el({}); el.removeAttribute('readonly'); el.readOnly = false; __setValue(el, {}); return null;",
            Self::handle(element)?,
            JavaScriptRunner::literal(value)?
        );
        self.run(&body).await?;
        Ok(())
    }

    async fn pick_calendar_day(&self, element: &ElementHandle) -> Result<bool> {
        let body = format!(
            r#"const d = __el({}).ownerDocument;
const day = d.querySelector(
    '.flatpickr-calendar.open .flatpickr-day:not(.flatpickr-disabled):not(.prevMonthDay):not(.nextMonthDay), ' +
    '#ui-datepicker-div td:not(.ui-datepicker-unselectable) a'
);
if (!day) return false;
day.dispatchEvent(new MouseEvent('mousedown', {{ bubbles: true }}));
day.click();
return true;"#,
            Self::handle(element)?
        );
        Ok(self.run(&body).await?.as_bool().unwrap_or(false))
    }

    async fn frame_sources(&self) -> Result<Vec<String>> {
        let body = "return Array.from(document.querySelectorAll('iframe')).map(f => f.getAttribute('src') || f.src || '');";
        Self::parse(self.run(body).await?)
    }

    async fn page_text(&self, root: &SearchRoot) -> Result<String> {
        let body = format!(
            "const d = __root({}); return d.body ? (d.body.innerText || '') : '';",
            Self::hint(root)?
        );
        Ok(self.run(&body).await?.as_str().unwrap_or_default().to_string())
    }

    async fn page_html(&self, root: &SearchRoot) -> Result<String> {
        let body = format!(
            "return __root({}).documentElement.outerHTML;",
            Self::hint(root)?
        );
        Ok(self.run(&body).await?.as_str().unwrap_or_default().to_string())
    }

    async fn wait_for_settle(&self, timeout_ms: u64) -> Result<SettleSignal> {
        NavigationManager::wait_for_settle(self.browser, self.tab, timeout_ms).await
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        self.browser.take_screenshot(self.tab).await
    }

    async fn current_url(&self) -> Result<String> {
        self.browser.get_url(self.tab).await
    }
}

/// Native events bubble; the framework hook goes through the page's jQuery under its namespace.
fn dispatch_script(handle: &str, event: DomEvent) -> String {
    match event {
        DomEvent::Input | DomEvent::Change => format!(
            "__el({}).dispatchEvent(new Event('{}', {{ bubbles: true }})); return null;",
            handle,
            event.as_str()
        ),
        DomEvent::FrameworkChange => format!(
            r#"const el = __el({});
const w = el.ownerDocument.defaultView;
const jq = w.jQuery || w.$;
if (typeof jq !== 'function') throw new Error('jQuery is not defined');
jq(el).trigger('{}');
return null;"#,
            handle,
            event.as_str()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::navigation::DOCUMENT_MARKER;

    #[test]
    fn test_framework_change_uses_select2_namespace() {
        let script = dispatch_script("\"fr-3\"", DomEvent::FrameworkChange);
        assert!(script.contains("jq(el).trigger('change.select2');"));
        let native = dispatch_script("\"fr-3\"", DomEvent::Change);
        assert!(native.contains("new Event('change'"));
    }

    #[test]
    fn test_prelude_plants_document_marker() {
        assert!(PRELUDE.contains(&format!("window.{} = true", DOCUMENT_MARKER)));
    }

    #[test]
    fn test_found_deserializes_profile() {
        let raw = serde_json::json!({
            "handle": "fr-7",
            "profile": {
                "tagName": "input",
                "inputType": "email",
                "name": "email",
                "elementId": null,
                "label": "E-mail",
                "attributes": { "type": "email", "name": "email" },
                "value": "",
                "isVisible": true,
                "fileCount": 0
            }
        });
        let found: Found = serde_json::from_value(raw).unwrap();
        assert_eq!(found.handle, ElementHandle::new("fr-7"));
        assert_eq!(found.profile.effective_type(), "email");
        assert_eq!(found.profile.label.as_deref(), Some("E-mail"));
        assert!(found.profile.is_interactable());
    }
}
