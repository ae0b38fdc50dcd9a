use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::debug;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("static regex"));
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").expect("static selector"));

/// Reads rendered HTML the way a reviewer would: error-styled nodes and plain visible text.
pub struct PageTextProcessor {
    error_selectors: Vec<Selector>,
}

impl PageTextProcessor {
    pub fn new(error_selectors: &[String]) -> Self {
        let error_selectors = error_selectors
            .iter()
            .filter_map(|raw| match Selector::parse(raw) {
                Ok(selector) => Some(selector),
                Err(e) => {
                    debug!("Skipping unparsable error selector {:?}: {:?}", raw, e);
                    None
                }
            })
            .collect();

        Self { error_selectors }
    }

    pub fn normalize_text(&self, text: &str) -> String {
        WHITESPACE.replace_all(text.trim(), " ").into_owned()
    }

    /// Literal, de-duplicated text of every node matching one of the error selectors.
    pub fn error_messages(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut messages: Vec<String> = Vec::new();

        for selector in &self.error_selectors {
            for element in document.select(selector) {
                if is_hidden(&element) {
                    continue;
                }
                let text = self.normalize_text(&element.text().collect::<Vec<_>>().join(" "));
                if !text.is_empty() && !messages.contains(&text) {
                    messages.push(text);
                }
            }
        }

        messages
    }

    /// Text of the body, skipping script/style/template/noscript content.
    pub fn visible_text(&self, html: &str) -> String {
        let document = Html::parse_document(html);
        let root = match document.select(&BODY).next() {
            Some(body) => body,
            None => document.root_element(),
        };

        let mut chunks = Vec::new();
        collect_text(root, &mut chunks);
        self.normalize_text(&chunks.join(" "))
    }
}

fn is_hidden(element: &ElementRef) -> bool {
    let own = element.value();
    if own.attr("hidden").is_some() {
        return true;
    }
    own.attr("style")
        .map(|style| {
            let style = style.replace(' ', "").to_lowercase();
            style.contains("display:none") || style.contains("visibility:hidden")
        })
        .unwrap_or(false)
}

fn collect_text(element: ElementRef, chunks: &mut Vec<String>) {
    if matches!(
        element.value().name(),
        "script" | "style" | "template" | "noscript"
    ) || is_hidden(&element)
    {
        return;
    }

    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            let text: &str = text;
            if !text.trim().is_empty() {
                chunks.push(text.trim().to_string());
            }
        } else if let Some(child_element) = ElementRef::wrap(child) {
            collect_text(child_element, chunks);
        }
    }
}
