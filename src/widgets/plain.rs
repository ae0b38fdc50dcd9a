use crate::core::{DomEvent, PageDriver};
use crate::errors::{FormAgentError, Result};
use crate::form::{FieldValue, ResolvedField};
use crate::widgets::base::{AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use async_trait::async_trait;

/// Text inputs and textareas.
pub struct PlainInputAdapter;

#[async_trait]
impl WidgetAdapter for PlainInputAdapter {
    fn name(&self) -> &str {
        "plain-input"
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::PlainInput
    }

    async fn set_value(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        context: &AdapterContext,
    ) -> Result<AdapterOutcome> {
        let text = value
            .as_text(&context.date_format)
            .ok_or_else(|| FormAgentError::adapter(self.name(), "expects a text value"))?;

        page.set_text(&field.handle, &text).await?;
        page.dispatch(&field.handle, DomEvent::Input).await?;
        page.dispatch(&field.handle, DomEvent::Change).await?;

        if context.dismiss_autocomplete {
            context.settle().await;
            page.press_key("Escape").await?;
        }

        let read_back = page.read_value(&field.handle).await?;
        if !equivalent_text(&read_back, &text) {
            return Err(FormAgentError::adapter(
                self.name(),
                format!("read back {:?}, expected {:?}", read_back, text),
            ));
        }

        Ok(AdapterOutcome::new("set-text").with_snapshot(read_back))
    }
}

/// Equal, or equal once input masks (spaces, dashes, brackets) are ignored.
fn equivalent_text(actual: &str, expected: &str) -> bool {
    if actual == expected {
        return true;
    }
    let significant = |s: &str| -> String { s.chars().filter(|c| c.is_alphanumeric()).collect() };
    !expected.trim().is_empty() && significant(actual) == significant(expected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SearchRoot;
    use crate::form::{CandidateCatalog, FieldIntent, FieldResolver};
    use crate::testing::MockPage;
    use std::collections::HashSet;

    async fn fill(
        page: &MockPage,
        intent: FieldIntent,
        value: &str,
        dismiss: bool,
    ) -> Result<AdapterOutcome> {
        let catalog = CandidateCatalog::new();
        let field = FieldResolver::new(page, &catalog)
            .resolve(&intent, &SearchRoot::Page, &HashSet::new())
            .await
            .unwrap();
        let context = AdapterContext::new(SearchRoot::Page)
            .with_settle(0, 0)
            .dismissing_autocomplete(dismiss);
        PlainInputAdapter
            .set_value(page, &field, &FieldValue::text(value), &context)
            .await
    }

    #[tokio::test]
    async fn test_email_placeholder_round_trip() {
        let page = MockPage::new(r#"<form><input placeholder="Email"></form>"#);
        let outcome = fill(&page, FieldIntent::Email, "user@example.com", false)
            .await
            .unwrap();
        assert_eq!(outcome.snapshot.as_deref(), Some("user@example.com"));
        assert_eq!(page.value_by_placeholder("Email"), Some("user@example.com".to_string()));
    }

    #[tokio::test]
    async fn test_replaces_existing_text_and_notifies() {
        let page = MockPage::new(r#"<input name="phone" value="old">"#);
        fill(&page, FieldIntent::Phone, "+31 6 1234 5678", false)
            .await
            .unwrap();
        assert_eq!(page.value_of("phone"), Some("+31 6 1234 5678".to_string()));
        let events = page.events();
        assert!(events.iter().any(|e| e == "input:phone"));
        assert!(events.iter().any(|e| e == "change:phone"));
    }

    #[tokio::test]
    async fn test_autocomplete_fields_press_escape() {
        let page = MockPage::new(r#"<input name="city">"#);
        fill(&page, FieldIntent::City, "Amsterdam", true).await.unwrap();
        assert!(page.events().iter().any(|e| e == "key:Escape"));
    }

    #[test]
    fn test_mask_tolerant_comparison() {
        assert!(equivalent_text("06-1234 5678", "0612345678"));
        assert!(!equivalent_text("", "a"));
        assert!(!equivalent_text("user@example.org", "user@example.com"));
    }
}
