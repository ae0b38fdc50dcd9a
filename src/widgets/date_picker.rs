use crate::core::{DomEvent, PageDriver};
use crate::errors::{FormAgentError, Result};
use crate::form::{FieldValue, ResolvedField};
use crate::widgets::base::{AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use async_trait::async_trait;
use tracing::debug;

/// Read-only date input owned by a calendar widget (flatpickr and friends).
pub struct DatePickerAdapter;

#[async_trait]
impl WidgetAdapter for DatePickerAdapter {
    fn name(&self) -> &str {
        "date-picker"
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::EnhancedDatePicker
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
            .ok_or_else(|| FormAgentError::adapter(self.name(), "expects a date"))?;
        let handle = &field.handle;
        let before = page.read_value(handle).await?;

        match page.call_date_setter(handle, &text).await {
            Ok(true) => {
                context.settle().await;
                let now = page.read_value(handle).await?;
                if !now.is_empty() && (now != before || now == text) {
                    return Ok(AdapterOutcome::new("widget-setter").with_snapshot(now));
                }
                debug!("{}: widget setter left {:?}", field.intent, now);
            }
            Ok(false) => debug!("{}: no calendar api on element", field.intent),
            Err(e) => debug!("{}: calendar api failed: {}", field.intent, e),
        }

        let forced = async {
            page.force_value(handle, &text).await?;
            page.dispatch(handle, DomEvent::Input).await?;
            page.dispatch(handle, DomEvent::Change).await
        };
        match forced.await {
            Ok(()) => {
                let now = page.read_value(handle).await?;
                if now.trim() == text.trim() {
                    return Ok(AdapterOutcome::new("forced-value").with_snapshot(now));
                }
                debug!("{}: forced value reads back {:?}", field.intent, now);
            }
            Err(e) => debug!("{}: forcing value failed: {}", field.intent, e),
        }

        page.click(handle).await?;
        context.settle().await;
        if page.pick_calendar_day(handle).await? {
            page.press_key("Escape").await?;
            context.settle().await;
            let now = page.read_value(handle).await?;
            if !now.is_empty() {
                return Ok(AdapterOutcome::new("calendar-click").with_snapshot(now));
            }
        }

        Err(FormAgentError::adapter(
            self.name(),
            "date input stayed empty after every strategy",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SearchRoot;
    use crate::form::{CandidateCatalog, FieldIntent, FieldResolver};
    use crate::testing::MockPage;
    use chrono::NaiveDate;
    use std::collections::HashSet;

    const FORM: &str = r#"<form>
        <input name="available_from" class="flatpickr-input" readonly placeholder="Available from">
    </form>"#;

    async fn fill(page: &MockPage) -> Result<AdapterOutcome> {
        let catalog = CandidateCatalog::new();
        let field = FieldResolver::new(page, &catalog)
            .resolve(&FieldIntent::AvailabilityDate, &SearchRoot::Page, &HashSet::new())
            .await
            .unwrap();
        assert_eq!(field.kind, WidgetKind::EnhancedDatePicker);
        let date = FieldValue::Date {
            date: NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        };
        DatePickerAdapter
            .set_value(
                page,
                &field,
                &date,
                &AdapterContext::new(SearchRoot::Page).with_settle(0, 0),
            )
            .await
    }

    #[tokio::test]
    async fn test_widget_setter_first() {
        let page = MockPage::new(FORM).with_date_api(true);
        let outcome = fill(&page).await.unwrap();
        assert_eq!(outcome.strategy, "widget-setter");
        assert_eq!(page.value_of("available_from"), Some("2025-01-15".to_string()));
    }

    #[tokio::test]
    async fn test_forced_value_without_api() {
        let page = MockPage::new(FORM).with_date_api(false);
        let outcome = fill(&page).await.unwrap();
        assert_eq!(outcome.strategy, "forced-value");
        assert_eq!(page.value_of("available_from"), Some("2025-01-15".to_string()));
        assert!(page.events().iter().any(|e| e == "change:available_from"));
    }

    #[tokio::test]
    async fn test_calendar_click_when_value_writes_are_reverted() {
        let page = MockPage::new(FORM)
            .with_date_api(false)
            .with_locked_values(true)
            .with_calendar(true);
        let outcome = fill(&page).await.unwrap();
        assert_eq!(outcome.strategy, "calendar-click");
        assert!(page.events().iter().any(|e| e == "key:Escape"));
    }

    #[tokio::test]
    async fn test_all_strategies_exhausted() {
        let page = MockPage::new(FORM)
            .with_date_api(false)
            .with_locked_values(true)
            .with_calendar(false);
        assert!(fill(&page).await.is_err());
    }
}
