use crate::core::{DomEvent, PageDriver};
use crate::dom::OptionInfo;
use crate::errors::{FormAgentError, Result};
use crate::form::{FieldValue, ResolvedField};
use crate::widgets::base::{AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use async_trait::async_trait;
use tracing::warn;

/// Native `<select>`, single or multiple. Requested entries match option values or labels.
pub struct NativeSelectAdapter;

#[async_trait]
impl WidgetAdapter for NativeSelectAdapter {
    fn name(&self) -> &str {
        "native-select"
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::NativeMultiSelect
    }

    async fn set_value(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        _context: &AdapterContext,
    ) -> Result<AdapterOutcome> {
        let wanted = value.as_choices();
        if wanted.is_empty() {
            return Err(FormAgentError::adapter(self.name(), "no options requested"));
        }

        let options = page.select_options(&field.handle, &wanted).await?;
        page.dispatch(&field.handle, DomEvent::Change).await?;

        let unmatched: Vec<&String> = wanted
            .iter()
            .filter(|w| !options.iter().any(|o| o.matches(w)))
            .collect();
        if unmatched.len() == wanted.len() {
            return Err(FormAgentError::adapter(
                self.name(),
                format!("no option matches {:?}", wanted),
            ));
        }
        if !unmatched.is_empty() {
            warn!("{}: no option for {:?}", field.intent, unmatched);
        }

        let after = page.options(&field.handle).await?;
        verify(&after, &wanted, field.profile.is_multiple)
            .map_err(|reason| FormAgentError::adapter(self.name(), reason))?;

        Ok(AdapterOutcome::new("select-options").with_snapshot(selected_labels(&after).join(", ")))
    }
}

/// Every matchable request ends up selected; a single select only needs one of them.
fn verify(
    options: &[OptionInfo],
    wanted: &[String],
    multiple: bool,
) -> std::result::Result<(), String> {
    let satisfied = |w: &String| options.iter().any(|o| o.selected && o.matches(w));
    let matchable: Vec<&String> = wanted
        .iter()
        .filter(|w| options.iter().any(|o| o.matches(w)))
        .collect();

    let ok = if multiple {
        matchable.iter().all(|w| satisfied(w))
    } else {
        matchable.iter().any(|w| satisfied(w))
    };

    if ok {
        Ok(())
    } else {
        Err(format!("selection did not stick: {:?}", selected_labels(options)))
    }
}

pub(crate) fn selected_labels(options: &[OptionInfo]) -> Vec<String> {
    options
        .iter()
        .filter(|o| o.selected)
        .map(|o| o.label.trim().to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SearchRoot;
    use crate::form::{CandidateCatalog, FieldIntent, FieldResolver};
    use crate::testing::MockPage;
    use std::collections::HashSet;

    const LANGUAGES: &str = r#"<form>
        <select name="1019019" multiple>
            <option value="39">Dutch</option>
            <option value="40" selected>English</option>
            <option value="41">Arabic</option>
            <option value="42" selected>German</option>
        </select>
        <select name="relocate"><option value="">--</option><option value="y">Yes</option><option value="n">No</option></select>
    </form>"#;

    async fn fill(page: &MockPage, key: &str, value: FieldValue) -> Result<AdapterOutcome> {
        let catalog = CandidateCatalog::new();
        let field = FieldResolver::new(page, &catalog)
            .resolve(&FieldIntent::from(key), &SearchRoot::Page, &HashSet::new())
            .await
            .unwrap();
        assert_eq!(field.kind, WidgetKind::NativeMultiSelect);
        NativeSelectAdapter
            .set_value(page, &field, &value, &AdapterContext::new(SearchRoot::Page))
            .await
    }

    #[tokio::test]
    async fn test_selects_all_requested_values_and_keeps_others() {
        let page = MockPage::new(LANGUAGES);
        fill(&page, "1019019", FieldValue::choices(["39", "40", "41"]))
            .await
            .unwrap();

        let mut checked = page.selected_labels("1019019");
        checked.sort();
        assert_eq!(checked, vec!["Arabic", "Dutch", "English", "German"]);
        assert!(page.events().iter().any(|e| e == "change:1019019"));
    }

    #[tokio::test]
    async fn test_requested_set_from_clean_state() {
        let page = MockPage::new(LANGUAGES.replace(" selected", "").as_str());
        fill(&page, "1019019", FieldValue::choices(["39", "40", "41"]))
            .await
            .unwrap();
        let mut checked = page.selected_labels("1019019");
        checked.sort();
        assert_eq!(checked, vec!["Arabic", "Dutch", "English"]);
    }

    #[tokio::test]
    async fn test_single_select_by_label() {
        let page = MockPage::new(LANGUAGES);
        let outcome = fill(&page, "relocate", FieldValue::text("yes")).await.unwrap();
        assert_eq!(outcome.snapshot.as_deref(), Some("Yes"));
        assert_eq!(page.selected_labels("relocate"), vec!["Yes"]);
    }

    #[tokio::test]
    async fn test_unknown_option_is_an_adapter_error() {
        let page = MockPage::new(LANGUAGES);
        let err = fill(&page, "relocate", FieldValue::text("Maybe")).await.unwrap_err();
        assert!(err.to_string().contains("no option matches"));
    }
}
