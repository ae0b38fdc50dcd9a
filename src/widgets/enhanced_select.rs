use crate::core::{DomEvent, PageDriver};
use crate::errors::{FormAgentError, Result};
use crate::form::{FieldValue, ResolvedField};
use crate::widgets::base::{same_label, AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Chips-style multi-select overlay (select2) over a hidden native `<select>`.
///
/// Either layer may hold the authoritative state depending on the site, so the adapter runs a
/// small state machine: write the native select and fire the widget's change hook, verify the
/// rendered badges; only if the badges disagree drive the overlay itself and verify again.
pub struct EnhancedSelectAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    NativeValue,
    DriveOverlay,
    Exhausted,
}

#[async_trait]
impl WidgetAdapter for EnhancedSelectAdapter {
    fn name(&self) -> &str {
        "enhanced-select"
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::EnhancedMultiSelect
    }

    async fn set_value(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        context: &AdapterContext,
    ) -> Result<AdapterOutcome> {
        let wanted = value.as_choices();
        let options = page.options(&field.handle).await?;
        let expected: Vec<String> = options
            .iter()
            .filter(|o| wanted.iter().any(|w| o.matches(w)))
            .map(|o| o.label.trim().to_string())
            .collect();

        if expected.is_empty() {
            return Err(FormAgentError::adapter(
                self.name(),
                format!("no option matches {:?}", wanted),
            ));
        }

        let mut step = Step::NativeValue;
        let mut badges = Vec::new();

        loop {
            match step {
                Step::NativeValue => {
                    if let Err(e) = write_native(page, field, &wanted).await {
                        debug!("{}: native write failed: {}", field.intent, e);
                    }
                    context.settle().await;
                    badges = page.enhanced_badges(&field.handle).await?;
                    if covers(&badges, &expected) {
                        return Ok(outcome("native-value", &badges));
                    }
                    debug!(
                        "{}: badges {:?} after native write, driving overlay",
                        field.intent, badges
                    );
                    step = Step::DriveOverlay;
                }
                Step::DriveOverlay => {
                    for label in &expected {
                        // Clicking a result that is already a badge would toggle it off.
                        let current = page.enhanced_badges(&field.handle).await?;
                        if contains(&current, label) {
                            continue;
                        }
                        match page.enhanced_pick(&field.handle, label).await {
                            Ok(true) => {}
                            Ok(false) => {
                                warn!("{}: overlay has no entry {:?}", field.intent, label)
                            }
                            Err(e) => warn!("{}: picking {:?} failed: {}", field.intent, label, e),
                        }
                        context.settle().await;
                    }
                    badges = page.enhanced_badges(&field.handle).await?;
                    if covers(&badges, &expected) {
                        return Ok(outcome("overlay", &badges));
                    }
                    step = Step::Exhausted;
                }
                Step::Exhausted => {
                    let missing: Vec<&String> =
                        expected.iter().filter(|l| !contains(&badges, l)).collect();
                    return Err(FormAgentError::adapter(
                        self.name(),
                        format!("badges {:?} missing {:?}", badges, missing),
                    ));
                }
            }
        }
    }
}

async fn write_native(
    page: &dyn PageDriver,
    field: &ResolvedField,
    wanted: &[String],
) -> Result<()> {
    page.select_options(&field.handle, wanted).await?;
    page.dispatch(&field.handle, DomEvent::FrameworkChange).await?;
    page.dispatch(&field.handle, DomEvent::Change).await
}

fn contains(badges: &[String], label: &str) -> bool {
    badges.iter().any(|b| same_label(b, label))
}

fn covers(badges: &[String], expected: &[String]) -> bool {
    expected.iter().all(|label| contains(badges, label))
}

fn outcome(strategy: &str, badges: &[String]) -> AdapterOutcome {
    AdapterOutcome::new(strategy).with_snapshot(badges.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SearchRoot;
    use crate::form::{CandidateCatalog, FieldIntent, FieldResolver};
    use crate::testing::MockPage;
    use std::collections::HashSet;

    const FORM: &str = r#"<form>
        <label for="langs">Languages</label>
        <select id="langs" name="languages[]" multiple class="select2-hidden-accessible">
            <option value="39">Dutch</option>
            <option value="40">English</option>
            <option value="41">Arabic</option>
        </select>
        <span class="select2 select2-container"><ul class="select2-selection__rendered"></ul></span>
    </form>"#;

    async fn fill(page: &MockPage, value: FieldValue) -> Result<AdapterOutcome> {
        let catalog = CandidateCatalog::new();
        let field = FieldResolver::new(page, &catalog)
            .resolve(&FieldIntent::Languages, &SearchRoot::Page, &HashSet::new())
            .await
            .unwrap();
        assert_eq!(field.kind, WidgetKind::EnhancedMultiSelect);
        EnhancedSelectAdapter
            .set_value(
                page,
                &field,
                &value,
                &AdapterContext::new(SearchRoot::Page).with_settle(0, 0),
            )
            .await
    }

    fn sorted(mut labels: Vec<String>) -> Vec<String> {
        labels.sort();
        labels
    }

    #[tokio::test]
    async fn test_native_value_path_when_framework_hook_works() {
        let page = MockPage::new(FORM).with_jquery(true);
        let outcome = fill(&page, FieldValue::choices(["39", "40", "41"]))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, "native-value");
        assert_eq!(
            sorted(page.badges("languages[]")),
            vec!["Arabic", "Dutch", "English"]
        );
    }

    #[tokio::test]
    async fn test_overlay_fallback_without_framework_hook() {
        let page = MockPage::new(FORM).with_jquery(false);
        let outcome = fill(&page, FieldValue::choices(["Dutch", "Arabic"]))
            .await
            .unwrap();
        assert_eq!(outcome.strategy, "overlay");
        assert_eq!(sorted(page.badges("languages[]")), vec!["Arabic", "Dutch"]);
        assert!(page.events().iter().any(|e| e.starts_with("pick:")));
    }

    #[tokio::test]
    async fn test_unknown_language_fails_verification() {
        let page = MockPage::new(FORM).with_jquery(false);
        let err = fill(&page, FieldValue::choices(["Klingon"])).await.unwrap_err();
        assert!(err.to_string().contains("no option matches"));
    }
}
