use crate::core::PageDriver;
use crate::errors::{FormAgentError, Result};
use crate::form::{FieldValue, ResolvedField};
use crate::widgets::base::{AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use async_trait::async_trait;
use tracing::debug;

/// Every enabled checkbox in the resolved box's form. Only ever checks; never unchecks.
pub struct CheckboxGroupAdapter;

#[async_trait]
impl WidgetAdapter for CheckboxGroupAdapter {
    fn name(&self) -> &str {
        "checkbox-group"
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::CheckboxGroup
    }

    async fn set_value(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        context: &AdapterContext,
    ) -> Result<AdapterOutcome> {
        if matches!(value, FieldValue::Check(false)) {
            return Ok(AdapterOutcome::new("left-unchanged"));
        }

        let scope = page.checkbox_scope(&context.root, &field.handle).await?;
        let mut newly_checked = 0;
        let mut enabled = Vec::new();

        for checkbox in scope {
            let profile = page.inspect(&checkbox).await?;
            if profile.is_disabled {
                continue;
            }
            if !profile.is_checked {
                page.set_checked(&checkbox, true).await?;
                newly_checked += 1;
            }
            enabled.push(checkbox);
        }

        let mut still_unchecked = 0;
        for checkbox in &enabled {
            if !page.inspect(checkbox).await?.is_checked {
                still_unchecked += 1;
            }
        }
        if still_unchecked > 0 {
            return Err(FormAgentError::adapter(
                self.name(),
                format!("{} of {} boxes would not check", still_unchecked, enabled.len()),
            ));
        }

        debug!(
            "{}: checked {} new of {} boxes",
            field.intent,
            newly_checked,
            enabled.len()
        );
        Ok(AdapterOutcome::new("check-unchecked")
            .with_snapshot(format!("{}/{} checked", enabled.len(), enabled.len())))
    }
}
