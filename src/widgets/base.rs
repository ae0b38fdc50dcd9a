use crate::core::{PageDriver, SearchRoot};
use crate::dom::ElementProfile;
use crate::errors::Result;
use crate::form::{FieldValue, ResolvedField};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Control families the engine knows how to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetKind {
    PlainInput,
    /// Any native `<select>`, single or multiple.
    NativeMultiSelect,
    /// A native select hidden behind a chips overlay.
    EnhancedMultiSelect,
    /// Read-only input backed by a calendar overlay.
    EnhancedDatePicker,
    FileInput,
    CheckboxGroup,
}

impl WidgetKind {
    pub fn infer(profile: &ElementProfile) -> Self {
        match (profile.tag_name.as_str(), profile.effective_type()) {
            ("input", "file") => WidgetKind::FileInput,
            ("input", "checkbox") => WidgetKind::CheckboxGroup,
            ("select", _) if profile.is_enhanced_select => WidgetKind::EnhancedMultiSelect,
            ("select", _) => WidgetKind::NativeMultiSelect,
            _ if profile.has_date_widget => WidgetKind::EnhancedDatePicker,
            _ => WidgetKind::PlainInput,
        }
    }

    /// Whether a value of this shape can be applied to the kind at all.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match self {
            WidgetKind::FileInput => matches!(value, FieldValue::File { .. }),
            WidgetKind::CheckboxGroup => matches!(value, FieldValue::Check(_)),
            WidgetKind::NativeMultiSelect | WidgetKind::EnhancedMultiSelect => {
                matches!(value, FieldValue::Choices(_) | FieldValue::Text(_))
            }
            WidgetKind::EnhancedDatePicker => {
                matches!(value, FieldValue::Date { .. } | FieldValue::Text(_))
            }
            WidgetKind::PlainInput => match value {
                FieldValue::Text(_) | FieldValue::Date { .. } => true,
                FieldValue::Choices(items) => items.len() == 1,
                _ => false,
            },
        }
    }
}

/// Per-call knobs handed to an adapter.
#[derive(Debug, Clone)]
pub struct AdapterContext {
    pub root: SearchRoot,
    pub settle_ms: u64,
    pub upload_settle_ms: u64,
    pub date_format: String,
    /// Press Escape after typing to close an autocomplete list.
    pub dismiss_autocomplete: bool,
}

impl AdapterContext {
    pub fn new(root: SearchRoot) -> Self {
        Self {
            root,
            settle_ms: 500,
            upload_settle_ms: 2000,
            date_format: "%Y-%m-%d".to_string(),
            dismiss_autocomplete: false,
        }
    }

    pub fn with_settle(mut self, settle_ms: u64, upload_settle_ms: u64) -> Self {
        self.settle_ms = settle_ms;
        self.upload_settle_ms = upload_settle_ms;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn dismissing_autocomplete(mut self, dismiss: bool) -> Self {
        self.dismiss_autocomplete = dismiss;
        self
    }

    pub async fn settle(&self) {
        pause(self.settle_ms).await;
    }
}

pub(crate) async fn pause(ms: u64) {
    if ms > 0 {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

/// What a successful adapter did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterOutcome {
    pub strategy: String,
    /// State read back after the write.
    pub snapshot: Option<String>,
}

impl AdapterOutcome {
    pub fn new(strategy: &str) -> Self {
        Self {
            strategy: strategy.to_string(),
            snapshot: None,
        }
    }

    pub fn with_snapshot(mut self, snapshot: impl Into<String>) -> Self {
        self.snapshot = Some(snapshot.into());
        self
    }
}

/// Drives one control family. Errors stay inside the registry, which turns them into
/// [`FillResult::AdapterError`](crate::form::FillResult).
#[async_trait]
pub trait WidgetAdapter: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> WidgetKind;

    async fn set_value(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        context: &AdapterContext,
    ) -> Result<AdapterOutcome>;
}

/// Labels compared the way users read them.
pub(crate) fn same_label(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_kinds() {
        let file = ElementProfile::new("input").with_attribute("type", "file");
        let checkbox = ElementProfile::new("input").with_attribute("type", "checkbox");
        let select = ElementProfile::new("select").with_attribute("multiple", "");
        let mut enhanced = select.clone();
        enhanced.is_enhanced_select = true;
        let mut date = ElementProfile::new("input").with_attribute("readonly", "");
        date.has_date_widget = true;

        assert_eq!(WidgetKind::infer(&file), WidgetKind::FileInput);
        assert_eq!(WidgetKind::infer(&checkbox), WidgetKind::CheckboxGroup);
        assert_eq!(WidgetKind::infer(&select), WidgetKind::NativeMultiSelect);
        assert_eq!(WidgetKind::infer(&enhanced), WidgetKind::EnhancedMultiSelect);
        assert_eq!(WidgetKind::infer(&date), WidgetKind::EnhancedDatePicker);
        assert_eq!(
            WidgetKind::infer(&ElementProfile::new("textarea")),
            WidgetKind::PlainInput
        );
    }

    #[test]
    fn test_value_shapes() {
        assert!(WidgetKind::PlainInput.accepts(&FieldValue::text("a")));
        assert!(!WidgetKind::PlainInput.accepts(&FieldValue::Check(true)));
        assert!(WidgetKind::NativeMultiSelect.accepts(&FieldValue::choices(["a", "b"])));
        assert!(!WidgetKind::FileInput.accepts(&FieldValue::text("/cv.pdf")));
        assert!(WidgetKind::CheckboxGroup.accepts(&FieldValue::Check(true)));
    }
}
