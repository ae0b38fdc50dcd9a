use crate::form::intent::FieldIntent;
use crate::widgets::WidgetKind;
use serde::{Deserialize, Serialize};

/// Outcome of filling one field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum FillResult {
    Filled,
    NotFound,
    /// Candidates matched but none was visible and enabled.
    NotVisible,
    AdapterError(String),
}

impl FillResult {
    pub fn is_filled(&self) -> bool {
        matches!(self, FillResult::Filled)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldFill {
    pub intent: FieldIntent,
    pub kind: Option<WidgetKind>,
    /// Candidate query that bound the element, as `locator(value)`.
    pub matched_by: Option<String>,
    /// Adapter strategy that produced the final state.
    pub strategy: Option<String>,
    pub result: FillResult,
    /// Value read back after the fill.
    pub snapshot: Option<String>,
    pub elapsed_ms: u64,
}

impl FieldFill {
    pub fn unresolved(intent: FieldIntent, result: FillResult, elapsed_ms: u64) -> Self {
        Self {
            intent,
            kind: None,
            matched_by: None,
            strategy: None,
            result,
            snapshot: None,
            elapsed_ms,
        }
    }
}

/// Per-field outcomes for one run. Always complete: every requested intent has one entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FillReport {
    pub fields: Vec<FieldFill>,
}

impl FillReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fill: FieldFill) {
        self.fields.push(fill);
    }

    pub fn get(&self, intent: &FieldIntent) -> Option<&FieldFill> {
        self.fields.iter().find(|f| &f.intent == intent)
    }

    pub fn result_of(&self, intent: &FieldIntent) -> Option<&FillResult> {
        self.get(intent).map(|f| &f.result)
    }

    pub fn filled_count(&self) -> usize {
        self.fields.iter().filter(|f| f.result.is_filled()).count()
    }

    pub fn not_found_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f.result, FillResult::NotFound | FillResult::NotVisible))
            .count()
    }

    pub fn error_count(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f.result, FillResult::AdapterError(_)))
            .count()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn summary(&self) -> String {
        format!(
            "{} filled, {} not found, {} errors of {}",
            self.filled_count(),
            self.not_found_count(),
            self.error_count(),
            self.len()
        )
    }
}
