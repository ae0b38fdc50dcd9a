use crate::core::PageDriver;
use crate::form::{FieldValue, FillResult, ResolvedField};
use crate::widgets::base::{AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use crate::widgets::{
    CheckboxGroupAdapter, DatePickerAdapter, EnhancedSelectAdapter, FileInputAdapter,
    NativeSelectAdapter, PlainInputAdapter,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::warn;

/// Result of one adapter dispatch, already converted to a fill result.
#[derive(Debug, Clone)]
pub struct Applied {
    pub result: FillResult,
    pub outcome: Option<AdapterOutcome>,
}

/// Registry for widget adapters, one per [`WidgetKind`].
pub struct AdapterRegistry {
    adapters: HashMap<WidgetKind, Arc<dyn WidgetAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self {
            adapters: HashMap::new(),
        }
    }

    /// Registry with every built-in adapter.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(PlainInputAdapter);
        registry.register(NativeSelectAdapter);
        registry.register(EnhancedSelectAdapter);
        registry.register(DatePickerAdapter);
        registry.register(FileInputAdapter);
        registry.register(CheckboxGroupAdapter);
        registry
    }

    /// Register an adapter, replacing any previous one for its kind
    pub fn register<A: WidgetAdapter + 'static>(&mut self, adapter: A) {
        self.adapters.insert(adapter.kind(), Arc::new(adapter));
    }

    pub fn get(&self, kind: WidgetKind) -> Option<Arc<dyn WidgetAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn kinds(&self) -> Vec<WidgetKind> {
        self.adapters.keys().copied().collect()
    }

    /// Dispatch to the adapter for the field's kind. Never fails: every error becomes
    /// `FillResult::AdapterError`.
    pub async fn apply(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        context: &AdapterContext,
    ) -> Applied {
        let Some(adapter) = self.get(field.kind) else {
            return failed(format!("no adapter registered for {:?}", field.kind));
        };

        if !field.kind.accepts(value) {
            return failed(format!(
                "{} cannot take a value of this shape",
                adapter.name()
            ));
        }

        match adapter.set_value(page, field, value, context).await {
            Ok(outcome) => Applied {
                result: FillResult::Filled,
                outcome: Some(outcome),
            },
            Err(e) => {
                warn!("{} on {} failed: {}", adapter.name(), field.intent, e);
                failed(e.to_string())
            }
        }
    }
}

fn failed(reason: String) -> Applied {
    Applied {
        result: FillResult::AdapterError(reason),
        outcome: None,
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
