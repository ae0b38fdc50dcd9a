pub mod base;
pub mod checkbox;
pub mod date_picker;
pub mod enhanced_select;
pub mod file;
pub mod native_select;
pub mod plain;
pub mod registry;

pub use base::{AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
pub use checkbox::CheckboxGroupAdapter;
pub use date_picker::DatePickerAdapter;
pub use enhanced_select::EnhancedSelectAdapter;
pub use file::FileInputAdapter;
pub use native_select::NativeSelectAdapter;
pub use plain::PlainInputAdapter;
pub use registry::{AdapterRegistry, Applied};
