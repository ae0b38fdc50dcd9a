use crate::core::PageDriver;
use crate::errors::{FormAgentError, Result};
use crate::form::{FieldValue, ResolvedField};
use crate::widgets::base::{pause, AdapterContext, AdapterOutcome, WidgetAdapter, WidgetKind};
use async_trait::async_trait;

/// `<input type=file>`. The path was validated by the orchestrator.
pub struct FileInputAdapter;

#[async_trait]
impl WidgetAdapter for FileInputAdapter {
    fn name(&self) -> &str {
        "file-input"
    }

    fn kind(&self) -> WidgetKind {
        WidgetKind::FileInput
    }

    async fn set_value(
        &self,
        page: &dyn PageDriver,
        field: &ResolvedField,
        value: &FieldValue,
        context: &AdapterContext,
    ) -> Result<AdapterOutcome> {
        let path = value
            .as_path()
            .ok_or_else(|| FormAgentError::adapter(self.name(), "expects a file path"))?;

        page.set_input_files(&field.handle, &[path.to_path_buf()])
            .await?;
        pause(context.upload_settle_ms).await;

        let profile = page.inspect(&field.handle).await?;
        if profile.file_count == 0 {
            return Err(FormAgentError::adapter(self.name(), "no file attached"));
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(AdapterOutcome::new("set-input-files").with_snapshot(file_name))
    }
}
