use crate::core::PageDriver;
use crate::errors::{FormAgentError, Result};
use crate::types::{Capture, Checkpoint};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub struct ScreenshotManager;

impl ScreenshotManager {
    /// Full-page capture for a checkpoint. A failed capture is logged and skipped.
    pub async fn capture(page: &dyn PageDriver, checkpoint: Checkpoint) -> Option<Capture> {
        match page.screenshot().await {
            Ok(png) => {
                debug!("captured {:?} ({} bytes)", checkpoint, png.len());
                Some(Capture {
                    checkpoint,
                    taken_at: chrono::Utc::now(),
                    size_bytes: png.len(),
                    png,
                })
            }
            Err(e) => {
                warn!("capture at {:?} failed: {}", checkpoint, e);
                None
            }
        }
    }

    pub fn to_base64(capture: &Capture) -> String {
        STANDARD.encode(&capture.png)
    }

    /// Write captures as `<prefix>_<checkpoint>.png` under `dir`.
    pub async fn save_all(captures: &[Capture], dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(FormAgentError::IoError)?;

        let mut written = Vec::with_capacity(captures.len());
        for capture in captures {
            let path = dir.join(format!("{}_{}.png", prefix, capture.checkpoint.file_stem()));
            tokio::fs::write(&path, &capture.png)
                .await
                .map_err(FormAgentError::IoError)?;
            written.push(path);
        }
        Ok(written)
    }
}
