// Filesystem signal channel
//
// The automation worker cannot take RPC calls mid-run, so confirmation and
// prompt answers travel through well-known files the worker polls for:
//   <confirm_dir>/confirm_<order_number>.txt   purchase confirmation
//   <response_dir>/<job_id>.json               prompt response payload
// The worker deletes each file after consuming it.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use sdw_core::error::{AppError, Result};
use sdw_core::port::SignalChannel;

/// Signal channel backed by a shared directory pair
pub struct FsSignalChannel {
    confirm_dir: PathBuf,
    response_dir: PathBuf,
}

impl FsSignalChannel {
    pub fn new(confirm_dir: impl Into<PathBuf>, response_dir: impl Into<PathBuf>) -> Self {
        Self {
            confirm_dir: confirm_dir.into(),
            response_dir: response_dir.into(),
        }
    }

    /// File names embed caller-supplied identifiers, so anything outside the
    /// id alphabet is rejected before it can become a path component.
    fn check_component(value: &str) -> Result<()> {
        if value.is_empty()
            || !value
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
        {
            return Err(AppError::Validation(format!(
                "Invalid signal file component '{value}'"
            )));
        }
        Ok(())
    }

    async fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Write then rename so the polling worker never sees a partial file.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, contents).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl SignalChannel for FsSignalChannel {
    async fn signal_confirmation(&self, order_number: &str) -> Result<()> {
        Self::check_component(order_number)?;
        let path = self.confirm_dir.join(format!("confirm_{order_number}.txt"));
        Self::write_atomic(&path, b"confirmed").await?;
        info!(order_number = %order_number, path = %path.display(), "Confirmation signal written");
        Ok(())
    }

    async fn submit_user_input(&self, job_id: &str, response: &serde_json::Value) -> Result<()> {
        Self::check_component(job_id)?;
        let path = self.response_dir.join(format!("{job_id}.json"));
        Self::write_atomic(&path, &serde_json::to_vec_pretty(response)?).await?;
        info!(job_id = %job_id, path = %path.display(), "User input response written");
        Ok(())
    }
}
