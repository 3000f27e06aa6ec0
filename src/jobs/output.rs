//! Single-file JSON persistence.
//!
//! Documents are written to a sibling `.tmp` file first and renamed into
//! place, so an interrupted run never leaves a truncated document under
//! the final name.

use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::error::HarvestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonStyle {
    Compact,
    Pretty,
}

/// Serialize `value` to `path`, creating parent directories. Returns the
/// number of bytes written.
pub async fn write_json(path: &Path, value: &Value, style: JsonStyle) -> Result<usize, HarvestError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let bytes = match style {
        JsonStyle::Compact => serde_json::to_vec(value)?,
        JsonStyle::Pretty => serde_json::to_vec_pretty(value)?,
    };

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(bytes.len())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
