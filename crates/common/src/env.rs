//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use std::path::Path;

use tracing::{debug, warn};

/// Ensure the directory holding the users snapshot exists.
pub async fn ensure_env(data_file: &Path) -> anyhow::Result<()> {
    let Some(data_dir) = data_file.parent().filter(|p| !p.as_os_str().is_empty()) else {
        debug!(file = %data_file.display(), "users file has no parent directory");
        return Ok(());
    };
    if tokio::fs::metadata(data_dir).await.is_err() {
        warn!(dir = %data_dir.display(), "data directory missing; creating it");
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {}: {e}", data_dir.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_missing_parent_dir() -> anyhow::Result<()> {
        let root = std::env::temp_dir().join(format!("ensure_env_{}", uuid::Uuid::new_v4()));
        let file = root.join("nested").join("users.json");
        ensure_env(&file).await?;
        assert!(tokio::fs::metadata(root.join("nested")).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&root).await;
        Ok(())
    }

    #[tokio::test]
    async fn bare_file_name_is_fine() -> anyhow::Result<()> {
        ensure_env(Path::new("users.json")).await?;
        Ok(())
    }
}
