use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::debug;

use crate::DownloadSink;

const DEFAULT_EXTENSION: &str = ".jpg";

/// File name for a downloaded receipt: the URL's last path segment without
/// fragment or query, with `.jpg` appended when it carries no extension.
pub fn download_file_name(url: &str) -> String {
    let segment = url.rsplit('/').next().unwrap_or_default();
    let segment = segment.split('#').next().unwrap_or_default();
    let name = segment.split('?').next().unwrap_or_default();
    if name.contains('.') {
        name.to_string()
    } else {
        format!("{name}{DEFAULT_EXTENSION}")
    }
}

/// Saves downloads into a directory. Bytes land in a hidden staging file that
/// is renamed into place once complete, and removed if the write fails.
pub struct DirectoryDownloads {
    dir: PathBuf,
}

impl DirectoryDownloads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl DownloadSink for DirectoryDownloads {
    async fn save(&self, file_name: &str, bytes: Vec<u8>) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("failed to create download dir '{}'", self.dir.display()))?;

        let target = self.dir.join(file_name);
        let staging = self.dir.join(format!(".{file_name}.part"));
        if let Err(err) = tokio::fs::write(&staging, &bytes).await {
            let _ = tokio::fs::remove_file(&staging).await;
            return Err(err)
                .with_context(|| format!("failed to write '{}'", staging.display()));
        }
        tokio::fs::rename(&staging, &target)
            .await
            .with_context(|| format!("failed to move download to '{}'", target.display()))?;

        debug!(path = %target.display(), size_bytes = bytes.len(), "receipt saved");
        Ok(target)
    }
}
