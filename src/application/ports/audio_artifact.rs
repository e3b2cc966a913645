//! Audio Artifact - 合成音频临时产物
//!
//! 一次播报对应一个产物，必须在创建它的那一轮迭代内被删除，且只删除一次。
//! 显式调用 [`AudioArtifact::release`]；遗漏时由 `Drop` 兜底删除。

use std::path::{Path, PathBuf};
use thiserror::Error;

/// 产物释放错误
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to remove artifact {path}: {source}")]
    RemoveFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// 合成音频产物
#[derive(Debug)]
pub struct AudioArtifact {
    path: PathBuf,
    size_bytes: u64,
    released: bool,
}

impl AudioArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            size_bytes: 0,
            released: false,
        }
    }

    pub fn with_size(mut self, size_bytes: u64) -> Self {
        self.size_bytes = size_bytes;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// 删除产物文件，消耗 self
    pub async fn release(mut self) -> Result<(), ArtifactError> {
        self.released = true;
        tokio::fs::remove_file(&self.path)
            .await
            .map_err(|source| ArtifactError::RemoveFailed {
                path: self.path.display().to_string(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), "Artifact released");
        Ok(())
    }
}

impl Drop for AudioArtifact {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let path = std::mem::take(&mut self.path);
        tracing::debug!(path = %path.display(), "Artifact dropped without release, removing");

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_quietly(&path));
            }
            Err(_) => remove_quietly(&path),
        }
    }
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove dropped artifact");
    }
}
