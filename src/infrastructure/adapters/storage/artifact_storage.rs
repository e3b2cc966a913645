//! Artifact Storage - 文件系统临时音频目录
//!
//! 为每次合成分配唯一路径，并在启动时清理上次异常退出遗留的文件

use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{AudioArtifact, TtsError};

/// 产物文件扩展名
const ARTIFACT_EXTENSION: &str = "mp3";

/// 是否为 `allocate` 产生的文件名：`<uuid>.mp3`
fn is_artifact_name(path: &Path) -> bool {
    let extension_matches = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == ARTIFACT_EXTENSION);
    let stem_is_uuid = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| Uuid::parse_str(stem).is_ok());
    extension_matches && stem_is_uuid
}

/// 临时音频目录
#[derive(Debug, Clone)]
pub struct ArtifactStorage {
    /// 存储根目录
    base_dir: PathBuf,
}

impl ArtifactStorage {
    /// 创建存储并确保目录存在
    pub async fn new(base_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    /// 获取存储根目录
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// 分配一个新的产物路径（文件尚未创建）
    pub fn allocate(&self, extension: &str) -> AudioArtifact {
        let path = self
            .base_dir
            .join(format!("{}.{}", Uuid::new_v4(), extension));
        AudioArtifact::new(path)
    }

    /// 创建产物文件，返回写入句柄
    pub async fn create(&self, extension: &str) -> Result<(AudioArtifact, fs::File), TtsError> {
        let artifact = self.allocate(extension);
        let file = fs::File::create(artifact.path())
            .await
            .map_err(|e| TtsError::StorageError(e.to_string()))?;
        Ok((artifact, file))
    }

    /// 删除目录中遗留的产物，返回删除数量
    ///
    /// 只处理 `<uuid>.mp3` 形式的文件，目录中的其他文件保持不动
    pub async fn purge_stale(&self) -> std::io::Result<u64> {
        let mut deleted_count = 0u64;
        let mut entries = fs::read_dir(&self.base_dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !is_artifact_name(&path) || !entry.file_type().await?.is_file() {
                continue;
            }
            match fs::remove_file(&path).await {
                Ok(()) => deleted_count += 1,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to purge stale artifact");
                }
            }
        }

        if deleted_count > 0 {
            tracing::info!(
                dir = %self.base_dir.display(),
                files = deleted_count,
                "Purged stale artifacts"
            );
        }

        Ok(deleted_count)
    }
}
