//! Fake TTS Client - 用于测试的 TTS 客户端
//!
//! 始终写出固定的音频内容，不实际调用 TTS 服务

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{AudioArtifact, SynthesisRequest, TtsEnginePort, TtsError};
use crate::infrastructure::adapters::storage::ArtifactStorage;

/// Fake TTS Client 配置
#[derive(Debug, Clone, Default)]
pub struct FakeTtsClientConfig {
    /// 固定返回的音频文件路径，未设置时写出一段占位字节
    pub audio_file_path: Option<PathBuf>,
    /// 模拟推理延迟（毫秒）
    pub delay_ms: u64,
}

/// Fake TTS Client
pub struct FakeTtsClient {
    config: FakeTtsClientConfig,
    storage: Arc<ArtifactStorage>,
    /// 缓存的音频数据
    audio_data: Vec<u8>,
}

impl FakeTtsClient {
    /// 创建新的 FakeTtsClient
    pub fn new(
        config: FakeTtsClientConfig,
        storage: Arc<ArtifactStorage>,
    ) -> Result<Self, std::io::Error> {
        let audio_data = match &config.audio_file_path {
            Some(path) => std::fs::read(path)?,
            None => b"fake audio".to_vec(),
        };
        tracing::info!(
            path = ?config.audio_file_path,
            audio_size = audio_data.len(),
            "FakeTtsClient initialized"
        );
        Ok(Self {
            config,
            storage,
            audio_data,
        })
    }
}

#[async_trait]
impl TtsEnginePort for FakeTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioArtifact, TtsError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice_id = %request.voice_id,
            "FakeTtsClient: returning fixed audio"
        );

        if self.config.delay_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(self.config.delay_ms)).await;
        }

        let (artifact, mut file) = self.storage.create("mp3").await?;
        file.write_all(&self.audio_data)
            .await
            .map_err(|e| TtsError::StorageError(e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| TtsError::StorageError(e.to_string()))?;

        Ok(artifact.with_size(self.audio_data.len() as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_fake_synthesize_writes_artifact() {
        let dir = tempdir().unwrap();
        let storage = Arc::new(ArtifactStorage::new(dir.path()).await.unwrap());
        let client = FakeTtsClient::new(FakeTtsClientConfig::default(), storage).unwrap();

        let artifact = client
            .synthesize(SynthesisRequest {
                text: "<speak>hi</speak>".to_string(),
                voice_id: "v".to_string(),
                model_id: "m".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(std::fs::read(artifact.path()).unwrap(), b"fake audio");
        assert_eq!(artifact.size_bytes(), 10);
        artifact.release().await.unwrap();
    }
}
