//! HTTP TTS Client - 调用 ElevenLabs 语音合成服务
//!
//! 实现 TtsEnginePort trait，响应体按流写入临时文件，不在内存中整体缓存
//!
//! 外部 TTS API:
//! POST https://api.elevenlabs.io/v1/text-to-speech/{voice_id}
//! Request: {"text": "...", "model_id": "..."}  (JSON)
//! Response: audio/mpeg binary

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{AudioArtifact, SynthesisRequest, TtsEnginePort, TtsError};
use crate::infrastructure::adapters::storage::ArtifactStorage;

/// 合成请求体 (JSON)
#[derive(Debug, Serialize)]
struct TtsHttpRequest<'a> {
    text: &'a str,
    model_id: &'a str,
}

/// HTTP TTS 客户端配置
#[derive(Debug, Clone)]
pub struct HttpTtsClientConfig {
    /// TTS 服务基础 URL
    pub base_url: String,
    /// API Key
    pub api_key: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for HttpTtsClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.elevenlabs.io/v1".to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

impl HttpTtsClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

/// HTTP TTS 客户端
pub struct HttpTtsClient {
    client: Client,
    config: HttpTtsClientConfig,
    storage: Arc<ArtifactStorage>,
}

impl HttpTtsClient {
    /// 创建新的 HTTP TTS 客户端
    pub fn new(config: HttpTtsClientConfig, storage: Arc<ArtifactStorage>) -> Result<Self, TtsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| TtsError::NetworkError(e.to_string()))?;

        Ok(Self {
            client,
            config,
            storage,
        })
    }

    /// 获取合成 URL
    fn synthesize_url(&self, voice_id: &str) -> String {
        format!(
            "{}/text-to-speech/{}",
            self.config.base_url.trim_end_matches('/'),
            voice_id
        )
    }

    /// 获取健康检查 URL
    fn health_url(&self) -> String {
        format!("{}/voices", self.config.base_url.trim_end_matches('/'))
    }

    /// 把响应体流式写入产物文件，返回写入字节数
    async fn stream_to_file(
        response: reqwest::Response,
        file: &mut tokio::fs::File,
    ) -> Result<u64, TtsError> {
        let mut written = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else {
                    TtsError::InvalidResponse(format!("Failed to read audio: {}", e))
                }
            })?;
            file.write_all(&chunk)
                .await
                .map_err(|e| TtsError::StorageError(e.to_string()))?;
            written += chunk.len() as u64;
        }

        file.flush()
            .await
            .map_err(|e| TtsError::StorageError(e.to_string()))?;

        if written == 0 {
            return Err(TtsError::InvalidResponse("Empty audio body".to_string()));
        }

        Ok(written)
    }
}

#[async_trait]
impl TtsEnginePort for HttpTtsClient {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioArtifact, TtsError> {
        let url = self.synthesize_url(&request.voice_id);
        let body = TtsHttpRequest {
            text: &request.text,
            model_id: &request.model_id,
        };

        tracing::debug!(
            url = %url,
            text_len = request.text.len(),
            model_id = %request.model_id,
            "Sending TTS synthesize request"
        );

        let response = self
            .client
            .post(&url)
            .header("xi-api-key", &self.config.api_key)
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TtsError::Timeout
                } else if e.is_connect() {
                    TtsError::NetworkError(format!("Cannot connect to TTS service: {}", e))
                } else {
                    TtsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(TtsError::ServiceError(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let (artifact, mut file) = self.storage.create("mp3").await?;

        match Self::stream_to_file(response, &mut file).await {
            Ok(size) => {
                tracing::info!(
                    path = %artifact.path().display(),
                    audio_size = size,
                    "TTS synthesis completed"
                );
                Ok(artifact.with_size(size))
            }
            Err(e) => {
                drop(file);
                if let Err(release_err) = artifact.release().await {
                    tracing::warn!(error = %release_err, "Failed to release partial artifact");
                }
                Err(e)
            }
        }
    }

    async fn health_check(&self) -> bool {
        match self
            .client
            .get(&self.health_url())
            .header("xi-api-key", &self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
