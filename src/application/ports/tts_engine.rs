//! TTS Engine Port - 语音合成引擎抽象
//!
//! 定义语音合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use thiserror::Error;

use super::AudioArtifact;

/// TTS 错误
#[derive(Debug, Error)]
pub enum TtsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

/// 合成请求
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    /// 带 SSML 标记的文本
    pub text: String,
    /// 音色 ID
    pub voice_id: String,
    /// 模型 ID
    pub model_id: String,
}

/// TTS Engine Port
///
/// 外部语音合成服务的抽象接口
#[async_trait]
pub trait TtsEnginePort: Send + Sync {
    /// 执行语音合成
    ///
    /// 成功时返回落盘的音频产物，调用方负责释放
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioArtifact, TtsError>;

    /// 检查 TTS 服务是否可用
    async fn health_check(&self) -> bool {
        true // 默认实现
    }
}
