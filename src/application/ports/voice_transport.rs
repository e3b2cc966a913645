//! Voice Transport Port - 语音会话传输抽象
//!
//! 连接、请求发言、状态查询与播放。连接与请求发言是两个独立调用，
//! 各自可能失败。

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 语音传输错误
#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Destination not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Connect failed: {0}")]
    ConnectFailed(String),

    #[error("Connect timeout")]
    Timeout,

    #[error("Not connected")]
    NotConnected,

    #[error("Playback failed: {0}")]
    Playback(String),
}

/// 目标类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationKind {
    /// 普通语音频道
    Voice,
    /// 舞台频道，连接后还需单独请求发言
    Stage,
    /// 其他类型（不能发声）
    Other(String),
}

impl DestinationKind {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "voice" => Self::Voice,
            "stage" => Self::Stage,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn is_speech_capable(&self) -> bool {
        matches!(self, Self::Voice | Self::Stage)
    }
}

impl std::fmt::Display for DestinationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Voice => write!(f, "voice"),
            Self::Stage => write!(f, "stage"),
            Self::Other(kind) => write!(f, "{}", kind),
        }
    }
}

/// 语音目标
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceDestination {
    pub id: String,
}

impl VoiceDestination {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl std::fmt::Display for VoiceDestination {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Voice Transport Port
#[async_trait]
pub trait VoiceTransportPort: Send + Sync {
    /// 查询目标类型
    async fn resolve(&self, destination: &VoiceDestination) -> Result<DestinationKind, VoiceError>;

    /// 建立连接
    async fn connect(
        &self,
        destination: &VoiceDestination,
        timeout: Duration,
    ) -> Result<(), VoiceError>;

    /// 请求解除静音/允许发言（舞台频道必需）
    async fn request_to_speak(&self, destination: &VoiceDestination) -> Result<(), VoiceError>;

    fn is_connected(&self) -> bool;

    fn is_playing(&self) -> bool;

    /// 播放音频文件，播放结束（或失败）后返回
    async fn play(&self, audio: &Path) -> Result<(), VoiceError>;
}
