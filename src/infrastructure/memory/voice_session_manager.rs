//! Voice Session Manager - 语音会话状态机
//!
//! 状态: Disconnected -> Connecting -> Connected -> (Suppressed | Unsuppressed)
//! 任何连接失败都回到 Disconnected。
//!
//! 连接与请求发言是两次独立的状态迁移：连接成功但请求发言失败时停留在
//! Suppressed，这是一个合法状态，句柄照常返回。

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::application::ports::{
    AudioArtifact, DestinationKind, VoiceDestination, VoiceError, VoiceTransportPort,
};

/// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceState {
    Disconnected,
    Connecting,
    /// 已连接，尚未请求发言
    Connected,
    /// 已连接，请求发言失败
    Suppressed,
    /// 已连接且可以发言
    Unsuppressed,
}

impl VoiceState {
    fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Suppressed | Self::Unsuppressed)
    }
}

/// 语音不可用的原因
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceUnavailable {
    /// 目标不存在或不是语音/舞台类型，不再重试
    #[error("Voice destination misconfigured: {0}")]
    Misconfigured(String),

    #[error("Voice connect timed out")]
    Timeout,

    #[error("Voice connect failed: {0}")]
    ConnectFailed(String),
}

impl VoiceUnavailable {
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Misconfigured(_))
    }
}

/// 语音句柄
///
/// 每次播放前向管理器获取，用完即弃
#[derive(Clone)]
pub struct VoiceHandle {
    transport: Arc<dyn VoiceTransportPort>,
    destination: VoiceDestination,
}

impl VoiceHandle {
    pub fn destination(&self) -> &VoiceDestination {
        &self.destination
    }

    pub fn is_playing(&self) -> bool {
        self.transport.is_playing()
    }

    /// 播放产物，播放结束后返回
    pub async fn play(&self, artifact: &AudioArtifact) -> Result<(), VoiceError> {
        self.transport.play(artifact.path()).await
    }
}

impl std::fmt::Debug for VoiceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceHandle")
            .field("destination", &self.destination)
            .finish()
    }
}

#[derive(Debug)]
struct SessionInner {
    state: VoiceState,
    kind: Option<DestinationKind>,
    misconfigured: Option<String>,
}

/// 语音会话管理器
///
/// 每个目标只维护一个连接；并发调用在状态锁上串行化，重复连接请求会识别
/// "已连接" 并直接返回。
pub struct VoiceSessionManager {
    transport: Arc<dyn VoiceTransportPort>,
    destination: VoiceDestination,
    connect_timeout: Duration,
    inner: Mutex<SessionInner>,
}

impl VoiceSessionManager {
    pub fn new(
        transport: Arc<dyn VoiceTransportPort>,
        destination: VoiceDestination,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            destination,
            connect_timeout,
            inner: Mutex::new(SessionInner {
                state: VoiceState::Disconnected,
                kind: None,
                misconfigured: None,
            }),
        }
    }

    pub fn destination(&self) -> &VoiceDestination {
        &self.destination
    }

    pub async fn state(&self) -> VoiceState {
        self.inner.lock().await.state
    }

    fn handle(&self) -> VoiceHandle {
        VoiceHandle {
            transport: self.transport.clone(),
            destination: self.destination.clone(),
        }
    }

    /// 获取可发声的句柄，或说明当前不可用
    ///
    /// 最长阻塞一次连接超时，不会无限等待
    pub async fn ensure_connected(&self) -> Result<VoiceHandle, VoiceUnavailable> {
        let mut inner = self.inner.lock().await;

        if let Some(reason) = &inner.misconfigured {
            return Err(VoiceUnavailable::Misconfigured(reason.clone()));
        }

        if inner.state.is_connected() {
            if self.transport.is_connected() {
                if inner.state != VoiceState::Unsuppressed {
                    self.unsuppress(&mut inner).await;
                }
                return Ok(self.handle());
            }
            tracing::warn!(destination = %self.destination, "Voice connection lost");
            inner.state = VoiceState::Disconnected;
        }

        let kind = match inner.kind.clone() {
            Some(kind) => kind,
            None => match self.transport.resolve(&self.destination).await {
                Ok(kind) => kind,
                Err(VoiceError::NotFound(reason)) => {
                    return Err(self.mark_misconfigured(
                        &mut inner,
                        format!("destination {} not found: {}", self.destination, reason),
                    ));
                }
                Err(e) => {
                    tracing::warn!(
                        destination = %self.destination,
                        error = %e,
                        "Failed to resolve voice destination"
                    );
                    return Err(VoiceUnavailable::ConnectFailed(e.to_string()));
                }
            },
        };

        if !kind.is_speech_capable() {
            return Err(self.mark_misconfigured(
                &mut inner,
                format!(
                    "destination {} is a {} destination, not voice or stage",
                    self.destination, kind
                ),
            ));
        }
        inner.kind = Some(kind);

        inner.state = VoiceState::Connecting;
        tracing::info!(destination = %self.destination, "Connecting to voice");

        let result = tokio::time::timeout(
            self.connect_timeout,
            self.transport.connect(&self.destination, self.connect_timeout),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                inner.state = VoiceState::Connected;
                tracing::info!(destination = %self.destination, "Voice connect OK");
            }
            Err(_) | Ok(Err(VoiceError::Timeout)) => {
                inner.state = VoiceState::Disconnected;
                tracing::warn!(
                    destination = %self.destination,
                    timeout_secs = self.connect_timeout.as_secs_f32(),
                    "Voice connect timed out"
                );
                return Err(VoiceUnavailable::Timeout);
            }
            Ok(Err(e)) => {
                inner.state = VoiceState::Disconnected;
                tracing::warn!(
                    destination = %self.destination,
                    error = %e,
                    "Voice connect failed"
                );
                return Err(VoiceUnavailable::ConnectFailed(e.to_string()));
            }
        }

        self.unsuppress(&mut inner).await;
        Ok(self.handle())
    }

    /// 请求发言；失败不致命，停留在 Suppressed
    async fn unsuppress(&self, inner: &mut SessionInner) {
        let result = tokio::time::timeout(
            self.connect_timeout,
            self.transport.request_to_speak(&self.destination),
        )
        .await;

        match result {
            Ok(Ok(())) => {
                inner.state = VoiceState::Unsuppressed;
                tracing::debug!(destination = %self.destination, "Voice unsuppressed");
            }
            Ok(Err(e)) => {
                inner.state = VoiceState::Suppressed;
                tracing::warn!(
                    destination = %self.destination,
                    error = %e,
                    "Failed to unsuppress, staying suppressed"
                );
            }
            Err(_) => {
                inner.state = VoiceState::Suppressed;
                tracing::warn!(destination = %self.destination, "Unsuppress timed out");
            }
        }
    }

    fn mark_misconfigured(&self, inner: &mut SessionInner, reason: String) -> VoiceUnavailable {
        tracing::error!(destination = %self.destination, reason = %reason, "Voice destination misconfigured");
        inner.state = VoiceState::Disconnected;
        inner.misconfigured = Some(reason.clone());
        VoiceUnavailable::Misconfigured(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeVoiceTransport, FakeVoiceTransportConfig};

    fn manager(
        config: FakeVoiceTransportConfig,
        timeout: Duration,
    ) -> (Arc<FakeVoiceTransport>, VoiceSessionManager) {
        let transport = Arc::new(FakeVoiceTransport::new(config));
        let manager =
            VoiceSessionManager::new(transport.clone(), VoiceDestination::new("stage-1"), timeout);
        (transport, manager)
    }

    #[tokio::test]
    async fn test_connect_then_unsuppress() {
        let (transport, manager) = manager(
            FakeVoiceTransportConfig {
                kind: DestinationKind::Stage,
                ..Default::default()
            },
            Duration::from_secs(1),
        );
        assert_eq!(manager.state().await, VoiceState::Disconnected);

        let handle = manager.ensure_connected().await.unwrap();
        assert_eq!(handle.destination().id, "stage-1");
        assert_eq!(manager.state().await, VoiceState::Unsuppressed);
        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(transport.unsuppress_attempts(), 1);
    }

    #[tokio::test]
    async fn test_already_connected_short_circuits() {
        let (transport, manager) =
            manager(FakeVoiceTransportConfig::default(), Duration::from_secs(1));

        manager.ensure_connected().await.unwrap();
        manager.ensure_connected().await.unwrap();
        manager.ensure_connected().await.unwrap();

        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(transport.unsuppress_attempts(), 1);
    }

    #[tokio::test]
    async fn test_connected_but_suppressed() {
        let (transport, manager) = manager(
            FakeVoiceTransportConfig {
                kind: DestinationKind::Stage,
                fail_unsuppress: true,
                ..Default::default()
            },
            Duration::from_secs(1),
        );

        // 请求发言失败不影响拿到句柄
        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(manager.state().await, VoiceState::Suppressed);

        // 再次调用只重试请求发言，不重连
        assert!(manager.ensure_connected().await.is_ok());
        assert_eq!(transport.connect_attempts(), 1);
        assert_eq!(transport.unsuppress_attempts(), 2);
    }

    #[tokio::test]
    async fn test_connect_failure_returns_unavailable() {
        let (_transport, manager) = manager(
            FakeVoiceTransportConfig {
                fail_connect: true,
                ..Default::default()
            },
            Duration::from_secs(1),
        );

        let err = manager.ensure_connected().await.unwrap_err();
        assert!(matches!(err, VoiceUnavailable::ConnectFailed(_)));
        assert!(!err.is_permanent());
        assert_eq!(manager.state().await, VoiceState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_timeout_is_bounded() {
        let (_transport, manager) = manager(
            FakeVoiceTransportConfig {
                hang_connect: true,
                ..Default::default()
            },
            Duration::from_millis(50),
        );

        let started = std::time::Instant::now();
        let err = manager.ensure_connected().await.unwrap_err();
        assert_eq!(err, VoiceUnavailable::Timeout);
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(manager.state().await, VoiceState::Disconnected);
    }

    #[tokio::test]
    async fn test_non_voice_destination_is_permanent() {
        let (transport, manager) = manager(
            FakeVoiceTransportConfig {
                kind: DestinationKind::Other("text".to_string()),
                ..Default::default()
            },
            Duration::from_secs(1),
        );

        let err = manager.ensure_connected().await.unwrap_err();
        assert!(err.is_permanent());
        let err = manager.ensure_connected().await.unwrap_err();
        assert!(err.is_permanent());
        assert_eq!(transport.connect_attempts(), 0);
    }

    #[tokio::test]
    async fn test_reconnect_after_connection_lost() {
        let (transport, manager) =
            manager(FakeVoiceTransportConfig::default(), Duration::from_secs(1));

        manager.ensure_connected().await.unwrap();
        transport.drop_connection();

        manager.ensure_connected().await.unwrap();
        assert_eq!(transport.connect_attempts(), 2);
        assert_eq!(manager.state().await, VoiceState::Unsuppressed);
    }
}
