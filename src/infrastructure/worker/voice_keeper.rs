//! Voice Keeper - 后台保持语音连接
//!
//! 启动后尽快连接，断开后按固定间隔重连。目标配置错误时停止重试。

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::memory::VoiceSessionManager;

/// Keeper 配置
#[derive(Debug, Clone)]
pub struct VoiceKeeperConfig {
    /// 未连接时的重试间隔
    pub retry_interval: Duration,
    /// 已连接时的检查间隔
    pub check_interval: Duration,
}

impl Default for VoiceKeeperConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(10),
            check_interval: Duration::from_secs(30),
        }
    }
}

/// Keeper 退出原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeeperExit {
    Cancelled,
    Misconfigured(String),
}

pub struct VoiceKeeper {
    config: VoiceKeeperConfig,
    manager: Arc<VoiceSessionManager>,
}

impl VoiceKeeper {
    pub fn new(config: VoiceKeeperConfig, manager: Arc<VoiceSessionManager>) -> Self {
        Self { config, manager }
    }

    pub async fn run(self, cancel: CancellationToken) -> KeeperExit {
        tracing::info!(
            destination = %self.manager.destination(),
            retry_secs = self.config.retry_interval.as_secs(),
            "VoiceKeeper started"
        );

        let exit = loop {
            let result = tokio::select! {
                _ = cancel.cancelled() => break KeeperExit::Cancelled,
                result = self.manager.ensure_connected() => result,
            };

            let wait = match result {
                Ok(_) => self.config.check_interval,
                Err(reason) if reason.is_permanent() => {
                    tracing::error!(reason = %reason, "Voice keeper giving up");
                    break KeeperExit::Misconfigured(reason.to_string());
                }
                Err(reason) => {
                    tracing::debug!(reason = %reason, "Voice not ready, will retry");
                    self.config.retry_interval
                }
            };

            tokio::select! {
                _ = cancel.cancelled() => break KeeperExit::Cancelled,
                _ = tokio::time::sleep(wait) => {}
            }
        };

        tracing::info!(exit = ?exit, "VoiceKeeper stopped");
        exit
    }
}
