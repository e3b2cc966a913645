//! Command Voice Transport - 通过外部播放器进程发声
//!
//! "连接"即定位播放器可执行文件；播放时为每个音频启动一个播放器进程，
//! 等待其退出。同一时刻只允许一个播放进程。

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::process::Command;

use crate::application::ports::{
    DestinationKind, VoiceDestination, VoiceError, VoiceTransportPort,
};

/// 播放器传输配置
#[derive(Debug, Clone)]
pub struct CommandVoiceTransportConfig {
    /// 播放器可执行文件（名称或路径）
    pub player: String,
    /// 播放器参数，音频路径追加在最后
    pub player_args: Vec<String>,
    /// 目标类型
    pub kind: DestinationKind,
}

impl Default for CommandVoiceTransportConfig {
    fn default() -> Self {
        Self {
            player: "ffplay".to_string(),
            player_args: ["-nodisp", "-autoexit", "-loglevel", "quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            kind: DestinationKind::Voice,
        }
    }
}

/// 播放期间持有，离开作用域时清除播放标记
struct PlayingGuard<'a>(&'a AtomicBool);

impl Drop for PlayingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// 外部播放器传输
pub struct CommandVoiceTransport {
    config: CommandVoiceTransportConfig,
    connected: AtomicBool,
    playing: AtomicBool,
}

impl CommandVoiceTransport {
    pub fn new(config: CommandVoiceTransportConfig) -> Self {
        Self {
            config,
            connected: AtomicBool::new(false),
            playing: AtomicBool::new(false),
        }
    }

    /// 在 PATH 中定位播放器
    async fn locate_player(&self) -> Option<PathBuf> {
        let player = Path::new(&self.config.player);
        if player.components().count() > 1 {
            return is_file(player).await.then(|| player.to_path_buf());
        }

        let path_var = std::env::var_os("PATH")?;
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(player);
            if is_file(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

#[async_trait]
impl VoiceTransportPort for CommandVoiceTransport {
    async fn resolve(&self, _destination: &VoiceDestination) -> Result<DestinationKind, VoiceError> {
        Ok(self.config.kind.clone())
    }

    async fn connect(
        &self,
        destination: &VoiceDestination,
        timeout: Duration,
    ) -> Result<(), VoiceError> {
        let located = tokio::time::timeout(timeout, self.locate_player())
            .await
            .map_err(|_| VoiceError::Timeout)?;

        match located {
            Some(path) => {
                self.connected.store(true, Ordering::SeqCst);
                tracing::debug!(
                    destination = %destination,
                    player = %path.display(),
                    "Player located"
                );
                Ok(())
            }
            None => {
                self.connected.store(false, Ordering::SeqCst);
                Err(VoiceError::ConnectFailed(format!(
                    "Player not found: {}",
                    self.config.player
                )))
            }
        }
    }

    async fn request_to_speak(&self, destination: &VoiceDestination) -> Result<(), VoiceError> {
        if !self.is_connected() {
            return Err(VoiceError::NotConnected);
        }
        // 本地输出没有静音状态
        tracing::debug!(destination = %destination, "Local output is always unsuppressed");
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }

    async fn play(&self, audio: &Path) -> Result<(), VoiceError> {
        if !self.is_connected() {
            return Err(VoiceError::NotConnected);
        }
        if self
            .playing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(VoiceError::Playback("Player is busy".to_string()));
        }
        let _guard = PlayingGuard(&self.playing);

        let status = Command::new(&self.config.player)
            .args(&self.config.player_args)
            .arg(audio)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
            .map_err(|e| {
                // 播放器消失视为断开，交给修复循环重连
                self.connected.store(false, Ordering::SeqCst);
                VoiceError::Playback(format!("Failed to start player: {}", e))
            })?;

        if !status.success() {
            return Err(VoiceError::Playback(format!("Player exited with {}", status)));
        }

        Ok(())
    }
}
