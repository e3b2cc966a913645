//! Fake Voice Transport - 不发声的语音传输
//!
//! 只记录调用，可按配置模拟各类失败；用于本地演练和测试

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    DestinationKind, VoiceDestination, VoiceError, VoiceTransportPort,
};

/// Fake 传输配置
#[derive(Debug, Clone)]
pub struct FakeVoiceTransportConfig {
    pub kind: DestinationKind,
    /// 连接直接失败
    pub fail_connect: bool,
    /// 连接永不返回（测试超时）
    pub hang_connect: bool,
    /// 请求发言失败
    pub fail_unsuppress: bool,
    /// 播放失败
    pub fail_playback: bool,
    /// 模拟播放时长（毫秒）
    pub play_duration_ms: u64,
}

impl Default for FakeVoiceTransportConfig {
    fn default() -> Self {
        Self {
            kind: DestinationKind::Voice,
            fail_connect: false,
            hang_connect: false,
            fail_unsuppress: false,
            fail_playback: false,
            play_duration_ms: 0,
        }
    }
}

/// Fake 语音传输
#[derive(Debug)]
pub struct FakeVoiceTransport {
    config: FakeVoiceTransportConfig,
    connected: AtomicBool,
    playing: AtomicBool,
    connect_attempts: AtomicUsize,
    unsuppress_attempts: AtomicUsize,
    played: Mutex<Vec<PathBuf>>,
}

impl FakeVoiceTransport {
    pub fn new(config: FakeVoiceTransportConfig) -> Self {
        Self {
            config,
            connected: AtomicBool::new(false),
            playing: AtomicBool::new(false),
            connect_attempts: AtomicUsize::new(0),
            unsuppress_attempts: AtomicUsize::new(0),
            played: Mutex::new(Vec::new()),
        }
    }

    pub fn connect_attempts(&self) -> usize {
        self.connect_attempts.load(Ordering::SeqCst)
    }

    pub fn unsuppress_attempts(&self) -> usize {
        self.unsuppress_attempts.load(Ordering::SeqCst)
    }

    /// 已播放的音频路径
    pub fn played(&self) -> Vec<PathBuf> {
        self.played.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// 模拟连接被远端断开
    pub fn drop_connection(&self) {
        self.connected.store(false, Ordering::SeqCst);
    }

    /// 模拟其他来源正在占用播放
    pub fn set_busy(&self, busy: bool) {
        self.playing.store(busy, Ordering::SeqCst);
    }
}

#[async_trait]
impl VoiceTransportPort for FakeVoiceTransport {
    async fn resolve(&self, _destination: &VoiceDestination) -> Result<DestinationKind, VoiceError> {
        Ok(self.config.kind.clone())
    }

    async fn connect(
        &self,
        destination: &VoiceDestination,
        _timeout: Duration,
    ) -> Result<(), VoiceError> {
        self.connect_attempts.fetch_add(1, Ordering::SeqCst);

        if self.config.hang_connect {
            std::future::pending::<()>().await;
        }
        if self.config.fail_connect {
            return Err(VoiceError::PermissionDenied(destination.to_string()));
        }

        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn request_to_speak(&self, _destination: &VoiceDestination) -> Result<(), VoiceError> {
        self.unsuppress_attempts.fetch_add(1, Ordering::SeqCst);
        if self.config.fail_unsuppress {
            return Err(VoiceError::PermissionDenied("cannot unsuppress".to_string()));
        }
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

        tracing::info!(path = %audio.display(), "FakeVoiceTransport: playing");
        if let Ok(mut played) = self.played.lock() {
            played.push(audio.to_path_buf());
        }

        if self.config.play_duration_ms > 0 {
            self.playing.store(true, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(self.config.play_duration_ms)).await;
            self.playing.store(false, Ordering::SeqCst);
        }

        if self.config.fail_playback {
            return Err(VoiceError::Playback("simulated failure".to_string()));
        }
        Ok(())
    }
}
