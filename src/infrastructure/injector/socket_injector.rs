//! Out-of-band Injector - 本地 Unix socket 注入
//!
//! 协议：客户端连接后写入 UTF-8 标题，关闭写端即视为一条消息结束。
//! 每个连接只读一条，处理完毕立即关闭。
//! 单个连接的任何错误都不会影响监听本身。

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;
use tokio::io::AsyncReadExt;
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;

use crate::config::InjectorDedup;
use crate::domain::{HeadlineItem, SeenSet};
use crate::infrastructure::memory::AnnouncementSender;

/// 注入错误
#[derive(Debug, Error)]
pub enum InjectError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Read timed out")]
    Timeout,

    #[error("Payload exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Payload is not valid UTF-8")]
    NotUtf8,

    #[error("Empty payload")]
    Empty,
}

/// 注入器配置
#[derive(Debug, Clone)]
pub struct OutOfBandInjectorConfig {
    pub socket_path: PathBuf,
    pub dedup: InjectorDedup,
    pub max_payload_bytes: usize,
    pub read_timeout: Duration,
}

impl Default for OutOfBandInjectorConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from("/tmp/squawk.sock"),
            dedup: InjectorDedup::Off,
            max_payload_bytes: 4096,
            read_timeout: Duration::from_secs(5),
        }
    }
}

/// 单条注入的处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    Enqueued,
    Duplicate,
    QueueClosed,
}

pub struct OutOfBandInjector {
    config: OutOfBandInjectorConfig,
    sender: AnnouncementSender,
    /// 仅 isolated 策略下存在，与拉取器的集合互不相干
    seen: Option<SeenSet>,
}

impl OutOfBandInjector {
    pub fn new(config: OutOfBandInjectorConfig, sender: AnnouncementSender) -> Self {
        let seen = match config.dedup {
            InjectorDedup::Off => None,
            InjectorDedup::Isolated => Some(SeenSet::unbounded()),
        };
        Self {
            config,
            sender,
            seen,
        }
    }

    /// 绑定 socket，遗留的同名文件先删除
    pub fn bind(&self) -> Result<UnixListener, InjectError> {
        let path = &self.config.socket_path;
        match std::fs::remove_file(path) {
            Ok(()) => tracing::debug!(path = %path.display(), "Removed stale socket"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let listener = UnixListener::bind(path)?;
        tracing::info!(path = %path.display(), "Injector listening");
        Ok(listener)
    }

    /// 绑定并服务，直到取消
    pub async fn run(self, cancel: CancellationToken) -> Result<(), InjectError> {
        let listener = self.bind()?;
        self.serve(listener, cancel).await;
        Ok(())
    }

    /// 逐个处理连接，直到取消；退出时删除 socket 文件
    pub async fn serve(mut self, listener: UnixListener, cancel: CancellationToken) {
        loop {
            let accepted = tokio::select! {
                _ = cancel.cancelled() => break,
                accepted = listener.accept() => accepted,
            };

            let stream = match accepted {
                Ok((stream, _addr)) => stream,
                Err(e) => {
                    tracing::warn!(error = %e, "Injector accept error");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    continue;
                }
            };

            match self.handle_connection(stream).await {
                Ok(InjectOutcome::QueueClosed) => {
                    tracing::info!("Announcement queue closed, injector stopping");
                    break;
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(error = %e, "Rejected injected message"),
            }
        }

        drop(listener);
        if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(error = %e, "Failed to remove injector socket");
            }
        }
        tracing::info!("Injector stopped");
    }

    async fn handle_connection(
        &mut self,
        mut stream: UnixStream,
    ) -> Result<InjectOutcome, InjectError> {
        let title = read_title(
            &mut stream,
            self.config.max_payload_bytes,
            self.config.read_timeout,
        )
        .await?;
        Ok(self.inject(title))
    }

    /// 把标题包装成无链接、无时间戳的条目后入队
    pub fn inject(&mut self, title: String) -> InjectOutcome {
        let item = HeadlineItem::injected(title);

        if let Some(seen) = self.seen.as_mut() {
            if !seen.insert(item.identity()) {
                tracing::debug!(title = %item.title(), "Duplicate injected headline");
                return InjectOutcome::Duplicate;
            }
        }

        tracing::info!(title = %item.title(), "Injected headline");
        match self.sender.enqueue(item) {
            Ok(()) => InjectOutcome::Enqueued,
            Err(_) => InjectOutcome::QueueClosed,
        }
    }
}

/// 读取一条消息，读到 EOF 为止
async fn read_title(
    stream: &mut UnixStream,
    max_bytes: usize,
    timeout: Duration,
) -> Result<String, InjectError> {
    let mut buf = Vec::new();
    let mut limited = stream.take(max_bytes as u64 + 1);

    tokio::time::timeout(timeout, limited.read_to_end(&mut buf))
        .await
        .map_err(|_| InjectError::Timeout)??;

    if buf.len() > max_bytes {
        return Err(InjectError::TooLarge(max_bytes));
    }

    let text = String::from_utf8(buf).map_err(|_| InjectError::NotUtf8)?;
    let title = text.trim();
    if title.is_empty() {
        return Err(InjectError::Empty);
    }
    Ok(title.to_string())
}
