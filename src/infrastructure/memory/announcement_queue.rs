//! Announcement Queue - 播报队列
//!
//! 无界、按插入顺序、单消费者的 FIFO。Fetcher 与 Injector 各持有一个
//! 发送端，入队不阻塞；唯一的 Consumer 持有接收端。

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::HeadlineItem;

/// 接收端已关闭（只在关闭流程中出现）
#[derive(Debug, Error)]
#[error("Announcement queue closed")]
pub struct QueueClosed(pub HeadlineItem);

/// 创建播报队列
pub fn announcement_queue() -> (AnnouncementSender, AnnouncementReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (AnnouncementSender { tx }, AnnouncementReceiver { rx })
}

/// 队列发送端
#[derive(Debug, Clone)]
pub struct AnnouncementSender {
    tx: mpsc::UnboundedSender<HeadlineItem>,
}

impl AnnouncementSender {
    /// 入队，不阻塞
    pub fn enqueue(&self, item: HeadlineItem) -> Result<(), QueueClosed> {
        self.tx.send(item).map_err(|e| QueueClosed(e.0))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// 队列接收端
#[derive(Debug)]
pub struct AnnouncementReceiver {
    rx: mpsc::UnboundedReceiver<HeadlineItem>,
}

impl AnnouncementReceiver {
    /// 等待下一条；所有发送端都已释放时返回 None
    pub async fn next(&mut self) -> Option<HeadlineItem> {
        self.rx.recv().await
    }

    /// 不等待地取一条
    pub fn try_next(&mut self) -> Option<HeadlineItem> {
        self.rx.try_recv().ok()
    }

    /// 当前排队数量
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
