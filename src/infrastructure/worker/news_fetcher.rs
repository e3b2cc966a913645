//! News Fetcher - 去重轮询
//!
//! 按固定间隔拉取新闻，过滤已见标题后入队。任何拉取错误只记录日志，
//! 循环永不因错误退出。

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::application::ports::NewsSourcePort;
use crate::domain::SeenSet;
use crate::infrastructure::memory::{AnnouncementSender, QueueClosed};

/// Fetcher 配置
#[derive(Debug, Clone)]
pub struct NewsFetcherConfig {
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 单次请求超时
    pub request_timeout: Duration,
}

impl Default for NewsFetcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(60),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// 新闻拉取器
///
/// 独占持有已见集合
pub struct NewsFetcher {
    config: NewsFetcherConfig,
    source: Arc<dyn NewsSourcePort>,
    seen: SeenSet,
    sender: AnnouncementSender,
}

impl NewsFetcher {
    pub fn new(
        config: NewsFetcherConfig,
        source: Arc<dyn NewsSourcePort>,
        seen: SeenSet,
        sender: AnnouncementSender,
    ) -> Self {
        Self {
            config,
            source,
            seen,
            sender,
        }
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// 执行一次拉取，返回入队数量
    pub async fn poll_once(&mut self) -> usize {
        let result = tokio::time::timeout(self.config.request_timeout, self.source.poll()).await;

        let items = match result {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "News fetch error");
                return 0;
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = self.config.request_timeout.as_secs(),
                    "News fetch timed out"
                );
                return 0;
            }
        };

        let mut enqueued = 0;
        for item in items {
            if !self.seen.insert(item.identity()) {
                tracing::trace!(title = %item.title(), "Already seen, skipping");
                continue;
            }

            tracing::debug!(title = %item.title(), "New headline");
            if let Err(QueueClosed(item)) = self.sender.enqueue(item) {
                tracing::warn!(title = %item.title(), "Queue closed, dropping headline");
                break;
            }
            enqueued += 1;
        }

        if enqueued > 0 {
            tracing::info!(
                enqueued = enqueued,
                seen = self.seen.len(),
                "Headlines enqueued"
            );
        }
        enqueued
    }

    /// 启动拉取循环，直到取消
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs(),
            "NewsFetcher started"
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.poll_once() => {}
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("NewsFetcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NewsError;
    use crate::domain::HeadlineItem;
    use crate::infrastructure::memory::announcement_queue;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// 按顺序返回预设结果的新闻源
    struct ScriptedSource {
        responses: Mutex<VecDeque<Result<Vec<HeadlineItem>, NewsError>>>,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<Vec<HeadlineItem>, NewsError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into()),
            })
        }
    }

    #[async_trait]
    impl NewsSourcePort for ScriptedSource {
        async fn poll(&self) -> Result<Vec<HeadlineItem>, NewsError> {
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    /// 永不返回的新闻源
    struct HangingSource;

    #[async_trait]
    impl NewsSourcePort for HangingSource {
        async fn poll(&self) -> Result<Vec<HeadlineItem>, NewsError> {
            std::future::pending().await
        }
    }

    fn headlines(titles: &[&str]) -> Vec<HeadlineItem> {
        titles
            .iter()
            .map(|t| HeadlineItem::new(*t, Some(format!("https://news/{}", t)), None))
            .collect()
    }

    fn config() -> NewsFetcherConfig {
        NewsFetcherConfig {
            poll_interval: Duration::from_millis(10),
            request_timeout: Duration::from_millis(100),
        }
    }

    #[tokio::test]
    async fn test_overlapping_polls_enqueue_each_title_once() {
        let source = ScriptedSource::new(vec![
            Ok(headlines(&["A", "B", "C"])),
            Ok(headlines(&["B", "C", "D"])),
            Ok(headlines(&["A", "D", "E", "E"])),
        ]);
        let (tx, mut rx) = announcement_queue();
        let mut fetcher = NewsFetcher::new(config(), source, SeenSet::unbounded(), tx);

        assert_eq!(fetcher.poll_once().await, 3);
        assert_eq!(fetcher.poll_once().await, 1);
        assert_eq!(fetcher.poll_once().await, 1);

        let mut titles = Vec::new();
        while let Some(item) = rx.try_next() {
            titles.push(item.title().to_string());
        }
        assert_eq!(titles, vec!["A", "B", "C", "D", "E"]);
        assert_eq!(fetcher.seen().len(), 5);
    }

    #[tokio::test]
    async fn test_item_fields_are_preserved() {
        let source = ScriptedSource::new(vec![Ok(vec![HeadlineItem::new(
            "Fed holds rates",
            Some("https://a".to_string()),
            Some("2024-05-01T12:00:00Z".to_string()),
        )])]);
        let (tx, mut rx) = announcement_queue();
        let mut fetcher = NewsFetcher::new(config(), source, SeenSet::unbounded(), tx);

        fetcher.poll_once().await;
        let item = rx.try_next().unwrap();
        assert_eq!(item.url(), Some("https://a"));
        assert_eq!(item.published_at(), Some("2024-05-01T12:00:00Z"));
    }

    #[tokio::test]
    async fn test_empty_poll_is_noop() {
        let source = ScriptedSource::new(vec![Ok(Vec::new())]);
        let (tx, rx) = announcement_queue();
        let mut fetcher = NewsFetcher::new(config(), source, SeenSet::unbounded(), tx);

        assert_eq!(fetcher.poll_once().await, 0);
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn test_errors_are_swallowed() {
        let source = ScriptedSource::new(vec![
            Err(NewsError::NetworkError("connection reset".to_string())),
            Err(NewsError::InvalidResponse("not json".to_string())),
            Ok(headlines(&["A"])),
        ]);
        let (tx, rx) = announcement_queue();
        let mut fetcher = NewsFetcher::new(config(), source, SeenSet::unbounded(), tx);

        assert_eq!(fetcher.poll_once().await, 0);
        assert_eq!(fetcher.poll_once().await, 0);
        assert_eq!(fetcher.poll_once().await, 1);
        assert_eq!(rx.len(), 1);
    }

    #[tokio::test]
    async fn test_poll_timeout() {
        let (tx, rx) = announcement_queue();
        let mut fetcher =
            NewsFetcher::new(config(), Arc::new(HangingSource), SeenSet::unbounded(), tx);

        assert_eq!(fetcher.poll_once().await, 0);
        assert!(rx.is_empty());
    }

    #[tokio::test]
    async fn test_capacity_allows_evicted_titles_again() {
        let source = ScriptedSource::new(vec![
            Ok(headlines(&["A", "B"])),
            Ok(headlines(&["C"])),
            Ok(headlines(&["A"])),
        ]);
        let (tx, rx) = announcement_queue();
        let mut fetcher = NewsFetcher::new(config(), source, SeenSet::with_capacity(2), tx);

        fetcher.poll_once().await;
        fetcher.poll_once().await;
        // A 已被淘汰
        assert_eq!(fetcher.poll_once().await, 1);
        assert_eq!(rx.len(), 4);
    }

    #[tokio::test]
    async fn test_run_loops_until_cancelled() {
        let source = ScriptedSource::new(vec![
            Err(NewsError::Timeout),
            Ok(headlines(&["A", "B"])),
            Ok(headlines(&["B", "C"])),
        ]);
        let (tx, mut rx) = announcement_queue();
        let fetcher = NewsFetcher::new(config(), source, SeenSet::unbounded(), tx);

        let cancel = CancellationToken::new();
        let task = tokio::spawn(fetcher.run(cancel.clone()));

        let mut titles = Vec::new();
        while titles.len() < 3 {
            let item = tokio::time::timeout(Duration::from_secs(5), rx.next())
                .await
                .unwrap()
                .unwrap();
            titles.push(item.title().to_string());
        }
        assert_eq!(titles, vec!["A", "B", "C"]);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
    }
}
