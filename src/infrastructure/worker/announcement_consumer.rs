//! Announcement Consumer - 播报流水线
//!
//! 逐条出队：发布文字 -> 合成语音 -> 有可用语音句柄时播放 -> 释放音频产物。
//! 文字与语音两条路径相互独立，任一失败都不影响另一条，也不中断循环。

use chrono::{DateTime, NaiveDateTime, Utc};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    AudioArtifact, HeadlinePost, SynthesisRequest, TextPosterPort, TtsEnginePort,
};
use crate::domain::{to_ssml, HeadlineItem};
use crate::infrastructure::memory::{AnnouncementReceiver, VoiceSessionManager};

/// Consumer 配置
#[derive(Debug, Clone)]
pub struct AnnouncementConsumerConfig {
    /// 合成音色
    pub voice_id: String,
    /// 合成模型
    pub model_id: String,
}

impl Default for AnnouncementConsumerConfig {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_multilingual_v2".to_string(),
        }
    }
}

/// 单条播报的结果
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnouncementOutcome {
    pub posted: bool,
    pub synthesized: bool,
    pub played: bool,
}

/// 解析展示用时间戳
///
/// 接受 RFC 3339（含 `Z`）以及不带时区的 ISO 8601（按 UTC 处理）；
/// 缺失或无法解析时使用当前时间
pub fn resolve_timestamp(raw: Option<&str>) -> DateTime<Utc> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Utc::now();
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return ts.with_timezone(&Utc);
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return naive.and_utc();
    }

    tracing::warn!(published_at = %raw, "Malformed publish timestamp, using now");
    Utc::now()
}

/// 播报消费者
pub struct AnnouncementConsumer {
    config: AnnouncementConsumerConfig,
    receiver: AnnouncementReceiver,
    text_poster: Arc<dyn TextPosterPort>,
    tts_engine: Arc<dyn TtsEnginePort>,
    voice: Arc<VoiceSessionManager>,
}

impl AnnouncementConsumer {
    pub fn new(
        config: AnnouncementConsumerConfig,
        receiver: AnnouncementReceiver,
        text_poster: Arc<dyn TextPosterPort>,
        tts_engine: Arc<dyn TtsEnginePort>,
        voice: Arc<VoiceSessionManager>,
    ) -> Self {
        Self {
            config,
            receiver,
            text_poster,
            tts_engine,
            voice,
        }
    }

    /// 启动消费循环，直到取消或队列关闭
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("AnnouncementConsumer started");

        loop {
            let item = tokio::select! {
                _ = cancel.cancelled() => break,
                item = self.receiver.next() => item,
            };

            let Some(item) = item else {
                tracing::info!("Announcement queue closed");
                break;
            };

            // 取消时丢弃进行中的播报，产物由 Drop 删除
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.process_item(item) => {}
            }
        }

        tracing::info!("AnnouncementConsumer stopped");
    }

    /// 处理单条播报
    pub async fn process_item(&self, item: HeadlineItem) -> AnnouncementOutcome {
        let mut outcome = AnnouncementOutcome::default();

        // 1) 发布文字
        let post = HeadlinePost {
            title: item.title().to_string(),
            url: item.url().map(str::to_string),
            timestamp: resolve_timestamp(item.published_at()),
        };
        match self.text_poster.post(&post).await {
            Ok(()) => outcome.posted = true,
            Err(e) => {
                tracing::warn!(title = %item.title(), error = %e, "Failed to post headline");
            }
        }

        // 2) 合成语音
        let request = SynthesisRequest {
            text: to_ssml(item.title()),
            voice_id: self.config.voice_id.clone(),
            model_id: self.config.model_id.clone(),
        };
        let artifact = match self.tts_engine.synthesize(request).await {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!(title = %item.title(), error = %e, "TTS synthesis failed");
                return outcome;
            }
        };
        outcome.synthesized = true;

        // 3) 播放，随后无论结果如何都释放产物
        outcome.played = self.play(&item, &artifact).await;

        if let Err(e) = artifact.release().await {
            tracing::warn!(error = %e, "Failed to release artifact");
        }

        tracing::info!(
            title = %item.title(),
            posted = outcome.posted,
            played = outcome.played,
            "Headline announced"
        );
        outcome
    }

    async fn play(&self, item: &HeadlineItem, artifact: &AudioArtifact) -> bool {
        let handle = match self.voice.ensure_connected().await {
            Ok(handle) => handle,
            Err(reason) => {
                tracing::info!(title = %item.title(), reason = %reason, "Voice unavailable, skipping playback");
                return false;
            }
        };

        if handle.is_playing() {
            tracing::info!(title = %item.title(), "Voice busy, discarding audio");
            return false;
        }

        match handle.play(artifact).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(title = %item.title(), error = %e, "Playback failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        DestinationKind, PostError, TtsError, VoiceDestination,
    };
    use crate::infrastructure::adapters::{
        ArtifactStorage, FakeTtsClient, FakeTtsClientConfig, FakeVoiceTransport,
        FakeVoiceTransportConfig,
    };
    use crate::infrastructure::memory::announcement_queue;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    /// 记录所有发布内容
    #[derive(Default)]
    struct RecordingPoster {
        posts: Mutex<Vec<HeadlinePost>>,
        fail: bool,
    }

    #[async_trait]
    impl TextPosterPort for RecordingPoster {
        async fn post(&self, post: &HeadlinePost) -> Result<(), PostError> {
            self.posts.lock().unwrap().push(post.clone());
            if self.fail {
                return Err(PostError::Rejected("HTTP 403".to_string()));
            }
            Ok(())
        }
    }

    /// 总是失败的 TTS
    struct FailingTts;

    #[async_trait]
    impl TtsEnginePort for FailingTts {
        async fn synthesize(&self, _request: SynthesisRequest) -> Result<AudioArtifact, TtsError> {
            Err(TtsError::ServiceError("HTTP 500".to_string()))
        }
    }

    /// 记录合成文本的 TTS
    struct RecordingTts {
        inner: FakeTtsClient,
        texts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TtsEnginePort for RecordingTts {
        async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioArtifact, TtsError> {
            self.texts.lock().unwrap().push(request.text.clone());
            self.inner.synthesize(request).await
        }
    }

    struct Harness {
        dir: TempDir,
        poster: Arc<RecordingPoster>,
        transport: Arc<FakeVoiceTransport>,
        consumer: AnnouncementConsumer,
    }

    impl Harness {
        fn artifact_count(&self) -> usize {
            std::fs::read_dir(self.dir.path()).unwrap().count()
        }
    }

    async fn harness(
        poster: RecordingPoster,
        voice: FakeVoiceTransportConfig,
        tts: Option<Arc<dyn TtsEnginePort>>,
    ) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ArtifactStorage::new(dir.path()).await.unwrap());
        let tts: Arc<dyn TtsEnginePort> = match tts {
            Some(tts) => tts,
            None => Arc::new(FakeTtsClient::new(FakeTtsClientConfig::default(), storage).unwrap()),
        };

        let poster = Arc::new(poster);
        let transport = Arc::new(FakeVoiceTransport::new(voice));
        let manager = Arc::new(VoiceSessionManager::new(
            transport.clone(),
            VoiceDestination::new("voice-1"),
            Duration::from_millis(200),
        ));
        let (_tx, rx) = announcement_queue();

        let consumer = AnnouncementConsumer::new(
            AnnouncementConsumerConfig::default(),
            rx,
            poster.clone(),
            tts,
            manager,
        );

        Harness {
            dir,
            poster,
            transport,
            consumer,
        }
    }

    #[test]
    fn test_resolve_timestamp() {
        let ts = resolve_timestamp(Some("2024-05-01T12:30:00Z"));
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");

        let ts = resolve_timestamp(Some("2024-05-01T14:30:00+02:00"));
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");

        let ts = resolve_timestamp(Some("2024-05-01T12:30:00"));
        assert_eq!(ts.to_rfc3339(), "2024-05-01T12:30:00+00:00");
    }

    #[test]
    fn test_malformed_timestamp_falls_back_to_now() {
        for raw in [Some("not-a-date"), Some(""), None] {
            let ts = resolve_timestamp(raw);
            let drift = (Utc::now() - ts).num_seconds().abs();
            assert!(drift < 5, "timestamp {:?} drifted {}s", raw, drift);
        }
    }

    #[tokio::test]
    async fn test_full_announcement_plays_and_releases() {
        let h = harness(RecordingPoster::default(), FakeVoiceTransportConfig::default(), None).await;

        let outcome = h
            .consumer
            .process_item(HeadlineItem::new(
                "NVDA beats estimates",
                Some("https://a".to_string()),
                Some("2024-05-01T12:00:00Z".to_string()),
            ))
            .await;

        assert_eq!(
            outcome,
            AnnouncementOutcome {
                posted: true,
                synthesized: true,
                played: true
            }
        );
        let posts = h.poster.posts.lock().unwrap().clone();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "NVDA beats estimates");
        assert_eq!(posts[0].url.as_deref(), Some("https://a"));
        assert_eq!(posts[0].timestamp.to_rfc3339(), "2024-05-01T12:00:00+00:00");

        assert_eq!(h.transport.played().len(), 1);
        assert_eq!(h.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_input_spells_tickers() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ArtifactStorage::new(dir.path()).await.unwrap());
        let tts = Arc::new(RecordingTts {
            inner: FakeTtsClient::new(FakeTtsClientConfig::default(), storage).unwrap(),
            texts: Mutex::new(Vec::new()),
        });
        let engine: Arc<dyn TtsEnginePort> = tts.clone();
        let h = harness(
            RecordingPoster::default(),
            FakeVoiceTransportConfig::default(),
            Some(engine),
        )
        .await;

        h.consumer
            .process_item(HeadlineItem::injected("NVDA and Nvidia"))
            .await;

        assert_eq!(
            tts.texts.lock().unwrap().clone(),
            vec!["<speak>N-V-D-A and Nvidia</speak>".to_string()]
        );
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_voice_still_posts_text() {
        let h = harness(
            RecordingPoster::default(),
            FakeVoiceTransportConfig {
                fail_connect: true,
                ..Default::default()
            },
            None,
        )
        .await;

        for title in ["One", "Two", "Three"] {
            let outcome = h.consumer.process_item(HeadlineItem::injected(title)).await;
            assert!(outcome.posted);
            assert!(outcome.synthesized);
            assert!(!outcome.played);
        }

        assert_eq!(h.poster.posts.lock().unwrap().len(), 3);
        assert!(h.transport.played().is_empty());
        assert_eq!(h.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_misconfigured_voice_still_posts_text() {
        let h = harness(
            RecordingPoster::default(),
            FakeVoiceTransportConfig {
                kind: DestinationKind::Other("text".to_string()),
                ..Default::default()
            },
            None,
        )
        .await;

        let outcome = h.consumer.process_item(HeadlineItem::injected("One")).await;
        assert!(outcome.posted);
        assert!(!outcome.played);
        assert_eq!(h.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_busy_voice_discards_artifact() {
        let h = harness(RecordingPoster::default(), FakeVoiceTransportConfig::default(), None).await;
        h.transport.set_busy(true);

        let outcome = h.consumer.process_item(HeadlineItem::injected("Busy")).await;
        assert!(outcome.synthesized);
        assert!(!outcome.played);
        assert!(h.transport.played().is_empty());
        assert_eq!(h.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_playback_failure_still_releases_artifact() {
        let h = harness(
            RecordingPoster::default(),
            FakeVoiceTransportConfig {
                fail_playback: true,
                ..Default::default()
            },
            None,
        )
        .await;

        let outcome = h.consumer.process_item(HeadlineItem::injected("Boom")).await;
        assert!(outcome.synthesized);
        assert!(!outcome.played);
        assert_eq!(h.transport.played().len(), 1);
        assert_eq!(h.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_post_failure_does_not_stop_speech() {
        let h = harness(
            RecordingPoster {
                fail: true,
                ..Default::default()
            },
            FakeVoiceTransportConfig::default(),
            None,
        )
        .await;

        let outcome = h.consumer.process_item(HeadlineItem::injected("Still spoken")).await;
        assert!(!outcome.posted);
        assert!(outcome.played);
        assert_eq!(h.artifact_count(), 0);
    }

    #[tokio::test]
    async fn test_synthesis_failure_skips_playback() {
        let h = harness(
            RecordingPoster::default(),
            FakeVoiceTransportConfig::default(),
            Some(Arc::new(FailingTts) as Arc<dyn TtsEnginePort>),
        )
        .await;

        let outcome = h.consumer.process_item(HeadlineItem::injected("Silent")).await;
        assert!(outcome.posted);
        assert!(!outcome.synthesized);
        assert!(!outcome.played);
        assert!(h.transport.played().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_timestamp_posts_with_now() {
        let h = harness(RecordingPoster::default(), FakeVoiceTransportConfig::default(), None).await;

        h.consumer
            .process_item(HeadlineItem::new("Odd", None, Some("not-a-date".to_string())))
            .await;

        let posts = h.poster.posts.lock().unwrap().clone();
        let drift = (Utc::now() - posts[0].timestamp).num_seconds().abs();
        assert!(drift < 5);
    }

    #[tokio::test]
    async fn test_run_consumes_in_order_until_cancelled() {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(ArtifactStorage::new(dir.path()).await.unwrap());
        let tts = Arc::new(FakeTtsClient::new(FakeTtsClientConfig::default(), storage).unwrap());
        let poster = Arc::new(RecordingPoster::default());
        let transport = Arc::new(FakeVoiceTransport::new(FakeVoiceTransportConfig::default()));
        let manager = Arc::new(VoiceSessionManager::new(
            transport.clone(),
            VoiceDestination::new("voice-1"),
            Duration::from_millis(200),
        ));
        let (tx, rx) = announcement_queue();
        let consumer = AnnouncementConsumer::new(
            AnnouncementConsumerConfig::default(),
            rx,
            poster.clone(),
            tts,
            manager,
        );

        let cancel = CancellationToken::new();
        let task = tokio::spawn(consumer.run(cancel.clone()));

        for title in ["first", "second", "third"] {
            tx.enqueue(HeadlineItem::injected(title)).unwrap();
        }

        for _ in 0..200 {
            if transport.played().len() == 3 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let titles: Vec<String> = poster
            .posts
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.title.clone())
            .collect();
        assert_eq!(titles, vec!["first", "second", "third"]);
        assert_eq!(transport.played().len(), 3);

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
