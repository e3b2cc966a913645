//! Squawk - 新闻快讯播报机器人
//!
//! 任务拓扑:
//! - NewsFetcher: 轮询 -> 去重 -> 入队
//! - OutOfBandInjector: Unix socket -> 入队
//! - AnnouncementConsumer: 出队 -> 文字 + 语音
//! - VoiceKeeper: 保持语音连接

use std::sync::Arc;
use std::time::Duration;

use squawk::application::ports::{
    DestinationKind, NewsSourcePort, TextPosterPort, TtsEnginePort, VoiceDestination,
    VoiceTransportPort,
};
use squawk::config::{load_config, print_config, TtsProvider, VoiceTransportKind};
use squawk::domain::SeenSet;
use squawk::infrastructure::adapters::{
    ArtifactStorage, CommandVoiceTransport, CommandVoiceTransportConfig, DiscordTextPoster,
    DiscordTextPosterConfig, FakeTtsClient, FakeTtsClientConfig, FakeVoiceTransport,
    FakeVoiceTransportConfig, HttpTtsClient, HttpTtsClientConfig, NewsApiClient,
    NewsApiClientConfig,
};
use squawk::infrastructure::injector::{OutOfBandInjector, OutOfBandInjectorConfig};
use squawk::infrastructure::memory::{announcement_queue, VoiceSessionManager};
use squawk::infrastructure::worker::{
    AnnouncementConsumer, AnnouncementConsumerConfig, NewsFetcher, NewsFetcherConfig,
    VoiceKeeper, VoiceKeeperConfig,
};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},squawk={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Squawk - 新闻快讯播报");
    print_config(&config);

    // 音频临时目录，清理上次运行遗留的文件
    let storage = Arc::new(ArtifactStorage::new(&config.tts.artifact_dir).await?);
    if let Err(e) = storage.purge_stale().await {
        tracing::warn!(error = %e, "Failed to purge stale artifacts");
    }

    // 新闻源
    let news_source: Arc<dyn NewsSourcePort> = Arc::new(NewsApiClient::new(NewsApiClientConfig {
        endpoint: config.news.endpoint.clone(),
        api_key: config.news.api_key.clone(),
        country: config.news.country.clone(),
        category: config.news.category.clone(),
        page_size: config.news.page_size,
        timeout_secs: config.news.timeout_secs,
    })?);

    // 文字频道
    let text_poster: Arc<dyn TextPosterPort> =
        Arc::new(DiscordTextPoster::new(DiscordTextPosterConfig {
            api_base: config.discord.api_base.clone(),
            bot_token: config.discord.token.clone(),
            channel_id: config.discord.text_channel_id.clone(),
            footer: config.discord.footer.clone(),
            ..Default::default()
        })?);

    // TTS 引擎
    let tts_engine: Arc<dyn TtsEnginePort> = match config.tts.provider {
        TtsProvider::Elevenlabs => {
            let tts_config = HttpTtsClientConfig::new(&config.tts.url, &config.tts.api_key)
                .with_timeout(config.tts.timeout_secs);
            let client = HttpTtsClient::new(tts_config, storage.clone())?;
            if !client.health_check().await {
                tracing::warn!(url = %config.tts.url, "TTS health check failed, continuing");
            }
            Arc::new(client)
        }
        TtsProvider::Fake => {
            let fake_config = FakeTtsClientConfig {
                audio_file_path: config.tts.fake_audio_path.clone(),
                delay_ms: 0,
            };
            Arc::new(FakeTtsClient::new(fake_config, storage.clone())?)
        }
    };

    // 语音传输
    let destination_kind = DestinationKind::parse(&config.voice.kind);
    let voice_transport: Arc<dyn VoiceTransportPort> = match config.voice.transport {
        VoiceTransportKind::Command => Arc::new(CommandVoiceTransport::new(
            CommandVoiceTransportConfig {
                player: config.voice.player.clone(),
                player_args: config.voice.player_args.clone(),
                kind: destination_kind,
            },
        )),
        VoiceTransportKind::Fake => Arc::new(FakeVoiceTransport::new(FakeVoiceTransportConfig {
            kind: destination_kind,
            ..Default::default()
        })),
    };

    let voice = Arc::new(VoiceSessionManager::new(
        voice_transport,
        VoiceDestination::new(config.voice.destination.clone()),
        Duration::from_secs(config.voice.connect_timeout_secs),
    ));

    // 播报队列
    let (sender, receiver) = announcement_queue();
    let cancel = CancellationToken::new();
    let mut tasks = Vec::new();

    // 带外注入
    if config.injector.enabled {
        let injector = OutOfBandInjector::new(
            OutOfBandInjectorConfig {
                socket_path: config.injector.socket_path.clone(),
                dedup: config.injector.dedup,
                max_payload_bytes: config.injector.max_payload_bytes,
                read_timeout: Duration::from_secs(config.injector.read_timeout_secs),
            },
            sender.clone(),
        );
        let listener = injector.bind()?;
        tasks.push(tokio::spawn(injector.serve(listener, cancel.clone())));
    }

    // 启动 Worker
    let fetcher = NewsFetcher::new(
        NewsFetcherConfig {
            poll_interval: Duration::from_secs(config.news.poll_interval_secs),
            request_timeout: Duration::from_secs(config.news.timeout_secs),
        },
        news_source,
        SeenSet::with_capacity(config.news.seen_capacity),
        sender,
    );
    tasks.push(tokio::spawn(fetcher.run(cancel.clone())));

    let consumer = AnnouncementConsumer::new(
        AnnouncementConsumerConfig {
            voice_id: config.tts.voice_id.clone(),
            model_id: config.tts.model_id.clone(),
        },
        receiver,
        text_poster,
        tts_engine,
        voice.clone(),
    );
    tasks.push(tokio::spawn(consumer.run(cancel.clone())));

    let keeper = VoiceKeeper::new(
        VoiceKeeperConfig {
            retry_interval: Duration::from_secs(config.voice.retry_interval_secs),
            check_interval: Duration::from_secs(config.voice.check_interval_secs),
        },
        voice,
    );
    let keeper_cancel = cancel.clone();
    tasks.push(tokio::spawn(async move {
        keeper.run(keeper_cancel).await;
    }));

    tracing::info!("Squawk running, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Received shutdown signal");
    cancel.cancel();

    for task in tasks {
        if let Err(e) = task.await {
            tracing::warn!(error = %e, "Task terminated abnormally");
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
