//! Squawk - 新闻快讯播报机器人
//!
//! 架构设计: Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Headline: 新闻条目、去重标识、已见集合
//! - Pronunciation: 股票代码等缩写的逐字母读法
//!
//! 应用层 (application/):
//! - Ports: 端口定义（NewsSource, TextPoster, TtsEngine, VoiceTransport, AudioArtifact）
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: NewsAPI, Discord 文字频道, ElevenLabs TTS, 语音传输, 音频临时目录
//! - Memory: 播报队列, 语音会话状态机
//! - Worker: NewsFetcher, AnnouncementConsumer, VoiceKeeper
//! - Injector: 本地 Unix socket 注入

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
