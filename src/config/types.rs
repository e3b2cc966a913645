//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Discord 文字频道配置
    #[serde(default)]
    pub discord: DiscordConfig,

    /// 新闻拉取配置
    #[serde(default)]
    pub news: NewsConfig,

    /// TTS 引擎配置
    #[serde(default)]
    pub tts: TtsConfig,

    /// 语音会话配置
    #[serde(default)]
    pub voice: VoiceConfig,

    /// 带外注入配置
    #[serde(default)]
    pub injector: InjectorConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// Discord 配置
#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot Token
    #[serde(default)]
    pub token: String,

    /// 发布标题的文字频道 ID
    #[serde(default)]
    pub text_channel_id: String,

    /// REST API 基础 URL
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,

    /// Embed 页脚文字
    #[serde(default = "default_footer")]
    pub footer: String,
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v10".to_string()
}

fn default_footer() -> String {
    "NewsAPI.org".to_string()
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            text_channel_id: String::new(),
            api_base: default_discord_api_base(),
            footer: default_footer(),
        }
    }
}

/// 新闻拉取配置
#[derive(Debug, Clone, Deserialize)]
pub struct NewsConfig {
    /// NewsAPI Key
    #[serde(default)]
    pub api_key: String,

    /// top-headlines 端点
    #[serde(default = "default_news_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_country")]
    pub country: String,

    #[serde(default = "default_category")]
    pub category: String,

    /// 每次拉取条数
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// 轮询间隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// 请求超时时间（秒）
    #[serde(default = "default_news_timeout")]
    pub timeout_secs: u64,

    /// 已见集合容量，0 表示不限制
    #[serde(default)]
    pub seen_capacity: usize,
}

fn default_news_endpoint() -> String {
    "https://newsapi.org/v2/top-headlines".to_string()
}

fn default_country() -> String {
    "us".to_string()
}

fn default_category() -> String {
    "business".to_string()
}

fn default_page_size() -> u32 {
    10
}

fn default_poll_interval() -> u64 {
    60
}

fn default_news_timeout() -> u64 {
    10
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            endpoint: default_news_endpoint(),
            country: default_country(),
            category: default_category(),
            page_size: default_page_size(),
            poll_interval_secs: default_poll_interval(),
            timeout_secs: default_news_timeout(),
            seen_capacity: 0,
        }
    }
}

/// TTS 提供方
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    #[default]
    Elevenlabs,
    /// 返回固定音频，不调用外部服务
    Fake,
}

/// TTS 引擎配置
#[derive(Debug, Clone, Deserialize)]
pub struct TtsConfig {
    #[serde(default)]
    pub provider: TtsProvider,

    /// ElevenLabs API Key
    #[serde(default)]
    pub api_key: String,

    /// TTS 服务基础 URL
    #[serde(default = "default_tts_url")]
    pub url: String,

    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_tts_timeout")]
    pub timeout_secs: u64,

    /// 合成音频临时目录
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: PathBuf,

    /// provider = fake 时使用的音频文件
    #[serde(default)]
    pub fake_audio_path: Option<PathBuf>,
}

fn default_tts_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_voice_id() -> String {
    "21m00Tcm4TlvDq8ikWAM".to_string()
}

fn default_model_id() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_tts_timeout() -> u64 {
    60
}

fn default_artifact_dir() -> PathBuf {
    std::env::temp_dir().join("squawk")
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            api_key: String::new(),
            url: default_tts_url(),
            voice_id: default_voice_id(),
            model_id: default_model_id(),
            timeout_secs: default_tts_timeout(),
            artifact_dir: default_artifact_dir(),
            fake_audio_path: None,
        }
    }
}

/// 语音传输实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceTransportKind {
    /// 通过外部播放器进程输出
    #[default]
    Command,
    /// 只记录日志，不实际发声
    Fake,
}

/// 语音会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub transport: VoiceTransportKind,

    /// 目标 ID
    #[serde(default = "default_destination")]
    pub destination: String,

    /// 目标类型: voice, stage
    #[serde(default = "default_destination_kind")]
    pub kind: String,

    /// 播放器可执行文件
    #[serde(default = "default_player")]
    pub player: String,

    /// 播放器参数，音频路径追加在最后
    #[serde(default = "default_player_args")]
    pub player_args: Vec<String>,

    /// 连接超时时间（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// 未连接时的重试间隔（秒）
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,

    /// 已连接时的检查间隔（秒）
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,
}

fn default_destination() -> String {
    "default".to_string()
}

fn default_destination_kind() -> String {
    "voice".to_string()
}

fn default_player() -> String {
    "ffplay".to_string()
}

fn default_player_args() -> Vec<String> {
    ["-nodisp", "-autoexit", "-loglevel", "quiet"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_retry_interval() -> u64 {
    10
}

fn default_check_interval() -> u64 {
    30
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            transport: VoiceTransportKind::default(),
            destination: default_destination(),
            kind: default_destination_kind(),
            player: default_player(),
            player_args: default_player_args(),
            connect_timeout_secs: default_connect_timeout(),
            retry_interval_secs: default_retry_interval(),
            check_interval_secs: default_check_interval(),
        }
    }
}

/// 注入条目的去重策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectorDedup {
    /// 不去重，每次注入都播报
    #[default]
    Off,
    /// 注入器维护自己的已见集合
    Isolated,
}

/// 带外注入配置
#[derive(Debug, Clone, Deserialize)]
pub struct InjectorConfig {
    #[serde(default = "default_injector_enabled")]
    pub enabled: bool,

    /// Unix socket 路径
    #[serde(default = "default_socket_path")]
    pub socket_path: PathBuf,

    #[serde(default)]
    pub dedup: InjectorDedup,

    /// 单条消息最大字节数
    #[serde(default = "default_max_payload")]
    pub max_payload_bytes: usize,

    /// 单个连接读取超时（秒）
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
}

fn default_injector_enabled() -> bool {
    true
}

fn default_socket_path() -> PathBuf {
    PathBuf::from("/tmp/squawk.sock")
}

fn default_max_payload() -> usize {
    4096
}

fn default_read_timeout() -> u64 {
    5
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self {
            enabled: default_injector_enabled(),
            socket_path: default_socket_path(),
            dedup: InjectorDedup::default(),
            max_payload_bytes: default_max_payload(),
            read_timeout_secs: default_read_timeout(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
