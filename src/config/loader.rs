//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, TtsProvider};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `SQUAWK_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `SQUAWK_DISCORD__TOKEN=...`
/// - `SQUAWK_DISCORD__TEXT_CHANNEL_ID=123456789`
/// - `SQUAWK_NEWS__API_KEY=...`
/// - `SQUAWK_NEWS__POLL_INTERVAL_SECS=60`
/// - `SQUAWK_TTS__API_KEY=...`
/// - `SQUAWK_VOICE__PLAYER_ARGS="-nodisp -autoexit"`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let app_config = build_config(config_path)?;

    validate_config(&app_config)?;
    validate_credentials(&app_config)?;

    Ok(app_config)
}

/// 合并配置源并反序列化，不做校验
fn build_config(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 首先设置默认值（最低优先级）
    builder = builder
        .set_default("news.poll_interval_secs", 60)?
        .set_default("news.timeout_secs", 10)?
        .set_default("news.page_size", 10)?
        .set_default("tts.timeout_secs", 60)?
        .set_default("voice.connect_timeout_secs", 10)?
        .set_default("voice.retry_interval_secs", 10)?
        .set_default("voice.check_interval_secs", 30)?
        .set_default("injector.enabled", true)?
        .set_default("injector.socket_path", "/tmp/squawk.sock")?
        .set_default("log.level", "info")?;

    // 2. 添加配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 添加环境变量（最高优先级）
    // 前缀: SQUAWK_
    // 层级分隔符: __ (双下划线)
    builder = builder.add_source(
        Environment::with_prefix("SQUAWK")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(" ")
            .with_list_parse_key("voice.player_args"),
    );

    let config = builder.build()?;

    config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.news.poll_interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "News poll interval cannot be 0".to_string(),
        ));
    }

    if config.news.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "News request timeout cannot be 0".to_string(),
        ));
    }

    if !(1..=100).contains(&config.news.page_size) {
        return Err(ConfigError::ValidationError(format!(
            "News page size must be between 1 and 100, got {}",
            config.news.page_size
        )));
    }

    if config.news.endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "News endpoint cannot be empty".to_string(),
        ));
    }

    if config.discord.api_base.is_empty() {
        return Err(ConfigError::ValidationError(
            "Discord API base cannot be empty".to_string(),
        ));
    }

    if config.tts.provider == TtsProvider::Elevenlabs && config.tts.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "TTS URL cannot be empty".to_string(),
        ));
    }

    if config.tts.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "TTS timeout cannot be 0".to_string(),
        ));
    }

    if config.voice.connect_timeout_secs == 0
        || config.voice.retry_interval_secs == 0
        || config.voice.check_interval_secs == 0
    {
        return Err(ConfigError::ValidationError(
            "Voice timeouts and intervals cannot be 0".to_string(),
        ));
    }

    if config.injector.enabled && config.injector.socket_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError(
            "Injector socket path cannot be empty when injector is enabled".to_string(),
        ));
    }

    if config.injector.max_payload_bytes == 0 {
        return Err(ConfigError::ValidationError(
            "Injector max payload cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 验证外部服务凭据
fn validate_credentials(config: &AppConfig) -> Result<(), ConfigError> {
    let mut missing = Vec::new();

    if config.discord.token.is_empty() {
        missing.push("discord.token");
    }
    if config.discord.text_channel_id.is_empty() {
        missing.push("discord.text_channel_id");
    }
    if config.news.api_key.is_empty() {
        missing.push("news.api_key");
    }
    if config.tts.provider == TtsProvider::Elevenlabs && config.tts.api_key.is_empty() {
        missing.push("tts.api_key");
    }

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "Missing credentials: {}",
            missing.join(", ")
        )))
    }
}

/// 遮蔽密钥，只保留末 4 位
fn mask(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Discord Token: {}", mask(&config.discord.token));
    tracing::info!("Text Channel: {}", config.discord.text_channel_id);
    tracing::info!("News Endpoint: {}", config.news.endpoint);
    tracing::info!(
        "News Query: country={}, category={}, page_size={}",
        config.news.country,
        config.news.category,
        config.news.page_size
    );
    tracing::info!("News API Key: {}", mask(&config.news.api_key));
    tracing::info!("Poll Interval: {}s", config.news.poll_interval_secs);
    if config.news.seen_capacity > 0 {
        tracing::info!("Seen Capacity: {}", config.news.seen_capacity);
    } else {
        tracing::info!("Seen Capacity: unbounded");
    }
    tracing::info!("TTS Provider: {:?}", config.tts.provider);
    tracing::info!("TTS URL: {}", config.tts.url);
    tracing::info!("TTS API Key: {}", mask(&config.tts.api_key));
    tracing::info!("TTS Voice: {} ({})", config.tts.voice_id, config.tts.model_id);
    tracing::info!("Artifact Directory: {:?}", config.tts.artifact_dir);
    tracing::info!(
        "Voice: transport={:?}, destination={}, kind={}",
        config.voice.transport,
        config.voice.destination,
        config.voice.kind
    );
    tracing::info!("Injector Enabled: {}", config.injector.enabled);
    if config.injector.enabled {
        tracing::info!("Injector Socket: {:?}", config.injector.socket_path);
        tracing::info!("Injector Dedup: {:?}", config.injector.dedup);
    }
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
