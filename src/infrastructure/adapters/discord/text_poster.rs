//! Discord Text Poster - 以 Embed 形式发布标题
//!
//! POST {api_base}/channels/{channel_id}/messages
//! Header: Authorization: Bot <token>

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::application::ports::{HeadlinePost, PostError, TextPosterPort};

/// Discord 标题上限
const MAX_EMBED_TITLE_LEN: usize = 256;

#[derive(Debug, Serialize)]
struct MessageBody {
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    timestamp: String,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

/// Discord 发布器配置
#[derive(Debug, Clone)]
pub struct DiscordTextPosterConfig {
    pub api_base: String,
    pub bot_token: String,
    pub channel_id: String,
    pub footer: String,
    pub timeout_secs: u64,
}

impl Default for DiscordTextPosterConfig {
    fn default() -> Self {
        Self {
            api_base: "https://discord.com/api/v10".to_string(),
            bot_token: String::new(),
            channel_id: String::new(),
            footer: "NewsAPI.org".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Discord 文字频道发布器
pub struct DiscordTextPoster {
    client: Client,
    config: DiscordTextPosterConfig,
}

impl DiscordTextPoster {
    pub fn new(config: DiscordTextPosterConfig) -> Result<Self, PostError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PostError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/channels/{}/messages",
            self.config.api_base.trim_end_matches('/'),
            self.config.channel_id
        )
    }

    fn build_body(&self, post: &HeadlinePost) -> MessageBody {
        MessageBody {
            embeds: vec![Embed {
                title: truncate(&post.title, MAX_EMBED_TITLE_LEN),
                url: post.url.clone().filter(|u| !u.is_empty()),
                timestamp: post.timestamp.to_rfc3339(),
                footer: EmbedFooter {
                    text: self.config.footer.clone(),
                },
            }],
        }
    }
}

/// 按字符截断
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(max_chars - 1).collect();
    truncated.push('…');
    truncated
}

#[async_trait]
impl TextPosterPort for DiscordTextPoster {
    async fn post(&self, post: &HeadlinePost) -> Result<(), PostError> {
        let response = self
            .client
            .post(self.messages_url())
            .header("Authorization", format!("Bot {}", self.config.bot_token))
            .json(&self.build_body(post))
            .send()
            .await
            .map_err(|e| PostError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PostError::Rejected(format!("HTTP {}: {}", status, body)));
        }

        tracing::debug!(title = %post.title, "Headline posted");
        Ok(())
    }
}
