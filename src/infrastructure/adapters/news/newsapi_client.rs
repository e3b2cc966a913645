//! NewsAPI Client - 拉取 top-headlines
//!
//! 外部 API:
//! GET https://newsapi.org/v2/top-headlines?country=us&category=business&pageSize=10
//! Header: X-Api-Key
//! Response: {"status": "ok", "articles": [{"title", "url", "publishedAt"}]}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::application::ports::{NewsError, NewsSourcePort};
use crate::domain::HeadlineItem;

/// NewsAPI 响应体
#[derive(Debug, Deserialize)]
struct TopHeadlinesResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<Article>,
}

#[derive(Debug, Deserialize)]
struct Article {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default, rename = "publishedAt")]
    published_at: Option<String>,
}

/// NewsAPI 客户端配置
#[derive(Debug, Clone)]
pub struct NewsApiClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub country: String,
    pub category: String,
    pub page_size: u32,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
}

impl Default for NewsApiClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://newsapi.org/v2/top-headlines".to_string(),
            api_key: String::new(),
            country: "us".to_string(),
            category: "business".to_string(),
            page_size: 10,
            timeout_secs: 10,
        }
    }
}

/// NewsAPI 客户端
pub struct NewsApiClient {
    client: Client,
    config: NewsApiClientConfig,
}

impl NewsApiClient {
    pub fn new(config: NewsApiClientConfig) -> Result<Self, NewsError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NewsError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// 解析响应体，丢弃没有标题的条目
    fn parse_body(body: &[u8]) -> Result<Vec<HeadlineItem>, NewsError> {
        let parsed: TopHeadlinesResponse = serde_json::from_slice(body)
            .map_err(|e| NewsError::InvalidResponse(e.to_string()))?;

        if parsed.status.as_deref() == Some("error") {
            return Err(NewsError::ServiceError(
                parsed.message.unwrap_or_else(|| "unknown error".to_string()),
            ));
        }

        let items = parsed
            .articles
            .into_iter()
            .filter_map(|article| {
                let title = article.title.map(|t| t.trim().to_string())?;
                if title.is_empty() {
                    tracing::debug!("Dropping article without title");
                    return None;
                }
                Some(HeadlineItem::new(title, article.url, article.published_at))
            })
            .collect();

        Ok(items)
    }
}

#[async_trait]
impl NewsSourcePort for NewsApiClient {
    async fn poll(&self) -> Result<Vec<HeadlineItem>, NewsError> {
        let page_size = self.config.page_size.to_string();
        let response = self
            .client
            .get(&self.config.endpoint)
            .header("X-Api-Key", &self.config.api_key)
            .query(&[
                ("country", self.config.country.as_str()),
                ("category", self.config.category.as_str()),
                ("pageSize", page_size.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NewsError::Timeout
                } else {
                    NewsError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                NewsError::Timeout
            } else {
                NewsError::NetworkError(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(NewsError::ServiceError(format!(
                "HTTP {}: {}",
                status,
                String::from_utf8_lossy(&body)
            )));
        }

        let items = Self::parse_body(&body)?;
        tracing::debug!(count = items.len(), "News poll completed");
        Ok(items)
    }
}
