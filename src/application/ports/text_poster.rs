//! Text Poster Port - 文字频道发布抽象

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// 发布错误
#[derive(Debug, Error)]
pub enum PostError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Post rejected: {0}")]
    Rejected(String),
}

/// 一条待发布的标题
#[derive(Debug, Clone, PartialEq)]
pub struct HeadlinePost {
    pub title: String,
    pub url: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// Text Poster Port
///
/// 发出即忘：失败由调用方记录，不在此重试
#[async_trait]
pub trait TextPosterPort: Send + Sync {
    async fn post(&self, post: &HeadlinePost) -> Result<(), PostError>;
}
