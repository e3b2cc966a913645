//! News Source Port - 新闻来源抽象

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::HeadlineItem;

/// 新闻拉取错误
#[derive(Debug, Error)]
pub enum NewsError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// News Source Port
///
/// 一次调用对应一次轮询请求，按来源给出的顺序返回条目
#[async_trait]
pub trait NewsSourcePort: Send + Sync {
    async fn poll(&self) -> Result<Vec<HeadlineItem>, NewsError>;
}
