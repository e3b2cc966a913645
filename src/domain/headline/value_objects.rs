//! Headline Context - Value Objects

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// 新闻标题条目
///
/// 不变量:
/// - 创建后不可变
/// - 只会被 Consumer 消费一次
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadlineItem {
    title: String,
    url: Option<String>,
    /// 来源给出的原始发布时间字符串，由 Consumer 解析
    published_at: Option<String>,
}

impl HeadlineItem {
    pub fn new(
        title: impl Into<String>,
        url: Option<String>,
        published_at: Option<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url,
            published_at,
        }
    }

    /// 带外注入的条目：没有链接也没有时间戳
    pub fn injected(title: impl Into<String>) -> Self {
        Self::new(title, None, None)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn published_at(&self) -> Option<&str> {
        self.published_at.as_deref()
    }

    /// 计算去重标识（只取决于标题）
    pub fn identity(&self) -> ItemIdentity {
        ItemIdentity::of_title(&self.title)
    }
}

/// 去重标识 - 标题的 SHA-256 摘要
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemIdentity(String);

impl ItemIdentity {
    pub fn of_title(title: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(title.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ItemIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
