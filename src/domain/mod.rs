//! Domain Layer - 领域层
//!
//! - Headline Context: 新闻标题与去重
//! - 发音预处理（供语音合成使用）

pub mod headline;
pub mod pronunciation;

pub use headline::{HeadlineItem, ItemIdentity, SeenSet};
pub use pronunciation::{pronounceable, spell, to_ssml};
