//! Headline Context - 新闻标题上下文
//!
//! 职责:
//! - 标题条目值对象
//! - 去重标识与已见集合

mod seen_set;
mod value_objects;

pub use seen_set::SeenSet;
pub use value_objects::{HeadlineItem, ItemIdentity};
