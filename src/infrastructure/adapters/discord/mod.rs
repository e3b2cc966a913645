//! Discord Adapter - 文字频道发布

mod text_poster;

pub use text_poster::{DiscordTextPoster, DiscordTextPosterConfig};
