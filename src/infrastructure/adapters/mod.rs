//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod discord;
pub mod news;
pub mod storage;
pub mod tts;
pub mod voice;

pub use discord::*;
pub use news::*;
pub use storage::*;
pub use tts::*;
pub use voice::*;
