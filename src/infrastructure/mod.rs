//! Infrastructure Layer - 基础设施层
//!
//! 提供所有端口的具体实现，以及串联它们的后台任务

pub mod adapters;
pub mod injector;
pub mod memory;
pub mod worker;

pub use injector::{OutOfBandInjector, OutOfBandInjectorConfig};
pub use memory::{announcement_queue, VoiceSessionManager};
pub use worker::{AnnouncementConsumer, NewsFetcher, VoiceKeeper};
