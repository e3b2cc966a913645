//! 后台任务

mod announcement_consumer;
mod news_fetcher;
mod voice_keeper;

pub use announcement_consumer::{
    resolve_timestamp, AnnouncementConsumer, AnnouncementConsumerConfig, AnnouncementOutcome,
};
pub use news_fetcher::{NewsFetcher, NewsFetcherConfig};
pub use voice_keeper::{KeeperExit, VoiceKeeper, VoiceKeeperConfig};
