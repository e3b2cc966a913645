//! Memory Layer - In-Memory State Management
//!
//! 播报队列与语音会话状态，均只存在于进程内存中

mod announcement_queue;
mod voice_session_manager;

pub use announcement_queue::{
    announcement_queue, AnnouncementReceiver, AnnouncementSender, QueueClosed,
};
pub use voice_session_manager::{
    VoiceHandle, VoiceSessionManager, VoiceState, VoiceUnavailable,
};
