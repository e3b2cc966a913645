//! Voice Adapter - 语音会话传输实现

mod command_transport;
mod fake_transport;

pub use command_transport::{CommandVoiceTransport, CommandVoiceTransportConfig};
pub use fake_transport::{FakeVoiceTransport, FakeVoiceTransportConfig};
