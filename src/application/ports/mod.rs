//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_artifact;
mod news_source;
mod text_poster;
mod tts_engine;
mod voice_transport;

pub use audio_artifact::{ArtifactError, AudioArtifact};
pub use news_source::{NewsError, NewsSourcePort};
pub use text_poster::{HeadlinePost, PostError, TextPosterPort};
pub use tts_engine::{SynthesisRequest, TtsEnginePort, TtsError};
pub use voice_transport::{
    DestinationKind, VoiceDestination, VoiceError, VoiceTransportPort,
};
