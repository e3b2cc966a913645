//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（NewsSource、TextPoster、TtsEngine、VoiceTransport）

pub mod ports;

pub use ports::{
    // Audio artifact
    ArtifactError,
    AudioArtifact,
    // News source
    NewsError,
    NewsSourcePort,
    // Text poster
    HeadlinePost,
    PostError,
    TextPosterPort,
    // TTS engine
    SynthesisRequest,
    TtsEnginePort,
    TtsError,
    // Voice transport
    DestinationKind,
    VoiceDestination,
    VoiceError,
    VoiceTransportPort,
};
