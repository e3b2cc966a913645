//! Storage Adapter - 合成音频临时目录

mod artifact_storage;

pub use artifact_storage::ArtifactStorage;
