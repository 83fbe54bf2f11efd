use async_trait::async_trait;
use serde_json::Value;
use trellis_providers::{AudioUpload, BackendReply, SttReply};

/// Delivery of one message payload to the conversation backend.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn send(&self, payload: &Value) -> anyhow::Result<BackendReply>;
}

/// Transcription of one finished voice note.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &AudioUpload) -> anyhow::Result<SttReply>;
}
