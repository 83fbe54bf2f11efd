use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::Value;
use trellis_providers::{
    build_message_request, build_stt_request, parse_backend_reply, parse_stt_reply, runtime,
    AudioUpload, BackendReply, SttReply, SttRequestConfig,
};

use crate::traits::{ChatBackend, SpeechToText};

/// The real conversation backend behind a JSON POST endpoint.
pub struct HttpChatBackend {
    endpoint: String,
}

impl HttpChatBackend {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl ChatBackend for HttpChatBackend {
    async fn send(&self, payload: &Value) -> anyhow::Result<BackendReply> {
        let req = build_message_request(&self.endpoint, payload);
        let resp = runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(anyhow!("backend returned status {}", resp.status));
        }
        parse_backend_reply(&resp.body)
    }
}

/// Transcription over the multipart upload endpoint.
pub struct HttpSpeechToText {
    cfg: SttRequestConfig,
}

impl HttpSpeechToText {
    pub fn new(cfg: SttRequestConfig) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(&self, audio: &AudioUpload) -> anyhow::Result<SttReply> {
        let req = build_stt_request(&self.cfg, audio);
        let resp = runtime::execute(&req).await?;
        if !resp.is_success() {
            return Err(anyhow!("transcription returned status {}", resp.status));
        }
        parse_stt_reply(&resp.body)
    }
}
