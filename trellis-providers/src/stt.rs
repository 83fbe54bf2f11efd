use anyhow::Context;
use serde::Deserialize;

use crate::backend::SttInfo;
use crate::request::{Body, HttpRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SttRequestConfig {
    pub endpoint: String,
    pub tree_id: String,
    pub session_id: String,
    pub context: String,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

pub fn build_stt_request(cfg: &SttRequestConfig, audio: &AudioUpload) -> HttpRequest {
    let boundary = format!("Boundary-{}", uuid::Uuid::new_v4());

    let mut body: Vec<u8> = Vec::new();

    append_file(
        &mut body,
        &boundary,
        "audio",
        &audio.filename,
        &audio.mime_type,
        &audio.bytes,
    );
    append_field(&mut body, &boundary, "tree_id", &cfg.tree_id);
    append_field(&mut body, &boundary, "session_id", &cfg.session_id);
    append_field(&mut body, &boundary, "context", &cfg.context);
    append_field(&mut body, &boundary, "language", &cfg.language);

    body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

    HttpRequest {
        method: "POST".into(),
        url: cfg.endpoint.clone(),
        headers: vec![
            (
                "Content-Type".into(),
                format!("multipart/form-data; boundary={}", boundary),
            ),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::MultipartFormData {
            boundary,
            bytes: body,
        },
    }
}

fn append_field(body: &mut Vec<u8>, boundary: &str, name: &str, value: &str) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
    );
    body.extend_from_slice(value.as_bytes());
    body.extend_from_slice(b"\r\n");
}

fn append_file(
    body: &mut Vec<u8>,
    boundary: &str,
    name: &str,
    filename: &str,
    mime_type: &str,
    bytes: &[u8],
) {
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
            name, filename
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.extend_from_slice(bytes);
    body.extend_from_slice(b"\r\n");
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SttReply {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub audio_duration: Option<f64>,
    #[serde(default)]
    pub process_time: Option<f64>,
    #[serde(default)]
    pub model_used: Option<String>,
    #[serde(default)]
    pub realtime_factor: Option<f64>,
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl SttReply {
    /// Metadata forwarded with the follow-up text message.
    pub fn info(&self, status: &str) -> SttInfo {
        SttInfo {
            status: status.to_string(),
            audio_duration: self.audio_duration,
            process_time: self.process_time,
            model_used: self.model_used.clone(),
            realtime_factor: self.realtime_factor,
            confidence: self.confidence,
        }
    }
}

pub fn parse_stt_reply(body: &[u8]) -> anyhow::Result<SttReply> {
    serde_json::from_slice(body).context("decode transcription JSON")
}
