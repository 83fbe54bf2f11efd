use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::request::{Body, HttpRequest};

pub const NO_REPLY_FALLBACK: &str = "Sin respuesta";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    pub endpoint: String,
    pub tree_id: String,
    pub session_id: String,
}

/// Transcription metadata forwarded alongside a voice-originated message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SttInfo {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Text,
    Event,
}

impl PayloadKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Event => "event",
        }
    }
}

/// Build the JSON payload for one outgoing message.
///
/// Every payload carries the same envelope regardless of kind; `stt_info` is
/// only present for messages that came in through the microphone.
pub fn message_payload(
    cfg: &BackendConfig,
    kind: PayloadKind,
    value: &str,
    is_start_event: bool,
    stt_info: Option<&SttInfo>,
) -> Value {
    let mut payload = json!({
        "type": kind.tag(),
        "value": value,
        "tree_id": cfg.tree_id,
        "session_id": cfg.session_id,
        "is_start_event": is_start_event,
        "source": "web",
    });
    if let Some(info) = stt_info {
        if let Ok(info) = serde_json::to_value(info) {
            payload["stt_info"] = info;
        }
    }
    payload
}

pub fn build_message_request(endpoint: &str, payload: &Value) -> HttpRequest {
    HttpRequest {
        method: "POST".into(),
        url: endpoint.to_string(),
        headers: vec![
            ("Content-Type".into(), "application/json".into()),
            ("Accept".into(), "application/json".into()),
        ],
        body: Body::Json(payload.to_string()),
    }
}

/// The bot's answer to one message.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub message: String,
    pub suggestions: Vec<String>,
    /// The decoded response body, kept for debug capture.
    pub raw: Value,
}

/// Decode a reply body. The reply text is looked up as `response.value`,
/// then `message`, then a fixed fallback; suggestions live either at the top
/// level or under `response`.
pub fn parse_backend_reply(body: &[u8]) -> anyhow::Result<BackendReply> {
    let raw: Value = serde_json::from_slice(body).context("decode backend JSON")?;

    let message = raw
        .pointer("/response/value")
        .and_then(Value::as_str)
        .or_else(|| raw.get("message").and_then(Value::as_str))
        .unwrap_or(NO_REPLY_FALLBACK)
        .to_string();

    let suggestions = raw
        .get("suggestions")
        .or_else(|| raw.pointer("/response/suggestions"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(BackendReply {
        message,
        suggestions,
        raw,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> BackendConfig {
        BackendConfig {
            endpoint: "http://localhost:8000/message".into(),
            tree_id: "onboarding".into(),
            session_id: "session-test".into(),
        }
    }

    #[test]
    fn text_payload_carries_the_full_envelope() {
        let payload = message_payload(&cfg(), PayloadKind::Text, "hola", false, None);
        assert_eq!(payload["type"], "text");
        assert_eq!(payload["value"], "hola");
        assert_eq!(payload["tree_id"], "onboarding");
        assert_eq!(payload["session_id"], "session-test");
        assert_eq!(payload["is_start_event"], false);
        assert_eq!(payload["source"], "web");
        assert!(payload.get("stt_info").is_none());
    }

    #[test]
    fn event_payload_marks_start_events() {
        let payload = message_payload(&cfg(), PayloadKind::Event, "welcome", true, None);
        assert_eq!(payload["type"], "event");
        assert_eq!(payload["is_start_event"], true);
    }

    #[test]
    fn stt_info_rides_along_when_present() {
        let info = SttInfo {
            status: "success".into(),
            audio_duration: Some(2.4),
            process_time: Some(0.3),
            model_used: Some("base".into()),
            realtime_factor: Some(8.0),
            confidence: Some(0.92),
        };
        let payload = message_payload(&cfg(), PayloadKind::Text, "dictado", false, Some(&info));
        assert_eq!(payload["stt_info"]["status"], "success");
        assert_eq!(payload["stt_info"]["confidence"], 0.92);
    }

    #[test]
    fn message_request_is_json_post() {
        let payload = message_payload(&cfg(), PayloadKind::Text, "hola", false, None);
        let req = build_message_request(&cfg().endpoint, &payload);
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "http://localhost:8000/message");
        assert_eq!(req.header("content-type"), Some("application/json"));
        match req.body {
            Body::Json(s) => assert!(s.contains("\"value\":\"hola\"")),
            _ => panic!("expected json body"),
        }
    }

    #[test]
    fn reply_prefers_nested_response_value() {
        let body = br#"{"response":{"value":"hola!","suggestions":["a"]},"message":"ignored"}"#;
        let reply = parse_backend_reply(body).unwrap();
        assert_eq!(reply.message, "hola!");
        assert_eq!(reply.suggestions, vec!["a"]);
    }

    #[test]
    fn reply_falls_back_to_top_level_message() {
        let reply = parse_backend_reply(br#"{"message":"plano"}"#).unwrap();
        assert_eq!(reply.message, "plano");
        assert!(reply.suggestions.is_empty());
    }

    #[test]
    fn reply_without_text_uses_the_fixed_fallback() {
        let reply = parse_backend_reply(br#"{"other":1}"#).unwrap();
        assert_eq!(reply.message, NO_REPLY_FALLBACK);
    }

    #[test]
    fn top_level_suggestions_win_over_nested() {
        let body = br#"{"message":"m","suggestions":["top"],"response":{"suggestions":["nested"]}}"#;
        let reply = parse_backend_reply(body).unwrap();
        assert_eq!(reply.suggestions, vec!["top"]);
    }

    #[test]
    fn malformed_body_is_an_error() {
        assert!(parse_backend_reply(b"not json").is_err());
    }
}
