use crate::content::MessageBody;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Exact request/response capture attached to a bot message when debug mode
/// is on. Values are deep copies taken at send/receive time; mutating the
/// live conversation never changes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebugData {
    pub request: Value,
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stt: Option<Value>,
}

/// One entry in the append-only conversation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub content: MessageBody,
    pub sender: Sender,
    #[serde(default)]
    pub suggestions: Vec<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<DebugData>,
}

impl ConversationMessage {
    pub fn user(content: MessageBody) -> Self {
        Self {
            content,
            sender: Sender::User,
            suggestions: Vec::new(),
            timestamp: Utc::now(),
            debug: None,
        }
    }

    pub fn bot(content: MessageBody, suggestions: Vec<String>) -> Self {
        Self {
            content,
            sender: Sender::Bot,
            suggestions,
            timestamp: Utc::now(),
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: Option<DebugData>) -> Self {
        self.debug = debug;
        self
    }
}

/// Session identity lives for one widget construction; there is no
/// persistence across page loads by design.
pub fn new_session_id() -> String {
    format!("session-{}", Uuid::new_v4())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_prefixed_and_unique() {
        let a = new_session_id();
        let b = new_session_id();
        assert!(a.starts_with("session-"));
        assert_ne!(a, b);
    }

    #[test]
    fn bot_message_carries_suggestions() {
        let msg = ConversationMessage::bot(
            MessageBody::Text("hola".into()),
            vec!["a".into(), "b".into()],
        );
        assert_eq!(msg.sender, Sender::Bot);
        assert_eq!(msg.suggestions, vec!["a", "b"]);
        assert!(msg.debug.is_none());
    }
}
