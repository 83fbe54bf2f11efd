use crate::types::RichBlock;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a chat bubble carries: plain prose or rich blocks, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Text(String),
    Rich(Vec<RichBlock>),
}

impl MessageBody {
    /// Decide whether a backend payload is rich content or plain text.
    ///
    /// Preferred form is the explicit envelope (`kind: "text" | "rich"`).
    /// For backends that predate the envelope we keep the parse-and-probe
    /// fallback: a JSON array, or a JSON object whose `type` tag is present
    /// and not `"text"`, is treated as rich. Anything else, malformed JSON
    /// included, is displayed verbatim as text.
    pub fn classify(raw: &str) -> Self {
        let trimmed = raw.trim();
        if !(trimmed.starts_with('{') || trimmed.starts_with('[')) {
            return Self::Text(raw.to_string());
        }

        let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
            return Self::Text(raw.to_string());
        };

        if let Some(body) = Self::from_envelope(&value) {
            return body;
        }

        if value.is_array() {
            return match serde_json::from_value::<Vec<RichBlock>>(value) {
                Ok(blocks) => Self::Rich(blocks),
                Err(_) => Self::Text(raw.to_string()),
            };
        }

        match value.get("type").and_then(Value::as_str) {
            Some(tag) if tag != "text" => match serde_json::from_value::<RichBlock>(value) {
                Ok(block) => Self::Rich(vec![block]),
                Err(_) => Self::Text(raw.to_string()),
            },
            _ => Self::Text(raw.to_string()),
        }
    }

    fn from_envelope(value: &Value) -> Option<Self> {
        match value.get("kind").and_then(Value::as_str)? {
            "text" => {
                let text = value.get("text").and_then(Value::as_str)?;
                Some(Self::Text(text.to_string()))
            }
            "rich" => {
                if let Some(blocks) = value.get("blocks") {
                    let blocks: Vec<RichBlock> = serde_json::from_value(blocks.clone()).ok()?;
                    return Some(Self::Rich(blocks));
                }
                let block = value.get("block")?;
                let block: RichBlock = serde_json::from_value(block.clone()).ok()?;
                Some(Self::Rich(vec![block]))
            }
            _ => None,
        }
    }

    pub fn is_rich(&self) -> bool {
        matches!(self, Self::Rich(_))
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Rich(_) => None,
        }
    }

    pub fn blocks(&self) -> Option<&[RichBlock]> {
        match self {
            Self::Text(_) => None,
            Self::Rich(blocks) => Some(blocks),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockKind;

    #[test]
    fn plain_prose_stays_text() {
        let body = MessageBody::classify("hola, ¿en qué puedo ayudarte?");
        assert_eq!(
            body.as_text(),
            Some("hola, ¿en qué puedo ayudarte?")
        );
    }

    #[test]
    fn malformed_json_falls_back_verbatim() {
        let raw = r#"{"type": "card", "title": "#;
        let body = MessageBody::classify(raw);
        assert_eq!(body.as_text(), Some(raw));
    }

    #[test]
    fn object_with_rich_type_is_rich() {
        let body = MessageBody::classify(r#"{"type":"card","title":"T"}"#);
        match body {
            MessageBody::Rich(blocks) => {
                assert_eq!(blocks.len(), 1);
                assert_eq!(blocks[0].kind, BlockKind::Card);
            }
            other => panic!("expected rich, got {other:?}"),
        }
    }

    #[test]
    fn object_with_text_type_stays_text() {
        // Probe compatibility: legacy behavior shows `type: "text"` objects verbatim.
        let raw = r#"{"type":"text","text":"hola"}"#;
        assert_eq!(MessageBody::classify(raw).as_text(), Some(raw));
    }

    #[test]
    fn array_of_blocks_is_rich_in_order() {
        let body =
            MessageBody::classify(r#"[{"type":"card","title":"A"},{"type":"video","url":"u"}]"#);
        match body {
            MessageBody::Rich(blocks) => {
                assert_eq!(blocks[0].kind, BlockKind::Card);
                assert_eq!(blocks[1].kind, BlockKind::Video);
            }
            other => panic!("expected rich, got {other:?}"),
        }
    }

    #[test]
    fn explicit_envelope_wins_over_probe() {
        let body = MessageBody::classify(r#"{"kind":"text","text":"hola"}"#);
        assert_eq!(body.as_text(), Some("hola"));

        let body =
            MessageBody::classify(r#"{"kind":"rich","block":{"type":"card","title":"T"}}"#);
        assert!(body.is_rich());

        let body = MessageBody::classify(
            r#"{"kind":"rich","blocks":[{"type":"card"},{"type":"file"}]}"#,
        );
        match body {
            MessageBody::Rich(blocks) => assert_eq!(blocks.len(), 2),
            other => panic!("expected rich, got {other:?}"),
        }
    }

    #[test]
    fn broken_envelope_falls_back_to_text() {
        let raw = r#"{"kind":"rich"}"#;
        assert_eq!(MessageBody::classify(raw).as_text(), Some(raw));
    }
}
