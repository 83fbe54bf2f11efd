use serde::de::Deserializer;
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Discriminant of a rich block, parsed from the JSON `type` tag.
///
/// Unrecognized tags are preserved verbatim in `Unknown` so the renderer can
/// skip them without failing the whole message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Text,
    Card,
    Carousel,
    Video,
    Audio,
    Location,
    File,
    Image,
    QuickReplies,
    Unknown(String),
}

impl BlockKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "text" | "paragraph" => Self::Text,
            "card" => Self::Card,
            "carousel" => Self::Carousel,
            "video" => Self::Video,
            "audio" => Self::Audio,
            "location" => Self::Location,
            "file" => Self::File,
            "image" => Self::Image,
            // Standalone buttons, option lists and quick replies share one renderer.
            "button" | "options" | "quick_replies" => Self::QuickReplies,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn tag(&self) -> &str {
        match self {
            Self::Text => "text",
            Self::Card => "card",
            Self::Carousel => "carousel",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Location => "location",
            Self::File => "file",
            Self::Image => "image",
            Self::QuickReplies => "quick_replies",
            Self::Unknown(tag) => tag,
        }
    }
}

impl Default for BlockKind {
    fn default() -> Self {
        Self::Unknown(String::new())
    }
}

impl Serialize for BlockKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for BlockKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Self::from_tag(&tag))
    }
}

/// A clickable action inside a card, button list or quick-reply row.
///
/// Backends are inconsistent about field names, so every field is optional and
/// the resolved accessors encode the fallback precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Action {
    pub label: Option<String>,
    pub text: Option<String>,
    pub title: Option<String>,
    pub payload: Option<String>,
    pub value: Option<String>,
    pub icon: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "iconUrl")]
    pub icon_url: Option<String>,
}

impl Action {
    /// `label` -> `text` -> `title`, first non-empty wins.
    pub fn resolved_label(&self) -> Option<&str> {
        non_empty(&self.label)
            .or_else(|| non_empty(&self.text))
            .or_else(|| non_empty(&self.title))
    }

    /// `payload` -> `value` -> resolved label. Activating the action submits
    /// this string as if the user typed it.
    pub fn resolved_payload(&self) -> Option<&str> {
        non_empty(&self.payload)
            .or_else(|| non_empty(&self.value))
            .or_else(|| self.resolved_label())
    }

    /// An image URL to show instead of a named icon, if any.
    pub fn icon_image(&self) -> Option<&str> {
        non_empty(&self.image)
            .or_else(|| non_empty(&self.icon_url))
            .or_else(|| {
                non_empty(&self.icon)
                    .filter(|i| i.starts_with("http") || i.starts_with("data:"))
            })
    }

    /// A named (non-URL) icon, resolved by the host's icon set.
    pub fn named_icon(&self) -> Option<&str> {
        non_empty(&self.icon).filter(|i| !i.starts_with("http") && !i.starts_with("data:"))
    }
}

/// One structured chat payload: card, carousel, media, location, file or
/// action set. All fields are optional; which ones matter depends on `kind`.
///
/// Action-ish fields (`label`, `payload`, ...) are carried too because some
/// backends put plain actions inside a block's `items` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub text: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub image: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
    #[serde(rename = "mediaUrl")]
    pub media_url: Option<String>,
    pub address: Option<String>,
    pub size: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub label: Option<String>,
    pub payload: Option<String>,
    pub value: Option<String>,
    pub icon: Option<String>,
    #[serde(rename = "iconUrl")]
    pub icon_url: Option<String>,

    pub items: Vec<RichBlock>,
    pub actions: Vec<Action>,
    pub buttons: Vec<Action>,
    pub options: Vec<Action>,
    pub quick_replies: Vec<Action>,
}

impl RichBlock {
    /// Card image precedence: `image` -> `imageUrl` -> `mediaUrl` -> `url`.
    pub fn image_source(&self) -> Option<&str> {
        non_empty(&self.image)
            .or_else(|| non_empty(&self.image_url))
            .or_else(|| non_empty(&self.media_url))
            .or_else(|| non_empty(&self.url))
    }

    /// Card action precedence: `actions` -> `buttons`.
    pub fn card_actions(&self) -> &[Action] {
        if !self.actions.is_empty() {
            &self.actions
        } else {
            &self.buttons
        }
    }

    /// Quick-reply precedence: `items` -> `options` -> `quick_replies`.
    pub fn reply_actions(&self) -> Vec<Action> {
        if !self.items.is_empty() {
            return self.items.iter().map(RichBlock::as_action).collect();
        }
        if !self.options.is_empty() {
            return self.options.clone();
        }
        self.quick_replies.clone()
    }

    /// Reinterpret this block as an action (quick-reply items arrive as
    /// loosely shaped objects rather than `Action` values).
    pub fn as_action(&self) -> Action {
        Action {
            label: self.label.clone(),
            text: self.text.clone(),
            title: self.title.clone(),
            payload: self.payload.clone(),
            value: self.value.clone(),
            icon: self.icon.clone(),
            image: self.image.clone(),
            icon_url: self.icon_url.clone(),
        }
    }
}

pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_kind_maps_aliases() {
        assert_eq!(BlockKind::from_tag("paragraph"), BlockKind::Text);
        assert_eq!(BlockKind::from_tag("options"), BlockKind::QuickReplies);
        assert_eq!(BlockKind::from_tag("button"), BlockKind::QuickReplies);
        assert_eq!(
            BlockKind::from_tag("hologram"),
            BlockKind::Unknown("hologram".into())
        );
    }

    #[test]
    fn deserializes_permissive_block() {
        let block: RichBlock = serde_json::from_str(
            r#"{"type":"card","title":"T","imageUrl":"https://x/i.png","buttons":[{"label":"Go","payload":"go"}]}"#,
        )
        .unwrap();
        assert_eq!(block.kind, BlockKind::Card);
        assert_eq!(block.image_source(), Some("https://x/i.png"));
        assert_eq!(block.card_actions().len(), 1);
    }

    #[test]
    fn missing_type_tag_is_unknown() {
        let block: RichBlock = serde_json::from_str(r#"{"title":"T"}"#).unwrap();
        assert!(matches!(block.kind, BlockKind::Unknown(ref t) if t.is_empty()));
    }

    #[test]
    fn action_label_and_payload_fallbacks() {
        let a: Action = serde_json::from_str(r#"{"text":"Yes","value":"YES"}"#).unwrap();
        assert_eq!(a.resolved_label(), Some("Yes"));
        assert_eq!(a.resolved_payload(), Some("YES"));

        let b: Action = serde_json::from_str(r#"{"title":"Maybe"}"#).unwrap();
        assert_eq!(b.resolved_payload(), Some("Maybe"));

        let c = Action::default();
        assert_eq!(c.resolved_label(), None);
        assert_eq!(c.resolved_payload(), None);
    }

    #[test]
    fn action_icon_classification() {
        let url_icon: Action = serde_json::from_str(r#"{"icon":"https://x/i.svg"}"#).unwrap();
        assert_eq!(url_icon.icon_image(), Some("https://x/i.svg"));
        assert_eq!(url_icon.named_icon(), None);

        let named: Action = serde_json::from_str(r#"{"icon":"location_on"}"#).unwrap();
        assert_eq!(named.icon_image(), None);
        assert_eq!(named.named_icon(), Some("location_on"));
    }

    #[test]
    fn reply_actions_precedence() {
        let from_items: RichBlock = serde_json::from_str(
            r#"{"type":"options","items":[{"label":"A"}],"options":[{"label":"B"}]}"#,
        )
        .unwrap();
        assert_eq!(from_items.reply_actions()[0].resolved_label(), Some("A"));

        let from_options: RichBlock =
            serde_json::from_str(r#"{"type":"options","options":[{"label":"B"}]}"#).unwrap();
        assert_eq!(from_options.reply_actions()[0].resolved_label(), Some("B"));

        let from_quick: RichBlock =
            serde_json::from_str(r#"{"type":"quick_replies","quick_replies":[{"label":"C"}]}"#)
                .unwrap();
        assert_eq!(from_quick.reply_actions()[0].resolved_label(), Some("C"));
    }
}
