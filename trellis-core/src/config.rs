use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    // Fatal: without a tree id there is no conversation to address. This is
    // surfaced to the embedder, never sent to the network.
    #[error("missing required tree id (set the `tree-id` attribute or the global `treeId` option)")]
    MissingTreeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Position {
    BottomRight,
    BottomLeft,
}

impl Position {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "bottom-right" => Some(Self::BottomRight),
            "bottom-left" => Some(Self::BottomLeft),
            _ => None,
        }
    }
}

/// A partial configuration, as supplied by element attributes or by the
/// embedding page's global defaults. Every field is optional; `WidgetConfig`
/// resolves the precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetOptions {
    pub title: Option<String>,
    pub endpoint: Option<String>,
    pub tree_id: Option<String>,
    pub bot_icon: Option<String>,
    pub bot_image: Option<String>,
    pub widget_icon: Option<String>,
    pub placeholder: Option<String>,
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub position: Option<Position>,
    pub z_index: Option<i64>,
    pub file_upload: Option<bool>,
    pub microphone: Option<bool>,
    pub debug: Option<bool>,
    pub max_file_size: Option<u64>,
    pub response_delay: Option<bool>,
    pub response_delay_ms: Option<u64>,
    pub stt_enabled: Option<bool>,
    pub stt_endpoint: Option<String>,
    pub stt_context: Option<String>,
    pub stt_language: Option<String>,
    pub start_event: Option<String>,
    pub enable_maximize: Option<bool>,
    pub maximize_on_start: Option<bool>,
}

impl WidgetOptions {
    /// Build options from kebab-case element attributes.
    ///
    /// Boolean attributes follow HTML semantics: `"true"` and the empty
    /// string enable, `"false"` disables, anything else is ignored (leaving
    /// the global/default value in effect). Unknown attribute names are
    /// ignored.
    pub fn from_attributes<'a, I>(attributes: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut opts = Self::default();
        for (name, value) in attributes {
            match name {
                "title" => opts.title = string_attr(value),
                "endpoint" => opts.endpoint = string_attr(value),
                "tree-id" | "tree_id" => opts.tree_id = string_attr(value),
                "bot-icon" => opts.bot_icon = string_attr(value),
                "bot-image" => opts.bot_image = string_attr(value),
                "widget-icon" => opts.widget_icon = string_attr(value),
                "placeholder" => opts.placeholder = string_attr(value),
                "primary-color" => opts.primary_color = string_attr(value),
                "secondary-color" => opts.secondary_color = string_attr(value),
                "position" => opts.position = Position::parse(value),
                "z-index" => opts.z_index = value.trim().parse().ok(),
                "file-upload" => opts.file_upload = bool_attr(value),
                "microphone" => opts.microphone = bool_attr(value),
                "debug" => opts.debug = bool_attr(value),
                "max-file-size" => opts.max_file_size = value.trim().parse().ok(),
                "response-delay" => opts.response_delay = bool_attr(value),
                "response-delay-ms" | "response-delay-seconds" => {
                    opts.response_delay_ms = value.trim().parse().ok()
                }
                "stt-enabled" => opts.stt_enabled = bool_attr(value),
                "stt-endpoint" => opts.stt_endpoint = string_attr(value),
                "stt-context" => opts.stt_context = string_attr(value),
                "stt-language" => opts.stt_language = string_attr(value),
                "start-event" => opts.start_event = string_attr(value),
                "enable-maximize" => opts.enable_maximize = bool_attr(value),
                "maximize-on-start" => opts.maximize_on_start = bool_attr(value),
                _ => {}
            }
        }
        opts
    }
}

fn string_attr(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn bool_attr(value: &str) -> Option<bool> {
    match value {
        "" | "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// The fully resolved widget configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetConfig {
    pub title: String,
    pub endpoint: String,
    pub tree_id: String,
    pub bot_icon: Option<String>,
    pub bot_image: Option<String>,
    pub widget_icon: Option<String>,
    pub placeholder: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub position: Position,
    pub z_index: i64,
    pub file_upload: bool,
    pub microphone: bool,
    pub debug: bool,
    pub max_file_size: u64,
    pub response_delay: bool,
    pub response_delay_ms: u64,
    pub stt_enabled: bool,
    pub stt_endpoint: String,
    pub stt_context: String,
    pub stt_language: String,
    pub start_event: Option<String>,
    pub enable_maximize: bool,
    pub maximize_on_start: bool,
}

impl WidgetConfig {
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

    /// Resolve the effective configuration: attribute wins over global wins
    /// over default. The tree id has no default and is required.
    pub fn resolve(attributes: &WidgetOptions, global: &WidgetOptions) -> Result<Self, ConfigError> {
        fn pick<T: Clone>(attr: &Option<T>, global: &Option<T>, default: T) -> T {
            attr.clone().or_else(|| global.clone()).unwrap_or(default)
        }

        fn pick_opt<T: Clone>(attr: &Option<T>, global: &Option<T>) -> Option<T> {
            attr.clone().or_else(|| global.clone())
        }

        let tree_id = pick_opt(&attributes.tree_id, &global.tree_id)
            .ok_or(ConfigError::MissingTreeId)?;

        Ok(Self {
            title: pick(&attributes.title, &global.title, "Trellis Chat".into()),
            endpoint: pick(
                &attributes.endpoint,
                &global.endpoint,
                "http://localhost:8000/message".into(),
            ),
            tree_id,
            bot_icon: pick_opt(&attributes.bot_icon, &global.bot_icon),
            bot_image: pick_opt(&attributes.bot_image, &global.bot_image),
            widget_icon: pick_opt(&attributes.widget_icon, &global.widget_icon),
            placeholder: pick(
                &attributes.placeholder,
                &global.placeholder,
                "Escribe un mensaje...".into(),
            ),
            primary_color: pick(
                &attributes.primary_color,
                &global.primary_color,
                "#2563eb".into(),
            ),
            secondary_color: pick(
                &attributes.secondary_color,
                &global.secondary_color,
                "#f3f4f6".into(),
            ),
            position: pick(&attributes.position, &global.position, Position::BottomRight),
            z_index: pick(&attributes.z_index, &global.z_index, 10_000),
            file_upload: pick(&attributes.file_upload, &global.file_upload, true),
            microphone: pick(&attributes.microphone, &global.microphone, true),
            debug: pick(&attributes.debug, &global.debug, false),
            max_file_size: pick(
                &attributes.max_file_size,
                &global.max_file_size,
                Self::DEFAULT_MAX_FILE_SIZE,
            ),
            response_delay: pick(&attributes.response_delay, &global.response_delay, false),
            response_delay_ms: pick(
                &attributes.response_delay_ms,
                &global.response_delay_ms,
                1_000,
            ),
            stt_enabled: pick(&attributes.stt_enabled, &global.stt_enabled, false),
            stt_endpoint: pick(
                &attributes.stt_endpoint,
                &global.stt_endpoint,
                "http://localhost:8000/stt".into(),
            ),
            stt_context: pick(&attributes.stt_context, &global.stt_context, "testing".into()),
            stt_language: pick(&attributes.stt_language, &global.stt_language, "es".into()),
            start_event: pick_opt(&attributes.start_event, &global.start_event),
            enable_maximize: pick(&attributes.enable_maximize, &global.enable_maximize, true),
            maximize_on_start: pick(
                &attributes.maximize_on_start,
                &global.maximize_on_start,
                false,
            ),
        })
    }
}
