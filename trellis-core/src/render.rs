use crate::content::MessageBody;
use crate::markup::escape;
use crate::types::{non_empty, Action, BlockKind, RichBlock};
use regex::Regex;
use std::fmt::Write as _;
use std::sync::OnceLock;

// The renderer is a pure data -> markup function. It never fails: unknown
// block types render to an empty fragment (with a warning) so that newer
// backend payloads cannot break the chat.

/// Render a batch of blocks in input order. Equal to the concatenation of
/// `render` over each element.
pub fn render_all(blocks: &[RichBlock]) -> String {
    blocks.iter().map(render).collect()
}

/// Render one rich block to an HTML fragment.
pub fn render(block: &RichBlock) -> String {
    // Items rule: for every non-carousel kind, sub-items re-enter the same
    // kind's single-item template in order, and the item's own `type` tag is
    // ignored. Carousels consume `items` as their card sequence.
    if block.kind != BlockKind::Carousel && !block.items.is_empty() {
        return block
            .items
            .iter()
            .map(|item| render_one(&block.kind, item))
            .collect();
    }
    render_one(&block.kind, block)
}

/// Render a whole message body: rich blocks, or escaped plain text.
pub fn render_body(body: &MessageBody) -> String {
    match body {
        MessageBody::Text(text) => format!("<span>{}</span>", escape(text)),
        MessageBody::Rich(blocks) => render_all(blocks),
    }
}

/// The suggestion-chip row appended after a bot message.
pub fn render_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        return String::new();
    }
    let chips: String = suggestions
        .iter()
        .map(|s| {
            format!(
                "<button class=\"suggestion-chip\" data-payload=\"{}\">{}</button>",
                escape(s),
                escape(s)
            )
        })
        .collect();
    format!("<div class=\"suggestions\">{chips}</div>")
}

fn render_one(kind: &BlockKind, block: &RichBlock) -> String {
    match kind {
        BlockKind::Text => paragraph(block),
        BlockKind::Card => card(block),
        BlockKind::Carousel => carousel(block),
        BlockKind::Video => video(block),
        BlockKind::Audio => audio(block),
        BlockKind::Location => location(block),
        BlockKind::File => file(block),
        BlockKind::Image => image(block),
        BlockKind::QuickReplies => quick_replies(block),
        BlockKind::Unknown(tag) => {
            log::warn!("unknown rich block type: {tag:?}");
            String::new()
        }
    }
}

fn paragraph(block: &RichBlock) -> String {
    let text = non_empty(&block.text)
        .or_else(|| non_empty(&block.content))
        .unwrap_or("");
    format!("<div class=\"rich-paragraph\">{}</div>", escape(text))
}

fn card(block: &RichBlock) -> String {
    let mut out = String::from("<div class=\"rich-card\">");

    if let Some(src) = block.image_source() {
        let alt = non_empty(&block.title).unwrap_or("Card Image");
        let _ = write!(
            out,
            "<img src=\"{}\" class=\"rich-card-image\" alt=\"{}\">",
            escape(src),
            escape(alt)
        );
    }

    out.push_str("<div class=\"rich-card-content\">");
    if let Some(title) = non_empty(&block.title) {
        let _ = write!(out, "<div class=\"rich-card-title\">{}</div>", escape(title));
    }
    if let Some(subtitle) = non_empty(&block.subtitle) {
        let _ = write!(
            out,
            "<div class=\"rich-card-subtitle\">{}</div>",
            escape(subtitle)
        );
    }
    if let Some(text) = non_empty(&block.text) {
        let _ = write!(out, "<div class=\"rich-card-text\">{}</div>", escape(text));
    }
    out.push_str("</div>");

    let actions = block.card_actions();
    if !actions.is_empty() {
        out.push_str("<div class=\"rich-card-actions\">");
        for action in actions {
            out.push_str(&action_button(action, ActionStyle::Button));
        }
        out.push_str("</div>");
    }

    out.push_str("</div>");
    out
}

fn carousel(block: &RichBlock) -> String {
    if block.items.is_empty() {
        return String::new();
    }
    let items: String = block
        .items
        .iter()
        .map(|item| format!("<div class=\"carousel-item\">{}</div>", card(item)))
        .collect();
    format!(
        "<div class=\"rich-carousel\"><div class=\"carousel-container\">\
         <div class=\"carousel-track-container\"><div class=\"carousel-track\">{items}</div>\
         </div></div></div>"
    )
}

/// Where a video URL resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VideoSource {
    YouTube(String),
    Vimeo(String),
    /// A directly playable media file.
    Direct,
    /// Recognized host but no extractable id; renders an empty player area.
    None,
}

fn youtube_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Matches the id after any of the usual YouTube URL shapes.
        Regex::new(r"(youtu\.be/|/v/|/u/\w/|embed/|watch\?v=|&v=)([^#&?]*)")
            .expect("valid youtube id regex")
    })
}

/// Classify a video URL. YouTube ids must be exactly 11 characters; Vimeo
/// takes the last path segment; everything else is treated as a direct file.
pub fn classify_video_url(url: &str) -> VideoSource {
    if url.contains("youtube.com") || url.contains("youtu.be") {
        if let Some(caps) = youtube_id_re().captures(url) {
            let id = &caps[2];
            if id.len() == 11 {
                return VideoSource::YouTube(id.to_string());
            }
        }
        return VideoSource::None;
    }

    if url.contains("vimeo.com") {
        let id = url
            .split(['#', '?'])
            .next()
            .unwrap_or("")
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or("");
        if !id.is_empty() && id != "vimeo.com" {
            return VideoSource::Vimeo(id.to_string());
        }
        return VideoSource::None;
    }

    VideoSource::Direct
}

fn video(block: &RichBlock) -> String {
    let player = match non_empty(&block.url) {
        None => String::new(),
        Some(url) => match classify_video_url(url) {
            VideoSource::YouTube(id) => format!(
                "<iframe src=\"https://www.youtube.com/embed/{}?modestbranding=1&amp;rel=0\" \
                 allowfullscreen></iframe>",
                escape(&id)
            ),
            VideoSource::Vimeo(id) => format!(
                "<iframe src=\"https://player.vimeo.com/video/{}\" allowfullscreen></iframe>",
                escape(&id)
            ),
            VideoSource::Direct => {
                format!("<video src=\"{}\" controls></video>", escape(url))
            }
            VideoSource::None => String::new(),
        },
    };
    format!("<div class=\"rich-video\">{player}</div>")
}

/// Decorative waveform heights for an audio bubble, in the 20–80 range.
///
/// This is a presentation placeholder, not signal analysis: the heights are
/// seeded from the block's url/title so the renderer stays pure.
pub fn decorative_bars(block: &RichBlock, bars: usize) -> Vec<u32> {
    let mut seed: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in block
        .url
        .as_deref()
        .unwrap_or("")
        .bytes()
        .chain(block.title.as_deref().unwrap_or("").bytes())
    {
        seed ^= u64::from(byte);
        seed = seed.wrapping_mul(0x0000_0100_0000_01b3);
    }

    (0..bars)
        .map(|i| {
            let pseudo = ((seed % 10_000) as f64 + i as f64 * 0.5).sin() * 0.5 + 0.5;
            20 + (pseudo * 60.0).round() as u32
        })
        .collect()
}

fn audio(block: &RichBlock) -> String {
    let title = non_empty(&block.title).unwrap_or("Audio");
    let src = non_empty(&block.url).unwrap_or("");
    let waveform: String = decorative_bars(block, 20)
        .into_iter()
        .map(|h| format!("<div class=\"waveform-bar\" style=\"height: {h}%\"></div>"))
        .collect();

    format!(
        "<div class=\"rich-audio\">\
         <button class=\"audio-control play-pause-btn\" data-src=\"{}\"></button>\
         <div class=\"audio-info\">\
         <div class=\"audio-title\">{}</div>\
         <div class=\"audio-waveform\">{}</div>\
         <div class=\"audio-duration\">0:00</div>\
         </div></div>",
        escape(src),
        escape(title),
        waveform
    )
}

fn location(block: &RichBlock) -> String {
    match (block.latitude, block.longitude) {
        (Some(lat), Some(lng)) => {
            let name = non_empty(&block.title).unwrap_or("Ubicación");
            let address = non_empty(&block.address)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{lat}, {lng}"));
            let map = format!(
                "https://www.openstreetmap.org/export/embed.html?bbox={}%2C{}%2C{}%2C{}&amp;layer=mapnik&amp;marker={}%2C{}",
                lng - 0.01,
                lat - 0.01,
                lng + 0.01,
                lat + 0.01,
                lat,
                lng
            );
            format!(
                "<div class=\"rich-location\">\
                 <div class=\"location-map\"><iframe src=\"{map}\"></iframe></div>\
                 <div class=\"location-info\">\
                 <div class=\"location-name\">{}</div>\
                 <div class=\"location-address\">{}</div>\
                 <a href=\"https://www.google.com/maps/search/?api=1&amp;query={lat},{lng}\" \
                 target=\"_blank\" class=\"action-btn primary\">Ver en Mapas</a>\
                 </div></div>",
                escape(name),
                escape(&address)
            )
        }
        _ => {
            // No coordinates: offer a share-my-location affordance instead.
            let name = non_empty(&block.title).unwrap_or("Compartir Ubicación");
            format!(
                "<div class=\"rich-location\"><div class=\"location-info\">\
                 <div class=\"location-name\">{}</div>\
                 <button class=\"share-location-btn\">Compartir mi ubicación actual</button>\
                 </div></div>",
                escape(name)
            )
        }
    }
}

fn file(block: &RichBlock) -> String {
    let name = non_empty(&block.title).unwrap_or("Archivo adjunto");
    let url = non_empty(&block.url).unwrap_or("");
    let size = non_empty(&block.size)
        .map(|s| format!("<div class=\"file-size\">{}</div>", escape(s)))
        .unwrap_or_default();
    format!(
        "<div class=\"rich-file\">\
         <div class=\"file-icon-container\"></div>\
         <div class=\"file-info\"><div class=\"file-name\">{}</div>{}</div>\
         <button class=\"file-download-btn\" data-url=\"{}\" data-name=\"{}\" \
         title=\"Descargar\"></button>\
         </div>",
        escape(name),
        size,
        escape(url),
        escape(name)
    )
}

fn image(block: &RichBlock) -> String {
    let src = non_empty(&block.url).unwrap_or("");
    let caption = non_empty(&block.title)
        .map(|t| {
            format!(
                "<div class=\"rich-card-content\"><div class=\"rich-card-text\">{}</div></div>",
                escape(t)
            )
        })
        .unwrap_or_default();
    format!(
        "<div class=\"rich-card\"><img src=\"{}\" class=\"rich-image-standalone\" alt=\"{}\">{}</div>",
        escape(src),
        escape(non_empty(&block.title).unwrap_or("Image")),
        caption
    )
}

fn quick_replies(block: &RichBlock) -> String {
    let actions = block.reply_actions();
    if actions.is_empty() {
        return String::new();
    }
    let chips: String = actions
        .iter()
        .map(|a| action_button(a, ActionStyle::Chip))
        .collect();
    format!("<div class=\"quick-replies-container\">{chips}</div>")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionStyle {
    Button,
    Chip,
}

// Activating an action re-submits its payload through the normal send path;
// the host wires clicks on `data-payload` back into the controller.
fn action_button(action: &Action, style: ActionStyle) -> String {
    let Some(label) = action.resolved_label() else {
        return String::new();
    };
    let payload = action.resolved_payload().unwrap_or(label);

    let icon = if let Some(src) = action.icon_image() {
        format!("<img src=\"{}\" class=\"action-icon-img\" alt=\"\"> ", escape(src))
    } else if let Some(name) = action.named_icon() {
        format!("<span class=\"action-icon\" data-icon=\"{}\"></span> ", escape(name))
    } else {
        String::new()
    };

    let class = match style {
        ActionStyle::Button => "action-btn",
        ActionStyle::Chip => "suggestion-chip",
    };

    format!(
        "<button class=\"{class}\" data-payload=\"{}\">{}{}</button>",
        escape(payload),
        icon,
        escape(label)
    )
}
