use std::io::{BufRead, Write};
use std::sync::Arc;

use trellis_appcore::ChatWidget;
use trellis_core::{new_session_id, render_all, render_suggestions, Sender, WidgetConfig, WidgetOptions};
use trellis_engine::{HttpChatBackend, HttpSpeechToText};
use trellis_providers::SttRequestConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Headless chat loop against a real backend. Configure with env vars:
    //   TREE_ID (required), ENDPOINT, START_EVENT, STT_ENDPOINT, DEBUG
    let tree_id = std::env::var("TREE_ID").unwrap_or_default();
    let endpoint = std::env::var("ENDPOINT").ok();
    let start_event = std::env::var("START_EVENT").ok();
    let stt_endpoint = std::env::var("STT_ENDPOINT").ok();
    let debug = std::env::var("DEBUG").is_ok_and(|v| v == "1" || v == "true");

    let global = WidgetOptions {
        tree_id: (!tree_id.trim().is_empty()).then(|| tree_id.trim().to_string()),
        endpoint,
        start_event,
        stt_enabled: stt_endpoint.as_ref().map(|_| true),
        stt_endpoint,
        debug: Some(debug),
        ..Default::default()
    };
    let config = WidgetConfig::resolve(&WidgetOptions::default(), &global)?;

    let session_id = new_session_id();
    let backend = Arc::new(HttpChatBackend::new(config.endpoint.clone()));
    let stt = config.stt_enabled.then(|| {
        Arc::new(HttpSpeechToText::new(SttRequestConfig {
            endpoint: config.stt_endpoint.clone(),
            tree_id: config.tree_id.clone(),
            session_id: session_id.clone(),
            context: config.stt_context.clone(),
            language: config.stt_language.clone(),
        })) as Arc<dyn trellis_engine::SpeechToText>
    });

    let mut widget = ChatWidget::with_session_id(config, session_id, backend, stt);
    widget.init().await;
    print_new_messages(&widget, 0, debug);

    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line.is_empty() || line == "/quit" {
            if line == "/quit" {
                break;
            }
            continue;
        }

        let before = widget.messages().len();
        widget.send_message(line).await;
        print_new_messages(&widget, before, debug);
    }

    Ok(())
}

fn print_new_messages(widget: &ChatWidget, from: usize, debug: bool) {
    for msg in &widget.messages()[from..] {
        if msg.sender != Sender::Bot {
            continue;
        }

        match msg.content.as_text() {
            Some(text) => println!("bot: {text}"),
            None => {
                if let Some(blocks) = msg.content.blocks() {
                    println!("bot (rich):\n{}", render_all(blocks));
                }
            }
        }

        if !msg.suggestions.is_empty() {
            println!("suggestions:\n{}", render_suggestions(&msg.suggestions));
        }

        if debug {
            if let Some(data) = &msg.debug {
                println!("debug request: {}", data.request);
                println!("debug response: {}", data.response);
            }
        }
    }
}
