use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use trellis_core::{ConversationMessage, MessageBody};
use trellis_providers::{message_payload, AudioUpload, BackendConfig, PayloadKind};

use crate::debug::DebugCapture;
use crate::traits::{ChatBackend, SpeechToText};

/// Shown in place of a reply whenever the exchange fails, whatever the cause.
pub const GENERIC_ERROR: &str =
    "Lo siento, ha ocurrido un error. Por favor, inténtalo de nuevo.";
/// Shown when a voice note transcribes to nothing usable.
pub const NO_SPEECH_DETECTED: &str = "No se detectó voz en el audio";
/// Shown when the transcription request itself fails.
pub const STT_FAILED: &str = "Error al procesar el audio.";

pub type TypingHook = Arc<dyn Fn(bool) + Send + Sync>;

#[derive(Clone)]
pub struct ControllerConfig {
    pub backend: BackendConfig,
    pub debug: bool,
    /// Optional artificial delay before dispatching, so replies do not feel
    /// instantaneous.
    pub response_delay: Option<Duration>,
}

/// Owns the conversation log and every exchange with the backend.
///
/// No operation here returns an error to the caller: a failed exchange
/// appends exactly one fixed bot-styled error message instead, and the
/// conversation continues.
pub struct ConversationController {
    cfg: ControllerConfig,
    backend: Arc<dyn ChatBackend>,
    stt: Option<Arc<dyn SpeechToText>>,
    messages: Vec<ConversationMessage>,
    typing_hook: Option<TypingHook>,
    debug: DebugCapture,
}

impl ConversationController {
    pub fn new(
        cfg: ControllerConfig,
        backend: Arc<dyn ChatBackend>,
        stt: Option<Arc<dyn SpeechToText>>,
    ) -> Self {
        Self {
            cfg,
            backend,
            stt,
            messages: Vec::new(),
            typing_hook: None,
            debug: DebugCapture::default(),
        }
    }

    /// Install the typing-indicator callback. It fires with `true` before a
    /// dispatch and `false` once the reply (or error message) is appended.
    pub fn set_typing_hook(&mut self, hook: TypingHook) {
        self.typing_hook = Some(hook);
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn clear_history(&mut self) {
        self.messages.clear();
    }

    /// Append a user-styled message without dispatching anything.
    pub fn push_user_note(&mut self, text: &str) {
        self.messages
            .push(ConversationMessage::user(MessageBody::Text(text.into())));
    }

    /// Append a bot-styled message without dispatching anything.
    pub fn push_bot_note(&mut self, text: &str) {
        self.messages.push(ConversationMessage::bot(
            MessageBody::Text(text.into()),
            Vec::new(),
        ));
    }

    /// Send what the user typed. Whitespace-only input is ignored entirely.
    pub async fn send_text(&mut self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        self.messages
            .push(ConversationMessage::user(MessageBody::Text(text.into())));
        self.dispatch(PayloadKind::Text, text, false, None).await;
    }

    /// Send a named event. Events are invisible: no user message is logged.
    pub async fn send_event(&mut self, name: &str, is_start_event: bool) {
        self.dispatch(PayloadKind::Event, name, is_start_event, None)
            .await;
    }

    /// Transcribe a finished voice note and run the result through the text
    /// flow, with the transcription metadata riding along.
    pub async fn send_audio(&mut self, upload: AudioUpload) {
        let Some(stt) = self.stt.clone() else {
            log::warn!("Voice note received but transcription is not configured");
            return;
        };

        match stt.transcribe(&upload).await {
            Ok(reply) => {
                let text = reply.text.trim().to_string();
                if text.is_empty() || text == "..." {
                    self.push_user_note(NO_SPEECH_DETECTED);
                    return;
                }

                if self.cfg.debug {
                    if let Ok(raw) = serde_json::to_value(reply.info("success")) {
                        self.debug.capture_stt(&raw);
                    }
                }

                let info = reply.info("success");
                self.push_user_note(&text);
                self.dispatch(PayloadKind::Text, &text, false, Some(info))
                    .await;
            }
            Err(e) => {
                log::error!("Transcription failed: {e:#}");
                self.push_bot_note(STT_FAILED);
            }
        }
    }

    async fn dispatch(
        &mut self,
        kind: PayloadKind,
        value: &str,
        is_start_event: bool,
        stt_info: Option<trellis_providers::SttInfo>,
    ) {
        self.set_typing(true);

        if let Some(delay) = self.cfg.response_delay {
            tokio::time::sleep(delay).await;
        }

        let payload = message_payload(
            &self.cfg.backend,
            kind,
            value,
            is_start_event,
            stt_info.as_ref(),
        );
        if self.cfg.debug {
            self.debug.capture_request(&payload);
        }

        match self.backend.send(&payload).await {
            Ok(reply) => {
                if self.cfg.debug {
                    self.debug.capture_response(&reply.raw);
                }
                let debug = self.debug.take();
                self.messages.push(
                    ConversationMessage::bot(
                        MessageBody::classify(&reply.message),
                        reply.suggestions,
                    )
                    .with_debug(debug),
                );
            }
            Err(e) => {
                log::error!("Message dispatch failed: {e:#}");
                self.debug.capture_response(&Value::Null);
                let debug = self.debug.take();
                self.messages.push(
                    ConversationMessage::bot(MessageBody::Text(GENERIC_ERROR.into()), Vec::new())
                        .with_debug(debug),
                );
            }
        }

        self.set_typing(false);
    }

    fn set_typing(&self, on: bool) {
        if let Some(hook) = &self.typing_hook {
            hook(on);
        }
    }
}
