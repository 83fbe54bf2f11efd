use std::sync::{Arc, Mutex};
use std::time::Duration;

use trellis_audio::{
    encode_s16le, resample, AudioCapture, CaptureError, CapturePhase, CapturedAudio, FinishMode,
    LevelCallback, LiveWaveform, Microphone, RecordingSession, STT_SAMPLE_RATE_HZ,
};
use trellis_core::{new_session_id, ConversationMessage, WidgetConfig};
use trellis_engine::{ChatBackend, ControllerConfig, ConversationController, SpeechToText};
use trellis_providers::{AudioUpload, BackendConfig};

use crate::window::WindowState;

const MIC_ERROR: &str = "Error al acceder al micrófono.";
const FILE_RECEIVED_ACK: &str = "He recibido tu archivo. ¿En qué puedo ayudarte con él?";
const FILE_ACK_DELAY: Duration = Duration::from_millis(1000);

/// Shown as a bot message when the microphone cannot be opened.
/// Details are in logs.
pub fn user_facing_capture_error(e: &CaptureError) -> String {
    log::error!("Microphone capture failed: {e}");
    MIC_ERROR.into()
}

/// The widget behind one embedded chat element.
///
/// Owns the resolved configuration, the conversation, the voice-note
/// lifecycle, and the panel state. All user interactions funnel through
/// here; nothing below this layer knows about the window or attachments.
pub struct ChatWidget {
    config: WidgetConfig,
    controller: ConversationController,
    capture: AudioCapture,
    live_waveform: Arc<Mutex<LiveWaveform>>,
    window: WindowState,
    started: bool,
}

impl ChatWidget {
    pub fn new(
        config: WidgetConfig,
        backend: Arc<dyn ChatBackend>,
        stt: Option<Arc<dyn SpeechToText>>,
    ) -> Self {
        Self::with_session_id(config, new_session_id(), backend, stt)
    }

    /// Construct with a caller-chosen session id, so sibling services (for
    /// example the transcription endpoint) can share it.
    pub fn with_session_id(
        config: WidgetConfig,
        session_id: String,
        backend: Arc<dyn ChatBackend>,
        stt: Option<Arc<dyn SpeechToText>>,
    ) -> Self {
        let controller = ConversationController::new(
            ControllerConfig {
                backend: BackendConfig {
                    endpoint: config.endpoint.clone(),
                    tree_id: config.tree_id.clone(),
                    session_id,
                },
                debug: config.debug,
                response_delay: config
                    .response_delay
                    .then(|| Duration::from_millis(config.response_delay_ms)),
            },
            backend,
            stt,
        );

        Self {
            config,
            controller,
            capture: AudioCapture::new(FinishMode::default()),
            live_waveform: Arc::new(Mutex::new(LiveWaveform::new())),
            window: WindowState::Closed,
            started: false,
        }
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    pub fn window(&self) -> WindowState {
        self.window
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        self.controller.messages()
    }

    pub fn clear_history(&mut self) {
        self.controller.clear_history();
    }

    pub fn controller_mut(&mut self) -> &mut ConversationController {
        &mut self.controller
    }

    /// Fire the configured start event, once, into an empty conversation.
    pub async fn init(&mut self) {
        if self.started {
            return;
        }
        self.started = true;

        if let Some(event) = self.config.start_event.clone() {
            if self.controller.messages().is_empty() {
                self.controller.send_event(&event, true).await;
            }
        }
    }

    pub fn toggle_window(&mut self) {
        self.window = self.window.toggle();
        if self.window == WindowState::Open && self.config.maximize_on_start {
            self.window = self.window.maximize(self.config.enable_maximize);
        }
    }

    pub fn open_window(&mut self) {
        if self.window == WindowState::Closed {
            self.toggle_window();
        }
    }

    pub fn close_window(&mut self) {
        self.window = self.window.close();
    }

    pub fn minimize_window(&mut self) {
        self.window = self.window.minimize();
    }

    pub fn toggle_maximize(&mut self) {
        self.window = self.window.toggle_maximize(self.config.enable_maximize);
    }

    pub async fn send_message(&mut self, text: &str) {
        self.controller.send_text(text).await;
    }

    /// A tapped quick-reply or card button: its payload goes out as text.
    pub async fn send_action_payload(&mut self, payload: &str) {
        self.controller.send_text(payload).await;
    }

    /// The attachment flow. Files never reach the backend; the widget
    /// acknowledges them locally after a size check.
    pub async fn attach_file(&mut self, name: &str, size: u64) {
        if !self.config.file_upload {
            log::warn!("File attachment ignored: uploads are disabled");
            return;
        }

        if size > self.config.max_file_size {
            self.controller.push_bot_note(&format!(
                "El archivo es demasiado grande. Tamaño máximo: {}",
                format_file_size(self.config.max_file_size)
            ));
            return;
        }

        self.controller
            .push_user_note(&format!("📎 Archivo enviado: {name}"));
        tokio::time::sleep(FILE_ACK_DELAY).await;
        self.controller.push_bot_note(FILE_RECEIVED_ACK);
    }

    pub fn capture_phase(&self) -> CapturePhase {
        self.capture.phase()
    }

    pub fn recording_elapsed_seconds(&self) -> u64 {
        self.capture.elapsed_seconds()
    }

    /// Open the default microphone and start recording. Failure surfaces as
    /// a bot message, never an error.
    pub fn start_recording(&mut self) {
        if !self.config.microphone {
            log::warn!("Recording ignored: microphone is disabled");
            return;
        }
        if self.capture.phase() != CapturePhase::Idle {
            return;
        }

        let waveform = self.live_waveform.clone();
        let on_level: LevelCallback = Arc::new(move |chunk: &[f32]| {
            waveform.lock().unwrap().update(chunk);
        });

        match Microphone::record(None, Some(on_level)) {
            Ok(session) => self.adopt_recording(session),
            Err(e) => {
                let msg = user_facing_capture_error(&e);
                self.controller.push_bot_note(&msg);
            }
        }
    }

    /// The animated bar heights shown while recording.
    pub fn live_waveform_heights(&self) -> Vec<f32> {
        self.live_waveform.lock().unwrap().heights().to_vec()
    }

    /// Hand an already-open recording session to the widget. Headless
    /// embedders and tests use this instead of `start_recording`.
    pub fn adopt_recording(&mut self, session: RecordingSession) {
        self.live_waveform.lock().unwrap().reset();
        if let Err(e) = self.capture.start(session) {
            log::warn!("Recording not adopted: {e}");
        }
    }

    /// The level callback a headless embedder should hand to its own
    /// recording source to keep the live waveform animating.
    pub fn level_callback(&self) -> LevelCallback {
        let waveform = self.live_waveform.clone();
        Arc::new(move |chunk: &[f32]| {
            waveform.lock().unwrap().update(chunk);
        })
    }

    pub fn toggle_pause_recording(&mut self) {
        if let Err(e) = self.capture.toggle_pause() {
            log::warn!("Pause toggle ignored: {e}");
        }
    }

    pub fn cancel_recording(&mut self) {
        self.capture.cancel();
    }

    /// Stop the active recording. In preview mode the audio parks in the
    /// preview phase; otherwise it uploads immediately.
    pub async fn stop_recording(&mut self) {
        match self.capture.stop() {
            Ok(Some(audio)) => self.send_captured(audio).await,
            Ok(None) => {}
            Err(e) => {
                let msg = user_facing_capture_error(&e);
                self.controller.push_bot_note(&msg);
            }
        }
    }

    pub fn preview(&mut self) -> Option<&mut trellis_audio::AudioPreview> {
        self.capture.preview()
    }

    pub fn discard_preview(&mut self) {
        self.capture.discard_preview();
    }

    /// Send the previewed voice note.
    pub async fn send_preview(&mut self) {
        if let Some(audio) = self.capture.take_preview_audio() {
            self.send_captured(audio).await;
        }
    }

    async fn send_captured(&mut self, audio: CapturedAudio) {
        let resampled = match resample(&audio, STT_SAMPLE_RATE_HZ) {
            Ok(a) => a,
            Err(e) => {
                log::error!("Voice note resample failed: {e:#}");
                self.controller.push_bot_note(trellis_engine::STT_FAILED);
                return;
            }
        };

        let upload = AudioUpload {
            filename: "recording.pcm".into(),
            mime_type: "application/octet-stream".into(),
            bytes: encode_s16le(&resampled.samples),
        };
        self.controller.send_audio(upload).await;
    }
}

/// Human-readable size with binary units, trailing zeros trimmed.
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".into();
    }
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    let rendered = format!("{value:.2}");
    let rendered = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", rendered, UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::Value;
    use std::sync::Mutex;
    use trellis_core::{Sender, WidgetOptions};
    use trellis_providers::{parse_backend_reply, BackendReply};

    struct ScriptedBackend {
        payloads: Arc<Mutex<Vec<Value>>>,
        body: &'static str,
    }

    impl ScriptedBackend {
        fn replying(body: &'static str) -> (Arc<Self>, Arc<Mutex<Vec<Value>>>) {
            let payloads = Arc::new(Mutex::new(Vec::new()));
            let backend = Arc::new(Self {
                payloads: payloads.clone(),
                body,
            });
            (backend, payloads)
        }
    }

    #[async_trait]
    impl ChatBackend for ScriptedBackend {
        async fn send(&self, payload: &Value) -> anyhow::Result<BackendReply> {
            self.payloads.lock().unwrap().push(payload.clone());
            parse_backend_reply(self.body.as_bytes())
        }
    }

    fn config_with(attrs: &[(&str, &str)]) -> WidgetConfig {
        let mut pairs = vec![("tree-id", "onboarding")];
        pairs.extend_from_slice(attrs);
        WidgetConfig::resolve(
            &WidgetOptions::from_attributes(pairs.iter().copied()),
            &WidgetOptions::default(),
        )
        .unwrap()
    }

    fn widget_with(attrs: &[(&str, &str)], body: &'static str) -> (ChatWidget, Arc<Mutex<Vec<Value>>>) {
        let (backend, payloads) = ScriptedBackend::replying(body);
        (ChatWidget::new(config_with(attrs), backend, None), payloads)
    }

    #[tokio::test]
    async fn init_fires_the_start_event_exactly_once() {
        let (mut widget, payloads) =
            widget_with(&[("start-event", "welcome")], r#"{"message":"bienvenido"}"#);

        widget.init().await;
        widget.init().await;

        let sent = payloads.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0]["type"], "event");
        assert_eq!(sent[0]["value"], "welcome");
        assert_eq!(sent[0]["is_start_event"], true);
        drop(sent);

        assert_eq!(widget.messages().len(), 1);
        assert_eq!(widget.messages()[0].sender, Sender::Bot);
    }

    #[tokio::test]
    async fn init_without_start_event_sends_nothing() {
        let (mut widget, payloads) = widget_with(&[], r#"{"message":"x"}"#);
        widget.init().await;
        assert!(payloads.lock().unwrap().is_empty());
        assert!(widget.messages().is_empty());
    }

    #[tokio::test]
    async fn window_toggles_and_honors_maximize_on_start() {
        let (mut widget, _) = widget_with(&[("maximize-on-start", "true")], r#"{"message":"x"}"#);
        assert_eq!(widget.window(), WindowState::Closed);

        widget.toggle_window();
        assert_eq!(widget.window(), WindowState::Maximized);

        widget.minimize_window();
        assert_eq!(widget.window(), WindowState::Open);

        widget.close_window();
        assert_eq!(widget.window(), WindowState::Closed);
    }

    #[tokio::test]
    async fn maximize_stays_gated_off() {
        let (mut widget, _) = widget_with(&[("enable-maximize", "false")], r#"{"message":"x"}"#);
        widget.toggle_window();
        widget.toggle_maximize();
        assert_eq!(widget.window(), WindowState::Open);
    }

    #[tokio::test]
    async fn oversized_files_are_rejected_with_the_limit_spelled_out() {
        let (mut widget, payloads) =
            widget_with(&[("max-file-size", "1024")], r#"{"message":"x"}"#);

        widget.attach_file("video.mp4", 4096).await;

        assert!(payloads.lock().unwrap().is_empty());
        let msgs = widget.messages();
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].sender, Sender::Bot);
        assert_eq!(
            msgs[0].content.as_text(),
            Some("El archivo es demasiado grande. Tamaño máximo: 1 KB")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn accepted_files_get_a_local_acknowledgement() {
        let (mut widget, payloads) = widget_with(&[], r#"{"message":"x"}"#);

        widget.attach_file("informe.pdf", 2048).await;

        assert!(payloads.lock().unwrap().is_empty());
        let msgs = widget.messages();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].sender, Sender::User);
        assert_eq!(
            msgs[0].content.as_text(),
            Some("📎 Archivo enviado: informe.pdf")
        );
        assert_eq!(msgs[1].content.as_text(), Some(FILE_RECEIVED_ACK));
    }

    #[tokio::test]
    async fn disabled_uploads_are_ignored_silently() {
        let (mut widget, _) = widget_with(&[("file-upload", "false")], r#"{"message":"x"}"#);
        widget.attach_file("a.txt", 10).await;
        assert!(widget.messages().is_empty());
    }

    #[tokio::test]
    async fn adopted_recording_flows_into_a_preview() {
        let (mut widget, _) = widget_with(&[], r#"{"message":"x"}"#);

        let (tx, rx) = std::sync::mpsc::channel();
        let session = RecordingSession::from_source(rx, 4, Some(widget.level_callback()));
        widget.adopt_recording(session);

        tx.send(vec![0.1; 8]).unwrap();
        std::thread::sleep(Duration::from_millis(150));

        assert_eq!(widget.capture_phase(), CapturePhase::Recording);
        assert!(widget.recording_elapsed_seconds() >= 2);
        assert_eq!(
            widget.live_waveform_heights().len(),
            trellis_audio::LIVE_BARS
        );

        widget.stop_recording().await;
        assert_eq!(widget.capture_phase(), CapturePhase::Preview);
        assert!(widget.preview().is_some());

        widget.discard_preview();
        assert_eq!(widget.capture_phase(), CapturePhase::Idle);
        assert!(widget.messages().is_empty());
    }

    #[test]
    fn file_sizes_render_like_the_panel_shows_them() {
        assert_eq!(format_file_size(0), "0 Bytes");
        assert_eq!(format_file_size(512), "512 Bytes");
        assert_eq!(format_file_size(1024), "1 KB");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5 MB");
        assert_eq!(format_file_size(3 * 1024 * 1024 * 1024), "3 GB");
    }
}
