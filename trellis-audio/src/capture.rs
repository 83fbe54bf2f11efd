use crate::recorder::CaptureError;
use crate::session::{CapturedAudio, RecordingSession};
use crate::waveform::static_waveform;

/// What happens when the user presses stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FinishMode {
    /// Park the recording in a preview the user can play back, send, or
    /// discard.
    #[default]
    PreviewBeforeSend,
    /// Hand the audio straight to the caller for upload.
    SendImmediately,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapturePhase {
    Idle,
    Recording,
    Paused,
    Preview,
}

/// A stopped recording awaiting a send-or-discard decision.
pub struct AudioPreview {
    audio: CapturedAudio,
    playing: bool,
}

impl AudioPreview {
    pub fn new(audio: CapturedAudio) -> Self {
        Self {
            audio,
            playing: false,
        }
    }

    pub fn duration_seconds(&self) -> f64 {
        self.audio.duration_seconds()
    }

    pub fn waveform(&self, columns: usize) -> Vec<(f32, f32)> {
        static_waveform(&self.audio.samples, columns)
    }

    pub fn toggle_playback(&mut self) -> bool {
        self.playing = !self.playing;
        self.playing
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn into_audio(self) -> CapturedAudio {
        self.audio
    }
}

enum State {
    Idle,
    Active(RecordingSession),
    Preview(AudioPreview),
}

/// The voice-note lifecycle behind the microphone button.
///
/// Idle -> recording -> (paused <-> recording) -> stopped or cancelled;
/// stopping either yields audio immediately or parks it in a preview,
/// depending on the finish mode. Cancel from any phase returns to idle and
/// the abandoned recording is discarded, never sent.
pub struct AudioCapture {
    mode: FinishMode,
    state: State,
}

impl AudioCapture {
    pub fn new(mode: FinishMode) -> Self {
        Self {
            mode,
            state: State::Idle,
        }
    }

    pub fn phase(&self) -> CapturePhase {
        match &self.state {
            State::Idle => CapturePhase::Idle,
            State::Active(session) => {
                if session.is_paused() {
                    CapturePhase::Paused
                } else {
                    CapturePhase::Recording
                }
            }
            State::Preview(_) => CapturePhase::Preview,
        }
    }

    /// Adopt a freshly opened recording session. Only legal from idle.
    pub fn start(&mut self, session: RecordingSession) -> Result<(), CaptureError> {
        match self.state {
            State::Idle => {
                self.state = State::Active(session);
                Ok(())
            }
            _ => Err(CaptureError::InvalidTransition(
                "start requires the idle phase",
            )),
        }
    }

    /// Flip between recording and paused; returns true when now paused.
    pub fn toggle_pause(&mut self) -> Result<bool, CaptureError> {
        match &self.state {
            State::Active(session) => session.toggle_pause(),
            _ => Err(CaptureError::InvalidTransition(
                "pause requires an active recording",
            )),
        }
    }

    /// Seconds of audio accumulated so far; zero outside a recording.
    pub fn elapsed_seconds(&self) -> u64 {
        match &self.state {
            State::Active(session) => session.elapsed_seconds(),
            _ => 0,
        }
    }

    /// Abandon whatever is in flight and return to idle.
    pub fn cancel(&mut self) {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Active(session) => session.cancel(),
            State::Idle | State::Preview(_) => {}
        }
    }

    /// Finish the active recording.
    ///
    /// Returns `Some(audio)` in send-immediately mode; in preview mode the
    /// audio moves into the preview phase and `None` is returned.
    pub fn stop(&mut self) -> Result<Option<CapturedAudio>, CaptureError> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Active(session) => {
                let audio = session.stop()?;
                match self.mode {
                    FinishMode::SendImmediately => Ok(Some(audio)),
                    FinishMode::PreviewBeforeSend => {
                        self.state = State::Preview(AudioPreview::new(audio));
                        Ok(None)
                    }
                }
            }
            other => {
                self.state = other;
                Err(CaptureError::InvalidTransition(
                    "stop requires an active recording",
                ))
            }
        }
    }

    pub fn preview(&mut self) -> Option<&mut AudioPreview> {
        match &mut self.state {
            State::Preview(preview) => Some(preview),
            _ => None,
        }
    }

    /// Drop the previewed recording and return to idle.
    pub fn discard_preview(&mut self) {
        if matches!(self.state, State::Preview(_)) {
            self.state = State::Idle;
        }
    }

    /// Take the previewed audio for upload, returning to idle.
    pub fn take_preview_audio(&mut self) -> Option<CapturedAudio> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Preview(preview) => Some(preview.into_audio()),
            other => {
                self.state = other;
                None
            }
        }
    }
}
