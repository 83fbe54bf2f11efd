pub mod capture;
pub mod pcm;
pub mod recorder;
pub mod resample;
pub mod session;
pub mod waveform;

pub use capture::{AudioCapture, AudioPreview, CapturePhase, FinishMode};
pub use pcm::encode_s16le;
pub use recorder::{CaptureError, Microphone};
pub use resample::{resample, STT_SAMPLE_RATE_HZ};
pub use session::{CapturedAudio, LevelCallback, RecordingSession};
pub use waveform::{static_waveform, LiveWaveform, LIVE_BARS};
