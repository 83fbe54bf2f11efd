pub mod controller;
pub mod debug;
pub mod http;
pub mod traits;

pub use controller::{
    ControllerConfig, ConversationController, TypingHook, GENERIC_ERROR, NO_SPEECH_DETECTED,
    STT_FAILED,
};
pub use debug::DebugCapture;
pub use http::{HttpChatBackend, HttpSpeechToText};
pub use traits::{ChatBackend, SpeechToText};
