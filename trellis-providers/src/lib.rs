pub mod backend;
pub mod request;
pub mod runtime;
pub mod stt;

pub use backend::{
    build_message_request, message_payload, parse_backend_reply, BackendConfig, BackendReply,
    PayloadKind, SttInfo, NO_REPLY_FALLBACK,
};
pub use request::{Body, HttpRequest};
pub use runtime::{execute, HttpResponse};
pub use stt::{build_stt_request, parse_stt_reply, AudioUpload, SttReply, SttRequestConfig};
