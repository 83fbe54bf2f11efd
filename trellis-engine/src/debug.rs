use serde_json::Value;
use trellis_core::DebugData;

/// Collects the exact request and response of one exchange.
///
/// Values are cloned at capture time so later mutation of the conversation
/// can never change what was recorded. `take` clears the capture for the
/// next exchange.
#[derive(Debug, Default)]
pub struct DebugCapture {
    request: Option<Value>,
    response: Option<Value>,
    stt: Option<Value>,
}

impl DebugCapture {
    pub fn capture_request(&mut self, payload: &Value) {
        self.request = Some(payload.clone());
    }

    pub fn capture_response(&mut self, body: &Value) {
        self.response = Some(body.clone());
    }

    pub fn capture_stt(&mut self, body: &Value) {
        self.stt = Some(body.clone());
    }

    /// Bundle the capture for attachment to a bot message, emptying it.
    /// Returns `None` unless both sides of the exchange were recorded.
    pub fn take(&mut self) -> Option<DebugData> {
        let stt = self.stt.take();
        match (self.request.take(), self.response.take()) {
            (Some(request), Some(response)) => Some(DebugData {
                request,
                response,
                stt,
            }),
            _ => None,
        }
    }
}
