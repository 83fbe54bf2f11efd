use serde::{Deserialize, Serialize};

/// One outgoing request, either a JSON message POST or a multipart voice
/// upload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Body,
}

impl std::fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Voice uploads carry raw PCM; log a size summary, not the bytes.
        let body_summary = match &self.body {
            Body::Json(s) => format!("Json(len={})", s.len()),
            Body::MultipartFormData { boundary, bytes } => {
                format!("MultipartFormData(boundary={}, bytes_len={})", boundary, bytes.len())
            }
        };

        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &self.headers)
            .field("body", &body_summary)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    Json(String),
    MultipartFormData { boundary: String, bytes: Vec<u8> },
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let req = HttpRequest {
            method: "POST".into(),
            url: "http://localhost:8000/message".into(),
            headers: vec![("Content-Type".into(), "application/json".into())],
            body: Body::Json("{}".into()),
        };
        assert_eq!(req.header("content-type"), Some("application/json"));
        assert_eq!(req.header("accept"), None);
    }

    #[test]
    fn debug_summarizes_bodies_instead_of_dumping_them() {
        let req = HttpRequest {
            method: "POST".into(),
            url: "http://localhost:8000/stt".into(),
            headers: vec![],
            body: Body::MultipartFormData {
                boundary: "Boundary-abc".into(),
                bytes: vec![0x7f; 4096],
            },
        };

        let s = format!("{req:?}");
        assert!(s.contains("bytes_len=4096"));
        assert!(!s.contains("127, 127"));
    }
}
