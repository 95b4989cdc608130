//! Response value returned to client code.

use crate::request::PreparedRequest;
use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use std::borrow::Cow;

/// A realized HTTP response, synthesized or received from the real transport.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    /// Canonical reason phrase for `status`, when one exists.
    pub reason: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub url: String,
    pub request: Option<Box<PreparedRequest>>,
}

impl HttpResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            reason: canonical_reason(status).map(str::to_string),
            headers: HeaderMap::new(),
            body: Bytes::new(),
            url: String::new(),
            request: None,
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    /// All values of a header joined with `", "`.
    pub fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    pub fn content_type(&self) -> Option<String> {
        self.header("content-type")
    }
}

/// Reason phrase such as `OK` or `Not Found`.
pub fn canonical_reason(status: u16) -> Option<&'static str> {
    http::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sets_reason() {
        assert_eq!(HttpResponse::new(404).reason.as_deref(), Some("Not Found"));
        assert_eq!(HttpResponse::new(299).reason, None);
    }

    #[test]
    fn test_json_and_text() {
        let resp = HttpResponse::new(200).with_body(r#"{"a":1}"#);
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["a"], 1);
        assert_eq!(resp.text(), r#"{"a":1}"#);
        assert!(resp.is_success());
    }
}
