//! Response templates and their materialization into `HttpResponse`.

use crate::error::TransportError;
use crate::request::PreparedRequest;
use crate::response::{canonical_reason, HttpResponse};
use bytes::Bytes;
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderName, HeaderValue};
use std::fmt;
use std::sync::Arc;

/// Body of a stubbed response, or the failure to raise instead.
#[derive(Debug, Clone)]
pub enum StubBody {
    Bytes(Bytes),
    Text(String),
    Error(TransportError),
}

impl StubBody {
    pub fn is_empty(&self) -> bool {
        match self {
            StubBody::Bytes(b) => b.is_empty(),
            StubBody::Text(t) => t.is_empty(),
            StubBody::Error(_) => false,
        }
    }

    fn has_wide_chars(&self) -> bool {
        match self {
            StubBody::Text(t) => t.chars().any(|c| c as u32 > 128),
            _ => false,
        }
    }

    /// Body bytes, or `None` for an error body.
    pub fn bytes(&self) -> Option<Bytes> {
        match self {
            StubBody::Bytes(b) => Some(b.clone()),
            StubBody::Text(t) => Some(Bytes::from(t.clone())),
            StubBody::Error(_) => None,
        }
    }
}

impl Default for StubBody {
    fn default() -> Self {
        StubBody::Text(String::new())
    }
}

impl From<&str> for StubBody {
    fn from(text: &str) -> Self {
        StubBody::Text(text.to_string())
    }
}

impl From<String> for StubBody {
    fn from(text: String) -> Self {
        StubBody::Text(text)
    }
}

impl From<Vec<u8>> for StubBody {
    fn from(bytes: Vec<u8>) -> Self {
        StubBody::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for StubBody {
    fn from(bytes: &'static [u8]) -> Self {
        StubBody::Bytes(Bytes::from_static(bytes))
    }
}

impl From<Bytes> for StubBody {
    fn from(bytes: Bytes) -> Self {
        StubBody::Bytes(bytes)
    }
}

impl From<TransportError> for StubBody {
    fn from(error: TransportError) -> Self {
        StubBody::Error(error)
    }
}

/// `Content-Type` policy of a stub.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ContentType {
    /// Derived from the body: JSON, UTF-8 text or plain text.
    #[default]
    Unset,
    /// No `Content-Type` header at all.
    Suppressed,
    Value(String),
}

impl ContentType {
    fn resolve(&self, body: &StubBody, is_json: bool) -> Option<String> {
        match self {
            ContentType::Value(v) => Some(v.clone()),
            ContentType::Suppressed => None,
            ContentType::Unset if is_json => Some("application/json".to_string()),
            ContentType::Unset if body.has_wide_chars() => {
                Some("text/plain; charset=utf-8".to_string())
            }
            ContentType::Unset => Some("text/plain".to_string()),
        }
    }
}

/// Template for a static response.
#[derive(Debug, Clone)]
pub struct StaticResponse {
    pub body: StubBody,
    pub status: u16,
    /// Explicit headers; repeated names are kept.
    pub headers: Vec<(String, String)>,
    pub content_type: ContentType,
    pub auto_calculate_content_length: bool,
    pub(crate) is_json: bool,
}

impl Default for StaticResponse {
    fn default() -> Self {
        Self {
            body: StubBody::default(),
            status: 200,
            headers: Vec::new(),
            content_type: ContentType::Unset,
            auto_calculate_content_length: false,
            is_json: false,
        }
    }
}

impl StaticResponse {
    pub fn is_json(&self) -> bool {
        self.is_json
    }

    /// Resolved `Content-Type`, if one is sent.
    pub fn resolved_content_type(&self) -> Option<String> {
        self.content_type.resolve(&self.body, self.is_json)
    }

    fn materialize(&self) -> Result<HttpResponse, TransportError> {
        let body = match &self.body {
            StubBody::Error(e) => return Err(e.clone()),
            other => other.bytes().unwrap_or_default(),
        };

        let mut headers = HeaderMap::new();
        if let Some(ct) = self.resolved_content_type() {
            headers.insert(CONTENT_TYPE, header_value(&ct)?);
        }
        append_headers(&mut headers, &self.headers)?;
        if self.auto_calculate_content_length && !headers.contains_key(CONTENT_LENGTH) {
            headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
        }

        Ok(HttpResponse {
            status: self.status,
            reason: canonical_reason(self.status).map(str::to_string),
            headers,
            body,
            url: String::new(),
            request: None,
        })
    }
}

/// Status, headers and body computed by a callback.
#[derive(Debug, Clone)]
pub struct CallbackReply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: StubBody,
}

impl CallbackReply {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: StubBody::default(),
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<StubBody>) -> Self {
        self.body = body.into();
        self
    }
}

pub type CallbackFn =
    dyn Fn(&PreparedRequest) -> Result<CallbackReply, TransportError> + Send + Sync;

/// Template whose response is computed per request.
#[derive(Clone)]
pub struct CallbackResponse {
    pub(crate) callback: Arc<CallbackFn>,
    pub content_type: ContentType,
}

impl CallbackResponse {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&PreparedRequest) -> Result<CallbackReply, TransportError> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            content_type: ContentType::Unset,
        }
    }

    fn materialize(&self, request: &PreparedRequest) -> Result<HttpResponse, TransportError> {
        let reply = (self.callback)(request)?;
        let body = match reply.body {
            StubBody::Error(e) => return Err(e),
            other => other.bytes().unwrap_or_default(),
        };

        let mut headers = HeaderMap::new();
        let overrides_type = reply
            .headers
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("content-type"));
        if !overrides_type {
            let default_type = match &self.content_type {
                ContentType::Value(v) => Some(v.clone()),
                ContentType::Suppressed => None,
                ContentType::Unset => Some("text/plain".to_string()),
            };
            if let Some(ct) = default_type {
                headers.insert(CONTENT_TYPE, header_value(&ct)?);
            }
        }
        append_headers(&mut headers, &reply.headers)?;

        Ok(HttpResponse {
            status: reply.status,
            reason: canonical_reason(reply.status).map(str::to_string),
            headers,
            body,
            url: String::new(),
            request: None,
        })
    }
}

impl fmt::Debug for CallbackResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackResponse")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

/// What a stub does once it has matched.
#[derive(Debug, Clone)]
pub enum StubResponse {
    Static(StaticResponse),
    Callback(CallbackResponse),
    /// Forward to the real transport.
    Passthrough,
}

/// Outcome of materializing a stub.
#[derive(Debug)]
pub enum Resolution {
    Respond(HttpResponse),
    Forward,
}

impl StubResponse {
    pub fn materialize(&self, request: &PreparedRequest) -> Result<Resolution, TransportError> {
        match self {
            StubResponse::Static(response) => response.materialize().map(Resolution::Respond),
            StubResponse::Callback(response) => {
                response.materialize(request).map(Resolution::Respond)
            }
            StubResponse::Passthrough => Ok(Resolution::Forward),
        }
    }
}

fn header_value(value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::from_str(value).map_err(|_| TransportError::InvalidHeader(value.to_string()))
}

fn append_headers(headers: &mut HeaderMap, pairs: &[(String, String)]) -> Result<(), TransportError> {
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| TransportError::InvalidHeader(name.clone()))?;
        headers.append(name, header_value(value)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PreparedRequest {
        PreparedRequest::new("GET", "http://x/")
    }

    fn respond(response: &StubResponse) -> HttpResponse {
        match response.materialize(&request()).unwrap() {
            Resolution::Respond(r) => r,
            Resolution::Forward => panic!("expected a response"),
        }
    }

    #[test]
    fn test_static_defaults() {
        let resp = respond(&StubResponse::Static(StaticResponse::default()));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.reason.as_deref(), Some("OK"));
        assert_eq!(resp.content_type().as_deref(), Some("text/plain"));
        assert!(resp.body.is_empty());
        assert!(!resp.headers.contains_key(CONTENT_LENGTH));
    }

    #[test]
    fn test_static_utf8_text_content_type() {
        let resp = respond(&StubResponse::Static(StaticResponse {
            body: "caf\u{e9} \u{2603}".into(),
            ..Default::default()
        }));
        assert_eq!(resp.content_type().as_deref(), Some("text/plain; charset=utf-8"));
    }

    #[test]
    fn test_static_duplicate_headers_and_length() {
        let resp = respond(&StubResponse::Static(StaticResponse {
            body: "hello".into(),
            headers: vec![
                ("Set-Cookie".into(), "a=1".into()),
                ("Set-Cookie".into(), "b=2".into()),
            ],
            content_type: ContentType::Suppressed,
            auto_calculate_content_length: true,
            ..Default::default()
        }));
        assert_eq!(resp.headers.get_all("set-cookie").iter().count(), 2);
        assert_eq!(resp.header("content-length").as_deref(), Some("5"));
        assert!(resp.content_type().is_none());
    }

    #[test]
    fn test_static_keeps_explicit_length() {
        let resp = respond(&StubResponse::Static(StaticResponse {
            body: "hello".into(),
            headers: vec![("Content-Length".into(), "99".into())],
            auto_calculate_content_length: true,
            ..Default::default()
        }));
        assert_eq!(resp.header("content-length").as_deref(), Some("99"));
    }

    #[test]
    fn test_static_error_body_raises() {
        let response = StubResponse::Static(StaticResponse {
            body: TransportError::Timeout("read".into()).into(),
            ..Default::default()
        });
        let err = response.materialize(&request()).unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
    }

    #[test]
    fn test_callback_replaces_default_content_type() {
        let response = StubResponse::Callback(CallbackResponse::new(|req| {
            Ok(CallbackReply::new(201)
                .header("content-type", "application/json")
                .body(format!("{{\"method\":\"{}\"}}", req.method)))
        }));
        let resp = respond(&response);
        assert_eq!(resp.status, 201);
        assert_eq!(resp.headers.get_all(CONTENT_TYPE).iter().count(), 1);
        assert_eq!(resp.content_type().as_deref(), Some("application/json"));
        assert_eq!(resp.text(), r#"{"method":"GET"}"#);
    }

    #[test]
    fn test_callback_default_content_type() {
        let response =
            StubResponse::Callback(CallbackResponse::new(|_| Ok(CallbackReply::new(200).header("X-A", "1"))));
        let resp = respond(&response);
        assert_eq!(resp.content_type().as_deref(), Some("text/plain"));
        assert_eq!(resp.header("x-a").as_deref(), Some("1"));
    }

    #[test]
    fn test_callback_errors_raise() {
        let raising = StubResponse::Callback(CallbackResponse::new(|_| {
            Err(TransportError::Connection("reset".into()))
        }));
        assert!(raising.materialize(&request()).is_err());

        let error_body = StubResponse::Callback(CallbackResponse::new(|_| {
            Ok(CallbackReply::new(200).body(TransportError::Other("boom".into())))
        }));
        let err = error_body.materialize(&request()).unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn test_passthrough_forwards() {
        assert!(matches!(
            StubResponse::Passthrough.materialize(&request()).unwrap(),
            Resolution::Forward
        ));
    }
}
