//! Registered expectations ("stubs").
//!
//! A `Stub` pairs a method and URL pattern with an ordered list of matchers
//! and a response template. Stubs are built with a consuming builder:
//!
//! ```
//! use rift_intercept::Stub;
//! use serde_json::json;
//!
//! let stub = Stub::get("http://api.example.com/users")
//!     .status(200)
//!     .json(json!({"users": []}));
//! assert_eq!(stub.to_string(), "GET http://api.example.com/users");
//! ```
//!
//! ## Module Structure
//!
//! - `url_pattern`: literal / regex URL matching
//! - `materialize`: response templates and their realization

mod materialize;
mod url_pattern;

pub use materialize::{
    CallbackFn, CallbackReply, CallbackResponse, ContentType, Resolution, StaticResponse,
    StubBody, StubResponse,
};
pub use url_pattern::UrlPattern;

use crate::error::TransportError;
use crate::matchers::{query_string_matcher, MatchResult, Matcher};
use crate::request::PreparedRequest;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One registered expectation.
pub struct Stub {
    method: String,
    url: UrlPattern,
    matchers: Vec<Matcher>,
    match_querystring: Option<bool>,
    query_matcher: Option<Matcher>,
    response: StubResponse,
    call_count: AtomicUsize,
}

impl Stub {
    /// Static stub answering `200` with an empty body.
    pub fn new(method: impl AsRef<str>, url: impl Into<UrlPattern>) -> Self {
        Self::with_response(method, url, StubResponse::Static(StaticResponse::default()))
    }

    /// Stub whose response is computed by `callback` for every match.
    pub fn callback<F>(method: impl AsRef<str>, url: impl Into<UrlPattern>, callback: F) -> Self
    where
        F: Fn(&PreparedRequest) -> Result<CallbackReply, TransportError> + Send + Sync + 'static,
    {
        Self::with_response(
            method,
            url,
            StubResponse::Callback(CallbackResponse::new(callback)),
        )
    }

    /// Stub that forwards matching requests to the real transport.
    pub fn passthrough(method: impl AsRef<str>, url: impl Into<UrlPattern>) -> Self {
        Self::with_response(method, url, StubResponse::Passthrough)
    }

    pub fn with_response(
        method: impl AsRef<str>,
        url: impl Into<UrlPattern>,
        response: StubResponse,
    ) -> Self {
        let mut stub = Self {
            method: method.as_ref().to_string(),
            url: url.into(),
            matchers: Vec::new(),
            match_querystring: None,
            query_matcher: None,
            response,
            call_count: AtomicUsize::new(0),
        };
        stub.refresh_query_matcher();
        stub
    }

    pub fn get(url: impl Into<UrlPattern>) -> Self {
        Self::new("GET", url)
    }

    pub fn post(url: impl Into<UrlPattern>) -> Self {
        Self::new("POST", url)
    }

    pub fn put(url: impl Into<UrlPattern>) -> Self {
        Self::new("PUT", url)
    }

    pub fn patch(url: impl Into<UrlPattern>) -> Self {
        Self::new("PATCH", url)
    }

    pub fn delete(url: impl Into<UrlPattern>) -> Self {
        Self::new("DELETE", url)
    }

    pub fn head(url: impl Into<UrlPattern>) -> Self {
        Self::new("HEAD", url)
    }

    pub fn options(url: impl Into<UrlPattern>) -> Self {
        Self::new("OPTIONS", url)
    }

    fn static_mut(&mut self) -> Option<&mut StaticResponse> {
        match &mut self.response {
            StubResponse::Static(response) => Some(response),
            _ => None,
        }
    }

    /// Response body. Has no effect on callback and passthrough stubs.
    pub fn body(mut self, body: impl Into<StubBody>) -> Self {
        if let Some(response) = self.static_mut() {
            response.body = body.into();
            response.is_json = false;
        }
        self
    }

    /// Serialize `value` as the body and default the content type to
    /// `application/json`.
    ///
    /// # Panics
    ///
    /// Panics if a non-empty body was already set.
    pub fn json(mut self, value: impl Into<serde_json::Value>) -> Self {
        if let Some(response) = self.static_mut() {
            assert!(
                response.body.is_empty(),
                "a stub cannot have both a body and a json payload"
            );
            response.body = StubBody::Text(value.into().to_string());
            response.is_json = true;
        }
        self
    }

    pub fn status(mut self, status: u16) -> Self {
        if let Some(response) = self.static_mut() {
            response.status = status;
        }
        self
    }

    /// Append a response header. Repeated names are kept.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Some(response) = self.static_mut() {
            response.headers.push((name.into(), value.into()));
        }
        self
    }

    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        if let Some(response) = self.static_mut() {
            response
                .headers
                .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        }
        self
    }

    pub fn content_type(self, content_type: impl Into<String>) -> Self {
        self.set_content_type(ContentType::Value(content_type.into()))
    }

    /// Send no `Content-Type` header.
    pub fn no_content_type(self) -> Self {
        self.set_content_type(ContentType::Suppressed)
    }

    fn set_content_type(mut self, content_type: ContentType) -> Self {
        match &mut self.response {
            StubResponse::Static(response) => response.content_type = content_type,
            StubResponse::Callback(response) => response.content_type = content_type,
            StubResponse::Passthrough => {}
        }
        self
    }

    pub fn auto_calculate_content_length(mut self, enabled: bool) -> Self {
        if let Some(response) = self.static_mut() {
            response.auto_calculate_content_length = enabled;
        }
        self
    }

    pub fn matcher(mut self, matcher: Matcher) -> Self {
        self.matchers.push(matcher);
        self
    }

    pub fn matchers(mut self, matchers: impl IntoIterator<Item = Matcher>) -> Self {
        self.matchers.extend(matchers);
        self
    }

    /// Whether the query string of a literal URL must match.
    ///
    /// Defaults to `true` when the registered URL carries a query string.
    /// Regex URLs never add a query matcher.
    pub fn match_querystring(mut self, enabled: bool) -> Self {
        self.match_querystring = Some(enabled);
        self.refresh_query_matcher();
        self
    }

    fn refresh_query_matcher(&mut self) {
        let query = self.url.query().map(str::to_string);
        let enabled = match (&self.url, self.match_querystring) {
            (UrlPattern::Regex { .. }, _) => false,
            (_, Some(explicit)) => explicit,
            (_, None) => query.is_some(),
        };
        self.query_matcher = enabled.then(|| query_string_matcher(query.as_deref()));
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    pub fn url(&self) -> &UrlPattern {
        &self.url
    }

    /// User-supplied matchers, in evaluation order.
    pub fn matcher_list(&self) -> &[Matcher] {
        &self.matchers
    }

    pub fn response(&self) -> &StubResponse {
        &self.response
    }

    pub fn is_passthrough(&self) -> bool {
        matches!(self.response, StubResponse::Passthrough)
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub(crate) fn record_call(&self) {
        self.call_count.fetch_add(1, Ordering::SeqCst);
    }

    /// Check method, URL and every matcher, stopping at the first failure.
    pub fn matches(&self, request: &PreparedRequest) -> MatchResult {
        if request.method != self.method {
            return MatchResult::fail("Method does not match");
        }
        if !self.url.matches_url(&request.url) {
            return MatchResult::fail("URL does not match");
        }
        for matcher in self.matchers.iter().chain(self.query_matcher.iter()) {
            let result = matcher.matches(request);
            if !result.matched {
                return result;
            }
        }
        MatchResult::ok()
    }

    /// Realize the response for a matched request.
    pub fn get_response(&self, request: &PreparedRequest) -> Result<Resolution, TransportError> {
        self.response.materialize(request)
    }
}

impl Clone for Stub {
    fn clone(&self) -> Self {
        Self {
            method: self.method.clone(),
            url: self.url.clone(),
            matchers: self.matchers.clone(),
            match_querystring: self.match_querystring,
            query_matcher: self.query_matcher.clone(),
            response: self.response.clone(),
            call_count: AtomicUsize::new(self.call_count()),
        }
    }
}

/// Stubs are equal when method and URL (or pattern text) are equal.
impl PartialEq for Stub {
    fn eq(&self, other: &Self) -> bool {
        self.method == other.method && self.url == other.url
    }
}

impl fmt::Display for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

impl fmt::Debug for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stub")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("matchers", &self.matchers)
            .field("response", &self.response)
            .field("call_count", &self.call_count())
            .finish()
    }
}
