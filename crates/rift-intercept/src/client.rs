//! Minimal blocking HTTP client that sends through an `HttpAdapter`.
//!
//! The client only prepares requests; whether they reach the network is up
//! to the hook installed on its adapter.
//!
//! ```no_run
//! use rift_intercept::Client;
//!
//! let resp = Client::new()
//!     .get("http://api.example.com/users")
//!     .query("page", "2")
//!     .header("Accept", "application/json")
//!     .send()?;
//! println!("{}", resp.status);
//! # Ok::<(), rift_intercept::TransportError>(())
//! ```

use crate::error::TransportError;
use crate::multipart::{random_boundary, MultipartForm};
use crate::request::{PreparedRequest, RequestKwargs};
use crate::response::HttpResponse;
use crate::transport::{default_adapter, HttpAdapter};
use bytes::Bytes;
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::HeaderMap;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Blocking client bound to one adapter.
#[derive(Clone)]
pub struct Client {
    adapter: Arc<HttpAdapter>,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Client on the process-wide default adapter.
    pub fn new() -> Self {
        Self::with_adapter(default_adapter())
    }

    pub fn with_adapter(adapter: Arc<HttpAdapter>) -> Self {
        Self { adapter }
    }

    pub fn adapter(&self) -> &Arc<HttpAdapter> {
        &self.adapter
    }

    pub fn request(&self, method: impl Into<String>, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(Arc::clone(&self.adapter), method.into(), url.into())
    }

    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("GET", url)
    }

    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("POST", url)
    }

    pub fn put(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("PUT", url)
    }

    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("PATCH", url)
    }

    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("DELETE", url)
    }

    pub fn head(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("HEAD", url)
    }

    pub fn options(&self, url: impl Into<String>) -> RequestBuilder {
        self.request("OPTIONS", url)
    }
}

/// Request under construction. Errors are deferred to `send`.
pub struct RequestBuilder {
    adapter: Arc<HttpAdapter>,
    method: String,
    url: String,
    headers: HeaderMap,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
    kwargs: RequestKwargs,
    error: Option<TransportError>,
}

impl RequestBuilder {
    fn new(adapter: Arc<HttpAdapter>, method: String, url: String) -> Self {
        let mut kwargs = RequestKwargs::new();
        kwargs.insert("stream".to_string(), Value::Bool(false));
        kwargs.insert("timeout".to_string(), Value::Null);
        kwargs.insert("verify".to_string(), Value::Bool(true));
        Self {
            adapter,
            method,
            url,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: None,
            kwargs,
            error: None,
        }
    }

    /// Append a header. Repeated names are kept.
    pub fn header(mut self, name: &str, value: &str) -> Self {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.append(name, value);
            }
            _ => {
                self.error
                    .get_or_insert(TransportError::InvalidHeader(format!("{}: {}", name, value)));
            }
        }
        self
    }

    /// Append a query parameter to the URL.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.body = Some(Bytes::from(body));
                self.set_default_content_type("application/json");
            }
            Err(e) => {
                self.error.get_or_insert(TransportError::Other(e.to_string()));
            }
        }
        self
    }

    /// URL-encode `pairs` as the body.
    pub fn form<K, V>(mut self, pairs: &[(K, V)]) -> Self
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())))
            .finish();
        self.body = Some(Bytes::from(encoded));
        self.set_default_content_type("application/x-www-form-urlencoded");
        self
    }

    /// Encode `form` with a fresh boundary.
    pub fn multipart(mut self, form: &MultipartForm) -> Self {
        let boundary = random_boundary();
        self.body = Some(form.encode(&boundary));
        self.headers.remove(CONTENT_TYPE);
        match HeaderValue::from_str(&MultipartForm::content_type(&boundary)) {
            Ok(value) => {
                self.headers.insert(CONTENT_TYPE, value);
            }
            Err(_) => {
                self.error
                    .get_or_insert(TransportError::InvalidHeader(boundary));
            }
        }
        self
    }

    /// Set an arbitrary per-call option.
    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    pub fn stream(self, stream: bool) -> Self {
        self.kwarg("stream", stream)
    }

    pub fn timeout(self, timeout: Duration) -> Self {
        self.kwarg("timeout", timeout.as_secs_f64())
    }

    pub fn verify(self, verify: bool) -> Self {
        self.kwarg("verify", verify)
    }

    fn set_default_content_type(&mut self, content_type: &'static str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers
                .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    fn build_url(&self) -> String {
        match Url::parse(&self.url) {
            Ok(mut url) => {
                if !self.query.is_empty() {
                    url.query_pairs_mut().extend_pairs(&self.query);
                }
                url.to_string()
            }
            Err(_) if self.query.is_empty() => self.url.clone(),
            Err(_) => {
                let encoded = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(&self.query)
                    .finish();
                let sep = if self.url.contains('?') { '&' } else { '?' };
                format!("{}{}{}", self.url, sep, encoded)
            }
        }
    }

    /// Prepare the request without sending it.
    pub fn build(&self) -> Result<PreparedRequest, TransportError> {
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        let mut request =
            PreparedRequest::new(self.method.clone(), self.build_url()).with_headers(self.headers.clone());
        request.body = self.body.clone();
        Ok(request)
    }

    pub fn send(self) -> Result<HttpResponse, TransportError> {
        let request = self.build()?;
        self.adapter.send(request, self.kwargs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{InterceptionPoint, SendHook};
    use parking_lot::Mutex;

    /// Hook that records what it saw and answers 200.
    #[derive(Default)]
    struct Capture {
        seen: Mutex<Vec<(PreparedRequest, RequestKwargs)>>,
    }

    impl SendHook for Capture {
        fn on_request(
            &self,
            adapter: &HttpAdapter,
            request: PreparedRequest,
            kwargs: RequestKwargs,
        ) -> Result<HttpResponse, TransportError> {
            self.seen.lock().push((request.clone(), kwargs));
            Ok(adapter.build_response(&request, HttpResponse::new(200)))
        }
    }

    fn capture() -> (Client, Arc<Capture>) {
        let adapter = Arc::new(HttpAdapter::offline());
        let hook = Arc::new(Capture::default());
        adapter.install(hook.clone());
        (Client::with_adapter(adapter), hook)
    }

    #[test]
    fn test_default_kwargs() {
        let (client, hook) = capture();
        client.get("http://x/").send().unwrap();
        let seen = hook.seen.lock();
        let kwargs = &seen[0].1;
        assert_eq!(kwargs["stream"], Value::Bool(false));
        assert_eq!(kwargs["timeout"], Value::Null);
        assert_eq!(kwargs["verify"], Value::Bool(true));
    }

    #[test]
    fn test_query_and_headers() {
        let (client, hook) = capture();
        client
            .get("http://x/search?a=1")
            .query("q", "hello world")
            .header("X-Tag", "a")
            .header("X-Tag", "b")
            .send()
            .unwrap();
        let seen = hook.seen.lock();
        let request = &seen[0].0;
        assert_eq!(request.url, "http://x/search?a=1&q=hello+world");
        assert_eq!(request.header("x-tag").as_deref(), Some("a, b"));
    }

    #[test]
    fn test_json_body_sets_content_type() {
        let (client, hook) = capture();
        client
            .post("http://x/")
            .json(&serde_json::json!({"a": 1}))
            .send()
            .unwrap();
        let seen = hook.seen.lock();
        let request = &seen[0].0;
        assert_eq!(request.body_text().as_deref(), Some(r#"{"a":1}"#));
        assert_eq!(request.header("content-type").as_deref(), Some("application/json"));
    }

    #[test]
    fn test_form_body() {
        let (client, hook) = capture();
        client
            .post("http://x/")
            .form(&[("a", "1"), ("b", "x y")])
            .send()
            .unwrap();
        let seen = hook.seen.lock();
        assert_eq!(seen[0].0.body_text().as_deref(), Some("a=1&b=x+y"));
    }

    #[test]
    fn test_multipart_uses_fresh_boundary() {
        let (client, hook) = capture();
        let form = MultipartForm::new().file("f", &b"data"[..]);
        client.post("http://x/").multipart(&form).send().unwrap();
        let seen = hook.seen.lock();
        let ct = seen[0].0.header("content-type").unwrap();
        let boundary = crate::multipart::boundary_from_content_type(&ct).unwrap();
        assert_eq!(seen[0].0.body.as_ref().unwrap(), &form.encode(boundary));
    }

    #[test]
    fn test_timeout_and_custom_kwargs() {
        let (client, hook) = capture();
        client
            .get("http://x/")
            .timeout(Duration::from_millis(1500))
            .kwarg("cert", "/tmp/cert.pem")
            .send()
            .unwrap();
        let seen = hook.seen.lock();
        assert_eq!(seen[0].1["timeout"], serde_json::json!(1.5));
        assert_eq!(seen[0].1["cert"], serde_json::json!("/tmp/cert.pem"));
    }

    #[test]
    fn test_invalid_header_deferred_to_send() {
        let (client, hook) = capture();
        let err = client.get("http://x/").header("bad name", "v").send().unwrap_err();
        assert!(matches!(err, TransportError::InvalidHeader(_)));
        assert!(hook.seen.lock().is_empty());
    }
}
