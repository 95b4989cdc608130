//! Record real traffic into a fixture.
//!
//! While started, a `Recorder` forwards every request on its target to the
//! real transport and appends a static stub describing the answer to a
//! strict-order registry. `record` runs a closure under recording and writes
//! the result as a fixture file that `HttpMock::add_from_file` can replay.

use crate::error::{FixtureError, TransportError};
use crate::fixtures;
use crate::registry::{OrderedRegistry, Registry};
use crate::request::{PreparedRequest, RequestKwargs};
use crate::response::HttpResponse;
use crate::stub::Stub;
use crate::transport::{default_adapter, HookId, HttpAdapter, InterceptionPoint, SendHook};
use http::header::CONTENT_TYPE;
use once_cell::sync::Lazy;
use parking_lot::{Mutex, MutexGuard};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::debug;

struct RecorderInner {
    registry: Mutex<OrderedRegistry>,
    hook: Mutex<Option<HookId>>,
    target: Arc<dyn InterceptionPoint>,
}

impl RecorderInner {
    fn on_request(
        &self,
        adapter: &HttpAdapter,
        mut request: PreparedRequest,
        kwargs: RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        request.capture(kwargs.clone());
        let response = adapter.real_send(request.clone(), &kwargs)?;
        let stub = describe(&request, &response);
        debug!("Recorded {}", stub);
        self.registry.lock().add(Arc::new(stub));
        Ok(response)
    }
}

/// Static stub reproducing `response` for `request`.
fn describe(request: &PreparedRequest, response: &HttpResponse) -> Stub {
    let headers: Vec<(String, String)> = response
        .headers
        .iter()
        .filter(|(name, _)| **name != CONTENT_TYPE)
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let stub = Stub::new(&request.method, request.url.as_str())
        .status(response.status)
        .headers(headers)
        .body(response.body.clone());
    match response.content_type() {
        Some(content_type) => stub.content_type(content_type),
        None => stub.no_content_type(),
    }
}

struct RecordHook(Weak<RecorderInner>);

impl SendHook for RecordHook {
    fn on_request(
        &self,
        adapter: &HttpAdapter,
        request: PreparedRequest,
        kwargs: RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        match self.0.upgrade() {
            Some(inner) => inner.on_request(adapter, request, kwargs),
            None => adapter.real_send(request, &kwargs),
        }
    }
}

/// Captures real responses as stubs. Clones share state.
#[derive(Clone)]
pub struct Recorder {
    inner: Arc<RecorderInner>,
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl Recorder {
    /// Recorder on the default adapter.
    pub fn new() -> Self {
        Self::with_target(default_adapter())
    }

    pub fn with_target(target: Arc<dyn InterceptionPoint>) -> Self {
        Self {
            inner: Arc::new(RecorderInner {
                registry: Mutex::new(OrderedRegistry::default()),
                hook: Mutex::new(None),
                target,
            }),
        }
    }

    /// Install the recording hook. No-op if already started.
    pub fn start(&self) {
        let mut hook = self.inner.hook.lock();
        if hook.is_none() {
            let recording = Arc::new(RecordHook(Arc::downgrade(&self.inner)));
            *hook = Some(self.inner.target.install(recording));
            debug!("Recording started");
        }
    }

    /// Uninstall the recording hook. No-op if not started.
    pub fn stop(&self) {
        let hook = self.inner.hook.lock().take();
        if let Some(id) = hook {
            self.inner.target.uninstall(id);
            debug!("Recording stopped");
        }
    }

    /// Drop everything recorded so far.
    pub fn reset(&self) {
        self.inner.registry.lock().reset();
    }

    pub fn is_started(&self) -> bool {
        self.inner.hook.lock().is_some()
    }

    /// The registry holding recorded stubs, in call order.
    pub fn registry(&self) -> MutexGuard<'_, OrderedRegistry> {
        self.inner.registry.lock()
    }

    pub fn recorded(&self) -> Vec<Arc<Stub>> {
        self.inner.registry.lock().registered().to_vec()
    }

    /// Write the recorded stubs as a fixture file.
    pub fn dump(&self, path: impl AsRef<Path>) -> Result<(), FixtureError> {
        let stubs = self.recorded();
        fixtures::dump(stubs.iter().map(|s| s.as_ref()), path.as_ref())
    }

    /// Run `f` while recording, write the fixture, then stop and reset.
    pub fn record<F, T>(&self, path: impl AsRef<Path>, f: F) -> Result<T, FixtureError>
    where
        F: FnOnce() -> T,
    {
        self.start();
        let outcome = panic::catch_unwind(AssertUnwindSafe(f));
        let result = match outcome {
            Ok(value) => self.dump(path).map(|()| value),
            Err(payload) => {
                self.stop();
                self.reset();
                panic::resume_unwind(payload)
            }
        };
        self.stop();
        self.reset();
        result
    }
}

static DEFAULT_RECORDER: Lazy<Recorder> = Lazy::new(Recorder::new);

/// The shared recorder on the default adapter.
pub fn recorder() -> &'static Recorder {
    &DEFAULT_RECORDER
}

/// Record with the shared recorder.
pub fn record<F, T>(path: impl AsRef<Path>, f: F) -> Result<T, FixtureError>
where
    F: FnOnce() -> T,
{
    recorder().record(path, f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::controller::HttpMock;
    use crate::registry::RegistryKind;
    use crate::transport::Transport;

    /// Real transport stand-in.
    struct Upstream;

    impl Transport for Upstream {
        fn send(
            &self,
            request: &PreparedRequest,
            _kwargs: &RequestKwargs,
        ) -> Result<HttpResponse, TransportError> {
            let mut headers = http::HeaderMap::new();
            headers.insert(CONTENT_TYPE, "application/json".parse().unwrap());
            headers.insert("x-upstream", "1".parse().unwrap());
            let status = if request.url.ends_with("/missing") { 404 } else { 200 };
            Ok(HttpResponse::new(status)
                .with_headers(headers)
                .with_body(format!("{{\"path\":\"{}\"}}", request.path_url())))
        }
    }

    fn setup() -> (Arc<HttpAdapter>, Client) {
        let adapter = Arc::new(HttpAdapter::new(Upstream));
        let client = Client::with_adapter(adapter.clone());
        (adapter, client)
    }

    #[test]
    fn test_records_in_call_order() {
        let (adapter, client) = setup();
        let recorder = Recorder::with_target(adapter);
        recorder.start();
        client.get("http://example.com/a").send().unwrap();
        client.get("http://example.com/missing").send().unwrap();
        recorder.stop();

        let recorded = recorder.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].to_string(), "GET http://example.com/a");
        assert_eq!(recorded[1].to_string(), "GET http://example.com/missing");
        assert_eq!(recorder.registry().kind(), RegistryKind::Ordered);

        recorder.reset();
        assert!(recorder.recorded().is_empty());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let (adapter, _client) = setup();
        let recorder = Recorder::with_target(adapter.clone());
        recorder.stop();
        recorder.start();
        recorder.start();
        recorder.stop();
        recorder.stop();
        assert!(!adapter.is_intercepted());
    }

    #[test]
    fn test_record_then_replay() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recorded.yaml");
        let (adapter, client) = setup();

        let recorder = Recorder::with_target(adapter.clone());
        let status = recorder
            .record(&path, || {
                client.get("http://example.com/missing").send().unwrap().status
            })
            .unwrap();
        assert_eq!(status, 404);
        assert!(!recorder.is_started());
        assert!(recorder.recorded().is_empty());

        let mock = HttpMock::builder().target(adapter).build();
        mock.add_from_file(&path).unwrap();
        let resp = mock
            .activate(|| client.get("http://example.com/missing").send().unwrap())
            .unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(resp.content_type().as_deref(), Some("application/json"));
        assert_eq!(resp.header("x-upstream").as_deref(), Some("1"));
        assert_eq!(resp.text(), r#"{"path":"/missing"}"#);
    }
}
