//! Interception controller.
//!
//! `HttpMock` owns a registry, a call log and passthrough rules. Once started
//! it installs a hook on its target `InterceptionPoint`; every request sent
//! through that point is then answered by the registry instead of the network.
//!
//! Resolution of one request:
//! 1. decoded query parameters and per-call options are attached to it
//! 2. the registry selects a stub
//! 3. with no stub, a passthrough rule may forward the request unrecorded;
//!    otherwise a connection-refused error listing every stub's mismatch
//!    reason is logged and returned
//! 4. a matching stub is materialized (or forwarded, for passthrough stubs),
//!    its call count incremented and the call logged
//!
//! Matchers run while the controller's state lock is held and must not call
//! back into the controller. Response callbacks, the response transform and
//! the real transport run without the lock.
//!
//! ## Module Structure
//!
//! - `calls`: `Call` and `CallList`
//! - `passthru`: `PassthruRule`
//! - `guard`: `MockGuard` scoped activation
//! - `global`: process-wide default controller and forwarding functions

mod calls;
mod global;
mod guard;
mod passthru;

pub use calls::{Call, CallList};
pub use global::*;
pub use guard::MockGuard;
pub use passthru::PassthruRule;

use crate::config::MockConfig;
use crate::error::{MockError, TransportError};
use crate::fixtures;
use crate::registry::{Registry, RegistryKind};
use crate::request::{PreparedRequest, RequestKwargs};
use crate::response::HttpResponse;
use crate::stub::{CallbackReply, Resolution, Stub, UrlPattern};
use crate::transport::{default_adapter, HookId, HttpAdapter, InterceptionPoint, SendHook};
use crate::url_utils::ensure_default_path;
use parking_lot::Mutex;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Transform applied to every response produced by a matched stub.
pub type ResponseTransform = dyn Fn(HttpResponse) -> HttpResponse + Send + Sync;

struct State {
    registry: Box<dyn Registry>,
    calls: CallList,
    passthru: Vec<PassthruRule>,
    hook: Option<HookId>,
    depth: usize,
    assert_all_requests_are_fired: bool,
}

struct Inner {
    state: Mutex<State>,
    target: Arc<dyn InterceptionPoint>,
    response_callback: Option<Arc<ResponseTransform>>,
}

/// What the registry lookup decided, computed under the state lock.
enum Decision {
    Stub(Arc<Stub>),
    Passthru,
    Refused(String),
}

impl Inner {
    fn decide(&self, request: &PreparedRequest) -> Decision {
        let mut state = self.state.lock();
        let result = state.registry.find(request);
        if let Some(stub) = result.found {
            return Decision::Stub(stub);
        }
        if state.passthru.iter().any(|rule| rule.allows(&request.url)) {
            return Decision::Passthru;
        }

        let mut message = format!(
            "Connection refused by rift-intercept - the call doesn't match any registered mock.\n\n\
             Request: \n- {} {}\n\nAvailable matches:\n",
            request.method, request.url
        );
        for (stub, reason) in state.registry.registered().iter().zip(&result.reasons) {
            message.push_str(&format!("- {} {} {}\n", stub.method(), stub.url(), reason));
        }
        Decision::Refused(message)
    }

    fn record(
        &self,
        stub: Option<&Stub>,
        request: PreparedRequest,
        response: Result<HttpResponse, TransportError>,
    ) {
        if let Some(stub) = stub {
            stub.record_call();
        }
        self.state.lock().calls.push(Call { request, response });
    }

    fn transform(&self, response: HttpResponse) -> HttpResponse {
        match &self.response_callback {
            Some(callback) => callback(response),
            None => response,
        }
    }

    fn on_request(
        &self,
        adapter: &HttpAdapter,
        mut request: PreparedRequest,
        kwargs: RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        request.capture(kwargs.clone());

        let stub = match self.decide(&request) {
            Decision::Stub(stub) => stub,
            Decision::Passthru => {
                info!(method = %request.method, url = %request.url, "request.allowed-passthru");
                return adapter.real_send(request, &kwargs);
            }
            Decision::Refused(message) => {
                debug!("No stub matches {} {}", request.method, request.url);
                let error = TransportError::ConnectionRefused {
                    message,
                    request: Some(Box::new(request.clone())),
                };
                self.record(None, request, Err(error.clone()));
                return Err(error);
            }
        };

        debug!("{} {} matched {}", request.method, request.url, stub);
        let response = match stub.get_response(&request) {
            Ok(Resolution::Respond(raw)) => {
                Ok(self.transform(adapter.build_response(&request, raw)))
            }
            Ok(Resolution::Forward) => {
                info!(method = %request.method, url = %request.url, "request.passthrough-response");
                adapter
                    .real_send(request.clone(), &kwargs)
                    .map(|response| self.transform(response))
            }
            Err(error) => Err(error),
        };
        self.record(Some(&stub), request, response.clone());
        response
    }
}

/// Hook installed on the target. Holds the controller weakly so an
/// installed hook never keeps a dropped controller alive.
struct MockHook(Weak<Inner>);

impl SendHook for MockHook {
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

/// The interception controller. Clones share state.
#[derive(Clone)]
pub struct HttpMock {
    inner: Arc<Inner>,
}

impl Default for HttpMock {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpMock {
    /// Controller on the default adapter with coverage assertions enabled.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> HttpMockBuilder {
        HttpMockBuilder::default()
    }

    /// Install the hook. No-op if already started.
    pub fn start(&self) {
        let mut state = self.inner.state.lock();
        if state.hook.is_some() {
            return;
        }
        let hook = Arc::new(MockHook(Arc::downgrade(&self.inner)));
        state.hook = Some(self.inner.target.install(hook));
        debug!("Interception started");
    }

    /// Uninstall the hook and, when `allow_assert` is set, check that every
    /// registered stub was called at least once.
    pub fn stop(&self, allow_assert: bool) -> Result<(), MockError> {
        let (hook, assert_all) = {
            let mut state = self.inner.state.lock();
            (state.hook.take(), state.assert_all_requests_are_fired)
        };
        if let Some(id) = hook {
            self.inner.target.uninstall(id);
            debug!("Interception stopped");
        }

        if !assert_all || !allow_assert {
            return Ok(());
        }
        let not_called: Vec<String> = self
            .registered()
            .iter()
            .filter(|stub| stub.call_count() == 0)
            .map(|stub| stub.to_string())
            .collect();
        if not_called.is_empty() {
            Ok(())
        } else {
            Err(MockError::UnfiredExpectations(not_called))
        }
    }

    /// Restore a first-match registry and clear the call log and passthrough
    /// rules.
    pub fn reset(&self) {
        let mut state = self.inner.state.lock();
        state.registry = RegistryKind::FirstMatch.build();
        state.calls.reset();
        state.passthru.clear();
    }

    pub fn is_started(&self) -> bool {
        self.inner.state.lock().hook.is_some()
    }

    pub fn assert_all_requests_are_fired(&self) -> bool {
        self.inner.state.lock().assert_all_requests_are_fired
    }

    pub fn set_assert_all_requests_are_fired(&self, enabled: bool) {
        self.inner.state.lock().assert_all_requests_are_fired = enabled;
    }

    pub(crate) fn enter(&self) {
        let first = {
            let mut state = self.inner.state.lock();
            state.depth += 1;
            state.depth == 1
        };
        if first {
            self.start();
        }
    }

    pub(crate) fn exit(&self, allow_assert: bool) -> Result<(), MockError> {
        let last = {
            let mut state = self.inner.state.lock();
            state.depth = state.depth.saturating_sub(1);
            state.depth == 0
        };
        if !last {
            return Ok(());
        }
        let result = self.stop(allow_assert);
        self.reset();
        result
    }

    /// Run `f` with interception active.
    ///
    /// Nested activations only stop and reset at the outermost exit. A panic
    /// in `f` skips the coverage check and is resumed after cleanup.
    pub fn activate<F, T>(&self, f: F) -> Result<T, MockError>
    where
        F: FnOnce() -> T,
    {
        self.enter();
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => self.exit(true).map(|()| value),
            Err(payload) => {
                let _ = self.exit(false);
                panic::resume_unwind(payload)
            }
        }
    }

    /// Swap in a registry of `kind`, then `activate`.
    pub fn activate_with_registry<F, T>(&self, kind: RegistryKind, f: F) -> Result<T, MockError>
    where
        F: FnOnce() -> T,
    {
        self.set_registry(kind)?;
        self.activate(f)
    }

    /// Activate until the returned guard is finished or dropped.
    pub fn scope(&self) -> MockGuard {
        MockGuard::new(self.clone())
    }

    pub fn registry_kind(&self) -> RegistryKind {
        self.inner.state.lock().registry.kind()
    }

    /// Replace the registry. Fails if the current one holds stubs.
    pub fn set_registry(&self, kind: RegistryKind) -> Result<(), MockError> {
        let mut state = self.inner.state.lock();
        if !state.registry.registered().is_empty() {
            return Err(MockError::RegistryConflict);
        }
        state.registry = kind.build();
        info!("Switched to {:?} registry", kind);
        Ok(())
    }

    /// Register a stub and return the stored handle.
    pub fn add(&self, stub: impl Into<Arc<Stub>>) -> Arc<Stub> {
        let stored = self.inner.state.lock().registry.add(stub.into());
        debug!("Registered {}", stored);
        stored
    }

    pub fn add_callback<F>(
        &self,
        method: impl AsRef<str>,
        url: impl Into<UrlPattern>,
        callback: F,
    ) -> Arc<Stub>
    where
        F: Fn(&PreparedRequest) -> Result<CallbackReply, TransportError> + Send + Sync + 'static,
    {
        self.add(Stub::callback(method, url, callback))
    }

    /// Let unmatched requests under `rule` reach the real transport.
    pub fn add_passthru(&self, rule: impl Into<PassthruRule>) {
        self.inner.state.lock().passthru.push(rule.into());
    }

    pub fn passthru_rules(&self) -> Vec<PassthruRule> {
        self.inner.state.lock().passthru.clone()
    }

    /// Remove every stub registered for `method` and `url`.
    pub fn remove(&self, method: impl AsRef<str>, url: impl Into<UrlPattern>) -> Vec<Arc<Stub>> {
        self.remove_stub(&Stub::new(method, url))
    }

    /// Remove every stub equal to `stub`.
    pub fn remove_stub(&self, stub: &Stub) -> Vec<Arc<Stub>> {
        self.inner.state.lock().registry.remove(stub)
    }

    /// Substitute the first stub equal to `stub`.
    pub fn replace(&self, stub: impl Into<Arc<Stub>>) -> Result<(), MockError> {
        self.inner.state.lock().registry.replace(stub.into())
    }

    /// Replace an equal stub, or register `stub` if none exists.
    pub fn upsert(&self, stub: impl Into<Arc<Stub>>) -> Arc<Stub> {
        let stub = stub.into();
        let mut state = self.inner.state.lock();
        match state.registry.replace(Arc::clone(&stub)) {
            Ok(()) => stub,
            Err(_) => state.registry.add(stub),
        }
    }

    /// Register every stub of a fixture file.
    pub fn add_from_file(&self, path: impl AsRef<Path>) -> Result<Vec<Arc<Stub>>, MockError> {
        let stubs = fixtures::load(path.as_ref())?;
        let mut state = self.inner.state.lock();
        let added: Vec<_> = stubs
            .into_iter()
            .map(|stub| state.registry.add(Arc::new(stub)))
            .collect();
        debug!("Registered {} stubs from {}", added.len(), path.as_ref().display());
        Ok(added)
    }

    pub fn registered(&self) -> Vec<Arc<Stub>> {
        self.inner.state.lock().registry.registered().to_vec()
    }

    /// Snapshot of the call log.
    pub fn calls(&self) -> CallList {
        self.inner.state.lock().calls.clone()
    }

    /// Check that `url` (default path applied) was requested exactly `count`
    /// times.
    pub fn assert_call_count(&self, url: &str, count: usize) -> Result<bool, MockError> {
        let url = ensure_default_path(url);
        let actual = self.inner.state.lock().calls.count_url(&url);
        if actual == count {
            Ok(true)
        } else {
            Err(MockError::CallCountMismatch {
                url,
                expected: count,
                actual,
            })
        }
    }
}

impl fmt::Debug for HttpMock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("HttpMock")
            .field("registry", &state.registry)
            .field("calls", &state.calls.len())
            .field("passthru", &state.passthru)
            .field("started", &state.hook.is_some())
            .finish()
    }
}

/// Builder for `HttpMock`.
pub struct HttpMockBuilder {
    target: Option<Arc<dyn InterceptionPoint>>,
    assert_all_requests_are_fired: bool,
    registry: RegistryKind,
    passthru: Vec<PassthruRule>,
    response_callback: Option<Arc<ResponseTransform>>,
}

impl Default for HttpMockBuilder {
    fn default() -> Self {
        Self {
            target: None,
            assert_all_requests_are_fired: true,
            registry: RegistryKind::default(),
            passthru: Vec::new(),
            response_callback: None,
        }
    }
}

impl HttpMockBuilder {
    /// Interception point to hook. Defaults to the shared default adapter.
    pub fn target(mut self, target: Arc<dyn InterceptionPoint>) -> Self {
        self.target = Some(target);
        self
    }

    pub fn assert_all_requests_are_fired(mut self, enabled: bool) -> Self {
        self.assert_all_requests_are_fired = enabled;
        self
    }

    pub fn registry(mut self, kind: RegistryKind) -> Self {
        self.registry = kind;
        self
    }

    pub fn passthru(mut self, rule: impl Into<PassthruRule>) -> Self {
        self.passthru.push(rule.into());
        self
    }

    pub fn response_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(HttpResponse) -> HttpResponse + Send + Sync + 'static,
    {
        self.response_callback = Some(Arc::new(callback));
        self
    }

    /// Apply a loaded configuration.
    pub fn config(mut self, config: &MockConfig) -> anyhow::Result<Self> {
        self.assert_all_requests_are_fired = config.assert_all_requests_are_fired;
        self.registry = config.registry;
        self.passthru.extend(config.passthru_rules()?);
        Ok(self)
    }

    pub fn build(self) -> HttpMock {
        let target: Arc<dyn InterceptionPoint> = match self.target {
            Some(target) => target,
            None => default_adapter(),
        };
        HttpMock {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    registry: self.registry.build(),
                    calls: CallList::default(),
                    passthru: self.passthru,
                    hook: None,
                    depth: 0,
                    assert_all_requests_are_fired: self.assert_all_requests_are_fired,
                }),
                target,
                response_callback: self.response_callback,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Client;
    use crate::matchers::{json_params_matcher, query_param_matcher};
    use crate::request::QueryParams;
    use crate::transport::Transport;
    use regex::Regex;
    use serde_json::json;
    use tracing_test::traced_test;

    /// Real transport stand-in that echoes the URL.
    struct Echo;

    impl Transport for Echo {
        fn send(
            &self,
            request: &PreparedRequest,
            _kwargs: &RequestKwargs,
        ) -> Result<HttpResponse, TransportError> {
            Ok(HttpResponse::new(299).with_body(format!("real {}", request.url)))
        }
    }

    fn setup() -> (HttpMock, Client) {
        let adapter = Arc::new(HttpAdapter::new(Echo));
        let mock = HttpMock::builder().target(adapter.clone()).build();
        (mock, Client::with_adapter(adapter))
    }

    #[test]
    fn test_basic_stub_and_call_log() {
        let (mock, client) = setup();
        mock.add(Stub::get("http://example.com/api").json(json!({"ok": true})));
        let result = mock.activate(|| client.get("http://example.com/api").send());
        let resp = result.unwrap().unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.url, "http://example.com/api");
        assert_eq!(resp.json::<serde_json::Value>().unwrap(), json!({"ok": true}));
        assert!(!mock.is_started());
        // the outermost exit resets the call log
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_no_match_message_lists_candidates() {
        let (mock, client) = setup();
        mock.start();
        mock.add(Stub::post("http://example.com/a"));
        mock.add(Stub::get("http://example.com/b"));
        let err = client.get("http://example.com/a").send().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Connection refused by rift-intercept - the call doesn't match any registered mock.\n\n\
             Request: \n- GET http://example.com/a\n\nAvailable matches:\n\
             - POST http://example.com/a Method does not match\n\
             - GET http://example.com/b URL does not match\n"
        );
        assert_eq!(err.request().unwrap().url, "http://example.com/a");

        let calls = mock.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].error().unwrap().is_connection_refused());
        mock.stop(false).unwrap();
    }

    #[test]
    fn test_request_is_captured_with_params_and_kwargs() {
        let (mock, client) = setup();
        mock.start();
        mock.add(
            Stub::get("http://example.com/search")
                .matcher(query_param_matcher(Some([("q", "rust")].into_iter().collect()), true)),
        );
        client.get("http://example.com/search").query("q", "rust").send().unwrap();
        let calls = mock.calls();
        let request = &calls[0].request;
        let expected: QueryParams = [("q", "rust")].into_iter().collect();
        assert_eq!(request.params.as_ref(), Some(&expected));
        assert_eq!(request.req_kwargs["verify"], json!(true));
        mock.stop(false).unwrap();
    }

    #[test]
    fn test_unfired_expectations() {
        let (mock, client) = setup();
        mock.add(Stub::get("http://example.com/a"));
        mock.add(Stub::get("http://example.com/b"));
        let err = mock
            .activate(|| client.get("http://example.com/a").send().unwrap())
            .unwrap_err();
        match err {
            MockError::UnfiredExpectations(urls) => {
                assert_eq!(urls, ["GET http://example.com/b"])
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(mock.registered().is_empty());
    }

    #[test]
    fn test_assert_all_disabled() {
        let adapter = Arc::new(HttpAdapter::new(Echo));
        let mock = HttpMock::builder()
            .target(adapter)
            .assert_all_requests_are_fired(false)
            .build();
        mock.add(Stub::get("http://example.com/never"));
        assert!(mock.activate(|| ()).is_ok());
    }

    #[test]
    fn test_panic_in_body_skips_assertion_and_resets() {
        let (mock, _client) = setup();
        mock.add(Stub::get("http://example.com/never"));
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let _ = mock.activate(|| panic!("body failed"));
        }));
        assert!(outcome.is_err());
        assert!(!mock.is_started());
        assert!(mock.registered().is_empty());
    }

    #[test]
    fn test_nested_activation_resets_at_outermost_exit() {
        let (mock, client) = setup();
        mock.add(Stub::get("http://example.com/"));
        let outer = mock.activate(|| {
            mock.activate(|| client.get("http://example.com/").send().unwrap())
                .unwrap();
            assert!(mock.is_started());
            assert_eq!(mock.calls().len(), 1);
        });
        assert!(outer.is_ok());
        assert!(!mock.is_started());
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn test_stop_without_start_still_asserts() {
        let (mock, _client) = setup();
        mock.add(Stub::get("http://example.com/"));
        assert!(mock.stop(true).is_err());
        assert!(mock.stop(false).is_ok());
    }

    #[test]
    fn test_start_twice_installs_once() {
        let adapter = Arc::new(HttpAdapter::new(Echo));
        let mock = HttpMock::builder().target(adapter.clone()).build();
        mock.start();
        mock.start();
        mock.stop(false).unwrap();
        assert!(!adapter.is_intercepted());
    }

    #[test]
    #[traced_test]
    fn test_passthru_prefix_forwards_unrecorded() {
        let (mock, client) = setup();
        mock.start();
        mock.add_passthru("http://localhost:8080");
        let resp = client.get("http://localhost:8080/health").send().unwrap();
        assert_eq!(resp.status, 299);
        assert_eq!(resp.text(), "real http://localhost:8080/health");
        assert!(mock.calls().is_empty());
        assert!(logs_contain("request.allowed-passthru"));
        mock.stop(false).unwrap();
    }

    #[test]
    fn test_passthru_regex() {
        let (mock, client) = setup();
        mock.start();
        mock.add_passthru(Regex::new(r"http://\w+\.internal/").unwrap());
        assert_eq!(client.get("http://db.internal/x").send().unwrap().status, 299);
        assert!(client.get("http://db.external/x").send().is_err());
        mock.stop(false).unwrap();
    }

    #[test]
    #[traced_test]
    fn test_passthrough_stub_is_counted() {
        let (mock, client) = setup();
        mock.start();
        let stub = mock.add(Stub::passthrough("GET", "http://example.com/real"));
        let resp = client.get("http://example.com/real").send().unwrap();
        assert_eq!(resp.status, 299);
        assert_eq!(stub.call_count(), 1);
        assert_eq!(mock.calls().len(), 1);
        assert!(logs_contain("request.passthrough-response"));
        mock.stop(true).unwrap();
    }

    #[test]
    fn test_error_body_is_logged_and_counted() {
        let (mock, client) = setup();
        mock.start();
        let stub = mock.add(
            Stub::get("http://example.com/").body(TransportError::Timeout("read".into())),
        );
        let err = client.get("http://example.com/").send().unwrap_err();
        assert!(matches!(err, TransportError::Timeout(_)));
        assert_eq!(stub.call_count(), 1);
        assert!(mock.calls()[0].error().is_some());
        mock.stop(true).unwrap();
    }

    #[test]
    fn test_callback_stub() {
        let (mock, client) = setup();
        mock.start();
        mock.add_callback("POST", "http://example.com/echo", |req| {
            Ok(CallbackReply::new(201).body(req.body_text().unwrap_or_default().into_owned()))
        });
        let resp = client.post("http://example.com/echo").body("ping").send().unwrap();
        assert_eq!(resp.status, 201);
        assert_eq!(resp.text(), "ping");
        mock.stop(true).unwrap();
    }

    #[test]
    fn test_response_callback_transforms() {
        let adapter = Arc::new(HttpAdapter::new(Echo));
        let mock = HttpMock::builder()
            .target(adapter.clone())
            .response_callback(|mut resp| {
                resp.headers.insert("x-mocked", "1".parse().unwrap());
                resp
            })
            .build();
        let client = Client::with_adapter(adapter);
        mock.add(Stub::get("http://example.com/"));
        let resp = mock
            .activate(|| client.get("http://example.com/").send().unwrap())
            .unwrap();
        assert_eq!(resp.header("x-mocked").as_deref(), Some("1"));
    }

    #[test]
    fn test_set_registry_requires_empty() {
        let (mock, _client) = setup();
        mock.set_registry(RegistryKind::Ordered).unwrap();
        assert_eq!(mock.registry_kind(), RegistryKind::Ordered);
        mock.add(Stub::get("http://example.com/"));
        assert!(matches!(
            mock.set_registry(RegistryKind::FirstMatch),
            Err(MockError::RegistryConflict)
        ));
        mock.reset();
        assert_eq!(mock.registry_kind(), RegistryKind::FirstMatch);
    }

    #[test]
    fn test_activate_with_ordered_registry() {
        let (mock, client) = setup();
        let result = mock.activate_with_registry(RegistryKind::Ordered, || {
            mock.add(Stub::post("http://example.com/1").status(201));
            mock.add(Stub::post("http://example.com/2").status(202));
            assert!(client.post("http://example.com/2").send().is_err());
            let first = client.post("http://example.com/1").send().unwrap();
            let second = client.post("http://example.com/2").send().unwrap();
            (first.status, second.status)
        });
        assert_eq!(result.unwrap(), (201, 202));
        assert_eq!(mock.registry_kind(), RegistryKind::FirstMatch);
    }

    #[test]
    fn test_remove_replace_upsert() {
        let (mock, client) = setup();
        mock.start();
        mock.add(Stub::get("http://example.com/").body("one"));
        mock.add(Stub::get("http://example.com/").body("two"));
        assert_eq!(mock.remove("GET", "http://example.com").len(), 2);
        assert!(mock.registered().is_empty());

        assert!(mock.replace(Stub::get("http://example.com/")).is_err());
        mock.upsert(Stub::get("http://example.com/").body("three"));
        mock.upsert(Stub::get("http://example.com/").body("four"));
        assert_eq!(mock.registered().len(), 1);
        assert_eq!(client.get("http://example.com/").send().unwrap().text(), "four");
        mock.stop(false).unwrap();
    }

    #[test]
    fn test_assert_call_count() {
        let (mock, client) = setup();
        mock.start();
        mock.add(Stub::get("http://example.com/"));
        client.get("http://example.com").send().unwrap();
        client.get("http://example.com/").send().unwrap();
        assert!(mock.assert_call_count("http://example.com", 2).unwrap());
        let err = mock.assert_call_count("http://example.com/", 3).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected URL 'http://example.com/' to be called 3 times. Called 2 times."
        );
        mock.stop(false).unwrap();
    }

    #[test]
    fn test_json_matcher_mismatch_reason_in_refusal() {
        let (mock, client) = setup();
        mock.start();
        mock.add(
            Stub::post("http://example.com/")
                .matcher(json_params_matcher(Some(json!({"a": 1})), true)),
        );
        let err = client
            .post("http://example.com/")
            .json(&json!({"a": 2}))
            .send()
            .unwrap_err();
        assert!(err.to_string().contains("request.body doesn't match"));
        mock.stop(false).unwrap();
    }

    #[test]
    fn test_dropped_controller_hook_forwards() {
        let adapter = Arc::new(HttpAdapter::new(Echo));
        let client = Client::with_adapter(adapter.clone());
        {
            let mock = HttpMock::builder().target(adapter.clone()).build();
            mock.start();
        }
        assert_eq!(client.get("http://example.com/").send().unwrap().status, 299);
    }
}
