//! `HttpAdapter`: the single interception point used by `Client`.

use super::{InterceptionPoint, OfflineTransport, SendHook, Transport};
use crate::error::TransportError;
use crate::request::{PreparedRequest, RequestKwargs};
use crate::response::HttpResponse;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Handle returned by `InterceptionPoint::install`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HookId(u64);

/// Sends prepared requests, through the most recently installed hook if any.
pub struct HttpAdapter {
    transport: Arc<dyn Transport>,
    hooks: RwLock<Vec<(HookId, Arc<dyn SendHook>)>>,
    next_id: AtomicU64,
}

impl HttpAdapter {
    pub fn new(transport: impl Transport + 'static) -> Self {
        Self::with_transport(Arc::new(transport))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            hooks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Adapter whose real transport refuses every request.
    pub fn offline() -> Self {
        Self::new(OfflineTransport)
    }

    pub fn is_intercepted(&self) -> bool {
        !self.hooks.read().is_empty()
    }

    /// Send a request, letting the active hook handle it.
    pub fn send(
        &self,
        request: PreparedRequest,
        kwargs: RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        let hook = self.hooks.read().last().map(|(_, hook)| Arc::clone(hook));
        match hook {
            Some(hook) => hook.on_request(self, request, kwargs),
            None => self.real_send(request, &kwargs),
        }
    }

    /// Send a request over the real transport, bypassing every hook.
    pub fn real_send(
        &self,
        request: PreparedRequest,
        kwargs: &RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        let raw = self.transport.send(&request, kwargs)?;
        Ok(self.build_response(&request, raw))
    }

    /// Attach the originating request and URL to a raw response.
    pub fn build_response(&self, request: &PreparedRequest, mut raw: HttpResponse) -> HttpResponse {
        raw.url = request.url.clone();
        raw.request = Some(Box::new(request.clone()));
        raw
    }
}

impl InterceptionPoint for HttpAdapter {
    fn install(&self, hook: Arc<dyn SendHook>) -> HookId {
        let id = HookId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.hooks.write().push((id, hook));
        debug!("Installed send hook {:?}", id);
        id
    }

    fn uninstall(&self, id: HookId) {
        self.hooks.write().retain(|(hook_id, _)| *hook_id != id);
        debug!("Removed send hook {:?}", id);
    }
}

static DEFAULT_ADAPTER: Lazy<Arc<HttpAdapter>> = Lazy::new(|| {
    #[cfg(feature = "reqwest-transport")]
    let adapter = HttpAdapter::new(super::ReqwestTransport::new());
    #[cfg(not(feature = "reqwest-transport"))]
    let adapter = HttpAdapter::offline();
    Arc::new(adapter)
});

/// Process-wide adapter used by `Client::new` and the global mock.
pub fn default_adapter() -> Arc<HttpAdapter> {
    Arc::clone(&DEFAULT_ADAPTER)
}
