//! The interception seam between client code and the real network.
//!
//! Every request prepared by a `Client` goes through `HttpAdapter::send`. When
//! a `SendHook` is installed on the adapter the hook decides what happens;
//! otherwise the request goes to the adapter's real `Transport`. Hooks can
//! still reach the real transport through `HttpAdapter::real_send`, which is
//! how passthrough works.
//!
//! ## Module Structure
//!
//! - `adapter`: `HttpAdapter`, hook stack and the shared default adapter
//! - `reqwest_transport`: blocking reqwest-backed transport (feature
//!   `reqwest-transport`)

mod adapter;
#[cfg(feature = "reqwest-transport")]
mod reqwest_transport;

pub use adapter::{default_adapter, HookId, HttpAdapter};
#[cfg(feature = "reqwest-transport")]
pub use reqwest_transport::ReqwestTransport;

use crate::error::TransportError;
use crate::request::{PreparedRequest, RequestKwargs};
use crate::response::HttpResponse;
use std::sync::Arc;

/// Performs real network I/O for a prepared request.
pub trait Transport: Send + Sync {
    fn send(
        &self,
        request: &PreparedRequest,
        kwargs: &RequestKwargs,
    ) -> Result<HttpResponse, TransportError>;
}

/// Handler installed at an interception point.
pub trait SendHook: Send + Sync {
    fn on_request(
        &self,
        adapter: &HttpAdapter,
        request: PreparedRequest,
        kwargs: RequestKwargs,
    ) -> Result<HttpResponse, TransportError>;
}

/// Somewhere a `SendHook` can be installed and removed.
pub trait InterceptionPoint: Send + Sync {
    fn install(&self, hook: Arc<dyn SendHook>) -> HookId;

    fn uninstall(&self, id: HookId);
}

/// Transport that refuses every request. Used when no real transport is
/// compiled in.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineTransport;

impl Transport for OfflineTransport {
    fn send(
        &self,
        request: &PreparedRequest,
        _kwargs: &RequestKwargs,
    ) -> Result<HttpResponse, TransportError> {
        Err(TransportError::Connection(format!(
            "no real transport available for {} {}",
            request.method, request.url
        )))
    }
}
