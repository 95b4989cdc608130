//! In-process HTTP interception for test suites.
//!
//! Register stubs describing expected requests and the responses to
//! synthesize, activate interception, and run the code under test. Requests
//! sent through the intercepted adapter never reach the network unless a stub
//! or passthrough rule says so; every call is logged for later assertions.
//!
//! ```
//! use rift_intercept::{Client, HttpAdapter, HttpMock, Stub};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let adapter = Arc::new(HttpAdapter::offline());
//! let client = Client::with_adapter(adapter.clone());
//! let mock = HttpMock::builder().target(adapter).build();
//!
//! mock.add(Stub::get("http://api.example.com/users").json(json!({"users": []})));
//! let status = mock
//!     .activate(|| client.get("http://api.example.com/users").send().unwrap().status)
//!     .unwrap();
//! assert_eq!(status, 200);
//! ```
//!
//! ## Module Structure
//!
//! - `request` / `response`: captured request and realized response
//! - `matchers`: request matchers and their declarative form
//! - `stub`: registered expectations and response templates
//! - `registry`: stub storage and selection policies
//! - `transport`: the interception seam and the real transport
//! - `client`: blocking client sending through an adapter
//! - `controller`: `HttpMock`, call log, global default instance
//! - `fixtures` / `recorder`: YAML fixtures and traffic recording
//! - `config`: controller configuration

pub mod client;
pub mod config;
pub mod controller;
pub mod error;
pub mod fixtures;
pub mod matchers;
pub mod multipart;
pub mod recorder;
pub mod registry;
pub mod request;
pub mod response;
pub mod stub;
pub mod transport;
pub mod url_utils;

pub use client::{Client, RequestBuilder};
pub use config::MockConfig;
pub use controller::{
    activate, add, add_callback, add_passthru, assert_call_count, calls, mock, registered,
    remove, replace, reset, start, stop, upsert, Call, CallList, HttpMock, HttpMockBuilder,
    MockGuard, PassthruRule,
};
pub use error::{FixtureError, MockError, TransportError};
pub use matchers::{MatchResult, Matcher, MatcherSpec};
pub use multipart::MultipartForm;
pub use recorder::Recorder;
pub use registry::{Registry, RegistryKind};
pub use request::{ParamValue, PreparedRequest, QueryParams, RequestKwargs};
pub use response::HttpResponse;
pub use stub::{CallbackReply, ContentType, Stub, StubBody, StubResponse, UrlPattern};
pub use transport::{default_adapter, HttpAdapter, InterceptionPoint, SendHook, Transport};
