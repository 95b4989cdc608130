//! Process-wide default controller.
//!
//! `mock()` returns a shared `HttpMock` on the default adapter with coverage
//! assertions disabled. The free functions below forward to it, so test code
//! can write `rift_intercept::add(...)` without threading a controller around.
//! Tests that use it should be serialized.

use super::{CallList, HttpMock, PassthruRule};
use crate::error::{MockError, TransportError};
use crate::request::PreparedRequest;
use crate::stub::{CallbackReply, Stub, UrlPattern};
use once_cell::sync::Lazy;
use std::sync::Arc;

static DEFAULT_MOCK: Lazy<HttpMock> = Lazy::new(|| {
    HttpMock::builder()
        .assert_all_requests_are_fired(false)
        .build()
});

/// The shared default controller.
pub fn mock() -> &'static HttpMock {
    &DEFAULT_MOCK
}

pub fn activate<F, T>(f: F) -> Result<T, MockError>
where
    F: FnOnce() -> T,
{
    mock().activate(f)
}

pub fn start() {
    mock().start()
}

pub fn stop(allow_assert: bool) -> Result<(), MockError> {
    mock().stop(allow_assert)
}

pub fn reset() {
    mock().reset()
}

pub fn add(stub: impl Into<Arc<Stub>>) -> Arc<Stub> {
    mock().add(stub)
}

pub fn add_callback<F>(method: impl AsRef<str>, url: impl Into<UrlPattern>, callback: F) -> Arc<Stub>
where
    F: Fn(&PreparedRequest) -> Result<CallbackReply, TransportError> + Send + Sync + 'static,
{
    mock().add_callback(method, url, callback)
}

pub fn add_passthru(rule: impl Into<PassthruRule>) {
    mock().add_passthru(rule)
}

pub fn remove(method: impl AsRef<str>, url: impl Into<UrlPattern>) -> Vec<Arc<Stub>> {
    mock().remove(method, url)
}

pub fn replace(stub: impl Into<Arc<Stub>>) -> Result<(), MockError> {
    mock().replace(stub)
}

pub fn upsert(stub: impl Into<Arc<Stub>>) -> Arc<Stub> {
    mock().upsert(stub)
}

pub fn calls() -> CallList {
    mock().calls()
}

pub fn registered() -> Vec<Arc<Stub>> {
    mock().registered()
}

pub fn assert_call_count(url: &str, count: usize) -> Result<bool, MockError> {
    mock().assert_call_count(url, count)
}
