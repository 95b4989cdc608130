//! The process-wide default controller and module-level functions.
//!
//! These tests share one controller and the default adapter, so they run
//! serially.

use rift_intercept::{Client, Stub};
use serial_test::serial;

#[test]
#[serial]
fn test_module_level_activation() {
    let client = Client::new();
    let result = rift_intercept::activate(|| {
        rift_intercept::add(Stub::get("http://global.test/a").body("A"));
        let body = client.get("http://global.test/a").send().unwrap().text().into_owned();
        assert_eq!(rift_intercept::calls().len(), 1);
        assert!(rift_intercept::assert_call_count("http://global.test/a", 1).unwrap());
        body
    });
    assert_eq!(result.unwrap(), "A");
    assert!(rift_intercept::registered().is_empty());
    assert!(rift_intercept::calls().is_empty());
}

#[test]
#[serial]
fn test_global_does_not_assert_unfired() {
    let result = rift_intercept::activate(|| {
        rift_intercept::add(Stub::get("http://global.test/never"));
    });
    assert!(result.is_ok());
}

#[test]
#[serial]
fn test_start_stop_and_replace() {
    let client = Client::new();
    rift_intercept::start();
    rift_intercept::add(Stub::get("http://global.test/r").body("old"));
    rift_intercept::replace(Stub::get("http://global.test/r").body("new")).unwrap();
    rift_intercept::upsert(Stub::get("http://global.test/other").body("other"));
    assert_eq!(client.get("http://global.test/r").send().unwrap().text(), "new");
    assert_eq!(rift_intercept::remove("GET", "http://global.test/other").len(), 1);
    rift_intercept::stop(true).unwrap();
    rift_intercept::reset();
    assert!(rift_intercept::registered().is_empty());
}

#[test]
#[serial]
fn test_callback_through_global() {
    let client = Client::new();
    rift_intercept::activate(|| {
        rift_intercept::add_callback("GET", "http://global.test/cb", |req| {
            Ok(rift_intercept::CallbackReply::new(202)
                .header("X-Path", req.path_url())
                .body("done"))
        });
        let resp = client.get("http://global.test/cb?x=1").send().unwrap();
        assert_eq!(resp.status, 202);
        assert_eq!(resp.header("x-path").as_deref(), Some("/cb?x=1"));
    })
    .unwrap();
}
