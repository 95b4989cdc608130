//! End-to-end interception scenarios through the blocking client.

use rift_intercept::matchers::{
    fragment_identifier_matcher, header_matcher, multipart_matcher, query_param_matcher,
    request_kwargs_matcher, urlencoded_params_matcher,
};
use rift_intercept::{
    Client, HttpAdapter, HttpMock, MockError, MultipartForm, QueryParams, RegistryKind,
    RequestKwargs, Stub, TransportError,
};
use regex::Regex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::Arc;

fn setup() -> (HttpMock, Client) {
    let adapter = Arc::new(HttpAdapter::offline());
    let mock = HttpMock::builder().target(adapter.clone()).build();
    (mock, Client::with_adapter(adapter))
}

#[test]
fn test_default_path_and_non_strict_query() {
    let (mock, client) = setup();
    mock.add(Stub::get("http://x"));
    let resp = mock
        .activate(|| client.get("http://x/?q=1").send().unwrap())
        .unwrap();
    assert_eq!(resp.status, 200);
    assert_eq!(resp.text(), "");
    assert_eq!(resp.url, "http://x/?q=1");
}

#[test]
fn test_method_mismatch_refuses_connection() {
    let (mock, client) = setup();
    mock.set_assert_all_requests_are_fired(false);
    mock.add(Stub::get("http://x/"));
    let err = mock
        .activate(|| client.post("http://x/").send().unwrap_err())
        .unwrap();
    let message = err.to_string();
    assert!(err.is_connection_refused());
    assert!(message.contains("POST"));
    assert!(message.contains("http://x/"));
    assert!(message.contains("Method does not match"));
}

#[test]
fn test_unfired_expectation_names_stub() {
    let (mock, _client) = setup();
    mock.add(Stub::get("http://x/unused"));
    match mock.activate(|| ()) {
        Err(MockError::UnfiredExpectations(names)) => {
            assert_eq!(names, ["GET http://x/unused"])
        }
        other => panic!("unexpected result {:?}", other),
    }
}

#[test]
fn test_first_match_sequence() {
    let (mock, client) = setup();
    mock.add(Stub::get("http://x/").body("A"));
    mock.add(Stub::get("http://x/").body("B"));
    let bodies = mock
        .activate(|| {
            (0..3)
                .map(|_| client.get("http://x/").send().unwrap().text().into_owned())
                .collect::<Vec<_>>()
        })
        .unwrap();
    assert_eq!(bodies, ["A", "B", "B"]);
}

#[test]
fn test_single_stub_repeats_with_call_count() {
    let (mock, client) = setup();
    let stub = mock.add(Stub::get("http://x/").body("A"));
    mock.activate(|| {
        for _ in 0..3 {
            assert_eq!(client.get("http://x/").send().unwrap().text(), "A");
        }
        assert_eq!(stub.call_count(), 3);
        assert_eq!(mock.calls().len(), 3);
    })
    .unwrap();
}

#[test]
fn test_insertion_order_registry_keeps_stubs() {
    let (mock, client) = setup();
    mock.activate_with_registry(RegistryKind::InsertionOrder, || {
        mock.add(Stub::get("http://x/").body("A"));
        mock.add(Stub::get("http://x/").body("B"));
        for _ in 0..3 {
            assert_eq!(client.get("http://x/").send().unwrap().text(), "A");
        }
        mock.set_assert_all_requests_are_fired(false);
    })
    .unwrap();
}

#[test]
fn test_json_body_round_trip() {
    let (mock, client) = setup();
    mock.add(Stub::get("http://x/").json(json!({"a": 1})));
    let resp = mock
        .activate(|| client.get("http://x/").send().unwrap())
        .unwrap();
    assert_eq!(resp.content_type().as_deref(), Some("application/json"));
    assert_eq!(resp.json::<serde_json::Value>().unwrap(), json!({"a": 1}));
}

#[test]
fn test_query_params_none_vs_empty() {
    let (mock, client) = setup();
    mock.set_assert_all_requests_are_fired(false);
    mock.start();

    mock.add(Stub::get("http://x/none").matcher(query_param_matcher(None, true)));
    mock.add(
        Stub::get("http://x/empty").matcher(query_param_matcher(Some(QueryParams::new()), true)),
    );

    assert!(client.get("http://x/none?a=1").send().is_err());
    assert!(client.get("http://x/empty?a=1").send().is_err());
    assert!(client.get("http://x/empty").send().is_ok());

    mock.stop(false).unwrap();
    mock.reset();
}

#[test]
fn test_multipart_matches_despite_fresh_boundary() {
    let (mock, client) = setup();
    let form = MultipartForm::new().text("k", "v").file("f", &b"data"[..]);
    mock.add(Stub::post("http://x/upload").matcher(multipart_matcher(form.clone()).unwrap()));
    let (first, second) = mock
        .activate(|| {
            let first = client.post("http://x/upload").multipart(&form).send().unwrap();
            let second = client.post("http://x/upload").multipart(&form).send().unwrap();
            (first, second)
        })
        .unwrap();
    assert_eq!(first.status, 200);
    assert_eq!(second.status, 200);
}

#[test]
fn test_multipart_body_mismatch() {
    let (mock, client) = setup();
    mock.set_assert_all_requests_are_fired(false);
    let expected = MultipartForm::new().file("f", &b"data"[..]);
    mock.add(Stub::post("http://x/upload").matcher(multipart_matcher(expected).unwrap()));
    let sent = MultipartForm::new().file("f", &b"other"[..]);
    let err = mock
        .activate(|| client.post("http://x/upload").multipart(&sent).send().unwrap_err())
        .unwrap();
    assert!(err.to_string().contains("multipart/form-data doesn't match."));
}

#[test]
fn test_multipart_requires_files() {
    assert!(matches!(
        multipart_matcher(MultipartForm::new().text("k", "v")),
        Err(MockError::InvalidMatcher(_))
    ));
}

#[test]
fn test_form_and_header_matchers() {
    let (mock, client) = setup();
    let mut form = BTreeMap::new();
    form.insert("user".to_string(), "ann".to_string());
    mock.add(
        Stub::post("http://x/login")
            .matcher(urlencoded_params_matcher(Some(form)))
            .matcher(header_matcher(
                [("X-Trace", Regex::new(r"^[0-9a-f]{4}$").unwrap())],
                false,
            ))
            .status(204),
    );
    let resp = mock
        .activate(|| {
            client
                .post("http://x/login")
                .header("X-Trace", "beef")
                .form(&[("user", "ann")])
                .send()
                .unwrap()
        })
        .unwrap();
    assert_eq!(resp.status, 204);
}

#[test]
fn test_fragment_and_kwargs_matchers() {
    let (mock, client) = setup();
    let mut kwargs = RequestKwargs::new();
    kwargs.insert("stream".into(), json!(true));
    mock.add(
        Stub::get("http://x/page")
            .matcher(fragment_identifier_matcher(Some("top")))
            .matcher(request_kwargs_matcher(Some(kwargs))),
    );
    let resp = mock
        .activate(|| client.get("http://x/page#top").stream(true).send().unwrap())
        .unwrap();
    assert_eq!(resp.status, 200);
}

#[test]
fn test_regex_url_full_match() {
    let (mock, client) = setup();
    mock.set_assert_all_requests_are_fired(false);
    mock.add(Stub::get(Regex::new(r"http://x/users/\d+").unwrap()).body("user"));
    mock.activate(|| {
        assert_eq!(client.get("http://x/users/42").send().unwrap().text(), "user");
        assert!(client.get("http://x/users/42/posts").send().is_err());
    })
    .unwrap();
}

#[test]
fn test_simulated_errors_reach_the_caller() {
    let (mock, client) = setup();
    mock.add(Stub::get("http://x/slow").body(TransportError::Timeout("read timed out".into())));
    let err = mock
        .activate(|| client.get("http://x/slow").send().unwrap_err())
        .unwrap();
    assert!(matches!(err, TransportError::Timeout(_)));
}

#[test]
fn test_scoped_guard() {
    let (mock, client) = setup();
    let guard = mock.scope();
    mock.add(Stub::get("http://x/"));
    client.get("http://x/").send().unwrap();
    assert_eq!(mock.calls().len(), 1);
    guard.finish().unwrap();
    assert!(mock.calls().is_empty());
}
