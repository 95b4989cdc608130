//! Per-call option matcher.

use super::format::render;
use super::{MatchResult, Matcher, MatcherSpec};
use crate::request::RequestKwargs;
use serde_json::Value;

/// Match the per-call options named in `kwargs`, ignoring all others.
pub fn request_kwargs_matcher(kwargs: Option<RequestKwargs>) -> Matcher {
    let expected = kwargs.unwrap_or_default();
    let spec = MatcherSpec::RequestKwargs {
        kwargs: expected.clone(),
    };

    Matcher::with_spec("request_kwargs_matcher", spec, move |request| {
        let actual: RequestKwargs = request
            .req_kwargs
            .iter()
            .filter(|(k, _)| expected.contains_key(k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let valid = if actual.is_empty() {
            expected.is_empty()
        } else {
            actual == expected
        };
        MatchResult::check(valid, || {
            format!(
                "Arguments don't match: {} doesn't match {}",
                render(&Value::Object(actual.clone())),
                render(&Value::Object(expected.clone()))
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::PreparedRequest;
    use serde_json::json;

    fn kwargs(value: Value) -> RequestKwargs {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    fn request_with(value: Value) -> PreparedRequest {
        let mut req = PreparedRequest::new("GET", "http://x/");
        req.req_kwargs = kwargs(value);
        req
    }

    #[test]
    fn test_kwargs_subset() {
        let matcher = request_kwargs_matcher(Some(kwargs(json!({"stream": true}))));
        let req = request_with(json!({"stream": true, "verify": true, "timeout": null}));
        assert!(matcher.matches(&req).matched);

        let req = request_with(json!({"stream": false, "verify": true}));
        let result = matcher.matches(&req);
        assert_eq!(
            result.reason,
            r#"Arguments don't match: {"stream":false} doesn't match {"stream":true}"#
        );
    }

    #[test]
    fn test_kwargs_missing_name_fails() {
        let matcher = request_kwargs_matcher(Some(kwargs(json!({"cert": "client.pem"}))));
        assert!(!matcher.matches(&request_with(json!({"verify": true}))).matched);
    }

    #[test]
    fn test_kwargs_empty_expectation() {
        let matcher = request_kwargs_matcher(None);
        assert!(matcher.matches(&request_with(json!({"verify": true}))).matched);
    }
}
