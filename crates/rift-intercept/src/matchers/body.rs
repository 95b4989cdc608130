//! Body matchers: urlencoded form, JSON and raw text.

use super::format::render;
use super::{MatchResult, Matcher, MatcherSpec};
use crate::request::parse_pairs;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

fn string_map_json(map: &BTreeMap<String, String>) -> Value {
    Value::Object(
        map.iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect(),
    )
}

/// Match an `application/x-www-form-urlencoded` body.
///
/// A request without a body only matches `None`. Repeated keys keep the last
/// value.
pub fn urlencoded_params_matcher(params: Option<BTreeMap<String, String>>) -> Matcher {
    let spec = MatcherSpec::UrlencodedParams {
        params: params.clone(),
    };
    let expects_none = params.is_none();
    let expected = params.unwrap_or_default();

    Matcher::with_spec("urlencoded_params_matcher", spec, move |request| {
        let Some(body) = request.body.as_ref() else {
            return MatchResult::check(expects_none, || {
                format!(
                    "request.body doesn't match: None doesn't match {}",
                    render(&string_map_json(&expected))
                )
            });
        };

        let actual: BTreeMap<String, String> =
            parse_pairs(&String::from_utf8_lossy(body), false)
                .into_iter()
                .collect();
        MatchResult::check(actual == expected, || {
            format!(
                "request.body doesn't match: {} doesn't match {}",
                render(&string_map_json(&actual)),
                render(&string_map_json(&expected))
            )
        })
    })
}

/// Match a JSON body by deep equality.
///
/// An empty body decodes to `{}`. With `strict_match == false` only the
/// top-level keys named by an object expectation are compared.
pub fn json_params_matcher(params: Option<Value>, strict_match: bool) -> Matcher {
    let spec = MatcherSpec::JsonParams {
        params: params.clone(),
        strict_match,
    };
    let expects_none = params.is_none();
    let expected = params.unwrap_or_else(|| Value::Object(Map::new()));

    Matcher::with_spec("json_params_matcher", spec, move |request| {
        let Some(body) = request.body.as_ref() else {
            return MatchResult::check(expects_none, || {
                format!(
                    "request.body doesn't match: None doesn't match {}",
                    render(&expected)
                )
            });
        };

        let actual: Value = if body.is_empty() {
            Value::Object(Map::new())
        } else {
            match serde_json::from_slice(body) {
                Ok(value) => value,
                Err(_) => {
                    return MatchResult::fail(
                        "request.body doesn't match: JSONDecodeError: Cannot parse request.body",
                    )
                }
            }
        };

        let compared = match (actual, &expected) {
            (Value::Object(got), Value::Object(want)) if !strict_match => Value::Object(
                got.into_iter()
                    .filter(|(k, _)| want.contains_key(k))
                    .collect(),
            ),
            (other, _) => other,
        };

        MatchResult::check(compared == expected, || {
            format!(
                "request.body doesn't match: {} doesn't match {}",
                render(&compared),
                render(&expected)
            )
        })
    })
}

/// Match the body text exactly. A missing body is treated as empty.
pub fn body_matcher(expected: impl Into<String>) -> Matcher {
    let expected = expected.into();
    let spec = MatcherSpec::Body {
        body: expected.clone(),
    };

    Matcher::with_spec("body_matcher", spec, move |request| {
        let actual = request.body_text().unwrap_or_default();
        MatchResult::check(actual == expected, || {
            format!(
                "request.body doesn't match: {} doesn't match {}",
                render(&Value::String(actual.to_string())),
                render(&Value::String(expected.clone()))
            )
        })
    })
}
