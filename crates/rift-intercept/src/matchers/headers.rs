//! Header matcher.

use super::format::render;
use super::{HeaderSpecValue, MatchResult, Matcher, MatcherSpec};
use crate::url_utils::matches_from_start;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Expected value of one header.
#[derive(Debug, Clone)]
pub enum HeaderExpectation {
    Exact(String),
    /// Must match from the start of the header value.
    Pattern(Regex),
}

impl HeaderExpectation {
    fn matches(&self, actual: &str) -> bool {
        match self {
            HeaderExpectation::Exact(expected) => expected == actual,
            HeaderExpectation::Pattern(regex) => matches_from_start(regex, actual),
        }
    }

    fn to_spec(&self) -> HeaderSpecValue {
        match self {
            HeaderExpectation::Exact(value) => HeaderSpecValue::Exact(value.clone()),
            HeaderExpectation::Pattern(regex) => HeaderSpecValue::Pattern {
                pattern: regex.as_str().to_string(),
            },
        }
    }

    fn to_json(&self) -> Value {
        match self {
            HeaderExpectation::Exact(value) => Value::String(value.clone()),
            HeaderExpectation::Pattern(regex) => Value::String(format!("/{}/", regex.as_str())),
        }
    }
}

impl From<&str> for HeaderExpectation {
    fn from(value: &str) -> Self {
        HeaderExpectation::Exact(value.to_string())
    }
}

impl From<String> for HeaderExpectation {
    fn from(value: String) -> Self {
        HeaderExpectation::Exact(value)
    }
}

impl From<Regex> for HeaderExpectation {
    fn from(regex: Regex) -> Self {
        HeaderExpectation::Pattern(regex)
    }
}

/// Match request headers, comparing names case-insensitively.
///
/// By default only the named headers are checked and the request may carry
/// others. With `strict_match` the request must carry exactly as many
/// distinct headers as are expected.
pub fn header_matcher<I, K, V>(headers: I, strict_match: bool) -> Matcher
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<HeaderExpectation>,
{
    let expected: Vec<(String, HeaderExpectation)> = headers
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect();
    let spec = MatcherSpec::Headers {
        headers: expected
            .iter()
            .map(|(k, v)| (k.clone(), v.to_spec()))
            .collect::<BTreeMap<_, _>>(),
        strict_match,
    };

    Matcher::with_spec("header_matcher", spec, move |request| {
        let mut valid = !strict_match || request.headers.keys_len() == expected.len();
        if valid {
            valid = expected.iter().all(|(name, expectation)| {
                request
                    .header(name)
                    .is_some_and(|actual| expectation.matches(&actual))
            });
        }

        MatchResult::check(valid, || {
            let actual: Map<String, Value> = if strict_match {
                request
                    .headers
                    .keys()
                    .filter_map(|name| {
                        request
                            .header(name.as_str())
                            .map(|v| (name.as_str().to_string(), Value::String(v)))
                    })
                    .collect()
            } else {
                expected
                    .iter()
                    .filter_map(|(name, _)| {
                        request
                            .header(name)
                            .map(|v| (name.clone(), Value::String(v)))
                    })
                    .collect()
            };
            let wanted: Map<String, Value> = expected
                .iter()
                .map(|(name, expectation)| (name.clone(), expectation.to_json()))
                .collect();
            format!(
                "Headers do not match: {} doesn't match {}",
                render(&Value::Object(actual)),
                render(&Value::Object(wanted))
            )
        })
    })
}
