//! Query parameter, raw query string and fragment matchers.

use super::format::{render, render_pairs};
use super::{MatchResult, Matcher, MatcherSpec};
use crate::request::{parse_pairs, QueryParams};

fn sorted_pairs(raw: &str) -> Vec<(String, String)> {
    let mut pairs = parse_pairs(raw, true);
    pairs.sort();
    pairs
}

/// Match the decoded query parameters captured on the request.
///
/// `None` accepts a request whose parameters were never captured, or were
/// captured empty; `Some(empty)` only accepts captured-and-empty parameters.
/// With `strict_match == false` extra request parameters are ignored.
pub fn query_param_matcher(params: Option<QueryParams>, strict_match: bool) -> Matcher {
    let spec = MatcherSpec::QueryParams {
        params: params.clone(),
        strict_match,
    };
    let expects_none = params.is_none();
    let expected = params.unwrap_or_default();

    Matcher::with_spec("query_param_matcher", spec, move |request| {
        let actual = match &request.params {
            None => {
                return MatchResult::check(expects_none, || {
                    format!(
                        "Parameters do not match. None doesn't match {}",
                        render(&expected.to_json())
                    )
                })
            }
            Some(actual) if strict_match => actual.clone(),
            Some(actual) => actual.restricted_to(&expected),
        };

        MatchResult::check(actual == expected, || {
            let mut reason = format!(
                "Parameters do not match. {} doesn't match {}",
                render(&actual.to_json()),
                render(&expected.to_json())
            );
            if !strict_match {
                reason.push_str(
                    "\nYou can use `strict_match = true` to do a strict parameters check.",
                );
            }
            reason
        })
    })
}

/// Match the raw query string of the request URL, ignoring pair order.
pub fn query_string_matcher(query: Option<&str>) -> Matcher {
    let spec = MatcherSpec::QueryString {
        query: query.map(str::to_string),
    };
    let raw = query.unwrap_or_default().to_string();
    let expected = sorted_pairs(&raw);

    Matcher::with_spec("query_string_matcher", spec, move |request| {
        let (valid, actual) = match request.query() {
            None => (raw.is_empty(), Vec::new()),
            Some(q) => {
                let actual = sorted_pairs(&q);
                (actual == expected, actual)
            }
        };
        MatchResult::check(valid, || {
            format!(
                "Query string doesn't match. {} doesn't match {}",
                render_pairs(&actual),
                render_pairs(&expected)
            )
        })
    })
}

/// Match the URL fragment (`#a=1&b=2`), ignoring pair order.
///
/// `None` or an empty identifier expects no fragment at all.
pub fn fragment_identifier_matcher(identifier: Option<&str>) -> Matcher {
    let spec = MatcherSpec::Fragment {
        identifier: identifier.map(str::to_string),
    };
    let identifier = identifier.filter(|s| !s.is_empty()).map(str::to_string);
    let expected = identifier.as_deref().map(sorted_pairs);

    Matcher::with_spec("fragment_identifier_matcher", spec, move |request| {
        let fragment = request.fragment().unwrap_or_default();
        let valid = match &expected {
            Some(pairs) => sorted_pairs(&fragment) == *pairs,
            None => fragment.is_empty(),
        };
        MatchResult::check(valid, || {
            format!(
                "URL fragment identifier is different: {} doesn't match {}",
                identifier.as_deref().unwrap_or("None"),
                fragment
            )
        })
    })
}
