//! Request matchers evaluated after method and URL.
//!
//! Every matcher looks at one attribute of a captured request and answers with
//! a `MatchResult`. A failed match never errors: it carries a reason naming the
//! request side and the expected side with concrete values, which the
//! controller folds into its diagnostics.
//!
//! # Module Structure
//!
//! - `query` - query parameters, raw query string, URL fragment
//! - `body` - urlencoded form, JSON and raw body
//! - `headers` - header subset / exact header set
//! - `multipart` - multipart/form-data with boundary substitution
//! - `kwargs` - per-call options
//! - `format` - rendering of values inside reasons
//!
//! Built-in matchers are compiled from a declarative `MatcherSpec`, which is
//! also what fixture files persist.

mod body;
mod format;
mod headers;
mod kwargs;
mod multipart;
mod query;

pub use body::{body_matcher, json_params_matcher, urlencoded_params_matcher};
pub use headers::{header_matcher, HeaderExpectation};
pub use kwargs::request_kwargs_matcher;
pub use multipart::multipart_matcher;
pub use query::{fragment_identifier_matcher, query_param_matcher, query_string_matcher};

use crate::error::MockError;
use crate::request::{PreparedRequest, QueryParams, RequestKwargs};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of evaluating a matcher. `reason` is empty iff `matched`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub matched: bool,
    pub reason: String,
}

impl MatchResult {
    pub fn ok() -> Self {
        Self {
            matched: true,
            reason: String::new(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            matched: false,
            reason: reason.into(),
        }
    }

    /// Build from a validity flag, computing the reason only on failure.
    pub fn check(valid: bool, reason: impl FnOnce() -> String) -> Self {
        if valid {
            Self::ok()
        } else {
            Self::fail(reason())
        }
    }
}

type MatchFn = dyn Fn(&PreparedRequest) -> MatchResult + Send + Sync;

/// A named predicate over a captured request.
#[derive(Clone)]
pub struct Matcher {
    name: Cow<'static, str>,
    spec: Option<MatcherSpec>,
    check: Arc<MatchFn>,
}

impl Matcher {
    /// Custom matcher from a closure. Custom matchers are not persisted to
    /// fixture files.
    pub fn new<F>(name: impl Into<Cow<'static, str>>, check: F) -> Self
    where
        F: Fn(&PreparedRequest) -> MatchResult + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            spec: None,
            check: Arc::new(check),
        }
    }

    pub(crate) fn with_spec<F>(name: &'static str, spec: MatcherSpec, check: F) -> Self
    where
        F: Fn(&PreparedRequest) -> MatchResult + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed(name),
            spec: Some(spec),
            check: Arc::new(check),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declarative form of a built-in matcher.
    pub fn spec(&self) -> Option<&MatcherSpec> {
        self.spec.as_ref()
    }

    pub fn matches(&self, request: &PreparedRequest) -> MatchResult {
        (self.check)(request)
    }

    /// Compile a declarative matcher.
    pub fn compile(spec: &MatcherSpec) -> Result<Self, MockError> {
        let matcher = match spec.clone() {
            MatcherSpec::QueryParams {
                params,
                strict_match,
            } => query_param_matcher(params, strict_match),
            MatcherSpec::QueryString { query } => query_string_matcher(query.as_deref()),
            MatcherSpec::UrlencodedParams { params } => urlencoded_params_matcher(params),
            MatcherSpec::JsonParams {
                params,
                strict_match,
            } => json_params_matcher(params, strict_match),
            MatcherSpec::Body { body } => body_matcher(body),
            MatcherSpec::Headers {
                headers,
                strict_match,
            } => {
                let compiled = headers
                    .into_iter()
                    .map(|(name, value)| value.compile().map(|v| (name, v)))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| MockError::InvalidMatcher(e.to_string()))?;
                header_matcher(compiled, strict_match)
            }
            MatcherSpec::Fragment { identifier } => {
                fragment_identifier_matcher(identifier.as_deref())
            }
            MatcherSpec::RequestKwargs { kwargs } => request_kwargs_matcher(Some(kwargs)),
        };
        Ok(matcher)
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matcher")
            .field("name", &self.name)
            .field("spec", &self.spec)
            .finish()
    }
}

fn default_true() -> bool {
    true
}

/// Declarative matcher description, as written in fixture files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatcherSpec {
    QueryParams {
        #[serde(default)]
        params: Option<QueryParams>,
        #[serde(default = "default_true")]
        strict_match: bool,
    },
    QueryString {
        #[serde(default)]
        query: Option<String>,
    },
    UrlencodedParams {
        #[serde(default)]
        params: Option<BTreeMap<String, String>>,
    },
    JsonParams {
        #[serde(default)]
        params: Option<Value>,
        #[serde(default = "default_true")]
        strict_match: bool,
    },
    Body {
        body: String,
    },
    Headers {
        headers: BTreeMap<String, HeaderSpecValue>,
        #[serde(default)]
        strict_match: bool,
    },
    Fragment {
        #[serde(default)]
        identifier: Option<String>,
    },
    RequestKwargs {
        kwargs: RequestKwargs,
    },
}

/// Expected header value in a declarative header matcher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HeaderSpecValue {
    Exact(String),
    Pattern { pattern: String },
}

impl HeaderSpecValue {
    fn compile(&self) -> Result<HeaderExpectation, regex::Error> {
        match self {
            HeaderSpecValue::Exact(value) => Ok(HeaderExpectation::Exact(value.clone())),
            HeaderSpecValue::Pattern { pattern } => Regex::new(pattern).map(HeaderExpectation::Pattern),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_matcher() {
        let matcher = Matcher::new("has_body", |req: &PreparedRequest| {
            MatchResult::check(req.body.is_some(), || "request has no body".to_string())
        });
        assert_eq!(matcher.name(), "has_body");
        assert!(matcher.spec().is_none());

        let req = PreparedRequest::new("POST", "http://example.com/");
        let result = matcher.matches(&req);
        assert!(!result.matched);
        assert_eq!(result.reason, "request has no body");

        let req = req.with_body("x");
        assert_eq!(matcher.matches(&req), MatchResult::ok());
    }

    #[test]
    fn test_spec_from_yaml() {
        let yaml = r#"
- query_params:
    params: {page: "1"}
- json_params:
    params: {id: 7}
    strict_match: false
- headers:
    headers:
      Accept: application/json
      X-Trace: {pattern: "^[a-f0-9]+$"}
- fragment: {}
"#;
        let specs: Vec<MatcherSpec> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(specs.len(), 4);
        assert!(matches!(
            specs[0],
            MatcherSpec::QueryParams {
                strict_match: true,
                ..
            }
        ));
        match &specs[2] {
            MatcherSpec::Headers { headers, .. } => {
                assert_eq!(
                    headers.get("X-Trace"),
                    Some(&HeaderSpecValue::Pattern {
                        pattern: "^[a-f0-9]+$".into()
                    })
                );
            }
            other => panic!("unexpected spec {:?}", other),
        }
        assert_eq!(specs[3], MatcherSpec::Fragment { identifier: None });

        for spec in &specs {
            let matcher = Matcher::compile(spec).unwrap();
            assert_eq!(matcher.spec(), Some(spec));
        }
    }

    #[test]
    fn test_compile_rejects_bad_header_pattern() {
        let mut headers = BTreeMap::new();
        headers.insert(
            "X-Id".to_string(),
            HeaderSpecValue::Pattern {
                pattern: "(".into(),
            },
        );
        let err = Matcher::compile(&MatcherSpec::Headers {
            headers,
            strict_match: false,
        })
        .unwrap_err();
        assert!(matches!(err, MockError::InvalidMatcher(_)));
    }
}
