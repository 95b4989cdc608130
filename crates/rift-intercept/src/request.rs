//! Captured outbound request as seen by matchers and stubs.
//!
//! A `PreparedRequest` is built by the client, handed to the adapter, and
//! enriched by the controller with the decoded query parameters and the
//! per-call options before any matcher looks at it.

use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use url::Url;

/// Opaque per-call options (`stream`, `timeout`, `verify`, ...).
pub type RequestKwargs = serde_json::Map<String, Value>;

/// Value of a decoded query parameter.
///
/// A key seen once decodes to `Single`; a repeated key keeps every value in
/// request order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Single(String),
    Multiple(Vec<String>),
}

impl ParamValue {
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Single(v) => Value::String(v.clone()),
            ParamValue::Multiple(vs) => {
                Value::Array(vs.iter().cloned().map(Value::String).collect())
            }
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Single(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Single(value)
    }
}

impl From<Vec<String>> for ParamValue {
    fn from(values: Vec<String>) -> Self {
        ParamValue::Multiple(values)
    }
}

impl From<Vec<&str>> for ParamValue {
    fn from(values: Vec<&str>) -> Self {
        ParamValue::Multiple(values.into_iter().map(str::to_string).collect())
    }
}

/// Decoded query parameters keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryParams(BTreeMap<String, ParamValue>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a raw query string, grouping repeated keys.
    ///
    /// Pairs with a blank value are dropped.
    pub fn parse(query: &str) -> Self {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, value) in parse_pairs(query, false) {
            grouped.entry(key).or_default().push(value);
        }
        let params = grouped
            .into_iter()
            .map(|(key, mut values)| {
                let value = if values.len() == 1 {
                    ParamValue::Single(values.remove(0))
                } else {
                    ParamValue::Multiple(values)
                };
                (key, value)
            })
            .collect();
        QueryParams(params)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&ParamValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ParamValue)> {
        self.0.iter()
    }

    /// Keep only the keys that also appear in `keys`.
    pub(crate) fn restricted_to(&self, keys: &QueryParams) -> QueryParams {
        QueryParams(
            self.0
                .iter()
                .filter(|(k, _)| keys.contains_key(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.0
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl<K, V> FromIterator<(K, V)> for QueryParams
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryParams(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Decode `a=1&b=2` into ordered pairs.
pub(crate) fn parse_pairs(query: &str, keep_blank: bool) -> Vec<(String, String)> {
    url::form_urlencoded::parse(query.as_bytes())
        .filter(|(_, v)| keep_blank || !v.is_empty())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Outbound request captured at the interception point.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: String,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    /// Decoded query parameters, filled in by the controller.
    pub params: Option<QueryParams>,
    /// Per-call options, filled in by the controller.
    pub req_kwargs: RequestKwargs,
}

impl PreparedRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
            params: None,
            req_kwargs: RequestKwargs::new(),
        }
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Raw query string of the URL, if any.
    pub fn query(&self) -> Option<String> {
        match Url::parse(&self.url) {
            Ok(url) => url.query().map(str::to_string),
            Err(_) => {
                let without_fragment = self.url.split('#').next().unwrap_or_default();
                without_fragment
                    .split_once('?')
                    .map(|(_, q)| q.to_string())
            }
        }
    }

    /// Raw fragment of the URL, if any.
    pub fn fragment(&self) -> Option<String> {
        match Url::parse(&self.url) {
            Ok(url) => url.fragment().map(str::to_string),
            Err(_) => self.url.split_once('#').map(|(_, f)| f.to_string()),
        }
    }

    /// Path plus query, e.g. `/search?q=1`.
    pub fn path_url(&self) -> String {
        match Url::parse(&self.url) {
            Ok(url) => match url.query() {
                Some(q) => format!("{}?{}", url.path(), q),
                None => url.path().to_string(),
            },
            Err(_) => self.url.clone(),
        }
    }

    /// Body decoded as UTF-8 (lossy).
    pub fn body_text(&self) -> Option<Cow<'_, str>> {
        self.body.as_ref().map(|b| String::from_utf8_lossy(b))
    }

    /// All values of a header joined with `", "`.
    pub fn header(&self, name: &str) -> Option<String> {
        let values: Vec<&str> = self
            .headers
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values.join(", "))
        }
    }

    /// Attach decoded query parameters and per-call options.
    pub(crate) fn capture(&mut self, kwargs: RequestKwargs) {
        let params = self.query().map(|q| QueryParams::parse(&q)).unwrap_or_default();
        self.params = Some(params);
        self.req_kwargs = kwargs;
    }
}
