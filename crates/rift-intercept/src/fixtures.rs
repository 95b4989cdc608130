//! YAML fixture files.
//!
//! A fixture lists stubs to register:
//!
//! ```yaml
//! responses:
//!   - response:
//!       method: GET
//!       url: http://api.example.com/users
//!       body: '{"users": []}'
//!       status: 200
//!       content_type: application/json
//!       headers:
//!         X-Request-Id: abc
//!       matchers:
//!         - query_params:
//!             params: {page: "1"}
//! ```
//!
//! `content_type` left out means the derived default; `content_type: null`
//! means no `Content-Type` header. `body_file` is resolved relative to the
//! fixture. Callback stubs and matchers without a declarative form cannot be
//! written and are skipped with a warning.

use crate::error::FixtureError;
use crate::matchers::{Matcher, MatcherSpec};
use crate::stub::{ContentType, StaticResponse, Stub, StubBody, StubResponse, UrlPattern};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixtureFile {
    #[serde(default)]
    pub responses: Vec<FixtureEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureEntry {
    pub response: FixtureResponse,
}

/// One stub as written in a fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureResponse {
    pub method: String,
    pub url: String,
    /// Treat `url` as a regular expression.
    #[serde(default, skip_serializing_if = "is_false")]
    pub url_regex: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_file: Option<PathBuf>,
    #[serde(
        default = "default_status",
        deserialize_with = "deserialize_status_code"
    )]
    pub status: u16,
    #[serde(default, skip_serializing_if = "FixtureHeaders::is_empty")]
    pub headers: FixtureHeaders,
    /// `None` when absent, `Some(None)` for an explicit `null`.
    #[serde(
        default,
        deserialize_with = "deserialize_present",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_type: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<MatcherSpec>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub auto_calculate_content_length: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub passthrough: bool,
}

/// Response headers as a mapping or, when names repeat, a list of pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureHeaders {
    Map(BTreeMap<String, String>),
    Pairs(Vec<(String, String)>),
}

impl Default for FixtureHeaders {
    fn default() -> Self {
        FixtureHeaders::Map(BTreeMap::new())
    }
}

impl FixtureHeaders {
    pub fn is_empty(&self) -> bool {
        match self {
            FixtureHeaders::Map(m) => m.is_empty(),
            FixtureHeaders::Pairs(p) => p.is_empty(),
        }
    }

    pub fn into_pairs(self) -> Vec<(String, String)> {
        match self {
            FixtureHeaders::Map(m) => m.into_iter().collect(),
            FixtureHeaders::Pairs(p) => p,
        }
    }

    fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut map = BTreeMap::new();
        for (name, value) in pairs {
            if map.insert(name.clone(), value.clone()).is_some() {
                return FixtureHeaders::Pairs(pairs.to_vec());
            }
        }
        FixtureHeaders::Map(map)
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_status() -> u16 {
    200
}

/// Deserialize status from either a number or a string
fn deserialize_status_code<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| D::Error::custom("invalid status code number")),
        serde_json::Value::String(s) => s
            .parse::<u16>()
            .map_err(|_| D::Error::custom(format!("invalid status code string: {s}"))),
        _ => Err(D::Error::custom("status must be a number or string")),
    }
}

/// Keep an explicit `null` distinct from an absent key.
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn invalid(index: usize, message: impl Into<String>) -> FixtureError {
    FixtureError::InvalidEntry {
        index,
        message: message.into(),
    }
}

impl FixtureResponse {
    /// Build the stub this entry describes. `base_dir` resolves `body_file`.
    pub fn to_stub(&self, index: usize, base_dir: &Path) -> Result<Stub, FixtureError> {
        let url = if self.url_regex {
            let regex = Regex::new(&self.url)
                .map_err(|e| invalid(index, format!("invalid url regex: {}", e)))?;
            UrlPattern::regex(regex)
        } else {
            UrlPattern::literal(&self.url)
        };

        let matchers = self
            .matchers
            .iter()
            .map(Matcher::compile)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid(index, e.to_string()))?;

        if self.passthrough {
            return Ok(Stub::passthrough(&self.method, url).matchers(matchers));
        }

        let body: StubBody = match (&self.body, &self.body_file) {
            (Some(_), Some(_)) => {
                return Err(invalid(index, "body and body_file are mutually exclusive"))
            }
            (Some(text), None) => text.clone().into(),
            (None, Some(file)) => {
                let path = base_dir.join(file);
                fs::read(&path)
                    .map_err(|source| FixtureError::Io { path, source })?
                    .into()
            }
            (None, None) => StubBody::default(),
        };

        let mut stub = Stub::new(&self.method, url)
            .status(self.status)
            .headers(self.headers.clone().into_pairs())
            .body(body)
            .auto_calculate_content_length(self.auto_calculate_content_length)
            .matchers(matchers);
        stub = match &self.content_type {
            None => stub,
            Some(None) => stub.no_content_type(),
            Some(Some(value)) => stub.content_type(value.clone()),
        };
        Ok(stub)
    }
}

/// Parse fixture text. `base_dir` resolves `body_file` entries.
pub fn parse(contents: &str, base_dir: &Path) -> Result<Vec<Stub>, FixtureError> {
    let file: FixtureFile = serde_yaml::from_str(contents)?;
    file.responses
        .iter()
        .enumerate()
        .map(|(index, entry)| entry.response.to_stub(index, base_dir))
        .collect()
}

/// Load every stub of a fixture file.
pub fn load(path: &Path) -> Result<Vec<Stub>, FixtureError> {
    let contents = fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let stubs = parse(&contents, base_dir)?;
    info!("Loaded {} stubs from {}", stubs.len(), path.display());
    Ok(stubs)
}

/// Describe `stub` as a fixture entry. Binary bodies are written next to
/// `path` as `<stem>_<index>.bin`.
fn to_entry(
    stub: &Stub,
    index: usize,
    path: &Path,
) -> Result<Option<FixtureResponse>, FixtureError> {
    let mut matchers = Vec::new();
    for matcher in stub.matcher_list() {
        match matcher.spec() {
            Some(spec) => matchers.push(spec.clone()),
            None => warn!(
                "Matcher '{}' of {} cannot be written to a fixture, skipping it",
                matcher.name(),
                stub
            ),
        }
    }

    let mut entry = FixtureResponse {
        method: stub.method().to_string(),
        url: stub.url().as_str().to_string(),
        url_regex: stub.url().is_regex(),
        body: None,
        body_file: None,
        status: default_status(),
        headers: FixtureHeaders::default(),
        content_type: None,
        matchers,
        auto_calculate_content_length: false,
        passthrough: false,
    };

    let response: &StaticResponse = match stub.response() {
        StubResponse::Passthrough => {
            entry.passthrough = true;
            return Ok(Some(entry));
        }
        StubResponse::Callback(_) => {
            warn!("Callback stub {} cannot be written to a fixture, skipping it", stub);
            return Ok(None);
        }
        StubResponse::Static(response) => response,
    };

    match &response.body {
        StubBody::Text(text) if !text.is_empty() => entry.body = Some(text.clone()),
        StubBody::Text(_) => {}
        StubBody::Bytes(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) if text.is_empty() => {}
            Ok(text) => entry.body = Some(text.to_string()),
            Err(_) => {
                let stem = path
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "fixture".to_string());
                let name = PathBuf::from(format!("{}_{}.bin", stem, index));
                let target = path
                    .parent()
                    .unwrap_or_else(|| Path::new("."))
                    .join(&name);
                fs::write(&target, bytes).map_err(|source| FixtureError::Io {
                    path: target.clone(),
                    source,
                })?;
                entry.body_file = Some(name);
            }
        },
        StubBody::Error(_) => {
            warn!(
                "Stub {} raises an error and cannot be written to a fixture, skipping it",
                stub
            );
            return Ok(None);
        }
    }

    entry.status = response.status;
    entry.headers = FixtureHeaders::from_pairs(&response.headers);
    entry.auto_calculate_content_length = response.auto_calculate_content_length;
    entry.content_type = match &response.content_type {
        ContentType::Value(value) => Some(Some(value.clone())),
        ContentType::Suppressed => Some(None),
        ContentType::Unset if response.is_json() => Some(Some("application/json".to_string())),
        ContentType::Unset => None,
    };
    Ok(Some(entry))
}

/// Write `stubs` as a fixture file.
pub fn dump<'a, I>(stubs: I, path: &Path) -> Result<(), FixtureError>
where
    I: IntoIterator<Item = &'a Stub>,
{
    let mut file = FixtureFile::default();
    for (index, stub) in stubs.into_iter().enumerate() {
        if let Some(response) = to_entry(stub, index, path)? {
            file.responses.push(FixtureEntry { response });
        }
    }
    let yaml = serde_yaml::to_string(&file)?;
    fs::write(path, yaml).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!("Wrote {} stubs to {}", file.responses.len(), path.display());
    Ok(())
}
