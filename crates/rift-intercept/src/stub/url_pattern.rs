//! URL part of a stub: a literal URL or a regular expression.

use crate::url_utils::{anchored, base_url, ensure_default_path};
use regex::Regex;
use std::fmt;

/// URL a stub answers for.
#[derive(Debug, Clone)]
pub enum UrlPattern {
    /// Normalized to a default `/` path. Compared on scheme, host, port and
    /// path; the query string is handled by a separate matcher.
    Literal(String),
    /// Must match the whole raw request URL, query string included.
    Regex { regex: Regex, full: Regex },
}

impl UrlPattern {
    pub fn literal(url: impl AsRef<str>) -> Self {
        UrlPattern::Literal(ensure_default_path(url.as_ref()))
    }

    pub fn regex(regex: Regex) -> Self {
        let full = anchored(&regex);
        UrlPattern::Regex { regex, full }
    }

    /// The literal URL or the pattern text.
    pub fn as_str(&self) -> &str {
        match self {
            UrlPattern::Literal(url) => url,
            UrlPattern::Regex { regex, .. } => regex.as_str(),
        }
    }

    pub fn is_regex(&self) -> bool {
        matches!(self, UrlPattern::Regex { .. })
    }

    /// Query string carried by a literal URL.
    pub fn query(&self) -> Option<&str> {
        match self {
            UrlPattern::Literal(url) => url
                .split('#')
                .next()
                .and_then(|u| u.split_once('?'))
                .map(|(_, q)| q),
            UrlPattern::Regex { .. } => None,
        }
    }

    pub fn matches_url(&self, url: &str) -> bool {
        match self {
            UrlPattern::Literal(expected) => base_url(expected) == base_url(url),
            UrlPattern::Regex { full, .. } => full.is_match(url),
        }
    }
}

impl PartialEq for UrlPattern {
    fn eq(&self, other: &Self) -> bool {
        self.is_regex() == other.is_regex() && self.as_str() == other.as_str()
    }
}

impl fmt::Display for UrlPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for UrlPattern {
    fn from(url: &str) -> Self {
        UrlPattern::literal(url)
    }
}

impl From<String> for UrlPattern {
    fn from(url: String) -> Self {
        UrlPattern::literal(url)
    }
}

impl From<&String> for UrlPattern {
    fn from(url: &String) -> Self {
        UrlPattern::literal(url)
    }
}

impl From<Regex> for UrlPattern {
    fn from(regex: Regex) -> Self {
        UrlPattern::regex(regex)
    }
}
