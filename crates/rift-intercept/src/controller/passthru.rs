//! Passthrough rules for requests that match no stub.

use crate::url_utils::{clean_unicode, matches_from_start};
use regex::Regex;
use std::fmt;

/// URL prefix allowed to reach the real transport when nothing matches.
#[derive(Clone)]
pub enum PassthruRule {
    /// Literal prefix, unicode-cleaned on construction.
    Prefix(String),
    /// Pattern that must match from the start of the URL.
    Pattern(Regex),
}

impl PassthruRule {
    pub fn prefix(prefix: impl AsRef<str>) -> Self {
        PassthruRule::Prefix(clean_unicode(prefix.as_ref()))
    }

    pub fn allows(&self, url: &str) -> bool {
        match self {
            PassthruRule::Prefix(prefix) => url.starts_with(prefix.as_str()),
            PassthruRule::Pattern(regex) => matches_from_start(regex, url),
        }
    }
}

impl fmt::Debug for PassthruRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PassthruRule::Prefix(p) => f.debug_tuple("Prefix").field(p).finish(),
            PassthruRule::Pattern(r) => f.debug_tuple("Pattern").field(&r.as_str()).finish(),
        }
    }
}

impl From<&str> for PassthruRule {
    fn from(prefix: &str) -> Self {
        PassthruRule::prefix(prefix)
    }
}

impl From<String> for PassthruRule {
    fn from(prefix: String) -> Self {
        PassthruRule::prefix(prefix)
    }
}

impl From<Regex> for PassthruRule {
    fn from(regex: Regex) -> Self {
        PassthruRule::Pattern(regex)
    }
}
