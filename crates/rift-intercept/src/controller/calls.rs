//! Call log.

use crate::error::TransportError;
use crate::request::PreparedRequest;
use crate::response::HttpResponse;
use std::ops::Index;
use std::slice;

/// One intercepted request and what it produced.
#[derive(Debug, Clone)]
pub struct Call {
    pub request: PreparedRequest,
    pub response: Result<HttpResponse, TransportError>,
}

impl Call {
    pub fn response(&self) -> Option<&HttpResponse> {
        self.response.as_ref().ok()
    }

    pub fn error(&self) -> Option<&TransportError> {
        self.response.as_ref().err()
    }
}

/// Append-only list of calls in the order they happened.
#[derive(Debug, Clone, Default)]
pub struct CallList(Vec<Call>);

impl CallList {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Call> {
        self.0.get(index)
    }

    pub fn last(&self) -> Option<&Call> {
        self.0.last()
    }

    pub fn iter(&self) -> slice::Iter<'_, Call> {
        self.0.iter()
    }

    /// Number of calls whose request URL equals `url` exactly.
    pub fn count_url(&self, url: &str) -> usize {
        self.0.iter().filter(|c| c.request.url == url).count()
    }

    pub(crate) fn push(&mut self, call: Call) {
        self.0.push(call);
    }

    pub(crate) fn reset(&mut self) {
        self.0.clear();
    }
}

impl Index<usize> for CallList {
    type Output = Call;

    fn index(&self, index: usize) -> &Call {
        &self.0[index]
    }
}

impl<'a> IntoIterator for &'a CallList {
    type Item = &'a Call;
    type IntoIter = slice::Iter<'a, Call>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(url: &str, status: u16) -> Call {
        Call {
            request: PreparedRequest::new("GET", url),
            response: Ok(HttpResponse::new(status)),
        }
    }

    #[test]
    fn test_append_and_index() {
        let mut calls = CallList::default();
        calls.push(call("http://x/a", 200));
        calls.push(Call {
            request: PreparedRequest::new("GET", "http://x/b"),
            response: Err(TransportError::Other("boom".into())),
        });
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].response().unwrap().status, 200);
        assert!(calls[1].error().is_some());
        assert_eq!(calls.iter().count(), 2);
        assert_eq!((&calls).into_iter().last().unwrap().request.url, "http://x/b");
    }

    #[test]
    fn test_count_url_and_reset() {
        let mut calls = CallList::default();
        calls.push(call("http://x/a", 200));
        calls.push(call("http://x/a", 200));
        calls.push(call("http://x/a?q=1", 200));
        assert_eq!(calls.count_url("http://x/a"), 2);
        calls.reset();
        assert!(calls.is_empty());
    }
}
