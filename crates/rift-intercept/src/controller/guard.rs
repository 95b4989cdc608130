//! Scoped activation.

use super::HttpMock;
use crate::error::MockError;
use std::thread;

/// Keeps interception active until finished or dropped.
///
/// `finish` returns the coverage result. Dropping the guard unfinished also
/// stops and resets the controller; the coverage check then panics unless
/// the thread is already panicking.
#[must_use = "interception stops as soon as the guard is dropped"]
pub struct MockGuard {
    mock: HttpMock,
    finished: bool,
}

impl MockGuard {
    pub(crate) fn new(mock: HttpMock) -> Self {
        mock.enter();
        Self {
            mock,
            finished: false,
        }
    }

    pub fn mock(&self) -> &HttpMock {
        &self.mock
    }

    /// Leave the scope and report unfired expectations.
    pub fn finish(mut self) -> Result<(), MockError> {
        self.finished = true;
        self.mock.exit(true)
    }
}

impl Drop for MockGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        let panicking = thread::panicking();
        if let Err(e) = self.mock.exit(!panicking) {
            if !panicking {
                panic!("{}", e);
            }
        }
    }
}
