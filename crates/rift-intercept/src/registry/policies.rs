//! `Registry` implementations.

use super::{FindResult, Registry, RegistryKind, StubList};
use crate::request::PreparedRequest;
use std::sync::Arc;
use tracing::debug;

/// Default policy.
///
/// A stub that is the only match is returned and kept, so it answers every
/// later call too. When a second, later stub also matches:
/// - if the first match has already been called, it is removed and the later
///   stub answers;
/// - otherwise the first match is removed and answers this call, leaving the
///   later stub for the next one.
///
/// Registering A then B for the same request therefore yields A, then B
/// forever.
#[derive(Debug, Default)]
pub struct FirstMatchRegistry {
    stubs: StubList,
}

impl Registry for FirstMatchRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::FirstMatch
    }

    fn stubs(&self) -> &StubList {
        &self.stubs
    }

    fn stubs_mut(&mut self) -> &mut StubList {
        &mut self.stubs
    }

    fn find(&mut self, request: &PreparedRequest) -> FindResult {
        let mut first: Option<usize> = None;
        // (index to remove, stub to return), decided during the scan and
        // applied once it completes.
        let mut consume: Option<(usize, usize)> = None;
        let mut reasons = Vec::new();

        for (index, stub) in self.stubs.as_slice().iter().enumerate() {
            let result = stub.matches(request);
            if !result.matched {
                reasons.push(result.reason);
                continue;
            }
            match first {
                None => first = Some(index),
                Some(candidate) => {
                    let exhausted = self.stubs.as_slice()[candidate].call_count() > 0;
                    consume = Some(if exhausted {
                        (candidate, index)
                    } else {
                        (candidate, candidate)
                    });
                    break;
                }
            }
        }

        match (consume, first) {
            (Some((remove_at, answer_at)), _) => {
                let answer = Arc::clone(&self.stubs.as_slice()[answer_at]);
                let removed = self.stubs.take(remove_at);
                debug!(
                    "Multiple stubs match {} {}, consumed {}",
                    request.method, request.url, removed
                );
                FindResult::found(answer, reasons)
            }
            (None, Some(index)) => {
                FindResult::found(Arc::clone(&self.stubs.as_slice()[index]), reasons)
            }
            (None, None) => FindResult::none(reasons),
        }
    }
}

/// Strict-order policy: every call must match the head of the queue.
///
/// A matching head is popped. A non-matching head stays at the front and the
/// lookup fails with a single reason.
#[derive(Debug, Default)]
pub struct OrderedRegistry {
    stubs: StubList,
}

impl Registry for OrderedRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::Ordered
    }

    fn stubs(&self) -> &StubList {
        &self.stubs
    }

    fn stubs_mut(&mut self) -> &mut StubList {
        &mut self.stubs
    }

    fn find(&mut self, request: &PreparedRequest) -> FindResult {
        if self.stubs.is_empty() {
            return FindResult::none(vec!["No more registered responses".to_string()]);
        }

        let head = self.stubs.take(0);
        let result = head.matches(request);
        if result.matched {
            FindResult::found(head, Vec::new())
        } else {
            self.stubs.push_front(head);
            FindResult::none(vec![format!(
                "Next 'Response' in the order doesn't match due to the following reason: {}.",
                result.reason
            )])
        }
    }
}

/// First match wins and is never removed.
#[derive(Debug, Default)]
pub struct InsertionOrderRegistry {
    stubs: StubList,
}

impl Registry for InsertionOrderRegistry {
    fn kind(&self) -> RegistryKind {
        RegistryKind::InsertionOrder
    }

    fn stubs(&self) -> &StubList {
        &self.stubs
    }

    fn stubs_mut(&mut self) -> &mut StubList {
        &mut self.stubs
    }

    fn find(&mut self, request: &PreparedRequest) -> FindResult {
        let mut reasons = Vec::new();
        for stub in self.stubs.as_slice() {
            let result = stub.matches(request);
            if result.matched {
                return FindResult::found(Arc::clone(stub), reasons);
            }
            reasons.push(result.reason);
        }
        FindResult::none(reasons)
    }
}
