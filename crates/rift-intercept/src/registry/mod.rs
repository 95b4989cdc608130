//! Ordered stub storage and selection policies.
//!
//! A registry owns the registered stubs in registration order. The variants
//! share registration semantics and differ only in `find`:
//!
//! - `FirstMatchRegistry` (default): a single match is reused forever; when a
//!   later stub also matches, the first one is consumed (see `find`)
//! - `OrderedRegistry`: the stubs form a queue that must be hit in order
//! - `InsertionOrderRegistry`: first match wins and is never removed
//!
//! ## Module Structure
//!
//! - `policies`: the three `Registry` implementations

mod policies;

pub use policies::{FirstMatchRegistry, InsertionOrderRegistry, OrderedRegistry};

use crate::error::MockError;
use crate::request::PreparedRequest;
use crate::stub::Stub;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Result of a registry lookup.
#[derive(Debug, Default)]
pub struct FindResult {
    pub found: Option<Arc<Stub>>,
    /// Mismatch reasons, one per rejected stub in scan order.
    pub reasons: Vec<String>,
}

impl FindResult {
    pub fn found(stub: Arc<Stub>, reasons: Vec<String>) -> Self {
        Self {
            found: Some(stub),
            reasons,
        }
    }

    pub fn none(reasons: Vec<String>) -> Self {
        Self {
            found: None,
            reasons,
        }
    }
}

/// Registration-ordered list of stubs.
#[derive(Debug, Default)]
pub struct StubList(Vec<Arc<Stub>>);

impl StubList {
    pub fn as_slice(&self) -> &[Arc<Stub>] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Append a stub. Adding an `Arc` that is already stored appends a copy,
    /// so one stub never occupies two slots.
    pub fn add(&mut self, stub: Arc<Stub>) -> Arc<Stub> {
        let stub = if self.0.iter().any(|s| Arc::ptr_eq(s, &stub)) {
            Arc::new(Stub::clone(&stub))
        } else {
            stub
        };
        self.0.push(Arc::clone(&stub));
        stub
    }

    /// Remove every stub equal to `stub`.
    pub fn remove(&mut self, stub: &Stub) -> Vec<Arc<Stub>> {
        let mut removed = Vec::new();
        self.0.retain(|s| {
            if **s == *stub {
                removed.push(Arc::clone(s));
                false
            } else {
                true
            }
        });
        removed
    }

    /// Substitute the first stub equal to `stub`.
    pub fn replace(&mut self, stub: Arc<Stub>) -> Result<(), MockError> {
        match self.0.iter().position(|s| **s == *stub) {
            Some(index) => {
                self.0[index] = stub;
                Ok(())
            }
            None => Err(MockError::NotRegistered(stub.url().to_string())),
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub(crate) fn take(&mut self, index: usize) -> Arc<Stub> {
        self.0.remove(index)
    }

    pub(crate) fn push_front(&mut self, stub: Arc<Stub>) {
        self.0.insert(0, stub);
    }
}

/// Selection policy over a `StubList`.
pub trait Registry: Send + fmt::Debug {
    fn kind(&self) -> RegistryKind;

    fn stubs(&self) -> &StubList;

    fn stubs_mut(&mut self) -> &mut StubList;

    /// Select the stub answering `request`, possibly consuming stubs.
    fn find(&mut self, request: &PreparedRequest) -> FindResult;

    fn registered(&self) -> &[Arc<Stub>] {
        self.stubs().as_slice()
    }

    fn add(&mut self, stub: Arc<Stub>) -> Arc<Stub> {
        self.stubs_mut().add(stub)
    }

    fn remove(&mut self, stub: &Stub) -> Vec<Arc<Stub>> {
        self.stubs_mut().remove(stub)
    }

    fn replace(&mut self, stub: Arc<Stub>) -> Result<(), MockError> {
        self.stubs_mut().replace(stub)
    }

    fn reset(&mut self) {
        self.stubs_mut().clear();
    }
}

/// Registry implementation selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    #[default]
    FirstMatch,
    Ordered,
    InsertionOrder,
}

impl RegistryKind {
    pub fn build(self) -> Box<dyn Registry> {
        match self {
            RegistryKind::FirstMatch => Box::new(FirstMatchRegistry::default()),
            RegistryKind::Ordered => Box::new(OrderedRegistry::default()),
            RegistryKind::InsertionOrder => Box::new(InsertionOrderRegistry::default()),
        }
    }
}
