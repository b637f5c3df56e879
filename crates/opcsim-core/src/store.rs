//! The variant store: current values of all store-backed variables.
//!
//! One [`VariantStore`] is created at startup and shared by handle with
//! the binder and every store-backed accessor. Entries are created at bind
//! time and mutated in place by writes; nothing is ever removed.
//!
//! # Write policy
//!
//! [`VariantStore::set`] only accepts a value whose [`VariantKind`] equals
//! the kind already stored under that identifier. A mismatched write is
//! refused with [`StoreError::TypeMismatch`] and the stored value is left
//! as it was. Writes to identifiers that were never bound are refused with
//! [`StoreError::NotFound`]; only [`VariantStore::insert`] creates entries.
//!
//! # Concurrency
//!
//! Every operation touches exactly one key, so a single lock over the map
//! is enough for last-write-wins ordering under a multithreaded host.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use opcsim_types::{NodeId, StatusCode, Variant, VariantKind};

/// Errors returned by [`VariantStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No entry is bound under this identifier.
    #[error("no value bound for {0}")]
    NotFound(NodeId),

    /// The incoming value's kind differs from the bound value's kind.
    #[error("type mismatch for {node_id}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Identifier that was written.
        node_id: NodeId,
        /// Kind of the value currently bound.
        expected: VariantKind,
        /// Kind of the rejected value.
        actual: VariantKind,
    },

    /// The lock guarding the map was poisoned by a panicking writer.
    #[error("variant store lock poisoned")]
    Poisoned,
}

impl StoreError {
    /// The status code reported to a client for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::BadNodeIdUnknown,
            Self::TypeMismatch { .. } => StatusCode::BadTypeMismatch,
            Self::Poisoned => StatusCode::BadInternalError,
        }
    }
}

/// Shared mapping from identifier to current value.
///
/// Cloning produces another handle to the same map.
#[derive(Debug, Clone, Default)]
pub struct VariantStore {
    entries: Arc<RwLock<BTreeMap<NodeId, Variant>>>,
}

impl VariantStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind an initial value, replacing any existing entry.
    ///
    /// Returns the previous value if one was bound.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the lock is poisoned.
    pub fn insert(&self, node_id: NodeId, value: Variant) -> Result<Option<Variant>, StoreError> {
        let mut entries = self.entries.write().map_err(|_err| StoreError::Poisoned)?;
        Ok(entries.insert(node_id, value))
    }

    /// Return the current value bound under `node_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing was bound under
    /// `node_id`, or [`StoreError::Poisoned`] if the lock is poisoned.
    pub fn get(&self, node_id: &NodeId) -> Result<Variant, StoreError> {
        let entries = self.entries.read().map_err(|_err| StoreError::Poisoned)?;
        entries
            .get(node_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(node_id.clone()))
    }

    /// Overwrite the value bound under `node_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if nothing was bound,
    /// [`StoreError::TypeMismatch`] if `value` has a different kind from
    /// the bound value, or [`StoreError::Poisoned`] if the lock is poisoned.
    pub fn set(&self, node_id: &NodeId, value: Variant) -> Result<(), StoreError> {
        let mut entries = self.entries.write().map_err(|_err| StoreError::Poisoned)?;
        let slot = entries
            .get_mut(node_id)
            .ok_or_else(|| StoreError::NotFound(node_id.clone()))?;

        let expected = slot.kind();
        let actual = value.kind();
        if expected != actual {
            return Err(StoreError::TypeMismatch {
                node_id: node_id.clone(),
                expected,
                actual,
            });
        }

        *slot = value;
        Ok(())
    }

    /// Return `true` if a value is bound under `node_id`.
    pub fn contains(&self, node_id: &NodeId) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(node_id))
            .unwrap_or(false)
    }

    /// Number of bound identifiers.
    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    /// Return `true` if nothing has been bound.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All bound identifiers, in sorted order.
    pub fn identifiers(&self) -> Vec<NodeId> {
        self.entries
            .read()
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default()
    }
}
