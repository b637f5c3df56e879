//! Binding variables into a namespace.
//!
//! [`VariableBinder`] is the one place a value source meets a node: it
//! turns a [`VariableKind`] into the matching accessor and registers it
//! together with the descriptor. Store-backed kinds are written to the
//! [`VariantStore`] before the node is registered, so no read can reach
//! an identifier that has no entry.

use opcsim_types::{AccessLevel, Array, NodeId, Scalar, Variant, VariableDescriptor};

use crate::accessor::{ComputedAccessor, StaticAccessor, StoreAccessor, VariableAccessor, VariableKind};
use crate::namespace::{Namespace, NamespaceError};
use crate::store::{StoreError, VariantStore};

/// Sampling interval hint used when none is configured.
pub const DEFAULT_SAMPLING_INTERVAL_MS: u32 = 500;

/// Errors raised while binding a variable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BindError {
    /// The namespace refused the node.
    #[error("namespace error: {source}")]
    Namespace {
        /// The underlying namespace error.
        #[from]
        source: NamespaceError,
    },

    /// The store could not record the initial value.
    #[error("store error: {source}")]
    Store {
        /// The underlying store error.
        #[from]
        source: StoreError,
    },

    /// Array dimensions could not be expressed.
    #[error("array of {len} elements is too long to advertise")]
    ArrayTooLong {
        /// Element count of the rejected array.
        len: usize,
    },
}

/// Registers variables, wiring their accessors to the shared store.
#[derive(Debug, Clone)]
pub struct VariableBinder {
    store: VariantStore,
    sampling_interval_ms: u32,
}

impl VariableBinder {
    /// Create a binder over `store` using the default sampling hint.
    pub const fn new(store: VariantStore) -> Self {
        Self {
            store,
            sampling_interval_ms: DEFAULT_SAMPLING_INTERVAL_MS,
        }
    }

    /// Override the sampling interval hint given to store-backed variables.
    #[must_use]
    pub const fn with_sampling_interval(mut self, interval_ms: u32) -> Self {
        self.sampling_interval_ms = interval_ms;
        self
    }

    /// The store this binder writes initial values to.
    pub const fn store(&self) -> &VariantStore {
        &self.store
    }

    /// Bind a store-backed, read/write scalar under `parent`.
    ///
    /// The node id and browse name are both `identifier`.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] if the node cannot be registered.
    pub fn bind_scalar(
        &self,
        namespace: &mut dyn Namespace,
        parent: &NodeId,
        identifier: &str,
        initial: Scalar,
    ) -> Result<NodeId, BindError> {
        let value = Variant::Scalar(initial);
        let descriptor = VariableDescriptor::new(NodeId::string(identifier), identifier, value.kind())
            .with_access(AccessLevel::READ_WRITE)
            .with_sampling_interval(self.sampling_interval_ms);
        self.bind(namespace, parent, descriptor, VariableKind::StoreBacked(value))
    }

    /// Bind a store-backed, read/write array under `parent`.
    ///
    /// Registered with value rank 1 and the initial length as its array
    /// dimension.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] if the node cannot be registered.
    pub fn bind_array(
        &self,
        namespace: &mut dyn Namespace,
        parent: &NodeId,
        identifier: &str,
        initial: Array,
    ) -> Result<NodeId, BindError> {
        let len = initial.len();
        let dimension = u32::try_from(len).map_err(|_err| BindError::ArrayTooLong { len })?;
        let value = Variant::Array(initial);
        let descriptor = VariableDescriptor::new(NodeId::string(identifier), identifier, value.kind())
            .with_access(AccessLevel::READ_WRITE)
            .with_sampling_interval(self.sampling_interval_ms)
            .with_array_dimensions(vec![dimension]);
        self.bind(namespace, parent, descriptor, VariableKind::StoreBacked(value))
    }

    /// Register any kind of variable under `parent`.
    ///
    /// Duplicate node ids are refused before the store is touched, so a
    /// failed bind leaves both the store and the namespace unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`BindError`] if the node cannot be registered or the
    /// initial value cannot be stored.
    pub fn bind(
        &self,
        namespace: &mut dyn Namespace,
        parent: &NodeId,
        descriptor: VariableDescriptor,
        kind: VariableKind,
    ) -> Result<NodeId, BindError> {
        if namespace.contains(&descriptor.node_id) {
            return Err(NamespaceError::DuplicateNodeId(descriptor.node_id).into());
        }

        let accessor: Box<dyn VariableAccessor> = match kind {
            VariableKind::Computed(compute) => Box::new(ComputedAccessor::new(compute)),
            VariableKind::Static(value) => {
                let accessor = StaticAccessor::new(value, descriptor.access.writable);
                Box::new(match descriptor.array_dimensions.clone() {
                    Some(dimensions) => accessor.with_dimensions(dimensions),
                    None => accessor,
                })
            }
            VariableKind::StoreBacked(value) => {
                let node_id = descriptor.node_id.clone();
                self.store.insert(node_id.clone(), value)?;
                Box::new(StoreAccessor::new(self.store.clone(), node_id))
            }
        };

        Ok(namespace.add_variable(parent, descriptor, accessor)?)
    }
}
