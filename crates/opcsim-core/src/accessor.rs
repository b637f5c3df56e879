//! Value accessors bound to variable nodes.
//!
//! The address space never holds values itself. Each variable node owns a
//! boxed [`VariableAccessor`], and every client read or write is dispatched
//! to it. Three implementations cover the variable semantics the device
//! tree uses:
//!
//! - [`StoreAccessor`] -- reads and writes one key of the [`VariantStore`].
//! - [`ComputedAccessor`] -- recomputes the value on every read; not writable.
//! - [`StaticAccessor`] -- holds its own value, fixed at build time and
//!   optionally writable by clients.
//!
//! [`VariableKind`] names these three so the binder can register any of
//! them through one operation.

use std::fmt;
use std::sync::{Arc, RwLock};

use opcsim_types::{NodeId, StatusCode, Variant, VariantKind};
use tracing::info;

use crate::store::{StoreError, VariantStore};

/// Errors returned by accessor reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    /// The variable does not accept writes.
    #[error("variable is not writable")]
    NotWritable,

    /// The written value's kind differs from the variable's kind.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Kind the variable holds.
        expected: VariantKind,
        /// Kind of the rejected value.
        actual: VariantKind,
    },

    /// An array write does not match the variable's declared dimensions.
    #[error("array length mismatch: expected {expected} elements, got {actual}")]
    DimensionMismatch {
        /// Element count the declared dimensions allow.
        expected: usize,
        /// Element count of the rejected value.
        actual: usize,
    },

    /// The backing store rejected the operation.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A computed value source failed.
    #[error("value source failed: {0}")]
    Source(String),
}

impl AccessError {
    /// The status code reported to a client for this error.
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::NotWritable => StatusCode::BadNotWritable,
            Self::TypeMismatch { .. } | Self::DimensionMismatch { .. } => StatusCode::BadTypeMismatch,
            Self::Store(e) => e.status_code(),
            Self::Source(_) => StatusCode::BadInternalError,
        }
    }
}

/// Read/write capability bound to one variable node.
///
/// Implementations must not block: the host calls them inline while
/// serving a client request.
pub trait VariableAccessor: Send + Sync {
    /// Produce the current value.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError`] if the value cannot be produced.
    fn read(&self) -> Result<Variant, AccessError>;

    /// Accept a new value.
    ///
    /// Completion is reported only through the returned `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError`] if the value is refused.
    fn write(&self, value: Variant) -> Result<(), AccessError>;
}

/// Signature of a computed value source.
pub type ComputeFn = dyn Fn() -> Result<Variant, AccessError> + Send + Sync;

/// How a variable's value is produced.
#[derive(Clone)]
pub enum VariableKind {
    /// Recomputed from live state on every read.
    Computed(Arc<ComputeFn>),
    /// Held by the node itself, initialized to this value.
    Static(Variant),
    /// Held in the [`VariantStore`] under the node id, initialized to this
    /// value at bind time.
    StoreBacked(Variant),
}

impl VariableKind {
    /// Wrap a closure as a computed kind.
    pub fn computed<F>(compute: F) -> Self
    where
        F: Fn() -> Result<Variant, AccessError> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(compute))
    }
}

impl fmt::Debug for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::Static(v) => f.debug_tuple("Static").field(v).finish(),
            Self::StoreBacked(v) => f.debug_tuple("StoreBacked").field(v).finish(),
        }
    }
}

// ---------------------------------------------------------------------------
// Store-backed
// ---------------------------------------------------------------------------

/// Accessor over one identifier of the [`VariantStore`].
#[derive(Debug, Clone)]
pub struct StoreAccessor {
    store: VariantStore,
    node_id: NodeId,
}

impl StoreAccessor {
    /// Bind an accessor to `node_id` in `store`.
    pub const fn new(store: VariantStore, node_id: NodeId) -> Self {
        Self { store, node_id }
    }

    /// The identifier this accessor reads and writes.
    pub const fn node_id(&self) -> &NodeId {
        &self.node_id
    }
}

impl VariableAccessor for StoreAccessor {
    fn read(&self) -> Result<Variant, AccessError> {
        Ok(self.store.get(&self.node_id)?)
    }

    fn write(&self, value: Variant) -> Result<(), AccessError> {
        let rendered = value.to_string();
        self.store.set(&self.node_id, value)?;
        info!(node_id = %self.node_id, value = %rendered, "set value");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Computed
// ---------------------------------------------------------------------------

/// Accessor that recomputes its value on every read.
pub struct ComputedAccessor {
    compute: Arc<ComputeFn>,
}

impl ComputedAccessor {
    /// Wrap a value source.
    pub fn new(compute: Arc<ComputeFn>) -> Self {
        Self { compute }
    }
}

impl fmt::Debug for ComputedAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputedAccessor").finish_non_exhaustive()
    }
}

impl VariableAccessor for ComputedAccessor {
    fn read(&self) -> Result<Variant, AccessError> {
        (self.compute)()
    }

    fn write(&self, _value: Variant) -> Result<(), AccessError> {
        Err(AccessError::NotWritable)
    }
}

// ---------------------------------------------------------------------------
// Static
// ---------------------------------------------------------------------------

/// Accessor holding its own value.
///
/// Writes, when permitted, replace the held value and never reach the
/// [`VariantStore`].
#[derive(Debug)]
pub struct StaticAccessor {
    value: RwLock<Variant>,
    writable: bool,
    dimensions: Option<Vec<u32>>,
}

impl StaticAccessor {
    /// Hold `value`; accept client writes if `writable`.
    pub const fn new(value: Variant, writable: bool) -> Self {
        Self {
            value: RwLock::new(value),
            writable,
            dimensions: None,
        }
    }

    /// Refuse array writes whose element count differs from `dimensions`.
    ///
    /// A zero dimension leaves the length open.
    #[must_use]
    pub fn with_dimensions(mut self, dimensions: Vec<u32>) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    fn check_length(&self, value: &Variant) -> Result<(), AccessError> {
        let (Some(dimensions), Some(array)) = (self.dimensions.as_deref(), value.as_array()) else {
            return Ok(());
        };
        if dimensions.is_empty() || dimensions.contains(&0) {
            return Ok(());
        }
        let expected = dimensions.iter().try_fold(1_usize, |count, &dimension| {
            usize::try_from(dimension)
                .ok()
                .and_then(|dimension| count.checked_mul(dimension))
        });
        match expected {
            Some(expected) if expected != array.len() => Err(AccessError::DimensionMismatch {
                expected,
                actual: array.len(),
            }),
            _ => Ok(()),
        }
    }
}

impl VariableAccessor for StaticAccessor {
    fn read(&self) -> Result<Variant, AccessError> {
        self.value
            .read()
            .map(|value| value.clone())
            .map_err(|_err| AccessError::Store(StoreError::Poisoned))
    }

    fn write(&self, value: Variant) -> Result<(), AccessError> {
        if !self.writable {
            return Err(AccessError::NotWritable);
        }
        let mut slot = self
            .value
            .write()
            .map_err(|_err| AccessError::Store(StoreError::Poisoned))?;
        let expected = slot.kind();
        let actual = value.kind();
        if expected != actual {
            return Err(AccessError::TypeMismatch { expected, actual });
        }
        self.check_length(&value)?;
        *slot = value;
        Ok(())
    }
}
