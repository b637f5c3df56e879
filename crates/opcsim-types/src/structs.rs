//! Variable access levels and descriptors.

use serde::{Deserialize, Serialize};

use crate::enums::{DataType, ValueShape};
use crate::ids::NodeId;
use crate::variant::VariantKind;

/// Which operations a client may perform on a variable's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessLevel {
    /// The current value may be read.
    pub readable: bool,
    /// The current value may be written.
    pub writable: bool,
}

impl AccessLevel {
    /// Current value readable only.
    pub const READ_ONLY: Self = Self {
        readable: true,
        writable: false,
    };

    /// Current value readable and writable.
    pub const READ_WRITE: Self = Self {
        readable: true,
        writable: true,
    };
}

impl Default for AccessLevel {
    fn default() -> Self {
        Self::READ_ONLY
    }
}

/// Everything the address space needs to know to register a variable node.
///
/// The node id doubles as the store key for store-backed variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableDescriptor {
    /// Node identity.
    pub node_id: NodeId,
    /// Name shown when browsing.
    pub browse_name: String,
    /// Declared primitive kind.
    pub data_type: DataType,
    /// Scalar or array.
    pub shape: ValueShape,
    /// Permitted client operations.
    pub access: AccessLevel,
    /// Fastest rate, in milliseconds, at which the value is worth sampling.
    pub minimum_sampling_interval_ms: u32,
    /// Length of each array dimension, for array variables.
    pub array_dimensions: Option<Vec<u32>>,
}

impl VariableDescriptor {
    /// Create a read-only descriptor for a value of the given kind.
    pub fn new(node_id: NodeId, browse_name: impl Into<String>, kind: VariantKind) -> Self {
        Self {
            node_id,
            browse_name: browse_name.into(),
            data_type: kind.data_type,
            shape: kind.shape,
            access: AccessLevel::READ_ONLY,
            minimum_sampling_interval_ms: 0,
            array_dimensions: None,
        }
    }

    /// Set the access level.
    #[must_use]
    pub const fn with_access(mut self, access: AccessLevel) -> Self {
        self.access = access;
        self
    }

    /// Set the minimum sampling interval hint.
    #[must_use]
    pub const fn with_sampling_interval(mut self, interval_ms: u32) -> Self {
        self.minimum_sampling_interval_ms = interval_ms;
        self
    }

    /// Set the array dimensions.
    #[must_use]
    pub fn with_array_dimensions(mut self, dimensions: Vec<u32>) -> Self {
        self.array_dimensions = Some(dimensions);
        self
    }

    /// The declared (data type, shape) pair.
    pub const fn kind(&self) -> VariantKind {
        VariantKind {
            data_type: self.data_type,
            shape: self.shape,
        }
    }

    /// The value rank advertised for this variable.
    pub const fn value_rank(&self) -> i32 {
        self.shape.value_rank()
    }
}
