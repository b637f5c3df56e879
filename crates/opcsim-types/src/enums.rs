//! Enumeration types for the opcsim value model.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Declared data kinds
// ---------------------------------------------------------------------------

/// The primitive data kind a variable is declared with.
///
/// This is a superset of the kinds a [`Variant`](crate::Variant) can carry.
/// The extra kinds exist so that node metadata can be declared for types
/// the simulator does not hold values of; they classify to
/// [`Category::Unspecified`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DataType {
    /// `true` / `false`.
    Boolean,
    /// Signed 8-bit integer.
    SByte,
    /// Unsigned 8-bit integer.
    Byte,
    /// Signed 16-bit integer.
    Int16,
    /// Unsigned 16-bit integer.
    UInt16,
    /// Signed 32-bit integer.
    Int32,
    /// Unsigned 32-bit integer.
    UInt32,
    /// Signed 64-bit integer.
    Int64,
    /// Unsigned 64-bit integer.
    UInt64,
    /// IEEE 754 single precision.
    Float,
    /// IEEE 754 double precision.
    Double,
    /// UTF-8 text.
    String,
    /// Absolute timestamp.
    DateTime,
    /// Opaque byte sequence.
    ByteString,
}

impl DataType {
    /// Return the canonical name of this data kind.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::SByte => "SByte",
            Self::Byte => "Byte",
            Self::Int16 => "Int16",
            Self::UInt16 => "UInt16",
            Self::Int32 => "Int32",
            Self::UInt32 => "UInt32",
            Self::Int64 => "Int64",
            Self::UInt64 => "UInt64",
            Self::Float => "Float",
            Self::Double => "Double",
            Self::String => "String",
            Self::DateTime => "DateTime",
            Self::ByteString => "ByteString",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a value is a single element or an ordered sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueShape {
    /// A single value.
    Scalar,
    /// A one-dimensional array of values.
    Array,
}

impl ValueShape {
    /// The value rank advertised in node metadata: `-1` for scalars,
    /// `1` for one-dimensional arrays.
    pub const fn value_rank(self) -> i32 {
        match self {
            Self::Scalar => -1,
            Self::Array => 1,
        }
    }
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => f.write_str("Scalar"),
            Self::Array => f.write_str("Array"),
        }
    }
}

/// Coarse exposition category derived from a [`DataType`].
///
/// Serialized as its label, so [`Category::Unspecified`] appears as the
/// empty string in node metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Boolean values.
    Boolean,
    /// Any signed integer width the simulator models.
    Integer,
    /// Single or double precision floating point, surfaced as double.
    Double,
    /// Text.
    String,
    /// No category could be derived.
    #[serde(rename = "")]
    Unspecified,
}

impl Category {
    /// Return the label placed in node metadata.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Boolean => "Boolean",
            Self::Integer => "Integer",
            Self::Double => "Double",
            Self::String => "String",
            Self::Unspecified => "",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Status codes
// ---------------------------------------------------------------------------

/// Result of a read or write dispatched to a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    /// The operation succeeded.
    Good,
    /// No node with the requested identity exists.
    BadNodeIdUnknown,
    /// The node does not permit reads.
    BadNotReadable,
    /// The node does not permit writes.
    BadNotWritable,
    /// The written value does not match the variable's data type or shape.
    BadTypeMismatch,
    /// The value source failed.
    BadInternalError,
}

impl StatusCode {
    /// Numeric status code as carried on the wire.
    pub const fn code(self) -> u32 {
        match self {
            Self::Good => 0x0000_0000,
            Self::BadInternalError => 0x8002_0000,
            Self::BadNodeIdUnknown => 0x8034_0000,
            Self::BadNotReadable => 0x803A_0000,
            Self::BadNotWritable => 0x803B_0000,
            Self::BadTypeMismatch => 0x8074_0000,
        }
    }

    /// Return `true` for [`StatusCode::Good`].
    pub const fn is_good(self) -> bool {
        matches!(self, Self::Good)
    }

    /// Return the symbolic name of this status.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::BadNodeIdUnknown => "BadNodeIdUnknown",
            Self::BadNotReadable => "BadNotReadable",
            Self::BadNotWritable => "BadNotWritable",
            Self::BadTypeMismatch => "BadTypeMismatch",
            Self::BadInternalError => "BadInternalError",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:08X})", self.name(), self.code())
    }
}

// ---------------------------------------------------------------------------
// Endpoint security
// ---------------------------------------------------------------------------

/// Security policy an endpoint is advertised with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SecurityPolicy {
    /// No signing or encryption.
    None,
    /// RSA with SHA-256 signatures and AES-256 encryption.
    Basic256Sha256,
}

impl SecurityPolicy {
    /// The policy URI advertised in endpoint descriptions.
    pub const fn uri(self) -> &'static str {
        match self {
            Self::None => "http://opcfoundation.org/UA/SecurityPolicy#None",
            Self::Basic256Sha256 => "http://opcfoundation.org/UA/SecurityPolicy#Basic256Sha256",
        }
    }

    /// Message security modes offered under this policy.
    pub const fn modes(self) -> &'static [MessageSecurityMode] {
        match self {
            Self::None => &[MessageSecurityMode::None],
            Self::Basic256Sha256 => &[MessageSecurityMode::Sign, MessageSecurityMode::SignAndEncrypt],
        }
    }
}

/// Message-level protection applied on an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageSecurityMode {
    /// Messages are neither signed nor encrypted.
    None,
    /// Messages are signed.
    Sign,
    /// Messages are signed and encrypted.
    SignAndEncrypt,
}

impl fmt::Display for MessageSecurityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("None"),
            Self::Sign => f.write_str("Sign"),
            Self::SignAndEncrypt => f.write_str("SignAndEncrypt"),
        }
    }
}
