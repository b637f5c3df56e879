//! Tagged values held by variables.
//!
//! A [`Variant`] is either a [`Scalar`] or an [`Array`], and each of those
//! is an enum over the primitive kinds the simulator stores. The data type
//! and shape of a value are therefore derived from the payload itself: a
//! variant cannot claim to be an `Int32` array while carrying a string.
//!
//! # Wire form
//!
//! Variants cross the client boundary as JSON via [`WireVariant`]:
//!
//! ```json
//! { "dataType": "Int32", "arrayType": "Scalar", "value": 42 }
//! { "dataType": "Double", "arrayType": "Array", "value": [1.0, 2.0, 3.0] }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::enums::{DataType, ValueShape};

/// A single primitive value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    /// Boolean value.
    Boolean(bool),
    /// 16-bit signed integer.
    Int16(i16),
    /// 32-bit signed integer.
    Int32(i32),
    /// 64-bit signed integer.
    Int64(i64),
    /// Single precision float.
    Float(f32),
    /// Double precision float.
    Double(f64),
    /// UTF-8 string.
    String(String),
}

/// An ordered sequence of primitive values of one kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Array {
    /// Boolean elements.
    Boolean(Vec<bool>),
    /// 16-bit signed integer elements.
    Int16(Vec<i16>),
    /// 32-bit signed integer elements.
    Int32(Vec<i32>),
    /// 64-bit signed integer elements.
    Int64(Vec<i64>),
    /// Single precision float elements.
    Float(Vec<f32>),
    /// Double precision float elements.
    Double(Vec<f64>),
    /// String elements.
    String(Vec<String>),
}

/// A tagged value: data type and shape are implied by the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireVariant", into = "WireVariant")]
pub enum Variant {
    /// A single value.
    Scalar(Scalar),
    /// A one-dimensional array.
    Array(Array),
}

/// The (data type, shape) pair a variant carries.
///
/// Two variants with equal kinds may replace one another in a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariantKind {
    /// Primitive data kind of the payload.
    pub data_type: DataType,
    /// Scalar or array.
    pub shape: ValueShape,
}

impl fmt::Display for VariantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.data_type, self.shape)
    }
}

/// Errors raised when a JSON payload cannot become a [`Variant`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariantError {
    /// The declared data type has no variant payload.
    #[error("data type {0} cannot be held in a variant")]
    Unsupported(DataType),

    /// The payload does not match the declared data type.
    #[error("expected {data_type} value, found {found}")]
    PayloadMismatch {
        /// The declared data type.
        data_type: DataType,
        /// JSON kind that was supplied.
        found: &'static str,
    },

    /// An integer payload does not fit the declared width.
    #[error("{value} is out of range for {data_type}")]
    OutOfRange {
        /// The declared data type.
        data_type: DataType,
        /// The supplied integer.
        value: i64,
    },

    /// An array shape was declared but the payload is not a sequence.
    #[error("expected an array of {0}")]
    ExpectedArray(DataType),
}

// ---------------------------------------------------------------------------
// Scalar
// ---------------------------------------------------------------------------

impl Scalar {
    /// Return the primitive data kind of this value.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    /// Decode a JSON value as a scalar of the given data type.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError`] if the JSON does not match `data_type` or
    /// the data type has no payload representation.
    pub fn from_json(data_type: DataType, value: &Value) -> Result<Self, VariantError> {
        match data_type {
            DataType::Boolean => parse_bool(data_type, value).map(Self::Boolean),
            DataType::Int16 => parse_int(data_type, value).map(Self::Int16),
            DataType::Int32 => parse_int(data_type, value).map(Self::Int32),
            DataType::Int64 => parse_int(data_type, value).map(Self::Int64),
            DataType::Float => parse_float(data_type, value).map(Self::Float),
            DataType::Double => parse_double(data_type, value).map(Self::Double),
            DataType::String => parse_string(data_type, value).map(Self::String),
            other => Err(VariantError::Unsupported(other)),
        }
    }

    /// Encode this value as JSON.
    pub fn to_json(&self) -> Value {
        match self {
            Self::Boolean(v) => Value::Bool(*v),
            Self::Int16(v) => Value::from(*v),
            Self::Int32(v) => Value::from(*v),
            Self::Int64(v) => Value::from(*v),
            Self::Float(v) => Value::from(f64::from(*v)),
            Self::Double(v) => Value::from(*v),
            Self::String(v) => Value::String(v.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Int16(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::Int64(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
            Self::String(v) => f.write_str(v),
        }
    }
}

// ---------------------------------------------------------------------------
// Array
// ---------------------------------------------------------------------------

impl Array {
    /// Return the primitive data kind of the elements.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Boolean(_) => DataType::Boolean,
            Self::Int16(_) => DataType::Int16,
            Self::Int32(_) => DataType::Int32,
            Self::Int64(_) => DataType::Int64,
            Self::Float(_) => DataType::Float,
            Self::Double(_) => DataType::Double,
            Self::String(_) => DataType::String,
        }
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        match self {
            Self::Boolean(v) => v.len(),
            Self::Int16(v) => v.len(),
            Self::Int32(v) => v.len(),
            Self::Int64(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
            Self::String(v) => v.len(),
        }
    }

    /// Return `true` if the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Decode a JSON sequence as an array of the given data type.
    ///
    /// # Errors
    ///
    /// Returns [`VariantError`] if any element does not match `data_type`.
    pub fn from_json(data_type: DataType, items: &[Value]) -> Result<Self, VariantError> {
        match data_type {
            DataType::Boolean => collect(data_type, items, parse_bool).map(Self::Boolean),
            DataType::Int16 => collect(data_type, items, parse_int).map(Self::Int16),
            DataType::Int32 => collect(data_type, items, parse_int).map(Self::Int32),
            DataType::Int64 => collect(data_type, items, parse_int).map(Self::Int64),
            DataType::Float => collect(data_type, items, parse_float).map(Self::Float),
            DataType::Double => collect(data_type, items, parse_double).map(Self::Double),
            DataType::String => collect(data_type, items, parse_string).map(Self::String),
            other => Err(VariantError::Unsupported(other)),
        }
    }

    /// Encode the elements as a JSON array.
    pub fn to_json(&self) -> Value {
        let items: Vec<Value> = match self {
            Self::Boolean(v) => v.iter().copied().map(Value::Bool).collect(),
            Self::Int16(v) => v.iter().copied().map(Value::from).collect(),
            Self::Int32(v) => v.iter().copied().map(Value::from).collect(),
            Self::Int64(v) => v.iter().copied().map(Value::from).collect(),
            Self::Float(v) => v.iter().map(|x| Value::from(f64::from(*x))).collect(),
            Self::Double(v) => v.iter().copied().map(Value::from).collect(),
            Self::String(v) => v.iter().cloned().map(Value::String).collect(),
        };
        Value::Array(items)
    }
}

impl fmt::Display for Array {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write_list(f, v),
            Self::Int16(v) => write_list(f, v),
            Self::Int32(v) => write_list(f, v),
            Self::Int64(v) => write_list(f, v),
            Self::Float(v) => write_list(f, v),
            Self::Double(v) => write_list(f, v),
            Self::String(v) => write_list(f, v),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    f.write_str("[")?;
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    f.write_str("]")
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

impl Variant {
    /// Return the primitive data kind of the payload.
    pub const fn data_type(&self) -> DataType {
        match self {
            Self::Scalar(s) => s.data_type(),
            Self::Array(a) => a.data_type(),
        }
    }

    /// Return whether this is a scalar or an array.
    pub const fn shape(&self) -> ValueShape {
        match self {
            Self::Scalar(_) => ValueShape::Scalar,
            Self::Array(_) => ValueShape::Array,
        }
    }

    /// Return the (data type, shape) pair.
    pub const fn kind(&self) -> VariantKind {
        VariantKind {
            data_type: self.data_type(),
            shape: self.shape(),
        }
    }

    /// Return the scalar payload, if this is a scalar.
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            Self::Array(_) => None,
        }
    }

    /// Return the array payload, if this is an array.
    pub const fn as_array(&self) -> Option<&Array> {
        match self {
            Self::Scalar(_) => None,
            Self::Array(a) => Some(a),
        }
    }

    /// Return the payload as `f64` if this is a floating point scalar.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Scalar(Scalar::Double(v)) => Some(*v),
            Self::Scalar(Scalar::Float(v)) => Some(f64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(s) => fmt::Display::fmt(s, f),
            Self::Array(a) => fmt::Display::fmt(a, f),
        }
    }
}

impl From<Scalar> for Variant {
    fn from(value: Scalar) -> Self {
        Self::Scalar(value)
    }
}

impl From<Array> for Variant {
    fn from(value: Array) -> Self {
        Self::Array(value)
    }
}

macro_rules! impl_from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }

            impl From<Vec<$ty>> for Array {
                fn from(values: Vec<$ty>) -> Self {
                    Self::$variant(values)
                }
            }
        )*
    };
}

impl_from_primitive!(
    bool => Boolean,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float,
    f64 => Double,
    String => String,
);

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Wire form
// ---------------------------------------------------------------------------

/// JSON representation of a [`Variant`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireVariant {
    /// Declared primitive kind of `value`.
    pub data_type: DataType,
    /// Declared shape of `value`.
    pub array_type: ValueShape,
    /// The payload: a JSON primitive, or a JSON array for arrays.
    pub value: Value,
}

impl From<Variant> for WireVariant {
    fn from(variant: Variant) -> Self {
        let data_type = variant.data_type();
        let array_type = variant.shape();
        let value = match &variant {
            Variant::Scalar(s) => s.to_json(),
            Variant::Array(a) => a.to_json(),
        };
        Self {
            data_type,
            array_type,
            value,
        }
    }
}

impl TryFrom<WireVariant> for Variant {
    type Error = VariantError;

    fn try_from(wire: WireVariant) -> Result<Self, Self::Error> {
        match wire.array_type {
            ValueShape::Scalar => Scalar::from_json(wire.data_type, &wire.value).map(Self::Scalar),
            ValueShape::Array => {
                let items = wire
                    .value
                    .as_array()
                    .ok_or(VariantError::ExpectedArray(wire.data_type))?;
                Array::from_json(wire.data_type, items).map(Self::Array)
            }
        }
    }
}

fn collect<T>(
    data_type: DataType,
    items: &[Value],
    parse: fn(DataType, &Value) -> Result<T, VariantError>,
) -> Result<Vec<T>, VariantError> {
    items.iter().map(|item| parse(data_type, item)).collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

const fn mismatch(data_type: DataType, value: &Value) -> VariantError {
    VariantError::PayloadMismatch {
        data_type,
        found: json_kind(value),
    }
}

fn parse_bool(data_type: DataType, value: &Value) -> Result<bool, VariantError> {
    value.as_bool().ok_or_else(|| mismatch(data_type, value))
}

fn parse_int<T: TryFrom<i64>>(data_type: DataType, value: &Value) -> Result<T, VariantError> {
    let raw = value.as_i64().ok_or_else(|| mismatch(data_type, value))?;
    T::try_from(raw).map_err(|_err| VariantError::OutOfRange {
        data_type,
        value: raw,
    })
}

#[allow(clippy::cast_possible_truncation)]
fn parse_float(data_type: DataType, value: &Value) -> Result<f32, VariantError> {
    parse_double(data_type, value).map(|v| v as f32)
}

fn parse_double(data_type: DataType, value: &Value) -> Result<f64, VariantError> {
    value.as_f64().ok_or_else(|| mismatch(data_type, value))
}

fn parse_string(data_type: DataType, value: &Value) -> Result<String, VariantError> {
    value
        .as_str()
        .map(str::to_owned)
        .ok_or_else(|| mismatch(data_type, value))
}
