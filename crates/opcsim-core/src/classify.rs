//! Data type classification for node metadata.
//!
//! Nodes advertise a coarse [`Category`] rather than their detailed
//! primitive kind: every integer width surfaces as `Integer` and both
//! float widths surface as `Double`. Kinds the simulator has no category
//! for map to [`Category::Unspecified`], whose label is empty; this never
//! fails, so registration of such a node still succeeds.

use opcsim_types::{Category, DataType};

/// Map a declared data kind to its exposition category.
pub const fn classify(data_type: DataType) -> Category {
    match data_type {
        DataType::Boolean => Category::Boolean,
        DataType::Int16 | DataType::Int32 | DataType::Int64 => Category::Integer,
        DataType::Float | DataType::Double => Category::Double,
        DataType::String => Category::String,
        DataType::SByte
        | DataType::Byte
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::DateTime
        | DataType::ByteString => Category::Unspecified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_is_boolean() {
        assert_eq!(classify(DataType::Boolean).label(), "Boolean");
    }

    #[test]
    fn signed_widths_collapse_to_integer() {
        assert_eq!(classify(DataType::Int16), Category::Integer);
        assert_eq!(classify(DataType::Int32), Category::Integer);
        assert_eq!(classify(DataType::Int64), Category::Integer);
    }

    #[test]
    fn float_surfaces_as_double() {
        assert_eq!(classify(DataType::Float), classify(DataType::Double));
        assert_eq!(classify(DataType::Double).label(), "Double");
    }

    #[test]
    fn string_is_string() {
        assert_eq!(classify(DataType::String).label(), "String");
    }

    #[test]
    fn other_kinds_have_empty_label() {
        for data_type in [
            DataType::SByte,
            DataType::Byte,
            DataType::UInt16,
            DataType::UInt32,
            DataType::UInt64,
            DataType::DateTime,
            DataType::ByteString,
        ] {
            assert_eq!(classify(data_type).label(), "", "{data_type}");
        }
    }
}
