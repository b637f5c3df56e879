//! Node identities.
//!
//! A [`NodeId`] names a node in the address space. Its textual form is
//! the identifier type prefix followed by the identifier:
//!
//! | Form | Example |
//! |------|---------|
//! | numeric | `i=85` |
//! | string | `s=Simulator.Default.Device1.INT1` |
//! | opaque | `b=1020ffab` |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Identity of a node in the address space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum NodeId {
    /// Numeric identifier, allocated by the address space.
    Numeric(u32),
    /// Hierarchical string identifier chosen by the binder.
    String(String),
    /// Opaque byte identifier.
    Opaque(Vec<u8>),
}

impl NodeId {
    /// The well-known `Objects` folder every device tree hangs off.
    pub const OBJECTS_FOLDER: Self = Self::Numeric(85);

    /// Build a string node id.
    pub fn string(identifier: impl Into<String>) -> Self {
        Self::String(identifier.into())
    }
}

/// Errors produced when parsing the textual form of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NodeIdParseError {
    /// The text has no `<type>=` prefix.
    #[error("node id {0:?} is missing an identifier type prefix")]
    MissingPrefix(String),

    /// The prefix is not one of `i`, `s`, `b`.
    #[error("unknown identifier type {0:?}")]
    UnknownType(String),

    /// The identifier does not match its declared type.
    #[error("invalid {kind} identifier {value:?}")]
    InvalidIdentifier {
        /// Identifier type that failed to parse.
        kind: &'static str,
        /// Offending identifier text.
        value: String,
    },
}

impl FromStr for NodeId {
    type Err = NodeIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (prefix, identifier) = s
            .split_once('=')
            .ok_or_else(|| NodeIdParseError::MissingPrefix(s.to_owned()))?;

        match prefix {
            "i" => identifier
                .parse::<u32>()
                .map(Self::Numeric)
                .map_err(|_err| NodeIdParseError::InvalidIdentifier {
                    kind: "numeric",
                    value: identifier.to_owned(),
                }),
            "s" if !identifier.is_empty() => Ok(Self::String(identifier.to_owned())),
            "s" => Err(NodeIdParseError::InvalidIdentifier {
                kind: "string",
                value: String::new(),
            }),
            "b" if !identifier.is_empty() => hex::decode(identifier)
                .map(Self::Opaque)
                .map_err(|_err| NodeIdParseError::InvalidIdentifier {
                    kind: "opaque",
                    value: identifier.to_owned(),
                }),
            "b" => Err(NodeIdParseError::InvalidIdentifier {
                kind: "opaque",
                value: String::new(),
            }),
            other => Err(NodeIdParseError::UnknownType(other.to_owned())),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "i={id}"),
            Self::String(id) => write!(f, "s={id}"),
            Self::Opaque(bytes) => write!(f, "b={}", hex::encode(bytes)),
        }
    }
}

impl From<NodeId> for String {
    fn from(id: NodeId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for NodeId {
    type Error = NodeIdParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
