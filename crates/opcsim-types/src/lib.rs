//! Shared type definitions for the opcsim device simulator.
//!
//! This crate is the single source of truth for the value model used
//! across the workspace: the declared data kinds, the tagged [`Variant`]
//! values that variables hold, node identities, access levels, and the
//! status codes returned to clients.
//!
//! # Modules
//!
//! - [`enums`] -- Data kinds, shapes, categories, status codes, security
//!   policies
//! - [`ids`] -- [`NodeId`] and its textual form (`i=85`, `s=Temperature`)
//! - [`structs`] -- [`AccessLevel`] and [`VariableDescriptor`]
//! - [`variant`] -- [`Scalar`], [`Array`], [`Variant`] and the JSON wire form

pub mod enums;
pub mod ids;
pub mod structs;
pub mod variant;

// Re-export all public types at crate root for convenience.
pub use enums::{Category, DataType, MessageSecurityMode, SecurityPolicy, StatusCode, ValueShape};
pub use ids::{NodeId, NodeIdParseError};
pub use structs::{AccessLevel, VariableDescriptor};
pub use variant::{Array, Scalar, Variant, VariantError, VariantKind, WireVariant};
