//! Variable binding and address space construction for opcsim.
//!
//! This crate owns everything between a value and the node a client sees:
//! the shared store of current values, the accessors that read and write
//! it, the namespace nodes are registered into, and the builder that lays
//! out the simulated device.
//!
//! # Modules
//!
//! - [`classify`] -- Maps declared data kinds to exposition categories.
//! - [`store`] -- [`VariantStore`], the shared map of current values.
//! - [`accessor`] -- [`VariableAccessor`] and its store-backed, computed,
//!   and static implementations.
//! - [`namespace`] -- The [`Namespace`] registration trait and the
//!   in-memory [`AddressSpace`] that dispatches reads and writes.
//! - [`binder`] -- [`VariableBinder`], which wires values to nodes.
//! - [`builder`] -- [`AddressSpaceBuilder`], which lays out the device tree.
//! - [`probe`] -- Clock and memory collaborators for computed variables.
//! - [`config`] -- Configuration loading from `opcsim-config.yaml`.
//!
//! [`VariantStore`]: store::VariantStore
//! [`VariableAccessor`]: accessor::VariableAccessor
//! [`Namespace`]: namespace::Namespace
//! [`AddressSpace`]: namespace::AddressSpace
//! [`VariableBinder`]: binder::VariableBinder
//! [`AddressSpaceBuilder`]: builder::AddressSpaceBuilder

pub mod accessor;
pub mod binder;
pub mod builder;
pub mod classify;
pub mod config;
pub mod namespace;
pub mod probe;
pub mod store;
