//! Client request gateway for the opcsim device simulator.
//!
//! This crate provides an Axum HTTP server that exposes the built address
//! space to clients:
//!
//! - **Endpoint listing** (`/api/endpoints`) with the advertised security
//!   modes, policies, and user token policies
//! - **Browse** (`/api/nodes`, `/api/nodes/{id}/children`) over folders
//! - **Read and write** (`GET`/`PUT /api/nodes/{id}`) dispatched to each
//!   variable's accessor
//! - **Minimal HTML status page** (`GET /`)
//!
//! # Architecture
//!
//! The gateway holds the [`AddressSpace`] behind an `Arc` and never
//! mutates its structure. Reads and writes go through the address space's
//! `&self` dispatch, so concurrent requests only contend on the variant
//! store's lock.
//!
//! [`AddressSpace`]: opcsim_core::namespace::AddressSpace

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::GatewayError;
pub use router::build_router;
pub use server::{ServerError, bind, serve};
pub use state::{EndpointDescription, EndpointInfo, GatewayState};
