//! # Platform
//!
//! Blocking client and reconciliation primitives for the digital-twin
//! platform API.
//!
//! ## Core Concepts
//!
//! - **`PlatformApi`**: the CRUD + access-control contract the engine codes
//!   against; [`ApiClient`] is the HTTP implementation
//! - **`SecuritySpec` / `compute_delta`**: a resource's ACL and the three
//!   disjoint sets that converge it to a desired spec
//! - **`poll`**: bounded blocking wait for asynchronous backend jobs
//!
//! The trait seam exists so the engine can run against a recorded double in
//! tests; only [`ApiClient`] touches the network.

pub mod api;
pub mod client;
pub mod error;
pub mod poll;
pub mod security;

pub use api::{DeleteOutcome, PlatformApi};
pub use client::ApiClient;
pub use error::{Error, Result};
pub use poll::{poll, PollError, PollResult};
pub use security::{compute_delta, AccessControlEntry, AclDelta, Role, SecuritySpec};
