//! The platform API contract.
//!
//! Everything the reconciliation engine needs from the remote platform is
//! behind [`PlatformApi`], so the engine can be exercised against a recorded
//! double in tests. The real implementation is [`crate::ApiClient`].

use crate::error::Result;
use crate::security::{AccessControlEntry, Role, SecuritySpec};
use serde_json::Value;

/// Outcome of a delete call.
///
/// A 404 is not an error here: the resource being gone is exactly what the
/// caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The resource existed and was deleted
    Deleted,
    /// The resource was already gone
    NotFound,
}

/// CRUD plus access-control operations against the platform.
///
/// `collection` arguments are collection paths such as `/organizations` or
/// `/organizations/{id}/workspaces`; `resource_path` arguments address one
/// resource, e.g. `/organizations/o-1`.
pub trait PlatformApi {
    /// Create a resource; returns the created resource's representation.
    fn create(&self, collection: &str, payload: &Value) -> Result<Value>;

    /// Update a resource in place.
    fn update(&self, collection: &str, id: &str, payload: &Value) -> Result<Value>;

    /// Delete a resource. A 404 maps to [`DeleteOutcome::NotFound`].
    fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome>;

    /// Fetch a resource's current security spec.
    fn get_security(&self, resource_path: &str) -> Result<SecuritySpec>;

    /// Replace the resource's default role.
    fn set_default_security(&self, resource_path: &str, role: Role) -> Result<()>;

    /// Add one access-control entry.
    fn add_access(&self, resource_path: &str, entry: &AccessControlEntry) -> Result<()>;

    /// Change the role of one existing entry.
    fn update_access(&self, resource_path: &str, id: &str, role: Role) -> Result<()>;

    /// Remove one entry.
    fn delete_access(&self, resource_path: &str, id: &str) -> Result<()>;

    /// Fetch a raw status body (e.g. a twin-graph creation status).
    fn get_status(&self, path: &str) -> Result<String>;

    /// Upload a blob to an absolute URL (deployment state mirroring).
    fn put_blob(&self, url: &str, body: &str) -> Result<()>;
}
