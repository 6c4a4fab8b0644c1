//! Manifest document types and the resource kind ordering.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The resource kinds a deployment is made of.
///
/// A static total order exists between kinds: an Organization owns Solutions
/// and Workspaces, and a WebApp fronts a Workspace. Apply walks
/// [`APPLY_ORDER`]; destroy walks it in reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
pub enum ResourceKind {
    Organization,
    Solution,
    Workspace,
    WebApp,
}

/// Kinds in dependency order for apply.
pub const APPLY_ORDER: [ResourceKind; 4] = [
    ResourceKind::Organization,
    ResourceKind::Solution,
    ResourceKind::Workspace,
    ResourceKind::WebApp,
];

impl ResourceKind {
    /// Kinds in reverse dependency order for destroy.
    pub fn destroy_order() -> [ResourceKind; 4] {
        let mut order = APPLY_ORDER;
        order.reverse();
        order
    }

    /// The key this kind's remote identifier is stored under.
    pub fn state_key(&self) -> &'static str {
        match self {
            ResourceKind::Organization => "organization_id",
            ResourceKind::Solution => "solution_id",
            ResourceKind::Workspace => "workspace_id",
            ResourceKind::WebApp => "webapp_name",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            ResourceKind::Organization => "organization",
            ResourceKind::Solution => "solution",
            ResourceKind::Workspace => "workspace",
            ResourceKind::WebApp => "webapp",
        };
        write!(f, "{token}")
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "organization" => Ok(ResourceKind::Organization),
            "solution" => Ok(ResourceKind::Solution),
            "workspace" => Ok(ResourceKind::Workspace),
            "webapp" => Ok(ResourceKind::WebApp),
            _ => Err(Error::UnknownKind(s.to_string())),
        }
    }
}

/// A fully parsed manifest document.
#[derive(Debug, Deserialize)]
pub struct ManifestDoc {
    pub kind: ResourceKind,
    #[serde(default)]
    pub spec: ManifestSpec,
}

/// The desired-state body of a manifest.
#[derive(Debug, Default, Deserialize)]
pub struct ManifestSpec {
    /// Resource-specific payload sent to the platform API. An absent `id`
    /// field means the resource has not been created yet.
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub sidecars: Sidecars,
}

/// Per-kind extension data carried next to the payload.
#[derive(Debug, Default, Deserialize)]
pub struct Sidecars {
    #[serde(default)]
    pub postgres: Option<PostgresSidecar>,
    #[serde(default)]
    pub dataset: Option<DatasetSidecar>,
    #[serde(default)]
    pub terraform: Option<TerraformSidecar>,
}

/// Workspace sidecar: bootstrap a PostgreSQL schema for the workspace.
#[derive(Debug, Deserialize)]
pub struct PostgresSidecar {
    #[serde(default)]
    pub schema: SchemaSpec,
}

#[derive(Debug, Default, Deserialize)]
pub struct SchemaSpec {
    #[serde(default)]
    pub create: bool,
}

/// Workspace sidecar: create a dataset whose twin-graph is materialized
/// asynchronously by the backend.
#[derive(Debug, Deserialize)]
pub struct DatasetSidecar {
    #[serde(default)]
    pub create: bool,
    pub name: String,
}

/// WebApp sidecar: extra variables handed to the provisioning run.
#[derive(Debug, Deserialize)]
pub struct TerraformSidecar {
    #[serde(default)]
    pub vars: BTreeMap<String, String>,
}

impl ManifestDoc {
    /// Parse a (rendered) manifest document.
    pub fn parse(path: &Path, text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The `id` field of the payload, if the manifest carries one.
    pub fn payload_id(&self) -> Option<&str> {
        self.spec.payload.get("id").and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_order() {
        assert_eq!(
            APPLY_ORDER,
            [
                ResourceKind::Organization,
                ResourceKind::Solution,
                ResourceKind::Workspace,
                ResourceKind::WebApp,
            ]
        );
    }

    #[test]
    fn test_destroy_order_is_reverse() {
        let mut reversed = ResourceKind::destroy_order();
        reversed.reverse();
        assert_eq!(reversed, APPLY_ORDER);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!(
            "organization".parse::<ResourceKind>().unwrap(),
            ResourceKind::Organization
        );
        assert_eq!(
            "WebApp".parse::<ResourceKind>().unwrap(),
            ResourceKind::WebApp
        );
        assert!("database".parse::<ResourceKind>().is_err());
    }

    #[test]
    fn test_parse_manifest_with_sidecars() {
        let text = r#"
kind: Workspace
spec:
  payload:
    name: Brewery
    solution_id: sol-1
  sidecars:
    postgres:
      schema:
        create: true
    dataset:
      create: true
      name: main-graph
"#;
        let doc = ManifestDoc::parse(Path::new("workspace.yaml"), text).unwrap();
        assert_eq!(doc.kind, ResourceKind::Workspace);
        assert_eq!(doc.payload_id(), None);
        assert!(doc.spec.sidecars.postgres.unwrap().schema.create);
        assert_eq!(doc.spec.sidecars.dataset.unwrap().name, "main-graph");
    }

    #[test]
    fn test_payload_id() {
        let text = "kind: Organization\nspec:\n  payload:\n    id: o-123\n";
        let doc = ManifestDoc::parse(Path::new("org.yaml"), text).unwrap();
        assert_eq!(doc.payload_id(), Some("o-123"));
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = ManifestDoc::parse(Path::new("bad.yaml"), "kind: [").unwrap_err();
        assert!(err.to_string().contains("bad.yaml"));
    }
}
