//! Access-control types and the ACL delta computation.
//!
//! A resource's security is a default role plus a list of per-principal
//! entries keyed by principal id. Converging the remote list to a desired
//! spec starts with [`compute_delta`], which splits the work into three
//! disjoint sets applied in a fixed order by the caller.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Role a principal (or the default) holds on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    User,
    Editor,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Viewer => "viewer",
            Role::User => "user",
            Role::Editor => "editor",
            Role::Admin => "admin",
        };
        write!(f, "{name}")
    }
}

/// One `{principal id, role}` access-control entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessControlEntry {
    pub id: String,
    pub role: Role,
}

/// A resource's full security spec: default role + ACL.
///
/// Entries are keyed by `id`; a well-formed list has no duplicate ids
/// (when the backend sends duplicates anyway, the last entry wins).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecuritySpec {
    pub default: Role,
    #[serde(default)]
    pub access_control_list: Vec<AccessControlEntry>,
}

/// The three disjoint sets that converge a current ACL to a desired one.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AclDelta {
    /// Ids present only in the desired list
    pub to_add: Vec<AccessControlEntry>,
    /// Ids present in both lists with a different role (desired role carried)
    pub to_update: Vec<AccessControlEntry>,
    /// Ids present only in the current list
    pub to_delete: Vec<String>,
}

impl AclDelta {
    /// True when the lists are already converged.
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_update.is_empty() && self.to_delete.is_empty()
    }
}

/// Compute the delta between a current and a desired ACL.
///
/// Output order is deterministic (sorted by principal id), so repeated runs
/// over the same inputs produce identical deltas.
pub fn compute_delta(current: &[AccessControlEntry], desired: &[AccessControlEntry]) -> AclDelta {
    let current_by_id: BTreeMap<&str, Role> =
        current.iter().map(|e| (e.id.as_str(), e.role)).collect();
    let desired_by_id: BTreeMap<&str, Role> =
        desired.iter().map(|e| (e.id.as_str(), e.role)).collect();

    let mut delta = AclDelta::default();

    for (id, role) in &desired_by_id {
        match current_by_id.get(id) {
            None => delta.to_add.push(AccessControlEntry {
                id: (*id).to_string(),
                role: *role,
            }),
            Some(current_role) if current_role != role => {
                delta.to_update.push(AccessControlEntry {
                    id: (*id).to_string(),
                    role: *role,
                });
            }
            Some(_) => {}
        }
    }

    for id in current_by_id.keys() {
        if !desired_by_id.contains_key(id) {
            delta.to_delete.push((*id).to_string());
        }
    }

    delta
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, role: Role) -> AccessControlEntry {
        AccessControlEntry {
            id: id.to_string(),
            role,
        }
    }

    #[test]
    fn test_delta_set_algebra() {
        let current = vec![
            entry("alice@acme.com", Role::Admin),
            entry("bob@acme.com", Role::Viewer),
            entry("carol@acme.com", Role::User),
        ];
        let desired = vec![
            entry("alice@acme.com", Role::Admin),
            entry("bob@acme.com", Role::Editor),
            entry("dave@acme.com", Role::Viewer),
        ];

        let delta = compute_delta(&current, &desired);

        assert_eq!(delta.to_add, vec![entry("dave@acme.com", Role::Viewer)]);
        assert_eq!(delta.to_update, vec![entry("bob@acme.com", Role::Editor)]);
        assert_eq!(delta.to_delete, vec!["carol@acme.com".to_string()]);
    }

    #[test]
    fn test_delta_sets_are_disjoint() {
        let current = vec![entry("a", Role::Viewer), entry("b", Role::User)];
        let desired = vec![entry("b", Role::Admin), entry("c", Role::User)];

        let delta = compute_delta(&current, &desired);

        let add_ids: Vec<&str> = delta.to_add.iter().map(|e| e.id.as_str()).collect();
        let update_ids: Vec<&str> = delta.to_update.iter().map(|e| e.id.as_str()).collect();
        for id in &add_ids {
            assert!(!delta.to_delete.iter().any(|d| d == id));
            assert!(!update_ids.contains(id));
        }
        for id in &update_ids {
            assert!(!delta.to_delete.iter().any(|d| d == id));
        }
    }

    #[test]
    fn test_delta_converged_is_empty() {
        let acl = vec![entry("a", Role::Admin), entry("b", Role::Viewer)];
        let delta = compute_delta(&acl, &acl.clone());
        assert!(delta.is_empty());
    }

    #[test]
    fn test_delta_empty_inputs() {
        assert!(compute_delta(&[], &[]).is_empty());

        let desired = vec![entry("a", Role::User)];
        let delta = compute_delta(&[], &desired);
        assert_eq!(delta.to_add.len(), 1);
        assert!(delta.to_update.is_empty() && delta.to_delete.is_empty());
    }

    #[test]
    fn test_delta_order_is_deterministic() {
        let desired = vec![entry("zed", Role::User), entry("amy", Role::User)];
        let delta = compute_delta(&[], &desired);
        let ids: Vec<&str> = delta.to_add.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["amy", "zed"]);
    }

    #[test]
    fn test_security_spec_wire_names() {
        let json = r#"{"default":"viewer","accessControlList":[{"id":"a","role":"admin"}]}"#;
        let spec: SecuritySpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.default, Role::Viewer);
        assert_eq!(spec.access_control_list[0].role, Role::Admin);

        let back = serde_json::to_string(&spec).unwrap();
        assert!(back.contains("accessControlList"));
    }
}
