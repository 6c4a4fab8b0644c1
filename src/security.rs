//! Converging a resource's access control to its manifest spec.

use crate::ui;
use platform::{compute_delta, PlatformApi, SecuritySpec};

/// Apply a desired security spec to one resource.
///
/// Order is fixed: the default role first (a changed default must land
/// before entries are touched so role changes don't transiently widen
/// access), then additions, then role updates, then deletions last so a
/// principal is never orphaned mid-update.
///
/// Convergence is best effort, not atomic: every mutation is caught
/// individually, logged with the resource label, and the remaining entries
/// still proceed. Re-running against an already-converged resource computes
/// three empty sets and issues no mutating calls.
pub fn apply_security(
    api: &dyn PlatformApi,
    resource_path: &str,
    desired: &SecuritySpec,
    label: &str,
) {
    let current = match api.get_security(resource_path) {
        Ok(current) => current,
        Err(e) => {
            ui::error(&format!("{label}: could not read security: {e}"));
            log::error!("{label}: get_security failed: {e}");
            return;
        }
    };

    if current.default != desired.default {
        match api.set_default_security(resource_path, desired.default) {
            Ok(()) => ui::info(&format!("{label}: default role set to {}", desired.default)),
            Err(e) => {
                ui::warn(&format!("{label}: failed to set default role: {e}"));
                log::warn!("{label}: set_default_security failed: {e}");
            }
        }
    }

    let delta = compute_delta(&current.access_control_list, &desired.access_control_list);
    if delta.is_empty() {
        log::debug!("{label}: access control already converged");
        return;
    }

    for entry in &delta.to_add {
        if let Err(e) = api.add_access(resource_path, entry) {
            ui::warn(&format!("{label}: failed to add access for {}: {e}", entry.id));
            log::warn!("{label}: add_access {} failed: {e}", entry.id);
        }
    }

    for entry in &delta.to_update {
        if let Err(e) = api.update_access(resource_path, &entry.id, entry.role) {
            ui::warn(&format!(
                "{label}: failed to update access for {}: {e}",
                entry.id
            ));
            log::warn!("{label}: update_access {} failed: {e}", entry.id);
        }
    }

    for id in &delta.to_delete {
        if let Err(e) = api.delete_access(resource_path, id) {
            ui::warn(&format!("{label}: failed to delete access for {id}: {e}"));
            log::warn!("{label}: delete_access {id} failed: {e}");
        }
    }

    ui::dim(&format!(
        "{label}: access control delta applied (+{} ~{} -{})",
        delta.to_add.len(),
        delta.to_update.len(),
        delta.to_delete.len()
    ));
}
