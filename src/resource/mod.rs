//! Per-kind reconciliation of manifests against the platform.
//!
//! Every manifest converges the same way: render the template against the
//! deployment state, parse it, then create or update depending on whether an
//! id is already known. Failures are resource-local: a manifest that cannot
//! converge is logged and counted, and reconciliation moves on to the next
//! one.

pub mod webapp;
pub mod workspace;

use crate::context::DeploymentContext;
use crate::state::DeploymentState;
use crate::{security, ui};
use anyhow::{bail, Context, Result};
use manifest::{ManifestDoc, ResourceKind};
use platform::SecuritySpec;
use std::fs;
use std::path::{Path, PathBuf};

/// Collection path for an API-backed kind, given the parent ids in state.
///
/// A missing parent id is the "missing id" failure: the manifest depends on
/// a resource an earlier kind never managed to create.
pub fn collection_path(kind: ResourceKind, state: &DeploymentState) -> Result<String> {
    match kind {
        ResourceKind::Organization => Ok("/organizations".to_string()),
        ResourceKind::Solution => {
            let org = parent_id(state, ResourceKind::Organization, kind)?;
            Ok(format!("/organizations/{org}/solutions"))
        }
        ResourceKind::Workspace => {
            let org = parent_id(state, ResourceKind::Organization, kind)?;
            Ok(format!("/organizations/{org}/workspaces"))
        }
        ResourceKind::WebApp => bail!("webapp is provisioned externally, not via the API"),
    }
}

fn parent_id(state: &DeploymentState, parent: ResourceKind, kind: ResourceKind) -> Result<String> {
    state
        .id_for(parent)
        .map(str::to_string)
        .with_context(|| format!("missing {parent} id (required by the {kind} manifest)"))
}

/// Reconcile every manifest of one kind; returns how many failed.
pub fn reconcile_kind(ctx: &mut DeploymentContext, kind: ResourceKind, files: &[PathBuf]) -> usize {
    let mut failed = 0;

    for path in files {
        if let Err(e) = reconcile_file(ctx, kind, path) {
            ui::error(&format!("{kind} ({}): {e:#}", file_name(path)));
            log::error!("reconciliation of {} failed: {e:#}", path.display());
            failed += 1;
        }
    }

    failed
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

fn reconcile_file(ctx: &mut DeploymentContext, kind: ResourceKind, path: &Path) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let rendered = manifest::template::render(&text, ctx.template_lookup())?;
    let doc = ManifestDoc::parse(path, &rendered)?;

    match kind {
        ResourceKind::Workspace => workspace::reconcile(ctx, &doc),
        ResourceKind::WebApp => webapp::reconcile(ctx, &doc),
        _ => reconcile_api_resource(ctx, kind, &doc).map(|_| ()),
    }
}

/// Create-or-update for API-backed kinds; returns the resource id.
///
/// A freshly created id is flushed to the state store before anything else
/// happens, so a later failure leaves a resumable state behind. Security is
/// only reconciled on the update path, once the resource is known to exist.
pub(crate) fn reconcile_api_resource(
    ctx: &mut DeploymentContext,
    kind: ResourceKind,
    doc: &ManifestDoc,
) -> Result<String> {
    if !doc.spec.payload.is_object() {
        bail!("manifest payload must be a mapping");
    }

    let collection = collection_path(kind, &ctx.state)?;
    let known_id = doc
        .payload_id()
        .map(str::to_string)
        .or_else(|| ctx.state.id_for(kind).map(str::to_string));

    match known_id {
        None => {
            let created = ctx
                .api
                .create(&collection, &doc.spec.payload)
                .with_context(|| format!("create {kind} failed"))?;
            let id = created
                .get("id")
                .and_then(|v| v.as_str())
                .context("create response carries no id")?
                .to_string();

            ctx.state.set_id(kind, id.clone());
            ctx.persist_state()?;
            ui::success(&format!("{kind} created ({id})"));
            Ok(id)
        }
        Some(id) => {
            ctx.api
                .update(&collection, &id, &doc.spec.payload)
                .with_context(|| format!("update {kind} {id} failed"))?;
            ui::success(&format!("{kind} updated ({id})"));

            if let Some(desired) = doc.spec.payload.get("security") {
                let desired: SecuritySpec = serde_json::from_value(desired.clone())
                    .context("invalid security block in payload")?;
                let resource_path = format!("{collection}/{id}");
                security::apply_security(
                    ctx.api.as_ref(),
                    &resource_path,
                    &desired,
                    &format!("{kind} {id}"),
                );
            }

            Ok(id)
        }
    }
}
