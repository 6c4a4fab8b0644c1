//! Workspace reconciliation, including its sidecars.
//!
//! On top of the generic create-or-update, a workspace manifest can ask for
//! a PostgreSQL schema (bootstrapped through a cluster job) and a dataset
//! whose twin-graph the backend materializes asynchronously. Both sidecars
//! are best effort: their failures are logged and never undo the workspace.

use crate::context::DeploymentContext;
use crate::{k8s, progress, ui};
use anyhow::{Context, Result};
use manifest::{DatasetSidecar, ManifestDoc, ResourceKind};
use platform::{poll, PollResult};
use serde_json::json;
use std::time::Duration;

pub fn reconcile(ctx: &mut DeploymentContext, doc: &ManifestDoc) -> Result<()> {
    let id = super::reconcile_api_resource(ctx, ResourceKind::Workspace, doc)?;

    if let Some(pg) = &doc.spec.sidecars.postgres
        && pg.schema.create
    {
        k8s::bootstrap_schema(ctx, &id);
    }

    if let Some(dataset) = &doc.spec.sidecars.dataset
        && dataset.create
    {
        create_dataset(ctx, dataset);
    }

    Ok(())
}

fn create_dataset(ctx: &mut DeploymentContext, sidecar: &DatasetSidecar) {
    if let Err(e) = try_create_dataset(ctx, sidecar) {
        ui::error(&format!("dataset {}: {e:#}", sidecar.name));
        log::error!("dataset {} failed: {e:#}", sidecar.name);
    }
}

fn try_create_dataset(ctx: &mut DeploymentContext, sidecar: &DatasetSidecar) -> Result<()> {
    let org = ctx
        .state
        .id_for(ResourceKind::Organization)
        .context("missing organization id (required by the dataset sidecar)")?
        .to_string();
    let collection = format!("/organizations/{org}/datasets");

    let dataset_id = match ctx.state.dataset_id.clone() {
        Some(id) => {
            ui::info(&format!("dataset {} already created ({id})", sidecar.name));
            id
        }
        None => {
            let created = ctx
                .api
                .create(&collection, &json!({ "name": sidecar.name }))
                .context("create dataset failed")?;
            let id = created
                .get("id")
                .and_then(|v| v.as_str())
                .context("create response carries no dataset id")?
                .to_string();

            ctx.state.dataset_id = Some(id.clone());
            ctx.persist_state()?;
            ui::success(&format!("dataset {} created ({id})", sidecar.name));
            id
        }
    };

    // The twin-graph behind the dataset is built asynchronously; wait for a
    // terminal status. A failed or timed-out twin-graph does not retract the
    // dataset. It exists either way.
    let status_path = format!("{collection}/{dataset_id}/status");
    let interval = Duration::from_secs(ctx.config.poll.interval_secs);
    let timeout = Duration::from_secs(ctx.config.poll.timeout_secs);

    let pb = progress::spinner(&format!("waiting for twin-graph of dataset {dataset_id}"));
    let api = ctx.api.as_ref();
    let outcome = poll(
        || {
            api.get_status(&status_path)
                .map(|s| PollResult::from_status_text(&s))
        },
        interval,
        timeout,
    );

    match outcome {
        Ok(_) => progress::finish_success(&pb, &format!("twin-graph of dataset {dataset_id} ready")),
        Err(e) => {
            progress::finish_error(&pb, &format!("twin-graph of dataset {dataset_id}: {e}"));
            log::error!("twin-graph polling for dataset {dataset_id} failed: {e}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{context_with, RecordingApi};
    use std::path::Path;
    use tempfile::TempDir;

    fn workspace_doc(with_dataset: bool) -> ManifestDoc {
        let mut text = String::from(
            "kind: Workspace\nspec:\n  payload:\n    name: brewery\n",
        );
        if with_dataset {
            text.push_str(
                "  sidecars:\n    dataset:\n      create: true\n      name: main-graph\n",
            );
        }
        ManifestDoc::parse(Path::new("workspace.yaml"), &text).unwrap()
    }

    #[test]
    fn test_reconcile_without_sidecars_is_pure_api() {
        let tmp = TempDir::new().unwrap();
        let api = RecordingApi::with_create_ids(&["w-1"]);
        let mut ctx = context_with(&api, tmp.path());
        ctx.state.set_id(ResourceKind::Organization, "o-1");

        reconcile(&mut ctx, &workspace_doc(false)).unwrap();

        assert_eq!(api.recorded(), vec!["create /organizations/o-1/workspaces"]);
        assert_eq!(ctx.state.workspace_id.as_deref(), Some("w-1"));
    }

    #[test]
    fn test_dataset_sidecar_creates_and_polls() {
        let tmp = TempDir::new().unwrap();
        let api = RecordingApi::with_create_ids(&["w-1", "d-1"]);
        api.statuses
            .borrow_mut()
            .extend(["PENDING".to_string(), "SUCCESS".to_string()]);
        let mut ctx = context_with(&api, tmp.path());
        ctx.state.set_id(ResourceKind::Organization, "o-1");
        ctx.config.poll.interval_secs = 0;
        ctx.config.poll.timeout_secs = 5;

        reconcile(&mut ctx, &workspace_doc(true)).unwrap();

        let calls = api.recorded();
        assert!(calls.contains(&"create /organizations/o-1/datasets".to_string()));
        assert_eq!(
            calls
                .iter()
                .filter(|c| c.starts_with("get_status"))
                .count(),
            2
        );
        assert_eq!(ctx.state.dataset_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn test_failed_twin_graph_keeps_dataset_and_workspace() {
        let tmp = TempDir::new().unwrap();
        let api = RecordingApi::with_create_ids(&["w-1", "d-1"]);
        api.statuses.borrow_mut().push_back("ERROR".to_string());
        let mut ctx = context_with(&api, tmp.path());
        ctx.state.set_id(ResourceKind::Organization, "o-1");
        ctx.config.poll.interval_secs = 0;
        ctx.config.poll.timeout_secs = 5;

        // the workspace still reconciles
        reconcile(&mut ctx, &workspace_doc(true)).unwrap();

        assert_eq!(ctx.state.workspace_id.as_deref(), Some("w-1"));
        assert_eq!(ctx.state.dataset_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn test_existing_dataset_is_not_recreated() {
        let tmp = TempDir::new().unwrap();
        let api = RecordingApi::with_create_ids(&["w-1"]);
        let mut ctx = context_with(&api, tmp.path());
        ctx.state.set_id(ResourceKind::Organization, "o-1");
        ctx.state.dataset_id = Some("d-old".to_string());
        ctx.config.poll.interval_secs = 0;
        ctx.config.poll.timeout_secs = 5;

        reconcile(&mut ctx, &workspace_doc(true)).unwrap();

        assert!(!api
            .recorded()
            .contains(&"create /organizations/o-1/datasets".to_string()));
        assert_eq!(ctx.state.dataset_id.as_deref(), Some("d-old"));
    }
}
