//! `strato destroy`: tear tracked resources down in reverse dependency
//! order.
//!
//! Destroy consults only the state store, never the manifests: whatever was
//! recorded as created is what gets deleted. Each kind is independent: a
//! failed deletion is logged and the remaining kinds still proceed.

use crate::cli::DestroyArgs;
use crate::context::DeploymentContext;
use crate::resource;
use crate::state::DeploymentState;
use crate::ui;
use crate::Context;
use anyhow::{bail, Result};
use manifest::ResourceKind;
use platform::DeleteOutcome;

/// Which resource kinds a destroy run touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyFilter {
    organization: bool,
    solution: bool,
    workspace: bool,
    webapp: bool,
}

impl DestroyFilter {
    fn all(value: bool) -> Self {
        Self {
            organization: value,
            solution: value,
            workspace: value,
            webapp: value,
        }
    }

    fn set(&mut self, kind: ResourceKind, value: bool) {
        match kind {
            ResourceKind::Organization => self.organization = value,
            ResourceKind::Solution => self.solution = value,
            ResourceKind::Workspace => self.workspace = value,
            ResourceKind::WebApp => self.webapp = value,
        }
    }

    pub fn selected(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::Organization => self.organization,
            ResourceKind::Solution => self.solution,
            ResourceKind::Workspace => self.workspace,
            ResourceKind::WebApp => self.webapp,
        }
    }

    /// Resolve `--include`/`--exclude` into a filter, before any resource is
    /// touched. Mutual exclusion is checked first (supplying both aborts
    /// regardless of token content), then unknown tokens are rejected.
    pub fn resolve(include: &[String], exclude: &[String]) -> Result<Self> {
        if !include.is_empty() && !exclude.is_empty() {
            bail!("--include and --exclude are mutually exclusive");
        }

        let parse = |tokens: &[String]| -> Result<Vec<ResourceKind>> {
            tokens
                .iter()
                .map(|t| t.parse::<ResourceKind>().map_err(Into::into))
                .collect()
        };

        if !include.is_empty() {
            let mut filter = Self::all(false);
            for kind in parse(include)? {
                filter.set(kind, true);
            }
            Ok(filter)
        } else if !exclude.is_empty() {
            let mut filter = Self::all(true);
            for kind in parse(exclude)? {
                filter.set(kind, false);
            }
            Ok(filter)
        } else {
            Ok(Self::all(true))
        }
    }
}

pub fn run(_ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let filter = DestroyFilter::resolve(&args.include, &args.exclude)?;

    ui::header("Destroying deployment");
    let mut dctx = DeploymentContext::load()?;

    if !args.yes && !confirm_destroy()? {
        println!();
        ui::warn("Aborted");
        return Ok(());
    }

    let mut failed = 0;
    for kind in ResourceKind::destroy_order() {
        if !filter.selected(kind) {
            continue;
        }
        if let Err(e) = destroy_kind(&mut dctx, kind) {
            ui::error(&format!("{kind}: {e:#}"));
            log::error!("destroy of {kind} failed: {e:#}");
            failed += 1;
        }
    }

    dctx.persist_state()?;
    print_summary(&dctx.state);

    if failed > 0 {
        bail!("{failed} resource(s) failed to delete")
    }
    Ok(())
}

fn destroy_kind(ctx: &mut DeploymentContext, kind: ResourceKind) -> Result<()> {
    match kind {
        ResourceKind::WebApp => resource::webapp::destroy(ctx),
        _ => destroy_api_resource(ctx, kind),
    }
}

/// Delete one API-backed resource. Absent from state → idempotent no-op;
/// remote 404 → already satisfied. Both clear the tracked id.
fn destroy_api_resource(ctx: &mut DeploymentContext, kind: ResourceKind) -> Result<()> {
    let Some(id) = ctx.state.id_for(kind).map(str::to_string) else {
        ui::warn(&format!("{kind}: nothing tracked in state, skipping"));
        return Ok(());
    };

    let collection = resource::collection_path(kind, &ctx.state)?;
    match ctx.api.delete(&collection, &id)? {
        DeleteOutcome::Deleted => ui::success(&format!("{kind} deleted ({id})")),
        DeleteOutcome::NotFound => ui::warn(&format!("{kind} {id} was already gone")),
    }

    ctx.state.clear_id(kind);
    ctx.persist_state()?;
    Ok(())
}

/// List every tracked key as its surviving value or DELETED.
fn print_summary(state: &DeploymentState) {
    ui::section("State summary");
    for (key, value) in state.entries() {
        ui::kv(key, value.unwrap_or("DELETED"));
    }
}

/// Confirm with user
fn confirm_destroy() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Destroy the tracked resources?")
        .default(false)
        .interact()?;

    Ok(confirmed)
}
