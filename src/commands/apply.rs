//! `strato apply`: converge a deploy directory against the platform.

use crate::context::DeploymentContext;
use crate::resource;
use crate::ui;
use crate::Context;
use anyhow::{bail, Result};
use manifest::APPLY_ORDER;
use std::path::{Path, PathBuf};

pub fn run(_ctx: &Context, deploy_dir: &str) -> Result<()> {
    ui::header("Applying deployment");

    let dir = PathBuf::from(shellexpand::tilde(deploy_dir).as_ref());
    let mut dctx = DeploymentContext::load()?;

    let failed = apply_dir(&mut dctx, &dir)?;

    println!();
    if failed == 0 {
        ui::success("Deployment applied");
        Ok(())
    } else {
        ui::warn(&format!("Deployment applied with {failed} failure(s)"));
        bail!("{failed} resource(s) failed to reconcile")
    }
}

/// Reconcile every manifest under `dir`, kinds in dependency order, and
/// return how many resources failed. Failures never short-circuit: each
/// kind is still attempted so independent resources converge.
pub fn apply_dir(ctx: &mut DeploymentContext, dir: &Path) -> Result<usize> {
    let classified = manifest::scan_dir(dir)?;

    if classified.is_empty() {
        ui::warn("no manifests found");
        return Ok(0);
    }

    let mut failed = 0;
    for kind in APPLY_ORDER {
        let Some(files) = classified.get(&kind) else {
            continue;
        };
        ui::section(&format!("{kind} ({})", files.len()));
        failed += resource::reconcile_kind(ctx, kind, files);
    }

    Ok(failed)
}
