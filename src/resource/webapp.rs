//! WebApp provisioning and teardown through Terraform.
//!
//! The webapp is the one kind with no API client behind it: a supervised
//! `terraform` run does the work, and state is finalized from the payload
//! fields only on a clean exit.

use crate::config::PlatformConfig;
use crate::context::DeploymentContext;
use crate::terraform::{self, LineClass, TerraformCmd};
use crate::ui;
use anyhow::{bail, Context, Result};
use colored::Colorize;
use manifest::{ManifestDoc, ResourceKind};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub fn reconcile(ctx: &mut DeploymentContext, doc: &ManifestDoc) -> Result<()> {
    let name = doc
        .spec
        .payload
        .get("name")
        .and_then(|v| v.as_str())
        .context("webapp payload carries no `name`")?
        .to_string();
    let url = doc
        .spec
        .payload
        .get("url")
        .and_then(|v| v.as_str())
        .map(str::to_string);
    let vars = doc
        .spec
        .sidecars
        .terraform
        .as_ref()
        .map(|t| t.vars.clone())
        .unwrap_or_default();

    let workdir = terraform_dir(&ctx.config)?;
    ui::info(&format!("provisioning webapp {name}"));

    let status = terraform::run(&workdir, TerraformCmd::Apply, &vars, render_line)?;
    if !status.success() {
        bail!("terraform apply exited with {status}");
    }

    ctx.state.webapp_name = Some(name.clone());
    ctx.state.webapp_url = url;
    ctx.persist_state()?;
    ui::success(&format!("webapp {name} provisioned"));
    Ok(())
}

/// Tear the webapp down; state is cleared only on a zero exit code.
pub fn destroy(ctx: &mut DeploymentContext) -> Result<()> {
    let Some(name) = ctx.state.webapp_name.clone() else {
        ui::warn("webapp: nothing tracked in state, skipping");
        return Ok(());
    };

    let workdir = terraform_dir(&ctx.config)?;
    ui::info(&format!("tearing down webapp {name}"));

    let status = terraform::run(&workdir, TerraformCmd::Destroy, &BTreeMap::new(), render_line)?;
    if !status.success() {
        bail!("terraform destroy exited with {status}");
    }

    ctx.state.clear_id(ResourceKind::WebApp);
    ctx.persist_state()?;
    ui::success(&format!("webapp {name} destroyed"));
    Ok(())
}

fn terraform_dir(config: &PlatformConfig) -> Result<PathBuf> {
    let expanded = shellexpand::tilde(&config.webapp.terraform_dir);
    let path = PathBuf::from(expanded.as_ref());
    if !path.is_dir() {
        bail!("terraform directory does not exist: {}", path.display());
    }
    Ok(path)
}

/// Presentation for classified terraform output.
fn render_line(class: LineClass, line: &str) {
    match class {
        LineClass::Error => println!("  {}", line.red()),
        LineClass::Success => println!("  {}", line.green()),
        LineClass::Neutral => println!("  {}", line.dimmed()),
    }
}
