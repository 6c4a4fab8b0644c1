//! `strato status`: show what the state store is tracking.

use crate::config::PlatformConfig;
use crate::state::DeploymentState;
use crate::ui;
use crate::Context;
use anyhow::Result;

pub fn run(ctx: &Context) -> Result<()> {
    ui::header("Deployment state");

    let config = PlatformConfig::load()?;
    let path = DeploymentState::default_path(&config.namespace)?;
    let state = DeploymentState::load(&path)?;

    for (key, value) in state.entries() {
        ui::kv(key, value.unwrap_or("-"));
    }

    if !ctx.quiet {
        println!();
        ui::dim(&format!("namespace: {}", config.namespace));
        ui::dim(&format!("state file: {}", path.display()));
        if ctx.verbose > 0 {
            ui::dim(&format!("api: {}", config.api.base_url));
        }
    }

    Ok(())
}
