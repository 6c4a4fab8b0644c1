//! Per-invocation deployment context.
//!
//! One [`DeploymentContext`] is constructed at the start of an apply/destroy
//! run and passed by reference into every component: config, API client and
//! state travel together instead of living in globals, so tests can run
//! several contexts side by side.

use crate::config::PlatformConfig;
use crate::state::DeploymentState;
use crate::ui;
use anyhow::Result;
use platform::{ApiClient, PlatformApi};
use std::path::PathBuf;

pub struct DeploymentContext {
    pub config: PlatformConfig,
    pub api: Box<dyn PlatformApi>,
    pub state: DeploymentState,
    pub state_path: PathBuf,
}

impl DeploymentContext {
    /// Build the context for a real run: config from disk, token from the
    /// environment, state loaded (or empty) for the configured namespace.
    pub fn load() -> Result<Self> {
        let config = PlatformConfig::load()?;
        let token = config.api_token()?;
        let api = Box::new(ApiClient::new(&config.api.base_url, token));
        let state_path = DeploymentState::default_path(&config.namespace)?;
        let state = DeploymentState::load(&state_path)?;

        Ok(Self {
            config,
            api,
            state,
            state_path,
        })
    }

    /// Persist the state locally, and mirror it to the remote blob when
    /// remote mode is on. The mirror is best effort: a failed upload is
    /// logged and the local file remains authoritative.
    pub fn persist_state(&mut self) -> Result<()> {
        self.state.touch();
        self.state.save(&self.state_path)?;

        if self.config.state.remote
            && let Some(url) = &self.config.state.blob_url
        {
            let body = serde_yaml::to_string(&self.state)?;
            if let Err(e) = self.api.put_blob(url, &body) {
                ui::warn(&format!("state mirror upload failed: {e}"));
                log::warn!("state mirror upload to {url} failed: {e}");
            }
        }

        Ok(())
    }

    /// Variable lookup for manifest templates: `state.*` resolves against
    /// the deployment state, `secret.*` against the process environment.
    pub fn template_lookup(&self) -> impl Fn(&str, &str) -> Option<String> + '_ {
        |namespace, key| match namespace {
            "state" => self.state.get(key),
            "secret" => std::env::var(key).ok(),
            _ => None,
        }
    }
}
