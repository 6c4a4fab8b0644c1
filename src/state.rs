//! Deployment state: the persisted mapping from resource kind to its remote
//! identifier.
//!
//! The state file is what makes apply and destroy idempotent: every
//! create/delete decision is re-derived from the ids recorded here, never
//! from in-memory run history. It is written after every successful mutation
//! so an interrupted run leaves a resumable file behind.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use manifest::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Identifiers of everything this deployment has created.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DeploymentState {
    #[serde(default)]
    pub organization_id: Option<String>,

    #[serde(default)]
    pub solution_id: Option<String>,

    #[serde(default)]
    pub workspace_id: Option<String>,

    /// Dataset backing the workspace's twin-graph, if one was created
    #[serde(default)]
    pub dataset_id: Option<String>,

    #[serde(default)]
    pub webapp_name: Option<String>,

    #[serde(default)]
    pub webapp_url: Option<String>,

    #[serde(default)]
    pub postgres: PostgresState,

    /// Last time the state was updated
    pub last_updated: DateTime<Utc>,
}

/// Auxiliary state for the workspace's PostgreSQL sidecar.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct PostgresState {
    #[serde(default)]
    pub schema_name: Option<String>,
}

impl DeploymentState {
    /// State file path for a namespace (~/.local/state/strato/<namespace>/state.yaml)
    pub fn default_path(namespace: &str) -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home
            .join(".local")
            .join("state")
            .join("strato")
            .join(namespace)
            .join("state.yaml"))
    }

    /// Load state from disk, or return default if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("state file does not exist, starting from empty state");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: DeploymentState = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        log::debug!("loaded state from {}", path.display());
        Ok(state)
    }

    /// Save state to disk
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        let content =
            serde_yaml::to_string(&self).context("Failed to serialize state to YAML")?;

        fs::write(path, &content)
            .with_context(|| format!("Failed to write state file: {}", path.display()))?;

        log::debug!("saved state to {}", path.display());
        Ok(())
    }

    /// Update the last_updated timestamp
    pub fn touch(&mut self) {
        self.last_updated = Utc::now();
    }

    /// The tracked identifier for a kind, if any.
    pub fn id_for(&self, kind: ResourceKind) -> Option<&str> {
        match kind {
            ResourceKind::Organization => self.organization_id.as_deref(),
            ResourceKind::Solution => self.solution_id.as_deref(),
            ResourceKind::Workspace => self.workspace_id.as_deref(),
            ResourceKind::WebApp => self.webapp_name.as_deref(),
        }
    }

    /// Record a freshly created identifier.
    pub fn set_id(&mut self, kind: ResourceKind, id: impl Into<String>) {
        let id = Some(id.into());
        match kind {
            ResourceKind::Organization => self.organization_id = id,
            ResourceKind::Solution => self.solution_id = id,
            ResourceKind::Workspace => self.workspace_id = id,
            ResourceKind::WebApp => self.webapp_name = id,
        }
    }

    /// Forget a destroyed resource, including the auxiliary entries that
    /// live and die with it.
    pub fn clear_id(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Organization => {
                self.organization_id = None;
                // datasets are owned by the organization
                self.dataset_id = None;
            }
            ResourceKind::Solution => self.solution_id = None,
            ResourceKind::Workspace => {
                self.workspace_id = None;
                self.postgres.schema_name = None;
            }
            ResourceKind::WebApp => {
                self.webapp_name = None;
                self.webapp_url = None;
            }
        }
    }

    /// Resolve a `{{ state.<key> }}` template variable.
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "organization_id" => &self.organization_id,
            "solution_id" => &self.solution_id,
            "workspace_id" => &self.workspace_id,
            "dataset_id" => &self.dataset_id,
            "webapp_name" => &self.webapp_name,
            "webapp_url" => &self.webapp_url,
            "postgres_schema_name" => &self.postgres.schema_name,
            _ => return None,
        };
        value.clone()
    }

    /// Every tracked key with its current value, for the summary views.
    pub fn entries(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("organization_id", self.organization_id.as_deref()),
            ("solution_id", self.solution_id.as_deref()),
            ("workspace_id", self.workspace_id.as_deref()),
            ("dataset_id", self.dataset_id.as_deref()),
            ("webapp_name", self.webapp_name.as_deref()),
            ("webapp_url", self.webapp_url.as_deref()),
            ("postgres.schema_name", self.postgres.schema_name.as_deref()),
        ]
    }
}

impl Default for DeploymentState {
    fn default() -> Self {
        Self {
            organization_id: None,
            solution_id: None,
            workspace_id: None,
            dataset_id: None,
            webapp_name: None,
            webapp_url: None,
            postgres: PostgresState::default(),
            last_updated: Utc::now(),
        }
    }
}
