//! Platform configuration for the CLI.
//!
//! Loaded once per invocation from `~/.config/strato/config.toml`. Secrets
//! (API token, database password) are never stored in the file; the config
//! only names the environment variables they are read from.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the config directory path
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".config").join("strato"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub api: ApiConfig,

    /// Deployment namespace: scopes the state file and the cluster resources
    #[serde(default = "default_namespace")]
    pub namespace: String,

    #[serde(default)]
    pub state: StateConfig,

    #[serde(default)]
    pub poll: PollConfig,

    #[serde(default)]
    pub webapp: WebAppConfig,

    #[serde(default)]
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,

    /// Environment variable holding the bearer token
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

/// Remote mirroring of the deployment state file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    #[serde(default)]
    pub remote: bool,

    /// Blob URL the state file is mirrored to when `remote` is on
    #[serde(default)]
    pub blob_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_poll_interval")]
    pub interval_secs: u64,

    #[serde(default = "default_poll_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebAppConfig {
    /// Working directory the provisioning configuration lives in
    #[serde(default = "default_terraform_dir")]
    pub terraform_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostgresConfig {
    /// Label selector used to discover the database service in the cluster
    #[serde(default = "default_service_label")]
    pub service_label: String,

    #[serde(default = "default_pg_user")]
    pub admin_user: String,

    /// Environment variable holding the admin password
    #[serde(default = "default_pg_password_env")]
    pub password_env: String,

    #[serde(default = "default_pg_database")]
    pub database: String,

    /// Bound on the schema job wait
    #[serde(default = "default_job_timeout")]
    pub job_timeout_secs: u64,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_token_env() -> String {
    "STRATO_API_TOKEN".to_string()
}

fn default_poll_interval() -> u64 {
    10
}

fn default_poll_timeout() -> u64 {
    300
}

fn default_terraform_dir() -> String {
    "~/.local/share/strato/webapp".to_string()
}

fn default_service_label() -> String {
    "app=postgresql".to_string()
}

fn default_pg_user() -> String {
    "postgres".to_string()
}

fn default_pg_password_env() -> String {
    "STRATO_PG_PASSWORD".to_string()
}

fn default_pg_database() -> String {
    "twin".to_string()
}

fn default_job_timeout() -> u64 {
    120
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            namespace: default_namespace(),
            state: StateConfig::default(),
            poll: PollConfig::default(),
            webapp: WebAppConfig::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token_env: default_token_env(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_poll_interval(),
            timeout_secs: default_poll_timeout(),
        }
    }
}

impl Default for WebAppConfig {
    fn default() -> Self {
        Self {
            terraform_dir: default_terraform_dir(),
        }
    }
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            service_label: default_service_label(),
            admin_user: default_pg_user(),
            password_env: default_pg_password_env(),
            database: default_pg_database(),
            job_timeout_secs: default_job_timeout(),
        }
    }
}

impl PlatformConfig {
    /// Load config.toml from the config directory
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join("config.toml");
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("Invalid config: {}", path.display()))
    }

    /// Read the API bearer token from the configured environment variable
    pub fn api_token(&self) -> Result<String> {
        std::env::var(&self.api.token_env)
            .with_context(|| format!("API token not set (expected ${})", self.api.token_env))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config: PlatformConfig = toml::from_str(
            r#"
[api]
base_url = "https://api.example.com/v3"
"#,
        )
        .unwrap();

        assert_eq!(config.api.base_url, "https://api.example.com/v3");
        assert_eq!(config.api.token_env, "STRATO_API_TOKEN");
        assert_eq!(config.namespace, "default");
        assert_eq!(config.poll.interval_secs, 10);
        assert_eq!(config.poll.timeout_secs, 300);
        assert!(!config.state.remote);
        assert_eq!(config.postgres.admin_user, "postgres");
    }

    #[test]
    fn test_full_config_round_trip() {
        let config: PlatformConfig = toml::from_str(
            r#"
namespace = "staging"

[api]
base_url = "https://api.example.com/v3"
token_env = "MY_TOKEN"

[state]
remote = true
blob_url = "https://blobs.example.com/staging/state.yaml"

[poll]
interval_secs = 5
timeout_secs = 60

[webapp]
terraform_dir = "~/deployments/webapp"

[postgres]
admin_user = "admin"
database = "twingraph"
"#,
        )
        .unwrap();

        assert_eq!(config.namespace, "staging");
        assert!(config.state.remote);
        assert_eq!(
            config.state.blob_url.as_deref(),
            Some("https://blobs.example.com/staging/state.yaml")
        );
        assert_eq!(config.poll.interval_secs, 5);
        assert_eq!(config.webapp.terraform_dir, "~/deployments/webapp");
        assert_eq!(config.postgres.database, "twingraph");
    }
}
