//! Blocking HTTP client for the platform API.

use crate::api::{DeleteOutcome, PlatformApi};
use crate::error::{Error, Result};
use crate::security::{AccessControlEntry, Role, SecuritySpec};
use serde_json::{json, Value};
use ureq::Agent;

/// Client that issues bearer-authenticated requests against the platform.
///
/// # Example
///
/// ```no_run
/// use platform::{ApiClient, PlatformApi};
/// use serde_json::json;
///
/// let client = ApiClient::new("https://api.example.com/v3", "token");
/// let created = client.create("/organizations", &json!({"name": "acme"})).unwrap();
/// println!("created {}", created["id"]);
/// ```
pub struct ApiClient {
    /// HTTP agent for requests.
    agent: Agent,
    /// API base URL, no trailing slash.
    base_url: String,
    /// Bearer token attached to every request.
    token: String,
}

impl ApiClient {
    /// Create a new client against the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        // Non-2xx statuses are data here, not transport failures: 404 means
        // "already deleted" and error bodies are worth reporting.
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self {
            agent,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    /// Get the configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    fn transport(path: &str, source: ureq::Error) -> Error {
        Error::Transport {
            path: path.to_string(),
            source: Box::new(source),
        }
    }

    /// Check the status line and read the body as text.
    fn read_text(path: &str, mut response: ureq::http::Response<ureq::Body>) -> Result<String> {
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| Self::transport(path, e))?;

        match status {
            200..=299 => Ok(body),
            404 => Err(Error::NotFound {
                path: path.to_string(),
            }),
            _ => Err(Error::Http {
                path: path.to_string(),
                status,
                body: body.trim().to_string(),
            }),
        }
    }

    /// Check the status line and parse the body as JSON (empty body → null).
    fn read_json(path: &str, response: ureq::http::Response<ureq::Body>) -> Result<Value> {
        let body = Self::read_text(path, response)?;
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|source| Error::Json {
            path: path.to_string(),
            source,
        })
    }

    fn get_json(&self, path: &str) -> Result<Value> {
        let response = self
            .agent
            .get(self.url(path))
            .header("Authorization", self.bearer())
            .call()
            .map_err(|e| Self::transport(path, e))?;
        Self::read_json(path, response)
    }

    fn post_json(&self, path: &str, payload: &Value) -> Result<Value> {
        let response = self
            .agent
            .post(self.url(path))
            .header("Authorization", self.bearer())
            .send_json(payload)
            .map_err(|e| Self::transport(path, e))?;
        Self::read_json(path, response)
    }

    fn patch_json(&self, path: &str, payload: &Value) -> Result<Value> {
        let response = self
            .agent
            .patch(self.url(path))
            .header("Authorization", self.bearer())
            .send_json(payload)
            .map_err(|e| Self::transport(path, e))?;
        Self::read_json(path, response)
    }
}

impl PlatformApi for ApiClient {
    fn create(&self, collection: &str, payload: &Value) -> Result<Value> {
        self.post_json(collection, payload)
    }

    fn update(&self, collection: &str, id: &str, payload: &Value) -> Result<Value> {
        self.patch_json(&format!("{collection}/{id}"), payload)
    }

    fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        let path = format!("{collection}/{id}");
        let response = self
            .agent
            .delete(self.url(&path))
            .header("Authorization", self.bearer())
            .call()
            .map_err(|e| Self::transport(&path, e))?;

        match Self::read_text(&path, response) {
            Ok(_) => Ok(DeleteOutcome::Deleted),
            Err(e) if e.is_not_found() => {
                log::debug!("delete {path}: already gone");
                Ok(DeleteOutcome::NotFound)
            }
            Err(e) => Err(e),
        }
    }

    fn get_security(&self, resource_path: &str) -> Result<SecuritySpec> {
        let path = format!("{resource_path}/security");
        let value = self.get_json(&path)?;
        serde_json::from_value(value).map_err(|source| Error::Json { path, source })
    }

    fn set_default_security(&self, resource_path: &str, role: Role) -> Result<()> {
        let path = format!("{resource_path}/security/default");
        self.post_json(&path, &json!({ "role": role }))?;
        Ok(())
    }

    fn add_access(&self, resource_path: &str, entry: &AccessControlEntry) -> Result<()> {
        let path = format!("{resource_path}/security/access");
        self.post_json(&path, &json!({ "id": entry.id, "role": entry.role }))?;
        Ok(())
    }

    fn update_access(&self, resource_path: &str, id: &str, role: Role) -> Result<()> {
        let path = format!("{resource_path}/security/access/{id}");
        self.patch_json(&path, &json!({ "role": role }))?;
        Ok(())
    }

    fn delete_access(&self, resource_path: &str, id: &str) -> Result<()> {
        let path = format!("{resource_path}/security/access/{id}");
        let response = self
            .agent
            .delete(self.url(&path))
            .header("Authorization", self.bearer())
            .call()
            .map_err(|e| Self::transport(&path, e))?;
        Self::read_text(&path, response)?;
        Ok(())
    }

    fn get_status(&self, path: &str) -> Result<String> {
        let response = self
            .agent
            .get(self.url(path))
            .header("Authorization", self.bearer())
            .call()
            .map_err(|e| Self::transport(path, e))?;
        Self::read_text(path, response)
    }

    fn put_blob(&self, url: &str, body: &str) -> Result<()> {
        let response = self
            .agent
            .put(url)
            .header("Authorization", self.bearer())
            .header("Content-Type", "application/x-yaml")
            .send(body)
            .map_err(|e| Self::transport(url, e))?;
        Self::read_text(url, response)?;
        Ok(())
    }
}
