//! Recorded double for the platform API, shared by the engine tests.

use crate::config::PlatformConfig;
use crate::context::DeploymentContext;
use crate::state::DeploymentState;
use platform::error::{Error, Result};
use platform::{AccessControlEntry, DeleteOutcome, PlatformApi, Role, SecuritySpec};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::ops::Deref;
use std::path::Path;
use std::rc::Rc;

/// Canned data and the call log behind a [`RecordingApi`].
#[derive(Default)]
pub struct ApiData {
    /// Every call in arrival order, as `"op path [detail]"`
    pub calls: RefCell<Vec<String>>,
    /// Payloads sent by create/update calls, paired with their call record
    pub payloads: RefCell<Vec<(String, Value)>>,
    /// Ids handed out by successive create calls
    pub create_ids: RefCell<VecDeque<String>>,
    /// Security spec returned per resource path
    pub security: RefCell<BTreeMap<String, SecuritySpec>>,
    /// Status bodies returned by successive get_status calls
    pub statuses: RefCell<VecDeque<String>>,
    /// Delete outcome per `collection/id` path
    pub delete_outcomes: RefCell<BTreeMap<String, DeleteOutcome>>,
    /// Call-record prefixes that should fail with an injected HTTP 500
    pub failing: RefCell<BTreeSet<String>>,
}

/// A `PlatformApi` that records every call and answers from canned data.
///
/// Clones share the same data, so a test can hand one clone to the context
/// and keep another for assertions.
#[derive(Default, Clone)]
pub struct RecordingApi(Rc<ApiData>);

impl Deref for RecordingApi {
    type Target = ApiData;

    fn deref(&self) -> &ApiData {
        &self.0
    }
}

impl RecordingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_create_ids(ids: &[&str]) -> Self {
        let api = Self::default();
        api.create_ids
            .borrow_mut()
            .extend(ids.iter().map(|s| (*s).to_string()));
        api
    }

    pub fn recorded(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Calls that mutate remote state (everything but reads).
    pub fn mutations(&self) -> Vec<String> {
        self.recorded()
            .into_iter()
            .filter(|c| !c.starts_with("get_security") && !c.starts_with("get_status"))
            .collect()
    }

    fn record(&self, entry: String) -> Result<()> {
        self.calls.borrow_mut().push(entry.clone());
        if self
            .failing
            .borrow()
            .iter()
            .any(|prefix| entry.starts_with(prefix.as_str()))
        {
            return Err(Error::Http {
                path: entry,
                status: 500,
                body: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

impl PlatformApi for RecordingApi {
    fn create(&self, collection: &str, payload: &Value) -> Result<Value> {
        let entry = format!("create {collection}");
        self.record(entry.clone())?;
        self.payloads.borrow_mut().push((entry, payload.clone()));
        let id = self
            .create_ids
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| "generated-id".to_string());
        Ok(json!({ "id": id }))
    }

    fn update(&self, collection: &str, id: &str, payload: &Value) -> Result<Value> {
        let entry = format!("update {collection}/{id}");
        self.record(entry.clone())?;
        self.payloads.borrow_mut().push((entry, payload.clone()));
        Ok(json!({ "id": id }))
    }

    fn delete(&self, collection: &str, id: &str) -> Result<DeleteOutcome> {
        let path = format!("{collection}/{id}");
        self.record(format!("delete {path}"))?;
        Ok(self
            .delete_outcomes
            .borrow()
            .get(&path)
            .copied()
            .unwrap_or(DeleteOutcome::Deleted))
    }

    fn get_security(&self, resource_path: &str) -> Result<SecuritySpec> {
        self.record(format!("get_security {resource_path}"))?;
        Ok(self
            .security
            .borrow()
            .get(resource_path)
            .cloned()
            .unwrap_or(SecuritySpec {
                default: Role::Viewer,
                access_control_list: Vec::new(),
            }))
    }

    fn set_default_security(&self, resource_path: &str, role: Role) -> Result<()> {
        self.record(format!("set_default {resource_path} {role}"))
    }

    fn add_access(&self, resource_path: &str, entry: &AccessControlEntry) -> Result<()> {
        self.record(format!("add_access {resource_path} {}", entry.id))
    }

    fn update_access(&self, resource_path: &str, id: &str, _role: Role) -> Result<()> {
        self.record(format!("update_access {resource_path} {id}"))
    }

    fn delete_access(&self, resource_path: &str, id: &str) -> Result<()> {
        self.record(format!("delete_access {resource_path} {id}"))
    }

    fn get_status(&self, path: &str) -> Result<String> {
        self.record(format!("get_status {path}"))?;
        Ok(self
            .statuses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| "SUCCESS".to_string()))
    }

    fn put_blob(&self, url: &str, _body: &str) -> Result<()> {
        self.record(format!("put_blob {url}"))
    }
}

/// A context wired to a recording API, with state persisted under `dir`.
pub fn context_with(api: &RecordingApi, dir: &Path) -> DeploymentContext {
    DeploymentContext {
        config: PlatformConfig::default(),
        api: Box::new(api.clone()),
        state: DeploymentState::default(),
        state_path: dir.join("state.yaml"),
    }
}
