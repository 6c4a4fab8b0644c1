//! PostgreSQL schema bootstrap through a Kubernetes job.
//!
//! Workspaces that ask for it (`spec.sidecars.postgres.schema.create`) get a
//! database schema named after their workspace id. The whole flow is best
//! effort: every failure in here is logged and the surrounding workspace
//! reconciliation carries on.

use crate::context::DeploymentContext;
use crate::ui;
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::process::{Command, Stdio};

const JOB_TEMPLATE: &str = include_str!("../templates/postgres-schema-job.yaml");

/// Outcome of the schema job, classified from its logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaOutcome {
    Created,
    AlreadyExists,
    Failed,
}

/// Schema names cannot carry the `-` of workspace ids.
pub fn schema_name_for(workspace_id: &str) -> String {
    workspace_id.replace('-', "_")
}

/// Classify the job logs by their literal markers.
///
/// psql reports an existing schema as an ERROR-prefixed line, so the
/// existence marker is checked before the error markers.
pub fn classify_job_logs(logs: &str) -> SchemaOutcome {
    if logs.contains("already exists") {
        SchemaOutcome::AlreadyExists
    } else if logs.contains("ERROR") || logs.contains("error") {
        SchemaOutcome::Failed
    } else {
        SchemaOutcome::Created
    }
}

/// Bootstrap the schema for a workspace. Never fails the caller.
pub fn bootstrap_schema(ctx: &mut DeploymentContext, workspace_id: &str) {
    if let Err(e) = try_bootstrap(ctx, workspace_id) {
        ui::warn(&format!("postgres schema bootstrap skipped: {e:#}"));
        log::warn!("schema bootstrap for workspace {workspace_id} failed: {e:#}");
    }
}

fn try_bootstrap(ctx: &mut DeploymentContext, workspace_id: &str) -> Result<()> {
    let namespace = ctx.config.namespace.clone();
    let pg = ctx.config.postgres.clone();
    let schema = schema_name_for(workspace_id);
    let job_name = format!("create-schema-{workspace_id}");

    let host = match discover_db_host(&pg.service_label, &namespace) {
        Ok(host) => host,
        Err(e) => {
            let fallback = conventional_db_host(&namespace);
            log::debug!("database service discovery failed ({e:#}); using {fallback}");
            fallback
        }
    };

    let password = std::env::var(&pg.password_env).unwrap_or_default();
    let job_manifest = render_job(
        &job_name,
        &namespace,
        &host,
        &pg.admin_user,
        &password,
        &pg.database,
        &schema,
    )?;

    submit_job(&job_manifest)?;

    // The wait outcome alone cannot tell "schema was already there" from a
    // real failure; the logs are classified either way.
    let wait = Command::new("kubectl")
        .args([
            "-n",
            &namespace,
            "wait",
            "--for=condition=complete",
            &format!("job/{job_name}"),
            &format!("--timeout={}s", pg.job_timeout_secs),
        ])
        .output()
        .context("Failed to execute kubectl wait")?;
    if !wait.status.success() {
        log::debug!(
            "kubectl wait did not confirm completion: {}",
            String::from_utf8_lossy(&wait.stderr).trim()
        );
    }

    let logs = run_capture(
        "kubectl",
        &["-n", &namespace, "logs", &format!("job/{job_name}")],
    )?;

    match classify_job_logs(&logs) {
        SchemaOutcome::Created => {
            ctx.state.postgres.schema_name = Some(schema.clone());
            ctx.persist_state()?;
            ui::success(&format!("postgres schema {schema} created"));
        }
        SchemaOutcome::AlreadyExists => {
            ctx.state.postgres.schema_name = Some(schema.clone());
            ctx.persist_state()?;
            ui::info(&format!("postgres schema {schema} already exists"));
        }
        SchemaOutcome::Failed => {
            anyhow::bail!("schema job reported errors:\n{}", logs.trim());
        }
    }

    Ok(())
}

/// Render the job template with its `{{ job.* }}` variables.
fn render_job(
    job_name: &str,
    namespace: &str,
    host: &str,
    user: &str,
    password: &str,
    database: &str,
    schema: &str,
) -> Result<String> {
    let vars: BTreeMap<&str, &str> = BTreeMap::from([
        ("name", job_name),
        ("namespace", namespace),
        ("host", host),
        ("user", user),
        ("password", password),
        ("database", database),
        ("schema", schema),
    ]);

    manifest::template::render(JOB_TEMPLATE, |ns, key| {
        if ns == "job" {
            vars.get(key).map(|v| (*v).to_string())
        } else {
            None
        }
    })
    .context("Failed to render schema job template")
}

/// Submit the rendered job; an existing job is a warning, not a failure.
fn submit_job(job_manifest: &str) -> Result<()> {
    let mut child = Command::new("kubectl")
        .args(["apply", "-f", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .context("Failed to launch kubectl (is it installed?)")?;

    child
        .stdin
        .as_mut()
        .context("kubectl stdin unavailable")?
        .write_all(job_manifest.as_bytes())
        .context("Failed to write job manifest to kubectl")?;

    let output = child
        .wait_with_output()
        .context("Failed to wait for kubectl apply")?;

    if output.status.success() {
        return Ok(());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    if stderr.contains("already exists") || stderr.contains("AlreadyExists") {
        ui::warn("schema job already exists, reusing it");
        return Ok(());
    }

    anyhow::bail!("kubectl apply failed: {}", stderr.trim())
}

/// Find the database service in the cluster and build its DNS name.
fn discover_db_host(service_label: &str, namespace: &str) -> Result<String> {
    let service = run_capture(
        "kubectl",
        &[
            "-n",
            namespace,
            "get",
            "svc",
            "-l",
            service_label,
            "-o",
            "jsonpath={.items[0].metadata.name}",
        ],
    )?;

    if service.is_empty() {
        anyhow::bail!("no service matches label {service_label}");
    }

    Ok(format!("{service}.{namespace}.svc.cluster.local"))
}

fn conventional_db_host(namespace: &str) -> String {
    format!("postgresql.{namespace}.svc.cluster.local")
}

/// Run a command and capture stdout
fn run_capture(cmd: &str, args: &[&str]) -> Result<String> {
    let output = Command::new(cmd)
        .args(args)
        .output()
        .with_context(|| format!("Failed to execute: {} {}", cmd, args.join(" ")))?;

    if output.status.success() {
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Command failed: {}", stderr.trim())
    }
}
