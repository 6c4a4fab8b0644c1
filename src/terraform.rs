//! Supervised Terraform runs for webapp provisioning and teardown.
//!
//! The subprocess is streamed line by line and every line is classified
//! before it reaches the caller; rendering (colors) stays in the command
//! layer so the classification itself can be tested.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::thread;

/// Which Terraform workflow to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerraformCmd {
    Apply,
    Destroy,
}

impl TerraformCmd {
    fn subcommand(self) -> &'static str {
        match self {
            TerraformCmd::Apply => "apply",
            TerraformCmd::Destroy => "destroy",
        }
    }
}

/// Classification of one output line, for operator-facing presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineClass {
    Success,
    Error,
    Neutral,
}

/// Ordered substring table; the first match wins. Purely a display
/// heuristic; the run's outcome is decided by the exit code alone.
const LINE_TABLE: [(&str, LineClass); 5] = [
    ("Error", LineClass::Error),
    ("Success", LineClass::Success),
    ("complete", LineClass::Success),
    ("Resources:", LineClass::Success),
    ("Destroy complete!", LineClass::Success),
];

/// Classify one line of Terraform output.
pub fn classify_line(line: &str) -> LineClass {
    for (needle, class) in LINE_TABLE {
        if line.contains(needle) {
            return class;
        }
    }
    LineClass::Neutral
}

/// Run `terraform apply|destroy -auto-approve` in `workdir`, streaming
/// classified output through `on_line`, and block until exit.
///
/// Stdout is streamed as it arrives; stderr is drained on a helper thread
/// and classified after the process exits. The caller decides what a
/// non-zero exit means; state is never touched here.
pub fn run<F>(
    workdir: &Path,
    cmd: TerraformCmd,
    vars: &BTreeMap<String, String>,
    mut on_line: F,
) -> Result<ExitStatus>
where
    F: FnMut(LineClass, &str),
{
    let mut command = Command::new("terraform");
    command
        .arg(cmd.subcommand())
        .arg("-auto-approve")
        .arg("-no-color")
        .current_dir(workdir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    for (key, value) in vars {
        command.arg("-var").arg(format!("{key}={value}"));
    }

    let mut child = command.spawn().with_context(|| {
        format!(
            "Failed to launch terraform in {} (is terraform installed?)",
            workdir.display()
        )
    })?;

    let stderr = child.stderr.take();
    let stderr_thread = thread::spawn(move || {
        let mut lines = Vec::new();
        if let Some(stderr) = stderr {
            for line in BufReader::new(stderr).lines() {
                match line {
                    Ok(line) => lines.push(line),
                    Err(_) => break,
                }
            }
        }
        lines
    });

    if let Some(stdout) = child.stdout.take() {
        for line in BufReader::new(stdout).lines() {
            let line = line.context("Failed to read terraform output")?;
            on_line(classify_line(&line), &line);
        }
    }

    let status = child.wait().context("Failed to wait for terraform")?;

    for line in stderr_thread.join().unwrap_or_default() {
        on_line(classify_line(&line), &line);
    }

    Ok(status)
}
