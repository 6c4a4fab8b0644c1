//! # Manifest
//!
//! Deployment manifest loading and classification.
//!
//! This crate provides functionality to:
//! - Scan a deploy directory and classify YAML manifests by resource kind
//! - Parse manifest documents into typed payloads and sidecars
//! - Render `{{ state.* }}` / `{{ secret.* }}` template variables
//!
//! ## Example
//!
//! ```no_run
//! use manifest::{scan_dir, APPLY_ORDER};
//! use std::path::Path;
//!
//! let classified = scan_dir(Path::new("./deploy"))?;
//! for kind in APPLY_ORDER {
//!     for path in classified.get(&kind).map(Vec::as_slice).unwrap_or(&[]) {
//!         println!("{kind}: {}", path.display());
//!     }
//! }
//! # Ok::<(), manifest::Error>(())
//! ```

mod error;
pub mod template;
mod types;

pub use error::{Error, Result};
pub use types::{
    DatasetSidecar, ManifestDoc, ManifestSpec, PostgresSidecar, ResourceKind, SchemaSpec,
    Sidecars, TerraformSidecar, APPLY_ORDER,
};

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Scan a deploy directory and group manifest files by resource kind.
///
/// Only the first line of each `*.yaml`/`*.yml` file is read and parsed as a
/// one-key mapping to extract `kind`; bodies are parsed later, at
/// reconciliation time. Files whose kind is not recognized (or whose first
/// line is not a `kind:` mapping) are skipped, not rejected. Within a kind,
/// files come back sorted by path so runs are reproducible.
pub fn scan_dir(dir: &Path) -> Result<BTreeMap<ResourceKind, Vec<PathBuf>>> {
    if !dir.is_dir() {
        return Err(Error::DirNotFound(dir.to_path_buf()));
    }

    let mut classified: BTreeMap<ResourceKind, Vec<PathBuf>> = BTreeMap::new();

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.path().to_path_buf())
        .filter(|p| {
            matches!(
                p.extension().and_then(|e| e.to_str()),
                Some("yaml") | Some("yml")
            )
        })
        .collect();
    files.sort();

    for path in files {
        match classify_file(&path)? {
            Some(kind) => classified.entry(kind).or_default().push(path),
            None => log::debug!("skipping manifest with unknown kind: {}", path.display()),
        }
    }

    Ok(classified)
}

/// Read the first line of a manifest and extract its kind, if recognizable.
fn classify_file(path: &Path) -> Result<Option<ResourceKind>> {
    let file = File::open(path)?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line)?;
    Ok(classify_first_line(&first_line))
}

fn classify_first_line(line: &str) -> Option<ResourceKind> {
    let mapping: BTreeMap<String, String> = serde_yaml::from_str(line).ok()?;
    mapping.get("kind")?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_scan_groups_by_kind() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "org.yaml", "kind: Organization\nspec: {}\n");
        write(tmp.path(), "sol.yml", "kind: Solution\nspec: {}\n");
        write(tmp.path(), "ws-a.yaml", "kind: Workspace\nspec: {}\n");
        write(tmp.path(), "ws-b.yaml", "kind: Workspace\nspec: {}\n");

        let classified = scan_dir(tmp.path()).unwrap();
        assert_eq!(classified[&ResourceKind::Organization].len(), 1);
        assert_eq!(classified[&ResourceKind::Solution].len(), 1);
        assert_eq!(classified[&ResourceKind::Workspace].len(), 2);
        assert!(!classified.contains_key(&ResourceKind::WebApp));
    }

    #[test]
    fn test_scan_ignores_unknown_kinds_and_non_yaml() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "future.yaml", "kind: Dataset\nspec: {}\n");
        write(tmp.path(), "notes.txt", "kind: Organization\n");
        write(tmp.path(), "org.yaml", "kind: Organization\nspec: {}\n");

        let classified = scan_dir(tmp.path()).unwrap();
        assert_eq!(classified.len(), 1);
        assert_eq!(classified[&ResourceKind::Organization].len(), 1);
    }

    #[test]
    fn test_scan_only_reads_first_line() {
        // A malformed body must not fail classification.
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "broken.yaml", "kind: Organization\nspec: [unclosed\n");

        let classified = scan_dir(tmp.path()).unwrap();
        assert_eq!(classified[&ResourceKind::Organization].len(), 1);
    }

    #[test]
    fn test_scan_stable_order_within_kind() {
        let tmp = TempDir::new().unwrap();
        write(tmp.path(), "b.yaml", "kind: Workspace\n");
        write(tmp.path(), "a.yaml", "kind: Workspace\n");

        let classified = scan_dir(tmp.path()).unwrap();
        let names: Vec<_> = classified[&ResourceKind::Workspace]
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["a.yaml", "b.yaml"]);
    }

    #[test]
    fn test_scan_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(
            scan_dir(&missing).unwrap_err(),
            Error::DirNotFound(_)
        ));
    }

    #[test]
    fn test_classify_first_line() {
        assert_eq!(
            classify_first_line("kind: Organization\n"),
            Some(ResourceKind::Organization)
        );
        assert_eq!(classify_first_line("kind: Dataset\n"), None);
        assert_eq!(classify_first_line("not yaml at all: ["), None);
    }
}
