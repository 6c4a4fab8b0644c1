//! Variable substitution for manifest templates.
//!
//! Manifests may reference deployment state and externally supplied secrets
//! with `{{ state.<key> }}` and `{{ secret.<NAME> }}` placeholders. Rendering
//! happens before the YAML body is parsed, so a manifest can splice an id
//! into any field.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static VAR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([a-z]+)\.([A-Za-z0-9_]+)\s*\}\}").expect("placeholder pattern")
});

/// Render a manifest template.
///
/// `lookup` receives the namespace (`state`, `secret`) and the key; returning
/// `None` fails the render with [`Error::MissingVariable`]. A missing
/// `state.` key is how a manifest that depends on an id a failed earlier
/// resource never produced surfaces its error.
pub fn render<F>(text: &str, lookup: F) -> Result<String>
where
    F: Fn(&str, &str) -> Option<String>,
{
    let mut missing: Vec<String> = Vec::new();

    let rendered = VAR_RE.replace_all(text, |caps: &regex::Captures| {
        let namespace = &caps[1];
        let key = &caps[2];
        match lookup(namespace, key) {
            Some(value) => value,
            None => {
                missing.push(format!("{namespace}.{key}"));
                String::new()
            }
        }
    });

    if let Some(name) = missing.into_iter().next() {
        return Err(Error::MissingVariable { name });
    }

    Ok(rendered.into_owned())
}
