use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::PatchConfig;

/// Where a reference name points once resolved. A target only counts as
/// resolved when `file` or `anchor` is non-empty; `external` marks targets
/// living outside the current document set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefTarget {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub anchor: Option<String>,
    #[serde(default)]
    pub external: bool,
}

impl RefTarget {
    pub fn is_resolved(&self) -> bool {
        non_empty(self.file.as_deref()) || non_empty(self.anchor.as_deref())
    }
}

fn non_empty(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

/// Maps a symbolic reference name, qualified by an ambient context, to a
/// target. Implementations must behave as pure queries.
pub trait RefResolver {
    fn resolve(&self, name: &str, context: &str) -> Option<RefTarget>;
}

/// Builds the URL for a resolved target, or `None` when the target does not
/// actually resolve. The URL is emitted verbatim into the attribute; callers
/// are expected to supply already-sane paths.
pub fn build_ref_url(target: &RefTarget, rel_path: &str, config: &PatchConfig) -> Option<String> {
    if !target.is_resolved() {
        return None;
    }
    let mut url = external_scope_prefix(rel_path, target.external, config);
    if let Some(file) = target.file.as_deref().filter(|f| !f.is_empty()) {
        url.push_str(&ensure_html_extension(file, &config.html_extension));
    }
    if let Some(anchor) = target.anchor.as_deref().filter(|a| !a.is_empty()) {
        url.push('#');
        url.push_str(anchor);
    }
    Some(url)
}

fn external_scope_prefix(rel_path: &str, external: bool, config: &PatchConfig) -> String {
    if !external {
        return rel_path.to_string();
    }
    let base = config.external_url_base.as_str();
    if base.is_empty() || base.ends_with('/') {
        base.to_string()
    } else {
        format!("{base}/")
    }
}

/// Appends `ext` when the file's last path component carries no extension of
/// its own, so resolver-supplied page names become browsable filenames.
pub fn ensure_html_extension(file: &str, ext: &str) -> String {
    let basename = file.rsplit('/').next().unwrap_or(file);
    if basename.contains('.') {
        file.to_string()
    } else {
        format!("{file}{ext}")
    }
}

/// Resolver backed by a flat name → target table, loadable from a JSON file.
/// Qualified lookups (`context::name`) win over bare names.
#[derive(Debug, Default)]
pub struct TableResolver {
    refs: HashMap<String, RefTarget>,
}

impl TableResolver {
    pub fn new(refs: HashMap<String, RefTarget>) -> Self {
        Self { refs }
    }

    /// A table that resolves nothing; every reference takes the unresolved
    /// branch.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let refs: HashMap<String, RefTarget> = serde_json::from_str(&contents)?;
        Ok(Self { refs })
    }
}

impl RefResolver for TableResolver {
    fn resolve(&self, name: &str, context: &str) -> Option<RefTarget> {
        if !context.is_empty() {
            if let Some(target) = self.refs.get(&format!("{context}::{name}")) {
                return Some(target.clone());
            }
        }
        self.refs.get(name).cloned()
    }
}
