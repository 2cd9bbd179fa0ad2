use rustc_hash::FxHashSet;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Declared dependency kinds, in manifest order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    Prod,
    Dev,
    Peer,
    Optional,
}

/// The `bin` field: either a single path or a name -> path map.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BinField {
    Single(String),
    Named(BTreeMap<String, String>),
}

/// The `workspaces` field: an array of globs or `{ "packages": [...] }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WorkspacesField {
    Globs(Vec<String>),
    Object {
        #[serde(default)]
        packages: Vec<String>,
    },
}

impl WorkspacesField {
    pub fn globs(&self) -> &[String] {
        match self {
            WorkspacesField::Globs(globs) => globs,
            WorkspacesField::Object { packages } => packages,
        }
    }
}

/// Parsed package.json, limited to the fields the analysis consumes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageJson {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub main: Option<String>,

    #[serde(default)]
    pub module: Option<String>,

    #[serde(default)]
    pub types: Option<String>,

    #[serde(default)]
    pub browser: Option<serde_json::Value>,

    #[serde(default)]
    pub bin: Option<BinField>,

    #[serde(default)]
    pub exports: Option<serde_json::Value>,

    #[serde(default)]
    pub scripts: BTreeMap<String, String>,

    #[serde(default)]
    pub workspaces: Option<WorkspacesField>,

    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "devDependencies")]
    pub dev_dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "peerDependencies")]
    pub peer_dependencies: BTreeMap<String, String>,

    #[serde(default, rename = "optionalDependencies")]
    pub optional_dependencies: BTreeMap<String, String>,
}

impl PackageJson {
    /// Read and parse `package.json` under `dir`. `None` when the file is
    /// missing or unreadable; `Some(Err)` is reserved for malformed JSON so
    /// the caller can warn with the offending path.
    pub fn load(dir: &Path) -> Option<Result<PackageJson, serde_json::Error>> {
        let path = dir.join("package.json");
        let content = std::fs::read_to_string(&path).ok()?;
        Some(serde_json::from_str(&content))
    }

    /// All declared dependency names with their kinds, manifest order.
    pub fn dependencies_by_kind(&self) -> impl Iterator<Item = (&str, DependencyKind)> {
        self.dependencies
            .keys()
            .map(|name| (name.as_str(), DependencyKind::Prod))
            .chain(self.dev_dependencies.keys().map(|name| (name.as_str(), DependencyKind::Dev)))
            .chain(self.peer_dependencies.keys().map(|name| (name.as_str(), DependencyKind::Peer)))
            .chain(
                self.optional_dependencies
                    .keys()
                    .map(|name| (name.as_str(), DependencyKind::Optional)),
            )
    }

    /// Set of all declared dependency names, any kind.
    pub fn all_dependencies(&self) -> FxHashSet<String> {
        self.dependencies_by_kind().map(|(name, _)| name.to_string()).collect()
    }

    pub fn declares(&self, package: &str) -> bool {
        self.dependencies.contains_key(package)
            || self.dev_dependencies.contains_key(package)
            || self.peer_dependencies.contains_key(package)
            || self.optional_dependencies.contains_key(package)
    }

    /// Relative source paths the manifest itself marks as entry points:
    /// `main`, `module`, `types`, `browser`, `bin` targets, and every
    /// relative path leaf of the `exports` map.
    pub fn entry_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();

        for field in [&self.main, &self.module, &self.types] {
            if let Some(p) = field {
                paths.push(p.clone());
            }
        }

        if let Some(browser) = &self.browser {
            collect_string_leaves(browser, &mut paths);
        }

        match &self.bin {
            Some(BinField::Single(p)) => paths.push(p.clone()),
            Some(BinField::Named(map)) => paths.extend(map.values().cloned()),
            None => {}
        }

        if let Some(exports) = &self.exports {
            collect_string_leaves(exports, &mut paths);
        }

        // Keep only paths that can point into the workspace source tree.
        paths.retain(|p| p != "." && !p.starts_with("http"));
        paths
    }

    pub fn workspace_globs(&self) -> Vec<String> {
        self.workspaces.as_ref().map(|w| w.globs().to_vec()).unwrap_or_default()
    }
}

/// Recursively collect relative-path string leaves from `exports`-shaped
/// values. Conditional keys (`import`, `require`, `types`, ...) are maps;
/// `false` leaves (blocked subpaths) are skipped.
fn collect_string_leaves(value: &serde_json::Value, out: &mut Vec<String>) {
    match value {
        serde_json::Value::String(s) => out.push(s.clone()),
        serde_json::Value::Array(items) => {
            for item in items {
                collect_string_leaves(item, out);
            }
        }
        serde_json::Value::Object(map) => {
            for leaf in map.values() {
                collect_string_leaves(leaf, out);
            }
        }
        _ => {}
    }
}

/// Extract the package name from an external import specifier.
/// `lodash/fp` -> `lodash`, `@scope/pkg/sub` -> `@scope/pkg`.
pub fn package_name_of(specifier: &str) -> Option<&str> {
    if specifier.is_empty() || specifier.starts_with('.') || specifier.starts_with('/') {
        return None;
    }
    let mut segments = specifier.splitn(3, '/');
    let first = segments.next()?;
    if let Some(scoped) = first.strip_prefix('@') {
        if scoped.is_empty() {
            return None;
        }
        let second = segments.next()?;
        let len = first.len() + 1 + second.len();
        Some(&specifier[..len])
    } else {
        Some(first)
    }
}

/// True for node builtin specifiers, with or without the `node:` prefix.
pub fn is_node_builtin(specifier: &str) -> bool {
    let name = specifier.strip_prefix("node:").unwrap_or(specifier);
    let name = name.split('/').next().unwrap_or(name);
    specifier.starts_with("node:") || crate::types::NODE_BUILTINS.contains(&name)
}
