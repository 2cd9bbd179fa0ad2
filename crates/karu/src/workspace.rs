use crate::diagnostics::{Diagnostics, WarningKind};
use crate::manifest::PackageJson;
use crate::types::{KaruConfig, KaruError};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Entry globs used for a workspace with no explicit `entry` config.
pub const DEFAULT_ENTRY_PATTERNS: &[&str] = &[
    "index.{js,jsx,ts,tsx,mjs,cjs}",
    "src/index.{js,jsx,ts,tsx,mjs,cjs}",
    "src/main.{js,jsx,ts,tsx,mjs,cjs}",
];

/// Effective per-workspace configuration after layering root config and
/// workspace overrides.
#[derive(Debug, Clone)]
pub struct WorkspaceConfig {
    pub entry: Vec<String>,
    pub project: Vec<String>,
    pub ignore: Vec<String>,
    pub ignore_dependencies: Vec<String>,
    pub ignore_binaries: Vec<String>,
}

/// One manifest-bearing directory participating in the analysis.
#[derive(Debug)]
pub struct Workspace {
    /// Canonical absolute directory
    pub dir: PathBuf,
    /// Directory relative to the run root; empty string for the root itself
    pub rel_dir: String,
    pub manifest: PackageJson,
    pub config: WorkspaceConfig,
    /// False when `-W` restricts the run and this workspace is outside the
    /// selected subtree; unselected workspaces still participate in
    /// dependency attribution.
    pub selected: bool,
}

/// The enumerated workspace tree, deepest-first so any workspace appears
/// before its ancestors.
#[derive(Debug)]
pub struct WorkspaceSet {
    pub workspaces: Vec<Workspace>,
    by_name: FxHashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
struct PnpmWorkspaceManifest {
    #[serde(default)]
    packages: Vec<String>,
}

impl WorkspaceSet {
    pub fn enumerate(
        cwd: &Path,
        config: &KaruConfig,
        diagnostics: &Diagnostics,
    ) -> Result<Self, KaruError> {
        let root_manifest = match PackageJson::load(cwd) {
            Some(Ok(manifest)) => manifest,
            Some(Err(e)) => {
                return Err(KaruError::Config(format!(
                    "malformed package.json in {}: {e}",
                    cwd.display()
                )));
            }
            None => PackageJson::default(),
        };

        let mut globs = root_manifest.workspace_globs();
        globs.extend(pnpm_workspace_globs(cwd));

        let mut dirs: Vec<PathBuf> = Vec::new();
        for pattern in &globs {
            // npm allows negated workspace globs; only positive ones name dirs
            if pattern.starts_with('!') {
                continue;
            }
            let full = cwd.join(pattern);
            let Ok(matches) = glob::glob(&full.to_string_lossy()) else {
                continue;
            };
            for dir in matches.flatten() {
                if dir.is_dir() && dir.join("package.json").is_file() {
                    if let Ok(canonical) = dir.canonicalize() {
                        dirs.push(canonical);
                    }
                }
            }
        }
        dirs.sort();
        dirs.dedup();

        let mut workspaces = Vec::new();
        for dir in dirs {
            if dir == cwd {
                continue;
            }
            match PackageJson::load(&dir) {
                Some(Ok(manifest)) => {
                    let rel_dir = dir
                        .strip_prefix(cwd)
                        .unwrap_or(&dir)
                        .to_string_lossy()
                        .replace('\\', "/");
                    let ws_config = effective_config(config, &rel_dir, false);
                    workspaces.push(Workspace {
                        dir,
                        rel_dir,
                        manifest,
                        config: ws_config,
                        selected: true,
                    });
                }
                Some(Err(e)) => {
                    diagnostics.warn(
                        WarningKind::Workspace,
                        format!("unreadable manifest: {e}"),
                        Some(&dir.join("package.json")),
                    );
                }
                None => {}
            }
        }

        // Root workspace always participates, even in an integrated monorepo
        // with no `workspaces` field at all.
        workspaces.push(Workspace {
            dir: cwd.to_path_buf(),
            rel_dir: String::new(),
            manifest: root_manifest,
            config: effective_config(config, "", true),
            selected: true,
        });

        // Deepest first: children precede ancestors so nearest-wins
        // attribution can scan in order.
        workspaces.sort_by(|a, b| {
            let depth_a = a.dir.components().count();
            let depth_b = b.dir.components().count();
            depth_b.cmp(&depth_a).then_with(|| a.dir.cmp(&b.dir))
        });

        if let Some(selector) = &config.workspace {
            let target = cwd.join(selector);
            let target = target.canonicalize().map_err(|_| {
                KaruError::WorkspaceNotFound(selector.clone())
            })?;
            let mut any = false;
            for ws in &mut workspaces {
                ws.selected = ws.dir.starts_with(&target);
                any |= ws.selected;
            }
            if !any {
                return Err(KaruError::WorkspaceNotFound(selector.clone()));
            }
        }

        let mut by_name = FxHashMap::default();
        for (idx, ws) in workspaces.iter().enumerate() {
            if let Some(name) = &ws.manifest.name {
                by_name.entry(name.clone()).or_insert(idx);
            }
        }

        Ok(Self { workspaces, by_name })
    }

    /// Index of the workspace a package name belongs to, if any.
    pub fn by_package_name(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    /// Deepest workspace whose directory contains `path`.
    pub fn owner_of(&self, path: &Path) -> Option<usize> {
        self.workspaces.iter().position(|ws| path.starts_with(&ws.dir))
    }

    /// Indices of `idx`'s ancestor workspaces, nearest first (self included).
    pub fn chain_of(&self, idx: usize) -> Vec<usize> {
        let dir = &self.workspaces[idx].dir;
        let mut chain: Vec<usize> = self
            .workspaces
            .iter()
            .enumerate()
            .filter(|(_, ws)| dir.starts_with(&ws.dir))
            .map(|(i, _)| i)
            .collect();
        chain.sort_by_key(|&i| std::cmp::Reverse(self.workspaces[i].dir.components().count()));
        chain
    }
}

fn pnpm_workspace_globs(cwd: &Path) -> Vec<String> {
    let path = cwd.join("pnpm-workspace.yaml");
    let Ok(content) = std::fs::read_to_string(&path) else {
        return Vec::new();
    };
    match serde_yaml::from_str::<PnpmWorkspaceManifest>(&content) {
        Ok(manifest) => manifest.packages,
        Err(_) => Vec::new(),
    }
}

fn effective_config(config: &KaruConfig, rel_dir: &str, is_root: bool) -> WorkspaceConfig {
    let overrides = config.workspaces.get(rel_dir);

    let entry = match overrides {
        Some(o) if !o.entry.is_empty() => o.entry.clone(),
        _ if is_root && !config.entry.is_empty() => config.entry.clone(),
        _ => DEFAULT_ENTRY_PATTERNS.iter().map(|s| (*s).to_string()).collect(),
    };

    let project = match overrides {
        Some(o) if !o.project.is_empty() => o.project.clone(),
        _ => config.project.clone(),
    };

    let mut ignore = config.ignore.clone();
    let mut ignore_dependencies = config.ignore_dependencies.clone();
    let mut ignore_binaries = config.ignore_binaries.clone();
    if let Some(o) = overrides {
        ignore.extend(o.ignore.iter().cloned());
        ignore_dependencies.extend(o.ignore_dependencies.iter().cloned());
        ignore_binaries.extend(o.ignore_binaries.iter().cloned());
    }

    WorkspaceConfig { entry, project, ignore, ignore_dependencies, ignore_binaries }
}
