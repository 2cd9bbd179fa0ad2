mod cypress;
mod eslint;
mod husky;
mod jest;
mod js_config;
mod lint_staged;
mod nextjs;
mod playwright;
mod postcss;
mod registry;
mod storybook;
mod tailwind;
mod typescript;
mod vite;
mod vitest;

pub use js_config::{load_config_value, string_array, string_at, strings_anywhere};
pub use registry::{builtin_plugins, PluginHost, WorkspacePluginResult};

use crate::manifest::PackageJson;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error types for plugin operations
#[derive(Error, Debug)]
pub enum PluginError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(String),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Glob error: {0}")]
    GlobError(#[from] glob::GlobError),
}

/// An entry glob with an optional base directory it is relative to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPattern {
    pub pattern: String,
    pub base: Option<PathBuf>,
}

impl EntryPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self { pattern: pattern.into(), base: None }
    }

    pub fn with_base(pattern: impl Into<String>, base: impl Into<PathBuf>) -> Self {
        Self { pattern: pattern.into(), base: Some(base.into()) }
    }
}

/// What one plugin extracted from one tool configuration file.
#[derive(Debug, Default)]
pub struct PluginOutput {
    /// Additional entry globs
    pub entries: Vec<EntryPattern>,
    /// External packages the tool config references (presets, transforms, ...)
    pub references: Vec<String>,
    /// Globs the tool generates or manages; excluded from issue reporting
    pub ignores: Vec<String>,
}

/// Everything a `resolve` function may look at.
pub struct PluginContext<'a> {
    pub workspace_dir: &'a Path,
    pub config_path: &'a Path,
    pub manifest: &'a PackageJson,
}

/// A plugin is a static record teaching the host where one third-party tool
/// keeps its config and entry files, and how to read references out of the
/// config. Dispatch is a compile-time table, not a runtime registry.
pub struct PluginDef {
    pub name: &'static str,
    /// Package-name patterns; any declared dependency matching one
    /// auto-enables the plugin.
    pub enablers: &'static [&'static str],
    /// Config file globs, relative to the workspace directory
    pub config_files: &'static [&'static str],
    /// Entry globs contributed whenever the plugin is enabled
    pub entry_patterns: &'static [&'static str],
    /// Broader globs merged into the project set
    pub project_patterns: &'static [&'static str],
    /// Contributions are skipped in production mode
    pub dev_only: bool,
    pub resolve: fn(&PluginContext) -> Result<PluginOutput, PluginError>,
}

impl PluginDef {
    /// Pure enablement predicate over the manifest's declared dependencies.
    pub fn is_enabled_by(&self, manifest: &PackageJson) -> bool {
        manifest.dependencies_by_kind().any(|(name, _)| {
            self.enablers.iter().any(|pattern| fast_glob::glob_match(pattern, name))
        })
    }
}

/// Normalize a `../`-style pattern against its base into a workspace-relative
/// glob, so `.storybook` + `../src/**` becomes `src/**`.
pub(crate) fn normalize_pattern(base: &str, pattern: &str) -> String {
    let mut components: Vec<&str> = base.split('/').filter(|c| !c.is_empty() && *c != ".").collect();
    for part in pattern.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                components.pop();
            }
            other => components.push(other),
        }
    }
    components.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enablement_matches_glob_patterns() {
        let manifest: PackageJson = serde_json::from_str(
            r#"{ "devDependencies": { "@storybook/react": "^8.0.0" } }"#,
        )
        .unwrap();

        let storybook = builtin_plugins().iter().find(|p| p.name == "storybook").unwrap();
        assert!(storybook.is_enabled_by(&manifest));

        let jest = builtin_plugins().iter().find(|p| p.name == "jest").unwrap();
        assert!(!jest.is_enabled_by(&manifest));
    }

    #[test]
    fn normalize_pattern_resolves_parent_segments() {
        assert_eq!(normalize_pattern(".storybook", "../src/**/*.stories.tsx"), "src/**/*.stories.tsx");
        assert_eq!(normalize_pattern("", "src/**"), "src/**");
        assert_eq!(normalize_pattern("config", "./local/*.ts"), "config/local/*.ts");
    }
}
