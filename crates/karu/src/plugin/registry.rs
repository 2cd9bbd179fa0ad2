use super::{
    cypress, eslint, husky, jest, lint_staged, nextjs, playwright, postcss, storybook, tailwind,
    typescript, vite, vitest, EntryPattern, PluginContext, PluginDef,
};
use crate::diagnostics::{Diagnostics, WarningKind};
use crate::manifest::{is_node_builtin, package_name_of};
use crate::parser::analyze_module;
use crate::types::{PluginOverrides, DEFAULT_EXTENSIONS};
use crate::workspace::Workspace;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// The compile-time plugin table. Order is alphabetical and stable; the
/// report never depends on it because contributions are set-merged.
pub fn builtin_plugins() -> &'static [PluginDef] {
    static TABLE: &[PluginDef] = &[
        cypress::PLUGIN,
        eslint::PLUGIN,
        husky::PLUGIN,
        jest::PLUGIN,
        lint_staged::PLUGIN,
        nextjs::PLUGIN,
        playwright::PLUGIN,
        postcss::PLUGIN,
        storybook::PLUGIN,
        tailwind::PLUGIN,
        typescript::PLUGIN,
        vite::PLUGIN,
        vitest::PLUGIN,
    ];
    TABLE
}

/// Merged plugin contributions for one workspace.
#[derive(Debug, Default)]
pub struct WorkspacePluginResult {
    pub entries: Vec<EntryPattern>,
    pub project: Vec<String>,
    /// Packages referenced by tool configs; counted as used dependencies.
    pub references: FxHashSet<String>,
    pub ignores: Vec<String>,
}

pub struct PluginHost<'a> {
    overrides: &'a PluginOverrides,
    production: bool,
}

impl<'a> PluginHost<'a> {
    pub fn new(overrides: &'a PluginOverrides, production: bool) -> Self {
        Self { overrides, production }
    }

    /// Run every enabled plugin against one workspace and merge the outputs.
    pub fn run(&self, workspace: &Workspace, diagnostics: &Diagnostics) -> WorkspacePluginResult {
        let mut result = WorkspacePluginResult::default();

        for plugin in builtin_plugins() {
            let enabled = self
                .overrides
                .forced(plugin.name)
                .unwrap_or_else(|| plugin.is_enabled_by(&workspace.manifest));
            if !enabled {
                continue;
            }
            if self.production && plugin.dev_only {
                continue;
            }

            let custom = self.overrides.custom(plugin.name);

            let entry_patterns: Vec<String> = match custom {
                Some((_, entry, _)) if !entry.is_empty() => entry.to_vec(),
                _ => plugin.entry_patterns.iter().map(|s| (*s).to_string()).collect(),
            };
            for pattern in entry_patterns {
                push_unique_entry(&mut result.entries, EntryPattern::new(pattern));
            }

            let project_patterns: Vec<String> = match custom {
                Some((_, _, project)) if !project.is_empty() => project.to_vec(),
                _ => plugin.project_patterns.iter().map(|s| (*s).to_string()).collect(),
            };
            result.project.extend(project_patterns);

            let config_globs: Vec<String> = match custom {
                Some((config, _, _)) if !config.is_empty() => config.to_vec(),
                _ => plugin.config_files.iter().map(|s| (*s).to_string()).collect(),
            };

            for config_path in locate_config_files(&workspace.dir, &config_globs) {
                self.run_on_config(plugin, workspace, &config_path, &mut result, diagnostics);
            }
        }

        result
    }

    fn run_on_config(
        &self,
        plugin: &PluginDef,
        workspace: &Workspace,
        config_path: &Path,
        result: &mut WorkspacePluginResult,
        diagnostics: &Diagnostics,
    ) {
        // Tool config files are loaded by the tool at runtime: they are entry
        // files themselves, and their own imports are dependency references.
        if let Ok(rel) = config_path.strip_prefix(&workspace.dir) {
            let rel = rel.to_string_lossy().replace('\\', "/");
            if has_default_extension(config_path) && rel != "package.json" {
                push_unique_entry(&mut result.entries, EntryPattern::new(rel));
                collect_import_references(config_path, &mut result.references);
            }
        }

        let ctx = PluginContext {
            workspace_dir: &workspace.dir,
            config_path,
            manifest: &workspace.manifest,
        };
        match (plugin.resolve)(&ctx) {
            Ok(output) => {
                for entry in output.entries {
                    push_unique_entry(&mut result.entries, entry);
                }
                for reference in output.references {
                    if let Some(name) = package_name_of(&reference) {
                        if !is_node_builtin(name) {
                            result.references.insert(name.to_string());
                        }
                    }
                }
                result.ignores.extend(output.ignores);
            }
            Err(e) => {
                diagnostics.warn(
                    WarningKind::Plugin,
                    format!("plugin '{}' failed: {e}", plugin.name),
                    Some(config_path),
                );
            }
        }
    }
}

fn has_default_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| DEFAULT_EXTENSIONS.contains(&format!(".{e}").as_str()))
}

/// Bare import specifiers of a JS/TS config file, as package references.
fn collect_import_references(path: &Path, references: &mut FxHashSet<String>) {
    if let Ok(analysis) = analyze_module(path) {
        for import in analysis.imports {
            if let Some(name) = package_name_of(&import.specifier) {
                if !is_node_builtin(&import.specifier) {
                    references.insert(name.to_string());
                }
            }
        }
    }
}

fn push_unique_entry(entries: &mut Vec<EntryPattern>, entry: EntryPattern) {
    if !entries.contains(&entry) {
        entries.push(entry);
    }
}

/// Expand config globs under a workspace directory to existing files.
fn locate_config_files(dir: &Path, globs: &[String]) -> Vec<PathBuf> {
    let mut found = Vec::new();

    for pattern in globs {
        // The glob crate has no brace support; expand them first
        for expanded in crate::collector::expand_brace_pattern(pattern) {
            if expanded.contains(['*', '?', '[']) {
                let full = dir.join(&expanded);
                if let Ok(matches) = glob::glob(&full.to_string_lossy()) {
                    for path in matches.flatten() {
                        if path.is_file() {
                            found.push(path);
                        }
                    }
                }
            } else {
                let path = dir.join(&expanded);
                if path.is_file() {
                    found.push(path);
                }
            }
        }
    }

    found.sort();
    found.dedup();
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::KaruConfig;
    use crate::workspace::WorkspaceSet;
    use std::fs;
    use tempfile::tempdir;

    fn single_workspace(dir: &Path) -> Workspace {
        let diagnostics = Diagnostics::new();
        let cwd = dir.canonicalize().unwrap();
        let mut set =
            WorkspaceSet::enumerate(&cwd, &KaruConfig::default(), &diagnostics).unwrap();
        set.workspaces.pop().unwrap()
    }

    #[test]
    fn disabled_plugin_contributes_nothing() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "t", "devDependencies": { "jest": "^29.0.0" } }"#,
        )
        .unwrap();

        let ws = single_workspace(dir.path());
        let overrides: PluginOverrides =
            serde_json::from_str(r#"{ "jest": false }"#).unwrap();
        let host = PluginHost::new(&overrides, false);
        let diagnostics = Diagnostics::new();
        let result = host.run(&ws, &diagnostics);

        assert!(result.entries.is_empty());
    }

    #[test]
    fn enabled_plugin_contributes_default_entries() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "t", "devDependencies": { "jest": "^29.0.0" } }"#,
        )
        .unwrap();

        let ws = single_workspace(dir.path());
        let overrides = PluginOverrides::default();
        let host = PluginHost::new(&overrides, false);
        let diagnostics = Diagnostics::new();
        let result = host.run(&ws, &diagnostics);

        assert!(result
            .entries
            .iter()
            .any(|e| e.pattern.contains("__tests__") || e.pattern.contains(".test.")));
    }

    #[test]
    fn production_skips_dev_only_plugins() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "t", "devDependencies": { "jest": "^29.0.0" } }"#,
        )
        .unwrap();

        let ws = single_workspace(dir.path());
        let overrides = PluginOverrides::default();
        let host = PluginHost::new(&overrides, true);
        let diagnostics = Diagnostics::new();
        let result = host.run(&ws, &diagnostics);

        assert!(result.entries.is_empty());
    }

    #[test]
    fn config_file_becomes_entry_and_reference_source() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "t", "devDependencies": { "vitest": "^2.0.0" } }"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("vitest.config.ts"),
            "import { defineConfig } from 'vitest/config';\nexport default defineConfig({});",
        )
        .unwrap();

        let ws = single_workspace(dir.path());
        let overrides = PluginOverrides::default();
        let host = PluginHost::new(&overrides, false);
        let diagnostics = Diagnostics::new();
        let result = host.run(&ws, &diagnostics);

        assert!(result.entries.iter().any(|e| e.pattern == "vitest.config.ts"));
        assert!(result.references.contains("vitest"));
    }
}
