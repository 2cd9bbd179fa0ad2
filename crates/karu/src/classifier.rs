use crate::binaries::{binaries_in_script, resolve_binary, BinaryResolution};
use crate::collector::{compile_globset, ProjectIndex};
use crate::dependencies::DependencyAnalysis;
use crate::graph::GraphResult;
use crate::module_cache::ModuleCache;
use crate::parser::ExportKind;
use crate::types::{Issue, IssueKind, KaruConfig};
use crate::workspace::WorkspaceSet;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;

/// Everything the classifier projects issues from. All inputs are finished
/// and immutable; classification is pure set arithmetic.
pub struct ClassifierInput<'a> {
    pub cwd: &'a Path,
    pub workspaces: &'a WorkspaceSet,
    /// Per-workspace project/entry sets, aligned with workspace indices;
    /// None for unselected workspaces.
    pub indexes: &'a [Option<ProjectIndex>],
    pub graph: &'a GraphResult,
    pub dependencies: &'a DependencyAnalysis,
    pub module_cache: &'a ModuleCache,
    pub config: &'a KaruConfig,
    /// Extra reporting-only ignore globs contributed by plugins, per workspace
    pub plugin_ignores: &'a FxHashMap<usize, Vec<String>>,
    pub included: &'a FxHashSet<IssueKind>,
}

/// `@public` always exempts an export from reporting; any further exempting
/// tags come from the `tags` config key. Other tags (`@alias`, `@beta`,
/// `@internal` by default) carry no effect.
fn is_exempt(tags: &[String], config_tags: &[String]) -> bool {
    tags.iter().any(|tag| tag == "public" || config_tags.contains(tag))
}

pub fn classify(input: &ClassifierInput) -> Vec<Issue> {
    let mut issues = Vec::new();

    for (ws_idx, ws) in input.workspaces.workspaces.iter().enumerate() {
        let Some(index) = input.indexes.get(ws_idx).and_then(|i| i.as_ref()) else {
            continue;
        };

        let mut ignore_patterns = ws.config.ignore.clone();
        if let Some(extra) = input.plugin_ignores.get(&ws_idx) {
            ignore_patterns.extend(extra.iter().cloned());
        }
        let ignore = compile_globset(&ignore_patterns);
        let is_ignored = |path: &Path| {
            let relative = path.strip_prefix(&ws.dir).unwrap_or(path);
            ignore.is_match(&*relative.to_string_lossy())
        };

        if input.included.contains(&IssueKind::Files) {
            for file in &index.project_files {
                if input.graph.is_reachable(file) || is_ignored(file) {
                    continue;
                }
                issues.push(Issue {
                    kind: IssueKind::Files,
                    workspace: ws.rel_dir.clone(),
                    subject: relative_subject(input.cwd, file),
                    symbol: None,
                });
            }
        }

        let report_exports = input.included.contains(&IssueKind::Exports)
            || input.included.contains(&IssueKind::EnumMembers)
            || input.included.contains(&IssueKind::ClassMembers);
        if report_exports {
            classify_exports(input, ws_idx, index, &is_ignored, &mut issues);
        }

        if input.included.contains(&IssueKind::Binaries) {
            classify_binaries(input, ws_idx, &mut issues);
        }
    }

    if input.included.contains(&IssueKind::Dependencies) {
        for (ws_idx, package) in &input.dependencies.unused {
            issues.push(Issue {
                kind: IssueKind::Dependencies,
                workspace: input.workspaces.workspaces[*ws_idx].rel_dir.clone(),
                subject: package.clone(),
                symbol: None,
            });
        }
    }
    if input.included.contains(&IssueKind::Unlisted) {
        for (ws_idx, package) in &input.dependencies.unlisted {
            issues.push(Issue {
                kind: IssueKind::Unlisted,
                workspace: input.workspaces.workspaces[*ws_idx].rel_dir.clone(),
                subject: package.clone(),
                symbol: None,
            });
        }
    }

    issues.sort();
    issues.dedup();
    issues
}

fn classify_exports(
    input: &ClassifierInput,
    ws_idx: usize,
    index: &ProjectIndex,
    is_ignored: &dyn Fn(&Path) -> bool,
    issues: &mut Vec<Issue>,
) {
    let ws = &input.workspaces.workspaces[ws_idx];

    let mut files: Vec<_> = index.project_files.iter().collect();
    files.sort();

    for file in files {
        // Exports of unreached files are subsumed by the unused-file issue
        if !input.graph.is_reachable(file) || is_ignored(file) {
            continue;
        }

        let is_entry = index.entry_files.contains(file);
        if is_entry && !input.config.include_entry_exports {
            continue;
        }

        let record = input.module_cache.get_or_parse(file);

        for export in &record.analysis.exports {
            if is_exempt(&export.tags, &input.config.tags) {
                continue;
            }

            let count = input.graph.export_count(file, &export.name);

            if count == 0 {
                if input.config.ignore_exports_used_in_file {
                    if let Some(local) = &export.local_name {
                        if record.analysis.local_refs.contains(local) {
                            continue;
                        }
                    }
                }
                if input.included.contains(&IssueKind::Exports) {
                    issues.push(Issue {
                        kind: IssueKind::Exports,
                        workspace: ws.rel_dir.clone(),
                        subject: relative_subject(input.cwd, file),
                        symbol: Some(export.name.clone()),
                    });
                }
                continue;
            }

            // Members are only interesting on exports that are themselves used
            let member_kind = match export.kind {
                ExportKind::Enum => IssueKind::EnumMembers,
                ExportKind::Class => IssueKind::ClassMembers,
                _ => continue,
            };
            if !input.included.contains(&member_kind) {
                continue;
            }
            for member in &export.members {
                let used = input.graph.member_used(file, &export.name, &member.name);
                if !used {
                    issues.push(Issue {
                        kind: member_kind,
                        workspace: ws.rel_dir.clone(),
                        subject: relative_subject(input.cwd, file),
                        symbol: Some(format!("{}.{}", export.name, member.name)),
                    });
                }
            }
        }
    }
}

fn classify_binaries(input: &ClassifierInput, ws_idx: usize, issues: &mut Vec<Issue>) {
    let ws = &input.workspaces.workspaces[ws_idx];
    let chain = input.workspaces.chain_of(ws_idx);
    let chain_dirs: Vec<&Path> = chain
        .iter()
        .map(|&idx| input.workspaces.workspaces[idx].dir.as_path())
        .collect();

    let declared = |name: &str| {
        chain
            .iter()
            .any(|&idx| input.workspaces.workspaces[idx].manifest.declares(name))
    };

    for script in ws.manifest.scripts.values() {
        for binary in binaries_in_script(script) {
            if binary.intentionally_unlisted {
                continue;
            }
            if ws.config.ignore_binaries.iter().any(|e| matches_binary_ignore(e, &binary.name)) {
                continue;
            }
            if resolve_binary(&binary.name, &chain_dirs, declared) == BinaryResolution::Unlisted
            {
                issues.push(Issue {
                    kind: IssueKind::Binaries,
                    workspace: ws.rel_dir.clone(),
                    subject: binary.name.clone(),
                    symbol: None,
                });
            }
        }
    }
}

fn matches_binary_ignore(entry: &str, name: &str) -> bool {
    if let Some(pattern) = entry.strip_prefix('/').and_then(|e| e.strip_suffix('/')) {
        return Regex::new(pattern).is_ok_and(|re| re.is_match(name));
    }
    entry == name
}

fn relative_subject(cwd: &Path, path: &Path) -> String {
    path.strip_prefix(cwd)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// Expand `--include` / `--exclude` selections over the issue kinds.
pub fn selected_kinds(include: &[IssueKind], exclude: &[IssueKind]) -> FxHashSet<IssueKind> {
    let mut selected: FxHashSet<IssueKind> = if include.is_empty() {
        IssueKind::DEFAULT.iter().copied().collect()
    } else {
        include.iter().copied().collect()
    };
    for kind in exclude {
        selected.remove(kind);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_selection_excludes_class_members() {
        let selected = selected_kinds(&[], &[]);
        assert!(selected.contains(&IssueKind::Files));
        assert!(selected.contains(&IssueKind::EnumMembers));
        assert!(!selected.contains(&IssueKind::ClassMembers));
    }

    #[test]
    fn include_narrows_selection() {
        let selected = selected_kinds(&[IssueKind::Files], &[]);
        assert_eq!(selected.len(), 1);
        assert!(selected.contains(&IssueKind::Files));
    }

    #[test]
    fn exclude_removes_from_selection() {
        let selected = selected_kinds(&[], &[IssueKind::Exports]);
        assert!(!selected.contains(&IssueKind::Exports));
        assert!(selected.contains(&IssueKind::Files));
    }

    #[test]
    fn public_always_exempts_config_tags_extend() {
        let public = vec!["public".to_string()];
        let internal = vec!["internal".to_string()];
        let alias = vec!["alias".to_string()];

        assert!(is_exempt(&public, &[]));
        assert!(!is_exempt(&internal, &[]));
        assert!(!is_exempt(&alias, &[]));
        assert!(is_exempt(&internal, &["internal".to_string()]));
    }

    #[test]
    fn binary_ignore_regex() {
        assert!(matches_binary_ignore("/^docker-/", "docker-compose"));
        assert!(matches_binary_ignore("terraform", "terraform"));
        assert!(!matches_binary_ignore("terraform", "tf"));
    }
}
