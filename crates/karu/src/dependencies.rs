use crate::workspace::WorkspaceSet;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;

/// Unused and unlisted dependencies per workspace index.
#[derive(Debug, Default)]
pub struct DependencyAnalysis {
    pub unused: Vec<(usize, String)>,
    pub unlisted: Vec<(usize, String)>,
}

/// The DefinitelyTyped companion of a package:
/// `lodash` -> `@types/lodash`, `@scope/pkg` -> `@types/scope__pkg`.
pub fn types_package(package: &str) -> String {
    match package.strip_prefix('@') {
        Some(scoped) => format!("@types/{}", scoped.replace('/', "__")),
        None => format!("@types/{package}"),
    }
}

/// Match an ignore entry against a package name: `/regex/` entries are
/// regular expressions, everything else is an exact name.
fn matches_ignore(entry: &str, package: &str) -> bool {
    if let Some(pattern) = entry.strip_prefix('/').and_then(|e| e.strip_suffix('/')) {
        return Regex::new(pattern).is_ok_and(|re| re.is_match(package));
    }
    entry == package
}

/// Attribute every external reference to its owning workspace and compute
/// the unused/unlisted sets.
///
/// Attribution is monotone: walking the importing file's workspace chain,
/// the nearest ancestor whose manifest declares the package owns the
/// reference. No declaring ancestor means unlisted at the importing
/// workspace. Referencing a package also marks its `@types/` companion as
/// referenced wherever that is declared.
pub fn analyze_dependencies(
    workspaces: &WorkspaceSet,
    external_refs: &FxHashSet<(String, PathBuf)>,
    plugin_refs: &FxHashMap<usize, FxHashSet<String>>,
) -> DependencyAnalysis {
    // workspace idx -> declared packages seen in use
    let mut referenced: FxHashMap<usize, FxHashSet<String>> = FxHashMap::default();
    let mut unlisted: FxHashSet<(usize, String)> = FxHashSet::default();

    let root_idx = workspaces.workspaces.len().saturating_sub(1);

    let mut attribute = |package: &str, origin_ws: usize, report_unlisted: bool| {
        let chain = workspaces.chain_of(origin_ws);
        let mut listed = false;
        for &idx in &chain {
            if workspaces.workspaces[idx].manifest.declares(package) {
                referenced.entry(idx).or_default().insert(package.to_string());
                listed = true;
                break;
            }
        }
        // Using a package counts its @types companion as used too
        let types = types_package(package);
        for &idx in &chain {
            if workspaces.workspaces[idx].manifest.declares(&types) {
                referenced.entry(idx).or_default().insert(types.clone());
                break;
            }
        }
        if !listed && report_unlisted {
            unlisted.insert((origin_ws, package.to_string()));
        }
    };

    for (package, referrer) in external_refs {
        let origin = workspaces.owner_of(referrer).unwrap_or(root_idx);
        attribute(package, origin, true);
    }

    for (&ws_idx, packages) in plugin_refs {
        for package in packages {
            attribute(package, ws_idx, true);
        }
    }

    let mut analysis = DependencyAnalysis::default();

    for (idx, ws) in workspaces.workspaces.iter().enumerate() {
        if !ws.selected {
            continue;
        }
        let used = referenced.get(&idx);
        let plugin_declared = plugin_refs.get(&idx);

        for (package, _) in ws.manifest.dependencies_by_kind() {
            if used.is_some_and(|set| set.contains(package)) {
                continue;
            }
            if plugin_declared.is_some_and(|set| set.contains(package)) {
                continue;
            }
            if ws.config.ignore_dependencies.iter().any(|e| matches_ignore(e, package)) {
                continue;
            }
            // A dependency on a sibling workspace is structural, not unused
            if workspaces.by_package_name(package).is_some() {
                continue;
            }
            analysis.unused.push((idx, package.to_string()));
        }
    }

    for (ws_idx, package) in unlisted {
        let ws = &workspaces.workspaces[ws_idx];
        if !ws.selected {
            continue;
        }
        if ws.config.ignore_dependencies.iter().any(|e| matches_ignore(e, &package)) {
            continue;
        }
        analysis.unlisted.push((ws_idx, package));
    }

    analysis.unused.sort();
    analysis.unused.dedup();
    analysis.unlisted.sort();
    analysis.unlisted.dedup();
    analysis
}
