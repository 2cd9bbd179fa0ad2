use crate::diagnostics::{Diagnostics, WarningKind};
use crate::manifest::{is_node_builtin, package_name_of};
use crate::module_cache::ModuleCache;
use crate::parser::{ImportKind, ImportedNames};
use crate::resolver::ModuleResolver;
use crate::workspace::WorkspaceSet;
use dashmap::{DashMap, DashSet};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Dense handle into the module table. Paths only exist at the graph
/// boundary; everything after the walk works on ids.
pub type ModuleId = usize;

/// The reachable modules, each assigned a dense id. Paths are sorted before
/// ids are handed out, so ids are deterministic for a given file-system
/// state regardless of traversal order.
pub struct ModuleTable {
    paths: Vec<PathBuf>,
    ids: FxHashMap<PathBuf, ModuleId>,
}

impl ModuleTable {
    fn from_reachable(reachable: FxHashSet<PathBuf>) -> Self {
        let mut paths: Vec<PathBuf> = reachable.into_iter().collect();
        paths.sort();
        let ids = paths
            .iter()
            .enumerate()
            .map(|(id, path)| (path.clone(), id))
            .collect();
        Self { paths, ids }
    }

    pub fn id_of(&self, path: &Path) -> Option<ModuleId> {
        self.ids.get(path).copied()
    }

    pub fn path_of(&self, id: ModuleId) -> &Path {
        &self.paths[id]
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// One internal edge: imported names flowing from a referrer to another
/// module in the table. Edges are id pairs; external references never enter
/// the edge list.
#[derive(Debug, Clone)]
pub struct Edge {
    pub target: ModuleId,
    pub names: ImportedNames,
    pub kind: ImportKind,
}

/// The built module graph: the module table, id-pair edges, and the
/// reference sets the classifier projects issues from.
pub struct GraphResult {
    pub table: ModuleTable,
    /// Outgoing edges per module, indexed by referrer id
    pub edges: Vec<Vec<Edge>>,
    /// (package name, referring file), deduplicated
    pub external_refs: FxHashSet<(String, PathBuf)>,
    /// Distinct (referrer, owner, export name) reference triples
    pub export_refs: FxHashSet<(ModuleId, ModuleId, String)>,
    /// (owner, export name, member name) usage triples
    pub member_refs: FxHashSet<(ModuleId, String, String)>,
}

impl GraphResult {
    pub fn is_reachable(&self, path: &Path) -> bool {
        self.table.id_of(path).is_some()
    }

    /// All reachable module paths, sorted.
    pub fn reachable_paths(&self) -> &[PathBuf] {
        self.table.paths()
    }

    /// Reference count of one export after the fixpoint.
    pub fn export_count(&self, module: &Path, name: &str) -> usize {
        let Some(id) = self.table.id_of(module) else { return 0 };
        self.export_refs
            .iter()
            .filter(|(_, owner, export)| *owner == id && export == name)
            .count()
    }

    /// Whether an enum or class member of an export was ever accessed.
    pub fn member_used(&self, module: &Path, export: &str, member: &str) -> bool {
        let Some(id) = self.table.id_of(module) else { return false };
        self.member_refs
            .contains(&(id, export.to_string(), member.to_string()))
    }
}

/// Raw edge recorded during the concurrent walk, before ids exist.
struct RawEdge {
    target: PathBuf,
    names: ImportedNames,
    kind: ImportKind,
}

pub struct ModuleGraph {
    project_files: FxHashSet<PathBuf>,
    resolver: Arc<ModuleResolver>,
    module_cache: Arc<ModuleCache>,
}

impl ModuleGraph {
    pub fn new(
        project_files: FxHashSet<PathBuf>,
        resolver: Arc<ModuleResolver>,
        module_cache: Arc<ModuleCache>,
    ) -> Self {
        Self { project_files, resolver, module_cache }
    }

    /// Wave-parallel BFS from the entry set. Files parse independently; the
    /// visited set serializes discovery so each module is processed once.
    /// The walk runs on paths (discovery is concurrent); the table and the
    /// id-based counting pass are built afterwards.
    pub fn build(
        &self,
        entry_points: &[PathBuf],
        workspaces: &WorkspaceSet,
        diagnostics: &Diagnostics,
    ) -> GraphResult {
        let reachable: DashSet<PathBuf> = DashSet::new();
        let queue: DashSet<PathBuf> = DashSet::new();
        let raw_edges: DashMap<PathBuf, Vec<RawEdge>> = DashMap::new();
        let external_refs: DashSet<(String, PathBuf)> = DashSet::new();

        for entry in entry_points {
            queue.insert(entry.clone());
        }

        while !queue.is_empty() {
            let current_wave: Vec<_> = queue.iter().map(|r| r.clone()).collect();
            queue.clear();

            current_wave.par_iter().for_each(|file| {
                if !reachable.insert(file.clone()) {
                    return; // Already processed
                }

                let record = self.module_cache.get_or_parse(file);
                if let Some(error) = &record.parse_error {
                    diagnostics.warn(WarningKind::Parse, error.clone(), Some(file));
                    return;
                }

                let mut file_edges = Vec::new();
                for import in &record.analysis.imports {
                    match self.resolve_import(file, &import.specifier, workspaces) {
                        Resolution::Internal(path) => {
                            if self.project_files.contains(&path) && !reachable.contains(&path)
                            {
                                queue.insert(path.clone());
                            }
                            file_edges.push(RawEdge {
                                target: path,
                                names: import.names.clone(),
                                kind: import.kind.clone(),
                            });
                        }
                        Resolution::WorkspacePackage(package, path) => {
                            external_refs.insert((package.clone(), file.clone()));
                            if let Some(path) = path {
                                if self.project_files.contains(&path)
                                    && !reachable.contains(&path)
                                {
                                    queue.insert(path.clone());
                                }
                                file_edges.push(RawEdge {
                                    target: path,
                                    names: import.names.clone(),
                                    kind: import.kind.clone(),
                                });
                            }
                        }
                        Resolution::External(package) => {
                            external_refs.insert((package, file.clone()));
                        }
                        Resolution::Builtin => {}
                        Resolution::Unresolved => {
                            diagnostics.warn(
                                WarningKind::Resolution,
                                format!("unresolved import '{}'", import.specifier),
                                Some(file),
                            );
                        }
                    }
                }
                raw_edges.insert(file.clone(), file_edges);
            });
        }

        let table = ModuleTable::from_reachable(reachable.into_iter().collect());

        // Rekey the raw edge map into id pairs. Targets outside the table
        // (assets, unreached files) drop out here.
        let mut edges: Vec<Vec<Edge>> = vec![Vec::new(); table.len()];
        for (path, file_edges) in raw_edges {
            let Some(id) = table.id_of(&path) else { continue };
            edges[id] = file_edges
                .into_iter()
                .filter_map(|raw| {
                    table.id_of(&raw.target).map(|target| Edge {
                        target,
                        names: raw.names,
                        kind: raw.kind,
                    })
                })
                .collect();
        }

        let external_refs: FxHashSet<(String, PathBuf)> = external_refs.into_iter().collect();

        let (export_refs, member_refs) = self.count_references(&table, &edges);

        GraphResult { table, edges, external_refs, export_refs, member_refs }
    }

    fn resolve_import(
        &self,
        from: &Path,
        specifier: &str,
        workspaces: &WorkspaceSet,
    ) -> Resolution {
        if specifier.starts_with('.') || specifier.starts_with('/') {
            return match self.resolver.resolve(from, specifier) {
                Some(path) => Resolution::Internal(path),
                None => Resolution::Unresolved,
            };
        }

        if is_node_builtin(specifier) {
            return Resolution::Builtin;
        }

        // A known workspace package name resolves through that workspace's
        // manifest entry points and still counts as a dependency reference.
        if let Some(package) = package_name_of(specifier) {
            if let Some(ws_idx) = workspaces.by_package_name(package) {
                let ws_dir = workspaces.workspaces[ws_idx].dir.clone();
                let subpath = &specifier[package.len()..];
                let local_specifier =
                    if subpath.is_empty() { ".".to_string() } else { format!(".{subpath}") };
                let path = self.resolver.resolve_in_dir(&ws_dir, &local_specifier);
                return Resolution::WorkspacePackage(package.to_string(), path);
            }
        }

        // Path aliases (tsconfig paths, config `paths`) resolve through the
        // resolver; a hit outside node_modules is an internal file.
        if let Some(path) = self.resolver.resolve(from, specifier) {
            if path.components().any(|c| c.as_os_str() == "node_modules") {
                if let Some(package) = package_name_of(specifier) {
                    return Resolution::External(package.to_string());
                }
            }
            return Resolution::Internal(path);
        }

        match package_name_of(specifier) {
            Some(package) => Resolution::External(package.to_string()),
            None => Resolution::Unresolved,
        }
    }

    /// Sequential counting pass over the id space. Deterministic: ids were
    /// assigned over sorted paths, so traversal order cannot leak into the
    /// report.
    fn count_references(
        &self,
        table: &ModuleTable,
        edges: &[Vec<Edge>],
    ) -> (FxHashSet<(ModuleId, ModuleId, String)>, FxHashSet<(ModuleId, String, String)>) {
        let mut export_refs = FxHashSet::default();
        let mut member_refs = FxHashSet::default();

        for referrer in 0..table.len() {
            let record = self.module_cache.get_or_parse(table.path_of(referrer));

            for edge in &edges[referrer] {
                match &edge.names {
                    ImportedNames::Named(named) => {
                        for name in named {
                            let mut visited = FxHashSet::default();
                            if let Some(owner) =
                                self.export_owner(edge.target, &name.imported, table, edges, &mut visited)
                            {
                                export_refs.insert((referrer, owner, name.imported.clone()));

                                // `Color.Red` on the local binding marks the
                                // member used on the owning export.
                                for (object, property) in &record.analysis.member_accesses {
                                    if object == &name.local {
                                        member_refs.insert((
                                            owner,
                                            name.imported.clone(),
                                            property.clone(),
                                        ));
                                    }
                                }
                            }
                        }
                    }
                    ImportedNames::Namespace => {
                        let mut visited = FxHashSet::default();
                        for (owner, export_name) in
                            self.exports_through_stars(edge.target, table, edges, &mut visited)
                        {
                            export_refs.insert((referrer, owner, export_name.clone()));
                            // Namespace access is opaque to member tracking;
                            // count every member as used rather than report
                            // false positives.
                            let owner_record =
                                self.module_cache.get_or_parse(table.path_of(owner));
                            for export in &owner_record.analysis.exports {
                                if export.name == export_name {
                                    for member in &export.members {
                                        member_refs.insert((
                                            owner,
                                            export_name.clone(),
                                            member.name.clone(),
                                        ));
                                    }
                                }
                            }
                        }
                    }
                    ImportedNames::SideEffect => {}
                }
            }

            // Same-file member accesses on the defining module
            for export in &record.analysis.exports {
                if export.members.is_empty() {
                    continue;
                }
                let Some(local) = &export.local_name else { continue };
                for (object, property) in &record.analysis.member_accesses {
                    if object == local {
                        member_refs.insert((
                            referrer,
                            export.name.clone(),
                            property.clone(),
                        ));
                    }
                }
            }
        }

        (export_refs, member_refs)
    }

    /// The module that actually declares `name`, following `export *` chains
    /// from `module`. Cycles are cut by the visited set.
    fn export_owner(
        &self,
        module: ModuleId,
        name: &str,
        table: &ModuleTable,
        edges: &[Vec<Edge>],
        visited: &mut FxHashSet<ModuleId>,
    ) -> Option<ModuleId> {
        if !visited.insert(module) {
            return None;
        }

        let record = self.module_cache.get_or_parse(table.path_of(module));
        if record.analysis.exports.iter().any(|e| e.name == name) {
            return Some(module);
        }

        // `export *` never forwards default
        if name == "default" {
            return None;
        }

        for edge in &edges[module] {
            if edge.kind != ImportKind::ExportStar {
                continue;
            }
            if let Some(owner) = self.export_owner(edge.target, name, table, edges, visited) {
                return Some(owner);
            }
        }
        None
    }

    /// Every (owner, export name) visible on `module`, own exports plus
    /// `export *` forwards.
    fn exports_through_stars(
        &self,
        module: ModuleId,
        table: &ModuleTable,
        edges: &[Vec<Edge>],
        visited: &mut FxHashSet<ModuleId>,
    ) -> Vec<(ModuleId, String)> {
        if !visited.insert(module) {
            return Vec::new();
        }

        let record = self.module_cache.get_or_parse(table.path_of(module));
        let mut exports: Vec<(ModuleId, String)> = record
            .analysis
            .exports
            .iter()
            .map(|e| (module, e.name.clone()))
            .collect();

        for edge in &edges[module] {
            if edge.kind != ImportKind::ExportStar {
                continue;
            }
            for (owner, name) in self.exports_through_stars(edge.target, table, edges, visited) {
                if name != "default" {
                    exports.push((owner, name));
                }
            }
        }

        exports
    }
}

enum Resolution {
    Internal(PathBuf),
    WorkspacePackage(String, Option<PathBuf>),
    External(String),
    Builtin,
    Unresolved,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::CompilerRegistry;
    use crate::types::KaruConfig;
    use std::collections::BTreeMap;
    use std::fs;
    use tempfile::tempdir;

    struct Fixture {
        _dir: tempfile::TempDir,
        cwd: PathBuf,
        project_files: FxHashSet<PathBuf>,
    }

    impl Fixture {
        fn new(files: &[(&str, &str)]) -> Self {
            let dir = tempdir().unwrap();
            for (name, content) in files {
                let path = dir.path().join(name);
                if let Some(parent) = path.parent() {
                    fs::create_dir_all(parent).unwrap();
                }
                fs::write(&path, content).unwrap();
            }
            let cwd = dir.path().canonicalize().unwrap();
            let project_files = files
                .iter()
                .map(|(name, _)| cwd.join(name))
                .filter(|p| {
                    p.extension().is_some_and(|e| e == "ts" || e == "tsx" || e == "js")
                })
                .collect();
            Self { _dir: dir, cwd, project_files }
        }

        fn build(&self, entries: &[&str]) -> (GraphResult, Diagnostics) {
            let registry = Arc::new(CompilerRegistry::new());
            let resolver = Arc::new(ModuleResolver::with_compilers(
                &self.cwd,
                &registry,
                &BTreeMap::new(),
            ));
            let cache = Arc::new(ModuleCache::new(registry));
            let graph = ModuleGraph::new(self.project_files.clone(), resolver, cache);

            let diagnostics = Diagnostics::new();
            let workspaces =
                WorkspaceSet::enumerate(&self.cwd, &KaruConfig::default(), &diagnostics)
                    .unwrap();
            let entry_paths: Vec<PathBuf> =
                entries.iter().map(|e| self.cwd.join(e)).collect();
            let result = graph.build(&entry_paths, &workspaces, &diagnostics);
            (result, diagnostics)
        }
    }

    #[test]
    fn transitive_reachability() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import { a } from './a';"),
            ("a.ts", "export const a = 1;\nimport './b';"),
            ("b.ts", "export {};"),
            ("lone.ts", "export const lone = 1;"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        assert!(result.is_reachable(&fixture.cwd.join("a.ts")));
        assert!(result.is_reachable(&fixture.cwd.join("b.ts")));
        assert!(!result.is_reachable(&fixture.cwd.join("lone.ts")));
    }

    #[test]
    fn module_ids_are_dense_and_sorted() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import './a';\nimport './b';"),
            ("a.ts", "export {};"),
            ("b.ts", "export {};"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        assert_eq!(result.table.len(), 3);
        let paths = result.reachable_paths();
        let mut sorted = paths.to_vec();
        sorted.sort();
        assert_eq!(paths, sorted.as_slice());
        for (id, path) in paths.iter().enumerate() {
            assert_eq!(result.table.id_of(path), Some(id));
            assert_eq!(result.table.path_of(id), path.as_path());
        }
    }

    #[test]
    fn named_import_counts_specific_export() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import { x } from './lib';\nconsole.log(x);"),
            ("lib.ts", "export const x = 1;\nexport const y = 2;"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        let lib = fixture.cwd.join("lib.ts");
        assert_eq!(result.export_count(&lib, "x"), 1);
        assert_eq!(result.export_count(&lib, "y"), 0);
    }

    #[test]
    fn namespace_import_counts_every_export() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import * as lib from './lib';\nconsole.log(lib);"),
            ("lib.ts", "export const x = 1;\nexport const y = 2;"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        let lib = fixture.cwd.join("lib.ts");
        assert_eq!(result.export_count(&lib, "x"), 1);
        assert_eq!(result.export_count(&lib, "y"), 1);
    }

    #[test]
    fn export_star_forwards_to_declaring_module() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import { deep } from './barrel';\nconsole.log(deep);"),
            ("barrel.ts", "export * from './deep';"),
            ("deep.ts", "export const deep = 1;\nexport const unused = 2;"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        let deep = fixture.cwd.join("deep.ts");
        assert_eq!(result.export_count(&deep, "deep"), 1);
        assert_eq!(result.export_count(&deep, "unused"), 0);
    }

    #[test]
    fn external_packages_are_recorded_not_followed() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import chalk from 'chalk';\nimport fs from 'node:fs';"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        let packages: Vec<_> =
            result.external_refs.iter().map(|(p, _)| p.as_str()).collect();
        assert_eq!(packages, ["chalk"]);
    }

    #[test]
    fn unresolved_relative_import_warns() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import { gone } from './gone';"),
        ]);

        let (_, diagnostics) = fixture.build(&["index.ts"]);

        let warnings = diagnostics.into_sorted();
        assert!(warnings
            .iter()
            .any(|w| w.kind == WarningKind::Resolution && w.message.contains("./gone")));
    }

    #[test]
    fn parse_failure_is_reached_but_edge_free() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import './broken';"),
            ("broken.ts", "const = = broken syntax"),
        ]);

        let (result, diagnostics) = fixture.build(&["index.ts"]);

        assert!(result.is_reachable(&fixture.cwd.join("broken.ts")));
        let warnings = diagnostics.into_sorted();
        assert!(warnings.iter().any(|w| w.kind == WarningKind::Parse));
    }

    #[test]
    fn import_cycles_terminate() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import { a } from './a';\nconsole.log(a);"),
            ("a.ts", "import { b } from './b';\nexport const a = b;"),
            ("b.ts", "import { a } from './a';\nexport const b = 1;"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        assert!(result.is_reachable(&fixture.cwd.join("a.ts")));
        assert!(result.is_reachable(&fixture.cwd.join("b.ts")));
    }

    #[test]
    fn member_access_marks_enum_member_used() {
        let fixture = Fixture::new(&[
            ("package.json", r#"{ "name": "t" }"#),
            ("index.ts", "import { Color } from './color';\nconst c = Color.Red;"),
            ("color.ts", "export enum Color { Red, Green }"),
        ]);

        let (result, _) = fixture.build(&["index.ts"]);

        let color = fixture.cwd.join("color.ts");
        assert!(result.member_used(&color, "Color", "Red"));
        assert!(!result.member_used(&color, "Color", "Green"));
    }
}
