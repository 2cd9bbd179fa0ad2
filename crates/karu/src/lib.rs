pub mod binaries;
pub mod classifier;
pub mod cli;
pub mod collector;
pub mod compiler;
pub mod dependencies;
pub mod diagnostics;
pub mod graph;
pub mod manifest;
pub mod module_cache;
pub mod parser;
pub mod plugin;
pub mod reporter;
pub mod resolver;
pub mod types;
pub mod workspace;

use std::path::PathBuf;
use std::sync::Arc;

pub use compiler::CompilerRegistry;
pub use reporter::Report;
pub use types::{
    CompilerConfig, FileConfig, Issue, IssueKind, KaruConfig, KaruError, PluginOverrides,
    DEFAULT_EXTENSIONS, FOREIGN_FILE_EXTENSIONS,
};

use classifier::{classify, ClassifierInput};
use collector::{Collector, ProjectIndex};
use dependencies::analyze_dependencies;
use diagnostics::Diagnostics;
use graph::ModuleGraph;
use module_cache::ModuleCache;
use plugin::PluginHost;
use resolver::ModuleResolver;
use rustc_hash::{FxHashMap, FxHashSet};
use workspace::WorkspaceSet;

struct Pipeline {
    cwd: PathBuf,
    workspaces: WorkspaceSet,
    indexes: Vec<Option<ProjectIndex>>,
    entry_files: Vec<PathBuf>,
    project_files: FxHashSet<PathBuf>,
    plugin_refs: FxHashMap<usize, FxHashSet<String>>,
    plugin_ignores: FxHashMap<usize, Vec<String>>,
    module_cache: Arc<ModuleCache>,
    resolver: Arc<ModuleResolver>,
}

/// Enumerate workspaces, run plugins, and collect the project and entry
/// sets. Shared by the full analysis and the reachability query.
fn prepare(config: &KaruConfig, diagnostics: &Diagnostics) -> Result<Pipeline, KaruError> {
    let cwd = config.cwd.canonicalize()?;

    let workspaces = WorkspaceSet::enumerate(&cwd, config, diagnostics)?;

    // Compiler enablement looks at every manifest: in a monorepo the tool
    // dependency usually lives in one package, not the root.
    let mut all_deps = FxHashSet::default();
    for ws in &workspaces.workspaces {
        all_deps.extend(ws.manifest.all_dependencies());
    }

    let registry = Arc::new(CompilerRegistry::from_config(&config.compilers, &all_deps));
    let compiler_extensions: Vec<String> = registry.extensions().cloned().collect();

    let resolver = Arc::new(ModuleResolver::with_compilers(&cwd, &registry, &config.paths));
    let module_cache = Arc::new(ModuleCache::new(Arc::clone(&registry)));

    let host = PluginHost::new(&config.plugins, config.production);

    let mut indexes: Vec<Option<ProjectIndex>> = Vec::new();
    let mut entry_files: Vec<PathBuf> = Vec::new();
    let mut project_files: FxHashSet<PathBuf> = FxHashSet::default();
    let mut plugin_refs: FxHashMap<usize, FxHashSet<String>> = FxHashMap::default();
    let mut plugin_ignores: FxHashMap<usize, Vec<String>> = FxHashMap::default();

    for (ws_idx, ws) in workspaces.workspaces.iter().enumerate() {
        if !ws.selected {
            indexes.push(None);
            continue;
        }

        let plugin_result = host.run(ws, diagnostics);

        let mut entry_patterns = ws.config.entry.clone();
        for path in ws.manifest.entry_paths() {
            entry_patterns.push(path.trim_start_matches("./").to_string());
        }

        let mut project_patterns = ws.config.project.clone();
        project_patterns.extend(plugin_result.project.iter().cloned());

        // Nested workspaces own their subtrees
        let children: Vec<PathBuf> = workspaces
            .workspaces
            .iter()
            .filter(|other| other.dir != ws.dir && other.dir.starts_with(&ws.dir))
            .map(|other| other.dir.clone())
            .collect();

        let collector = Collector::new(
            &ws.dir,
            &entry_patterns,
            &project_patterns,
            &plugin_result.entries,
            &compiler_extensions,
            config.gitignore,
            &children,
        );
        let index = collector.collect();

        entry_files.extend(index.entry_files.iter().cloned());
        project_files.extend(index.project_files.iter().cloned());
        if !plugin_result.references.is_empty() {
            plugin_refs.insert(ws_idx, plugin_result.references);
        }
        if !plugin_result.ignores.is_empty() {
            plugin_ignores.insert(ws_idx, plugin_result.ignores);
        }
        indexes.push(Some(index));
    }

    if entry_files.is_empty() {
        return Err(KaruError::NoEntryFiles(config.entry.clone()));
    }
    entry_files.sort();
    entry_files.dedup();

    Ok(Pipeline {
        cwd,
        workspaces,
        indexes,
        entry_files,
        project_files,
        plugin_refs,
        plugin_ignores,
        module_cache,
        resolver,
    })
}

/// Run the full analysis: build the module graph from the entry set,
/// attribute dependencies, and classify issues.
///
/// # Example
/// ```no_run
/// use karu::{analyze_project, classifier::selected_kinds, KaruConfig};
/// use std::path::PathBuf;
///
/// let config = KaruConfig {
///     entry: vec!["src/index.ts".to_string()],
///     cwd: PathBuf::from("."),
///     ..Default::default()
/// };
///
/// let report = analyze_project(&config, &selected_kinds(&[], &[])).unwrap();
/// println!("{} issues", report.issue_count);
/// ```
pub fn analyze_project(
    config: &KaruConfig,
    included: &FxHashSet<IssueKind>,
) -> Result<Report, KaruError> {
    let diagnostics = Diagnostics::new();
    let pipeline = prepare(config, &diagnostics)?;

    let graph = ModuleGraph::new(
        pipeline.project_files.clone(),
        Arc::clone(&pipeline.resolver),
        Arc::clone(&pipeline.module_cache),
    );
    let result = graph.build(&pipeline.entry_files, &pipeline.workspaces, &diagnostics);

    let dependency_analysis =
        analyze_dependencies(&pipeline.workspaces, &result.external_refs, &pipeline.plugin_refs);

    let issues = classify(&ClassifierInput {
        cwd: &pipeline.cwd,
        workspaces: &pipeline.workspaces,
        indexes: &pipeline.indexes,
        graph: &result,
        dependencies: &dependency_analysis,
        module_cache: &pipeline.module_cache,
        config,
        plugin_ignores: &pipeline.plugin_ignores,
        included,
    });

    let total_files = pipeline.project_files.len();
    Ok(Report::new(issues, diagnostics.into_sorted(), total_files))
}

/// Find all files reachable from the entry set.
///
/// Returns the files that are directly or transitively imported from the
/// entry points, sorted.
pub fn find_reachable_files(config: &KaruConfig) -> Result<Vec<PathBuf>, KaruError> {
    let diagnostics = Diagnostics::new();
    let pipeline = prepare(config, &diagnostics)?;

    let graph = ModuleGraph::new(
        pipeline.project_files.clone(),
        Arc::clone(&pipeline.resolver),
        Arc::clone(&pipeline.module_cache),
    );
    let result = graph.build(&pipeline.entry_files, &pipeline.workspaces, &diagnostics);

    Ok(result.reachable_paths().to_vec())
}
