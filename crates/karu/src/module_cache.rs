use crate::compiler::CompilerRegistry;
use crate::parser::{analyze_module, ModuleAnalysis, ParseError};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Analysis of one file, or the reason it has none.
#[derive(Debug)]
pub struct ModuleRecord {
    pub analysis: ModuleAnalysis,
    /// Set when the analyzer failed; the file then contributes no edges but
    /// still counts as reached.
    pub parse_error: Option<String>,
}

impl ModuleRecord {
    fn ok(analysis: ModuleAnalysis) -> Self {
        Self { analysis, parse_error: None }
    }

    fn failed(error: String) -> Self {
        Self { analysis: ModuleAnalysis::default(), parse_error: Some(error) }
    }
}

/// Thread-safe cache of per-file analyses, shared between the graph walk and
/// any plugin that inspects source files. A file is parsed at most once per
/// run, keyed by its canonical path.
pub struct ModuleCache {
    cache: DashMap<PathBuf, Arc<ModuleRecord>>,
    compiler_registry: Arc<CompilerRegistry>,
}

impl ModuleCache {
    pub fn new(compiler_registry: Arc<CompilerRegistry>) -> Self {
        Self { cache: DashMap::new(), compiler_registry }
    }

    /// Get or compute the analysis for a file. Foreign extensions with a
    /// registered compiler are pre-transformed; without one they analyze to
    /// an empty (leaf) module.
    pub fn get_or_parse(&self, path: &Path) -> Arc<ModuleRecord> {
        if let Some(record) = self.cache.get(path) {
            return Arc::clone(&record);
        }

        let record = Arc::new(self.parse(path));
        self.cache.insert(path.to_path_buf(), Arc::clone(&record));
        record
    }

    fn parse(&self, path: &Path) -> ModuleRecord {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default();

        if let Some(compiler) = self.compiler_registry.get(&ext) {
            let content = match std::fs::read_to_string(path) {
                Ok(c) => c,
                Err(e) => return ModuleRecord::failed(e.to_string()),
            };
            return match compiler.compile(&content, path) {
                Ok(output) => ModuleRecord::ok(ModuleAnalysis {
                    imports: output.imports,
                    ..Default::default()
                }),
                Err(e) => ModuleRecord::failed(e.to_string()),
            };
        }

        // Foreign syntax without a compiler: opaque leaf, not a parse failure.
        if !crate::types::DEFAULT_EXTENSIONS.contains(&ext.as_str()) {
            return ModuleRecord::ok(ModuleAnalysis::default());
        }

        match analyze_module(path) {
            Ok(analysis) => ModuleRecord::ok(analysis),
            Err(ParseError::IoError(e)) => ModuleRecord::failed(e.to_string()),
            Err(ParseError::ParseFailed(message)) => ModuleRecord::failed(message),
        }
    }

    /// Get cached info without parsing (returns None if not cached)
    pub fn get(&self, path: &Path) -> Option<Arc<ModuleRecord>> {
        self.cache.get(path).map(|r| Arc::clone(&r))
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn cache() -> ModuleCache {
        ModuleCache::new(Arc::new(CompilerRegistry::new()))
    }

    #[test]
    fn parses_once_and_caches() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("a.ts");
        fs::write(&file, "import './b';").unwrap();

        let cache = cache();
        let first = cache.get_or_parse(&file);
        let second = cache.get_or_parse(&file);

        assert_eq!(first.analysis.imports.len(), 1);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn missing_file_is_a_parse_failure() {
        let dir = tempdir().unwrap();
        let cache = cache();
        let record = cache.get_or_parse(&dir.path().join("absent.ts"));
        assert!(record.parse_error.is_some());
        assert!(record.analysis.imports.is_empty());
    }

    #[test]
    fn foreign_file_without_compiler_is_leaf() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("style.scss");
        fs::write(&file, "@use './other';").unwrap();

        let cache = cache();
        let record = cache.get_or_parse(&file);
        assert!(record.parse_error.is_none());
        assert!(record.analysis.imports.is_empty());
    }
}
