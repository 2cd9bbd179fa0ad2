use super::{Compiler, MdxCompiler, ScssCompiler, SvelteCompiler, VueCompiler};
use crate::types::CompilerConfig;
use rustc_hash::{FxHashMap, FxHashSet};
use std::sync::Arc;

/// Registry of compilers mapped by file extension
pub struct CompilerRegistry {
    /// Map of extension (with dot) -> compiler
    compilers: FxHashMap<String, Arc<dyn Compiler>>,
}

impl CompilerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self { compilers: FxHashMap::default() }
    }

    /// Register a compiler for all its supported extensions
    pub fn register(&mut self, compiler: Arc<dyn Compiler>) {
        for ext in compiler.extensions() {
            self.compilers.insert(ext.to_string(), Arc::clone(&compiler));
        }
    }

    /// Build the registry from config overrides, falling back to dependency
    /// auto-detection per compiler.
    pub fn from_config(config: &CompilerConfig, deps: &FxHashSet<String>) -> Self {
        let mut registry = Self::new();

        let builtins: Vec<(Option<bool>, Arc<dyn Compiler>)> = vec![
            (config.scss, Arc::new(ScssCompiler::new())),
            (config.vue, Arc::new(VueCompiler::new())),
            (config.svelte, Arc::new(SvelteCompiler::new())),
            (config.mdx, Arc::new(MdxCompiler::new())),
        ];

        for (forced, compiler) in builtins {
            if forced.unwrap_or_else(|| compiler.should_enable(deps)) {
                registry.register(compiler);
            }
        }

        registry
    }

    /// Get compiler for a file extension (with dot, e.g., ".scss")
    pub fn get(&self, extension: &str) -> Option<&Arc<dyn Compiler>> {
        self.compilers.get(extension)
    }

    /// Get all registered extensions
    pub fn extensions(&self) -> impl Iterator<Item = &String> {
        self.compilers.keys()
    }

    /// Check if a compiler is registered for the given extension
    pub fn has_compiler(&self, extension: &str) -> bool {
        self.compilers.contains_key(extension)
    }
}

impl Default for CompilerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
