use super::{script_blocks, Compiler, CompilerError, CompilerOutput};
use crate::parser::analyze_source;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Vue SFC compiler: feeds `<script>` / `<script setup>` blocks through the
/// analyzer so component imports participate in the graph.
pub struct VueCompiler;

impl VueCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for VueCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler for VueCompiler {
    fn extensions(&self) -> &[&str] {
        &[".vue"]
    }

    fn should_enable(&self, deps: &FxHashSet<String>) -> bool {
        deps.contains("vue") || deps.contains("nuxt")
    }

    fn compile(&self, content: &str, file_path: &Path) -> Result<CompilerOutput, CompilerError> {
        let synthetic = file_path.with_extension("vue.ts");
        let mut imports = Vec::new();

        for block in script_blocks(content) {
            match analyze_source(block, &synthetic) {
                Ok(analysis) => imports.extend(analysis.imports),
                Err(e) => {
                    return Err(CompilerError::CompileFailed(format!(
                        "script block in {}: {e:?}",
                        file_path.display()
                    )))
                }
            }
        }

        Ok(CompilerOutput { imports })
    }
}
