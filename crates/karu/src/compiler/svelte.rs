use super::{script_blocks, Compiler, CompilerError, CompilerOutput};
use crate::parser::analyze_source;
use rustc_hash::FxHashSet;
use std::path::Path;

/// Svelte compiler: analyzes `<script>` and `<script context="module">`
/// blocks for imports.
pub struct SvelteCompiler;

impl SvelteCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SvelteCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler for SvelteCompiler {
    fn extensions(&self) -> &[&str] {
        &[".svelte"]
    }

    fn should_enable(&self, deps: &FxHashSet<String>) -> bool {
        deps.contains("svelte") || deps.contains("@sveltejs/kit")
    }

    fn compile(&self, content: &str, file_path: &Path) -> Result<CompilerOutput, CompilerError> {
        let synthetic = file_path.with_extension("svelte.ts");
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svelte_script_imports() {
        let compiler = SvelteCompiler::new();
        let content = r#"<script>
import Nested from './Nested.svelte';
import { store } from './store';
</script>
<h1>hi</h1>
"#;

        let output = compiler.compile(content, Path::new("App.svelte")).unwrap();

        let sources: Vec<_> = output.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert_eq!(sources, ["./Nested.svelte", "./store"]);
    }

    #[test]
    fn svelte_should_enable() {
        let compiler = SvelteCompiler::new();
        let mut deps = FxHashSet::default();
        assert!(!compiler.should_enable(&deps));
        deps.insert("svelte".to_string());
        assert!(compiler.should_enable(&deps));
    }
}
