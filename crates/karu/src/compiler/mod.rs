mod mdx;
mod registry;
mod scss;
mod svelte;
mod vue;

pub use mdx::MdxCompiler;
pub use registry::CompilerRegistry;
pub use scss::ScssCompiler;
pub use svelte::SvelteCompiler;
pub use vue::VueCompiler;

use crate::parser::ImportInfo;
use rustc_hash::FxHashSet;
use std::path::Path;
use thiserror::Error;

/// Error types for compiler operations
#[derive(Error, Debug)]
pub enum CompilerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Compilation failed: {0}")]
    CompileFailed(String),
}

/// Output of compiling a foreign file: the imports the analyzer would have
/// found in an equivalent JS/TS source.
#[derive(Debug, Default)]
pub struct CompilerOutput {
    pub imports: Vec<ImportInfo>,
}

/// A compiler turns a non-JS/TS file into import information so foreign
/// syntaxes participate in the module graph.
pub trait Compiler: Send + Sync {
    /// Extensions (with dot) this compiler handles
    fn extensions(&self) -> &[&str];

    /// Auto-enablement predicate over the project's declared dependencies
    fn should_enable(&self, deps: &FxHashSet<String>) -> bool;

    fn compile(&self, content: &str, file_path: &Path) -> Result<CompilerOutput, CompilerError>;
}

/// Extract the content of `<script>` blocks (plain and setup/module variants).
/// Shared by the Vue and Svelte compilers.
fn script_blocks(content: &str) -> Vec<&str> {
    let mut blocks = Vec::new();
    let mut rest = content;

    while let Some(open) = rest.find("<script") {
        let after_open = &rest[open..];
        let Some(tag_end) = after_open.find('>') else { break };
        let body_start = open + tag_end + 1;
        let Some(close) = rest[body_start..].find("</script>") else { break };
        blocks.push(&rest[body_start..body_start + close]);
        rest = &rest[body_start + close + "</script>".len()..];
    }

    blocks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_blocks_finds_multiple() {
        let content = "<script lang=\"ts\">import a from './a';</script>\n<template></template>\n<script setup>import b from './b';</script>";
        let blocks = script_blocks(content);
        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].contains("./a"));
        assert!(blocks[1].contains("./b"));
    }

    #[test]
    fn script_blocks_handles_no_script() {
        assert!(script_blocks("<template><div/></template>").is_empty());
    }
}
