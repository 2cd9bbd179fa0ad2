use super::{Compiler, CompilerError, CompilerOutput};
use crate::parser::{ImportInfo, ImportKind};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::OnceLock;

/// MDX compiler: ESM import/export lines are valid at the top level of an
/// MDX document; everything else is markdown and ignored.
pub struct MdxCompiler;

impl MdxCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MdxCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn mdx_import_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // Matches the specifier of import/export-from lines:
        //   import Chart from './chart';
        //   export { x } from "./x";
        Regex::new(r#"(?m)^\s*(?:import|export)\b[^'"\n]*from\s+['"]([^'"]+)['"]"#).unwrap()
    })
}

fn mdx_bare_import_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // Side-effect imports: import './styles.css';
        Regex::new(r#"(?m)^\s*import\s+['"]([^'"]+)['"]"#).unwrap()
    })
}

impl Compiler for MdxCompiler {
    fn extensions(&self) -> &[&str] {
        &[".mdx"]
    }

    fn should_enable(&self, deps: &FxHashSet<String>) -> bool {
        deps.contains("@mdx-js/react")
            || deps.contains("@mdx-js/mdx")
            || deps.contains("@next/mdx")
            || deps.contains("@astrojs/mdx")
    }

    fn compile(&self, content: &str, _file_path: &Path) -> Result<CompilerOutput, CompilerError> {
        let mut imports = Vec::new();

        for cap in mdx_import_regex().captures_iter(content) {
            imports.push(ImportInfo::side_effect(&cap[1], ImportKind::Static));
        }
        for cap in mdx_bare_import_regex().captures_iter(content) {
            imports.push(ImportInfo::side_effect(&cap[1], ImportKind::SideEffect));
        }

        Ok(CompilerOutput { imports })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mdx_import_lines() {
        let compiler = MdxCompiler::new();
        let content = r#"import Chart from './chart';
import './theme.css';

# Title

Some text with `import fake from './nope'` in a code span is still matched
only when the line starts with import.
"#;

        let output = compiler.compile(content, Path::new("doc.mdx")).unwrap();

        let sources: Vec<_> = output.imports.iter().map(|i| i.specifier.as_str()).collect();
        assert!(sources.contains(&"./chart"));
        assert!(sources.contains(&"./theme.css"));
    }

    #[test]
    fn mdx_should_enable() {
        let compiler = MdxCompiler::new();
        let mut deps = FxHashSet::default();
        assert!(!compiler.should_enable(&deps));
        deps.insert("@mdx-js/react".to_string());
        assert!(compiler.should_enable(&deps));
    }
}
