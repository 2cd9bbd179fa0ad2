use super::{Compiler, CompilerError, CompilerOutput};
use crate::parser::{ImportInfo, ImportKind};
use regex::Regex;
use rustc_hash::FxHashSet;
use std::path::Path;
use std::sync::OnceLock;

/// SCSS/Sass compiler: extracts the loads of @use, @import, and @forward
/// rules so stylesheets participate in the module graph and bare `~package`
/// loads surface as dependency references.
pub struct ScssCompiler;

impl ScssCompiler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ScssCompiler {
    fn default() -> Self {
        Self::new()
    }
}

fn load_rule_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        // The rule head; the quoted load list after it is scanned separately
        // because @import takes comma-separated lists:
        //   @import 'base', 'utilities';
        Regex::new(r"^\s*@(?:use|import|forward)\s+(.+)$").unwrap()
    })
}

fn quoted_load_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"['"]([^'"]+)['"]"#).unwrap())
}

/// Cut a `//` line comment, leaving `https://...` inside a load untouched.
fn strip_line_comment(line: &str) -> &str {
    for (idx, _) in line.match_indices("//") {
        if idx == 0 || line.as_bytes()[idx - 1] != b':' {
            return &line[..idx];
        }
    }
    line
}

/// Loads that stay plain CSS at-rules: sass does not resolve them.
fn is_css_passthrough(load: &str) -> bool {
    load.ends_with(".css") || load.starts_with("http://") || load.starts_with("https://")
}

impl Compiler for ScssCompiler {
    fn extensions(&self) -> &[&str] {
        &[".scss", ".sass"]
    }

    fn should_enable(&self, deps: &FxHashSet<String>) -> bool {
        deps.contains("sass") || deps.contains("sass-embedded") || deps.contains("node-sass")
    }

    fn compile(&self, content: &str, _file_path: &Path) -> Result<CompilerOutput, CompilerError> {
        let mut imports = Vec::new();

        for line in content.lines() {
            let code = strip_line_comment(line);
            let Some(rule) = load_rule_regex().captures(code) else { continue };

            for capture in quoted_load_regex().captures_iter(&rule[1]) {
                let load = &capture[1];

                // Built-in sass modules (sass:math, sass:color, ...)
                if load.starts_with("sass:") {
                    continue;
                }
                if is_css_passthrough(load) {
                    continue;
                }

                // Webpack-style `~bootstrap/...` loads name an installed
                // package; the bare specifier lets the graph attribute the
                // dependency.
                let specifier = load.strip_prefix('~').unwrap_or(load);
                imports.push(ImportInfo::side_effect(specifier, ImportKind::Static));
            }
        }

        Ok(CompilerOutput { imports })
    }
}
