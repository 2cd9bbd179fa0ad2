use crate::plugin::EntryPattern;
use crate::types::DEFAULT_EXTENSIONS;
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};

/// Result of a single filesystem walk that collects both entry and project files
pub struct ProjectIndex {
    pub entry_files: FxHashSet<PathBuf>,
    pub project_files: FxHashSet<PathBuf>,
}

/// A compiled glob set anchored to a base directory. Workspace-level entry
/// globs anchor at the workspace root; plugin-contributed patterns may
/// anchor elsewhere (a tool config directory, for example). Matching is
/// against the canonical path so symlinked bases behave.
struct ScopedGlobs {
    set: GlobSet,
    base: PathBuf,
}

impl ScopedGlobs {
    fn anchored(patterns: &[String], base: &Path) -> Option<Self> {
        let base = base.canonicalize().ok()?;
        Some(Self { set: compile_globset(patterns), base })
    }

    fn matches(&self, canonical: &Path) -> bool {
        match canonical.strip_prefix(&self.base) {
            Ok(relative) => self.set.is_match(&*relative.to_string_lossy()),
            Err(_) => false,
        }
    }
}

/// Locate the innermost brace group of a pattern: the first `}` paired with
/// the nearest `{` before it.
fn brace_group(pattern: &str) -> Option<(usize, usize)> {
    let end = pattern.find('}')?;
    let start = pattern[..end].rfind('{')?;
    Some((start, end))
}

/// Expand brace patterns like `**/*.{ts,tsx}` into plain alternatives the
/// glob machinery understands. Worklist-driven so nested groups expand
/// without recursion.
pub(crate) fn expand_brace_pattern(pattern: &str) -> Vec<String> {
    let mut expanded = Vec::new();
    let mut work = vec![pattern.to_string()];

    while let Some(candidate) = work.pop() {
        match brace_group(&candidate) {
            Some((start, end)) => {
                let prefix = &candidate[..start];
                let suffix = &candidate[end + 1..];
                for alternative in candidate[start + 1..end].split(',') {
                    work.push(format!("{prefix}{alternative}{suffix}"));
                }
            }
            None => expanded.push(candidate),
        }
    }

    // Nested groups can expand to the same alternative twice
    expanded.sort();
    expanded.dedup();
    expanded
}

/// Compile glob patterns into a GlobSet, expanding braces and shedding the
/// `./` prefix entries and manifest paths often carry.
pub fn compile_globset(patterns: &[String]) -> GlobSet {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let normalized = pattern.trim_start_matches("./");
        for expanded in expand_brace_pattern(normalized) {
            if let Ok(glob) = Glob::new(&expanded) {
                builder.add(glob);
            }
        }
    }
    builder.build().unwrap_or_else(|_| GlobSetBuilder::new().build().unwrap())
}

pub struct Collector {
    cwd: PathBuf,
    /// Workspace entry globs and plugin patterns, each with its anchor
    entry: Vec<ScopedGlobs>,
    project: GlobSet,
    project_negated: GlobSet,
    parseable_extensions: Vec<String>,
    gitignore: bool,
    excluded_dirs: Vec<PathBuf>,
}

impl Collector {
    pub fn new(
        cwd: &Path,
        entry_patterns: &[String],
        project_patterns: &[String],
        plugin_patterns: &[EntryPattern],
        compiler_extensions: &[String],
        gitignore: bool,
        excluded_dirs: &[PathBuf],
    ) -> Self {
        // `!`-prefixed project globs subtract from the positive set
        let (positive, negated): (Vec<String>, Vec<String>) =
            project_patterns.iter().cloned().partition(|p| !p.starts_with('!'));
        let negated: Vec<String> =
            negated.into_iter().map(|p| p.trim_start_matches('!').to_string()).collect();

        let mut entry = Vec::new();
        if let Some(scoped) = ScopedGlobs::anchored(entry_patterns, cwd) {
            entry.push(scoped);
        }
        for pattern in plugin_patterns {
            let base = match &pattern.base {
                Some(base) => cwd.join(base),
                None => cwd.to_path_buf(),
            };
            let patterns = std::slice::from_ref(&pattern.pattern);
            // A base that does not exist cannot anchor matches
            if let Some(scoped) = ScopedGlobs::anchored(patterns, &base) {
                entry.push(scoped);
            }
        }

        let mut parseable_extensions: Vec<String> =
            DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect();
        parseable_extensions.extend(compiler_extensions.iter().cloned());

        Self {
            cwd: cwd.to_path_buf(),
            entry,
            project: compile_globset(&positive),
            project_negated: compile_globset(&negated),
            parseable_extensions,
            gitignore,
            excluded_dirs: excluded_dirs.to_vec(),
        }
    }

    fn has_parseable_extension(&self, path: &Path) -> bool {
        let ext = match path.extension().and_then(|e| e.to_str()) {
            Some(e) => format!(".{e}"),
            None => return false,
        };
        self.parseable_extensions.iter().any(|known| *known == ext)
    }

    /// node_modules and nested workspace subtrees are pruned during the
    /// walk itself, not filtered afterwards.
    fn walker(&self) -> ignore::Walk {
        let mut builder = WalkBuilder::new(&self.cwd);
        builder.hidden(false).git_ignore(self.gitignore);

        let mut overrides = OverrideBuilder::new(&self.cwd);
        overrides.add("!**/node_modules/").ok();
        for dir in &self.excluded_dirs {
            if let Ok(rel) = dir.strip_prefix(&self.cwd) {
                overrides.add(&format!("!{}/", rel.to_string_lossy().replace('\\', "/"))).ok();
            }
        }
        if let Ok(built) = overrides.build() {
            builder.overrides(built);
        }

        builder.build()
    }

    /// Collect all files in a single walk, categorizing them as entry or
    /// project files. An entry wins over a negated project pattern and is
    /// silently promoted into the project set.
    pub fn collect(&self) -> ProjectIndex {
        let mut entry_files = FxHashSet::default();
        let mut project_files = FxHashSet::default();

        for item in self.walker().flatten() {
            let path = item.path();

            if !path.is_file() {
                continue;
            }

            let relative = path.strip_prefix(&self.cwd).unwrap_or(path);
            let relative_str = relative.to_string_lossy();

            let canonical = match path.canonicalize() {
                Ok(c) => c,
                Err(_) => continue,
            };

            let is_entry = self.entry.iter().any(|scoped| scoped.matches(&canonical));

            // Plain project membership requires a parseable (or
            // compiler-handled) extension so assets don't show up as unused
            // files.
            let is_project = self.project.is_match(&*relative_str)
                && !self.project_negated.is_match(&*relative_str)
                && self.has_parseable_extension(path);

            if is_project {
                project_files.insert(canonical.clone());
            }

            if is_entry && self.has_parseable_extension(path) {
                project_files.insert(canonical.clone());
                entry_files.insert(canonical);
            }
        }

        ProjectIndex { entry_files, project_files }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn collect(dir: &Path, entry: &[&str], project: &[&str]) -> ProjectIndex {
        let collector = Collector::new(
            dir,
            &entry.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
            &project.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
            &[],
            &[],
            true,
            &[],
        );
        collector.collect()
    }

    #[test]
    fn collects_project_and_entry_files() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/index.ts"), "").unwrap();
        fs::write(dir.path().join("src/other.ts"), "").unwrap();
        fs::write(dir.path().join("src/readme.md"), "").unwrap();

        let cwd = dir.path().canonicalize().unwrap();
        let index = collect(&cwd, &["src/index.ts"], &["src/**/*.ts"]);

        assert_eq!(index.entry_files.len(), 1);
        assert_eq!(index.project_files.len(), 2);
    }

    #[test]
    fn negated_project_pattern_excludes() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/a.ts"), "").unwrap();
        fs::write(dir.path().join("src/a.test.ts"), "").unwrap();

        let cwd = dir.path().canonicalize().unwrap();
        let index = collect(&cwd, &[], &["src/**/*.ts", "!src/**/*.test.ts"]);

        assert_eq!(index.project_files.len(), 1);
        assert!(index.project_files.iter().next().unwrap().ends_with("a.ts"));
    }

    #[test]
    fn entry_wins_over_negated_project() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/setup.test.ts"), "").unwrap();

        let cwd = dir.path().canonicalize().unwrap();
        let index =
            collect(&cwd, &["src/setup.test.ts"], &["src/**/*.ts", "!src/**/*.test.ts"]);

        assert_eq!(index.entry_files.len(), 1);
        // promoted into the project set despite the negation
        assert_eq!(index.project_files.len(), 1);
    }

    #[test]
    fn plugin_pattern_anchors_at_its_base() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("apps/web/src")).unwrap();
        fs::write(dir.path().join("apps/web/src/story.tsx"), "").unwrap();
        fs::write(dir.path().join("story.tsx"), "").unwrap();

        let cwd = dir.path().canonicalize().unwrap();
        let plugin_patterns =
            vec![EntryPattern::with_base("src/*.tsx", "apps/web")];
        let collector = Collector::new(
            &cwd,
            &[],
            &["**/*.tsx".to_string()],
            &plugin_patterns,
            &[],
            true,
            &[],
        );
        let index = collector.collect();

        assert_eq!(index.entry_files.len(), 1);
        assert!(index
            .entry_files
            .iter()
            .next()
            .unwrap()
            .ends_with("apps/web/src/story.tsx"));
    }

    #[test]
    fn excluded_dirs_are_pruned() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("packages/a/src")).unwrap();
        fs::create_dir(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/root.ts"), "").unwrap();
        fs::write(dir.path().join("packages/a/src/sub.ts"), "").unwrap();

        let cwd = dir.path().canonicalize().unwrap();
        let excluded = vec![cwd.join("packages/a")];
        let collector = Collector::new(
            &cwd,
            &[],
            &["**/*.ts".to_string()],
            &[],
            &[],
            true,
            &excluded,
        );
        let index = collector.collect();

        assert_eq!(index.project_files.len(), 1);
        assert!(index.project_files.iter().next().unwrap().ends_with("root.ts"));
    }

    #[test]
    fn brace_expansion_handles_nesting() {
        let mut flat = expand_brace_pattern("*.{ts,tsx}");
        flat.sort();
        assert_eq!(flat, ["*.ts", "*.tsx"]);

        let mut nested = expand_brace_pattern("**/*.{mdx,stories.{ts,tsx}}");
        nested.sort();
        assert_eq!(
            nested,
            ["**/*.mdx", "**/*.stories.ts", "**/*.stories.tsx"]
        );

        assert_eq!(expand_brace_pattern("plain.ts"), ["plain.ts"]);
    }

    #[test]
    fn brace_expansion_matches_multiple_extensions() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.ts"), "").unwrap();
        fs::write(dir.path().join("b.tsx"), "").unwrap();

        let cwd = dir.path().canonicalize().unwrap();
        let index = collect(&cwd, &[], &["*.{ts,tsx}"]);

        assert_eq!(index.project_files.len(), 2);
    }
}
