use crate::compiler::CompilerRegistry;
use crate::types::{DEFAULT_EXTENSIONS, FOREIGN_FILE_EXTENSIONS};
use oxc_resolver::{AliasValue, ResolveOptions, Resolver, TsconfigOptions, TsconfigReferences};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub struct ModuleResolver {
    resolver: Resolver,
}

impl ModuleResolver {
    pub fn new(cwd: &Path) -> Self {
        Self::with_options(cwd, &[], &BTreeMap::new())
    }

    /// Create a resolver with additional compiler extensions and config-level
    /// path aliases (tsconfig-style `paths`, `/*` suffixes stripped).
    pub fn with_options(
        cwd: &Path,
        additional_extensions: &[String],
        paths: &BTreeMap<String, Vec<String>>,
    ) -> Self {
        let tsconfig_path = cwd.join("tsconfig.json");
        let tsconfig = if tsconfig_path.exists() {
            Some(TsconfigOptions {
                config_file: tsconfig_path,
                references: TsconfigReferences::Auto,
            })
        } else {
            None
        };

        // Start with default JS/TS extensions
        let mut extensions: Vec<String> =
            DEFAULT_EXTENSIONS.iter().map(|s| (*s).to_string()).collect();

        // Add foreign file extensions (assets like images, fonts, etc.)
        for ext in FOREIGN_FILE_EXTENSIONS {
            extensions.push((*ext).to_string());
        }

        // Add compiler extensions
        for ext in additional_extensions {
            if !extensions.contains(ext) {
                extensions.push(ext.clone());
            }
        }

        let alias = paths
            .iter()
            .map(|(key, targets)| {
                let key = key.trim_end_matches("/*").to_string();
                let values = targets
                    .iter()
                    .map(|target| {
                        let target = target.trim_end_matches("/*");
                        AliasValue::Path(cwd.join(target).to_string_lossy().into_owned())
                    })
                    .collect();
                (key, values)
            })
            .collect();

        let options = ResolveOptions {
            builtin_modules: true,
            tsconfig,
            alias,
            extensions,
            extension_alias: vec![
                (".js".into(), vec![".js".into(), ".ts".into(), ".tsx".into()]),
                (".jsx".into(), vec![".jsx".into(), ".tsx".into()]),
                (".mjs".into(), vec![".mjs".into(), ".mts".into()]),
                (".cjs".into(), vec![".cjs".into(), ".cts".into()]),
            ],
            condition_names: vec![
                "import".into(),
                "require".into(),
                "node".into(),
                "default".into(),
            ],
            main_fields: vec!["module".into(), "main".into()],
            ..Default::default()
        };

        Self { resolver: Resolver::new(options) }
    }

    /// Create a resolver with extensions from a compiler registry.
    pub fn with_compilers(
        cwd: &Path,
        registry: &CompilerRegistry,
        paths: &BTreeMap<String, Vec<String>>,
    ) -> Self {
        let additional: Vec<String> = registry.extensions().cloned().collect();
        Self::with_options(cwd, &additional, paths)
    }

    pub fn resolve(&self, from: &Path, specifier: &str) -> Option<PathBuf> {
        let dir = from.parent()?;

        if let Some(path) = self.resolve_in_dir(dir, specifier) {
            return Some(path);
        }

        // Sass load rules have their own lookup: underscore partials and
        // directory `_index` files, which node-style resolution never finds
        if from.extension().is_some_and(|ext| ext == "scss" || ext == "sass") {
            for candidate in sass_load_candidates(specifier) {
                if let Some(path) = self.resolve_in_dir(dir, &candidate) {
                    return Some(path);
                }
            }
        }

        None
    }

    /// Resolve a specifier against a directory. Used for entry seeding and
    /// workspace-package resolution where there is no importing file.
    pub fn resolve_in_dir(&self, dir: &Path, specifier: &str) -> Option<PathBuf> {
        if let Ok(resolution) = self.resolver.resolve(dir, specifier) {
            if let Ok(path) = resolution.into_path_buf().canonicalize() {
                return Some(path);
            }
        }
        None
    }
}

/// The specifiers sass itself would try for a load that plain resolution
/// missed, in order: the underscore partial (bare, then with explicit
/// extensions), then the directory's `_index`/`index` files.
fn sass_load_candidates(specifier: &str) -> Vec<String> {
    let (parent, name) = match specifier.rsplit_once('/') {
        Some((parent, name)) => (Some(parent), name),
        None => (None, specifier),
    };

    let mut candidates = Vec::new();

    // `a/b` loads `a/_b.scss`; an already-underscored name has no variant
    if !name.starts_with('_') {
        for suffix in ["", ".scss", ".sass"] {
            let partial = format!("_{name}{suffix}");
            candidates.push(match parent {
                Some(parent) => format!("{parent}/{partial}"),
                None => partial,
            });
        }
    }

    // `a/b` may also name the directory `a/b/` holding an index stylesheet
    for index in ["_index.scss", "_index.sass", "index.scss", "index.sass"] {
        candidates.push(format!("{specifier}/{index}"));
    }

    candidates
}
