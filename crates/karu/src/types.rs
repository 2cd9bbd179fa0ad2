use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

/// File extensions the analyzer can parse directly.
pub const DEFAULT_EXTENSIONS: &[&str] =
    &[".ts", ".tsx", ".js", ".jsx", ".mjs", ".cjs", ".mts", ".cts"];

/// Extensions of assets that may be imported but carry no module structure.
/// They resolve (so imports of them are not warnings) but are never analyzed.
pub const FOREIGN_FILE_EXTENSIONS: &[&str] = &[
    ".css", ".less", ".styl", ".json", ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp",
    ".avif", ".woff", ".woff2", ".ttf", ".eot", ".otf", ".mp3", ".mp4", ".webm", ".wasm", ".node",
    ".graphql", ".gql", ".html", ".md", ".txt", ".yaml", ".yml",
];

/// Node builtin module names, matched with or without the `node:` prefix.
/// Imports of these are never dependency references.
pub const NODE_BUILTINS: &[&str] = &[
    "assert", "async_hooks", "buffer", "child_process", "cluster", "console", "constants",
    "crypto", "dgram", "diagnostics_channel", "dns", "domain", "events", "fs", "http", "http2",
    "https", "inspector", "module", "net", "os", "path", "perf_hooks", "process", "punycode",
    "querystring", "readline", "repl", "stream", "string_decoder", "test", "timers", "tls",
    "trace_events", "tty", "url", "util", "v8", "vm", "wasi", "worker_threads", "zlib",
];

/// Binaries assumed to exist globally; invoking them from a script is never an issue.
pub const IGNORED_GLOBAL_BINARIES: &[&str] = &[
    "bash", "bun", "bunx", "cat", "cd", "corepack", "cp", "curl", "deno", "docker", "echo",
    "exit", "false", "git", "grep", "kill", "ls", "make", "mkdir", "mv", "node", "nodemon",
    "npm", "npx", "pnpm", "pnpx", "rm", "rsync", "set", "sh", "sleep", "sort", "tar", "test",
    "touch", "true", "xargs", "yarn",
];

/// The seven reportable issue categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IssueKind {
    Files,
    Dependencies,
    Unlisted,
    Exports,
    EnumMembers,
    ClassMembers,
    Binaries,
}

impl IssueKind {
    pub const ALL: &'static [IssueKind] = &[
        IssueKind::Files,
        IssueKind::Dependencies,
        IssueKind::Unlisted,
        IssueKind::Exports,
        IssueKind::EnumMembers,
        IssueKind::ClassMembers,
        IssueKind::Binaries,
    ];

    /// Categories reported when no include/exclude filter is given.
    /// Class members are opt-in.
    pub const DEFAULT: &'static [IssueKind] = &[
        IssueKind::Files,
        IssueKind::Dependencies,
        IssueKind::Unlisted,
        IssueKind::Exports,
        IssueKind::EnumMembers,
        IssueKind::Binaries,
    ];
}

impl std::str::FromStr for IssueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(IssueKind::Files),
            "dependencies" => Ok(IssueKind::Dependencies),
            "unlisted" => Ok(IssueKind::Unlisted),
            "exports" => Ok(IssueKind::Exports),
            "enumMembers" => Ok(IssueKind::EnumMembers),
            "classMembers" => Ok(IssueKind::ClassMembers),
            "binaries" => Ok(IssueKind::Binaries),
            other => Err(format!("unknown issue kind: {other}")),
        }
    }
}

impl std::fmt::Display for IssueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IssueKind::Files => "files",
            IssueKind::Dependencies => "dependencies",
            IssueKind::Unlisted => "unlisted",
            IssueKind::Exports => "exports",
            IssueKind::EnumMembers => "enumMembers",
            IssueKind::ClassMembers => "classMembers",
            IssueKind::Binaries => "binaries",
        };
        write!(f, "{s}")
    }
}

/// A single reportable issue, already attributed to a workspace.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Issue {
    pub kind: IssueKind,
    /// Workspace-relative path of the workspace the issue belongs to
    /// (empty string for the root workspace).
    pub workspace: String,
    /// File path relative to the run directory, or package/binary name.
    pub subject: String,
    /// Symbol name for export/member issues, member name for member issues.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
}

/// Configuration for one analysis run, after config-file and CLI merging.
#[derive(Debug, Clone)]
pub struct KaruConfig {
    /// Entry point files or glob patterns
    pub entry: Vec<String>,

    /// Project files to check (glob patterns, `!`-prefixed to negate)
    pub project: Vec<String>,

    /// Working directory
    pub cwd: PathBuf,

    /// Patterns excluded from issue reporting only
    pub ignore: Vec<String>,

    /// Dependency names (or /regex/) never reported as unused or unlisted
    pub ignore_dependencies: Vec<String>,

    /// Binary names (or /regex/) never reported as unlisted
    pub ignore_binaries: Vec<String>,

    /// Report exports of entry files too
    pub include_entry_exports: bool,

    /// Skip exports that are consumed within their defining file only
    pub ignore_exports_used_in_file: bool,

    /// JSDoc tags (without `@`) that exempt an export from reporting, in
    /// addition to `@public` which always does
    pub tags: Vec<String>,

    /// Only analyze production entries (skip dev-only plugin contributions)
    pub production: bool,

    /// Respect .gitignore during the walk
    pub gitignore: bool,

    /// Extra path aliases, supplementing tsconfig paths. Keys are alias
    /// prefixes, values are target directories relative to cwd.
    pub paths: BTreeMap<String, Vec<String>>,

    /// Restrict the run to a single workspace subtree (relative dir)
    pub workspace: Option<String>,

    /// Compiler configuration
    pub compilers: CompilerConfig,

    /// Plugin configuration
    pub plugins: PluginOverrides,

    /// Per-workspace overrides, keyed by workspace-relative dir
    pub workspaces: BTreeMap<String, WorkspaceOverride>,
}

impl Default for KaruConfig {
    fn default() -> Self {
        Self {
            entry: Vec::new(),
            project: vec!["**/*.{ts,tsx,js,jsx,mjs,cjs,mts,cts}".to_string()],
            cwd: PathBuf::from("."),
            ignore: Vec::new(),
            ignore_dependencies: Vec::new(),
            ignore_binaries: Vec::new(),
            include_entry_exports: false,
            ignore_exports_used_in_file: false,
            tags: Vec::new(),
            production: false,
            gitignore: true,
            paths: BTreeMap::new(),
            workspace: None,
            compilers: CompilerConfig::default(),
            plugins: PluginOverrides::default(),
            workspaces: BTreeMap::new(),
        }
    }
}

/// Per-workspace configuration overrides, layered over the root config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkspaceOverride {
    #[serde(default)]
    pub entry: Vec<String>,

    #[serde(default)]
    pub project: Vec<String>,

    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default, rename = "ignoreDependencies")]
    pub ignore_dependencies: Vec<String>,

    #[serde(default, rename = "ignoreBinaries")]
    pub ignore_binaries: Vec<String>,
}

/// Configuration for file compilers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompilerConfig {
    /// Enable/disable SCSS compiler (None = auto-detect based on dependencies)
    #[serde(default)]
    pub scss: Option<bool>,

    /// Enable/disable Vue SFC compiler (None = auto-detect based on dependencies)
    #[serde(default)]
    pub vue: Option<bool>,

    /// Enable/disable Svelte compiler (None = auto-detect based on dependencies)
    #[serde(default)]
    pub svelte: Option<bool>,

    /// Enable/disable MDX compiler (None = auto-detect based on dependencies)
    #[serde(default)]
    pub mdx: Option<bool>,
}

/// Force a plugin on or off, or reshape what it contributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginToggle {
    Enabled(bool),
    Custom {
        #[serde(default)]
        config: Vec<String>,
        #[serde(default)]
        entry: Vec<String>,
        #[serde(default)]
        project: Vec<String>,
    },
}

/// Per-plugin overrides, keyed by plugin name (None = auto-detect).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginOverrides {
    #[serde(flatten)]
    pub toggles: BTreeMap<String, PluginToggle>,
}

impl PluginOverrides {
    /// Explicit on/off for a plugin, if configured.
    pub fn forced(&self, name: &str) -> Option<bool> {
        match self.toggles.get(name) {
            Some(PluginToggle::Enabled(on)) => Some(*on),
            Some(PluginToggle::Custom { .. }) => Some(true),
            None => None,
        }
    }

    pub fn custom(&self, name: &str) -> Option<(&[String], &[String], &[String])> {
        match self.toggles.get(name) {
            Some(PluginToggle::Custom { config, entry, project }) => {
                Some((config, entry, project))
            }
            _ => None,
        }
    }
}

/// Error types for karu operations
#[derive(Error, Debug)]
pub enum KaruError {
    #[error("No entry files found matching patterns: {0:?}")]
    NoEntryFiles(Vec<String>),

    #[error("Invalid working directory: {0}")]
    InvalidCwd(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    #[error("Unsupported option: {0}")]
    Unsupported(String),
}

/// Config file structure for karu.json / karu.jsonc / package.json "karu"
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub entry: Vec<String>,

    #[serde(default)]
    pub project: Vec<String>,

    #[serde(default)]
    pub ignore: Vec<String>,

    #[serde(default, rename = "ignoreDependencies")]
    pub ignore_dependencies: Vec<String>,

    #[serde(default, rename = "ignoreBinaries")]
    pub ignore_binaries: Vec<String>,

    #[serde(default, rename = "includeEntryExports")]
    pub include_entry_exports: bool,

    #[serde(default, rename = "ignoreExportsUsedInFile")]
    pub ignore_exports_used_in_file: bool,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub paths: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub compilers: CompilerConfig,

    #[serde(default)]
    pub workspaces: BTreeMap<String, WorkspaceOverride>,

    #[serde(flatten)]
    pub plugins: PluginOverrides,
}

impl FileConfig {
    /// Overlay this file config onto a base config. The caller layers CLI
    /// values afterwards, so CLI wins over file values.
    pub fn apply(self, base: &mut KaruConfig) {
        if !self.entry.is_empty() {
            base.entry = self.entry;
        }
        if !self.project.is_empty() {
            base.project = self.project;
        }
        if !self.ignore.is_empty() {
            base.ignore = self.ignore;
        }
        base.ignore_dependencies.extend(self.ignore_dependencies);
        base.ignore_binaries.extend(self.ignore_binaries);
        base.include_entry_exports |= self.include_entry_exports;
        base.ignore_exports_used_in_file |= self.ignore_exports_used_in_file;
        base.tags.extend(self.tags);
        base.paths.extend(self.paths);
        base.compilers = self.compilers;
        base.workspaces = self.workspaces;
        base.plugins = self.plugins;
    }
}
