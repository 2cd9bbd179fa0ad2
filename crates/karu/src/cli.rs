use crate::types::IssueKind;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "karu")]
#[command(about = "Find unused files, exports, dependencies and binaries in JS/TS projects")]
pub struct Cli {
    /// Working directory to lint (defaults to the current directory)
    #[arg(value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Path to config file (karu.json or karu.jsonc)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Entry point files or glob patterns
    #[arg(short, long)]
    pub entry: Vec<String>,

    /// Project files to check (glob patterns, `!`-prefixed to negate)
    #[arg(short, long)]
    pub project: Vec<String>,

    /// Working directory
    #[arg(short = 'C', long, default_value = ".")]
    pub cwd: PathBuf,

    /// Issue kinds to report (repeatable)
    #[arg(long, value_name = "KIND")]
    pub include: Vec<IssueKindArg>,

    /// Issue kinds to suppress (repeatable)
    #[arg(long, value_name = "KIND")]
    pub exclude: Vec<IssueKindArg>,

    /// Shorthand for --include dependencies --include unlisted
    #[arg(long)]
    pub dependencies: bool,

    /// Shorthand for --include exports --include enumMembers
    #[arg(long)]
    pub exports: bool,

    /// Shorthand for --include files
    #[arg(long)]
    pub files: bool,

    /// Only analyze production entries
    #[arg(long)]
    pub production: bool,

    /// Inspect external-library type declarations (not supported)
    #[arg(long)]
    pub include_libs: bool,

    /// Lint a single workspace subtree
    #[arg(short = 'W', long)]
    pub workspace: Option<String>,

    /// Do not respect .gitignore files
    #[arg(long)]
    pub no_gitignore: bool,

    /// Patterns to ignore
    #[arg(long)]
    pub ignore: Vec<String>,

    /// Output format
    #[arg(long, default_value = "text")]
    pub reporter: OutputFormat,
}

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// clap-friendly mirror of the issue kinds.
#[derive(Clone, Copy, ValueEnum)]
pub enum IssueKindArg {
    Files,
    Dependencies,
    Unlisted,
    Exports,
    #[value(name = "enumMembers", alias = "enum-members")]
    EnumMembers,
    #[value(name = "classMembers", alias = "class-members")]
    ClassMembers,
    Binaries,
}

impl From<IssueKindArg> for IssueKind {
    fn from(arg: IssueKindArg) -> Self {
        match arg {
            IssueKindArg::Files => IssueKind::Files,
            IssueKindArg::Dependencies => IssueKind::Dependencies,
            IssueKindArg::Unlisted => IssueKind::Unlisted,
            IssueKindArg::Exports => IssueKind::Exports,
            IssueKindArg::EnumMembers => IssueKind::EnumMembers,
            IssueKindArg::ClassMembers => IssueKind::ClassMembers,
            IssueKindArg::Binaries => IssueKind::Binaries,
        }
    }
}

impl Cli {
    /// The run directory: the positional argument wins over `-C`.
    pub fn run_dir(&self) -> PathBuf {
        self.dir.clone().unwrap_or_else(|| self.cwd.clone())
    }

    /// Include selection after expanding the convenience shorthands.
    pub fn included_kinds(&self) -> Vec<IssueKind> {
        let mut kinds: Vec<IssueKind> =
            self.include.iter().map(|&k| k.into()).collect();
        if self.dependencies {
            kinds.push(IssueKind::Dependencies);
            kinds.push(IssueKind::Unlisted);
        }
        if self.exports {
            kinds.push(IssueKind::Exports);
            kinds.push(IssueKind::EnumMembers);
        }
        if self.files {
            kinds.push(IssueKind::Files);
        }
        kinds
    }

    pub fn excluded_kinds(&self) -> Vec<IssueKind> {
        self.exclude.iter().map(|&k| k.into()).collect()
    }
}
