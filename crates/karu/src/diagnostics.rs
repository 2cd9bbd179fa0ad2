use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Non-fatal problems surfaced alongside issues. Warnings never abort a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Workspace,
    Resolution,
    Parse,
    Plugin,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct Diagnostic {
    pub kind: WarningKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// Thread-safe accumulator shared across the parallel graph walk.
#[derive(Debug, Default)]
pub struct Diagnostics {
    warnings: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&self, kind: WarningKind, message: impl Into<String>, path: Option<&Path>) {
        let diagnostic = Diagnostic {
            kind,
            message: message.into(),
            path: path.map(Path::to_path_buf),
        };
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(diagnostic);
        }
    }

    /// Drain into a sorted, deduplicated list for deterministic reports.
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut warnings = self.warnings.into_inner().unwrap_or_default();
        warnings.sort();
        warnings.dedup();
        warnings
    }
}
