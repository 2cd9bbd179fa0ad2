use crate::diagnostics::Diagnostic;
use crate::types::{Issue, IssueKind};
use serde::Serialize;

#[derive(Serialize)]
pub struct Report {
    pub issues: Vec<Issue>,
    pub warnings: Vec<Diagnostic>,
    pub total_files: usize,
    pub issue_count: usize,
}

impl Report {
    pub fn new(issues: Vec<Issue>, warnings: Vec<Diagnostic>, total_files: usize) -> Self {
        let issue_count = issues.len();
        Self { issues, warnings, total_files, issue_count }
    }

    pub fn has_issues(&self) -> bool {
        !self.issues.is_empty()
    }
}

fn heading(kind: IssueKind) -> &'static str {
    match kind {
        IssueKind::Files => "Unused files",
        IssueKind::Dependencies => "Unused dependencies",
        IssueKind::Unlisted => "Unlisted dependencies",
        IssueKind::Exports => "Unused exports",
        IssueKind::EnumMembers => "Unused enum members",
        IssueKind::ClassMembers => "Unused class members",
        IssueKind::Binaries => "Unlisted binaries",
    }
}

pub fn report_text(report: &Report) {
    if report.issues.is_empty() {
        println!("No issues found.");
    }

    let mut current_kind: Option<IssueKind> = None;
    for issue in &report.issues {
        if current_kind != Some(issue.kind) {
            let count =
                report.issues.iter().filter(|i| i.kind == issue.kind).count();
            println!("{} ({count}):", heading(issue.kind));
            current_kind = Some(issue.kind);
        }
        let location = if issue.workspace.is_empty() {
            issue.subject.clone()
        } else {
            format!("{}  [{}]", issue.subject, issue.workspace)
        };
        match &issue.symbol {
            Some(symbol) => println!("  {location}  {symbol}"),
            None => println!("  {location}"),
        }
    }

    for warning in &report.warnings {
        match &warning.path {
            Some(path) => eprintln!("Warning: {} ({})", warning.message, path.display()),
            None => eprintln!("Warning: {}", warning.message),
        }
    }
}

pub fn report_json(report: &Report) {
    match serde_json::to_string_pretty(report) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to serialize report: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_issues() {
        let issues = vec![
            Issue {
                kind: IssueKind::Files,
                workspace: String::new(),
                subject: "src/b.ts".into(),
                symbol: None,
            },
            Issue {
                kind: IssueKind::Dependencies,
                workspace: String::new(),
                subject: "lodash".into(),
                symbol: None,
            },
        ];
        let report = Report::new(issues, Vec::new(), 10);

        assert!(report.has_issues());
        assert_eq!(report.issue_count, 2);
    }

    #[test]
    fn empty_report_has_no_issues() {
        let report = Report::new(Vec::new(), Vec::new(), 0);
        assert!(!report.has_issues());
    }
}
