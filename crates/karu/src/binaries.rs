use crate::types::IGNORED_GLOBAL_BINARIES;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// A binary invoked from a manifest script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryRef {
    pub name: String,
    /// `npx --yes` / `pnpm dlx`: fetched on demand, intentionally unlisted.
    pub intentionally_unlisted: bool,
}

/// How a binary reference resolved against the workspace chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryResolution {
    Installed,
    Ignored,
    Unlisted,
}

fn env_assignment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*=").unwrap())
}

/// Package managers whose `exec`-style subcommands wrap another binary.
const PACKAGE_MANAGERS: &[&str] = &["npm", "pnpm", "yarn", "bun"];

/// Wrappers that run a trailing command after their own arguments.
const COMMAND_WRAPPERS: &[&str] = &["cross-env", "dotenv", "env", "retry-cli", "concurrently"];

/// Strip a version suffix: `prettier@3` -> `prettier`, `@scope/p@1` -> `@scope/p`.
fn strip_version(token: &str) -> &str {
    let search_from = if token.starts_with('@') { 1 } else { 0 };
    match token[search_from..].find('@') {
        Some(at) => &token[..search_from + at],
        None => token,
    }
}

/// Extract the binaries invoked by one script line. Commands separated by
/// shell operators are scanned independently; env-var assignments and
/// wrapper flags are skipped.
pub fn binaries_in_script(script: &str) -> Vec<BinaryRef> {
    let mut refs = Vec::new();

    for segment in split_on_operators(script) {
        let tokens: Vec<&str> = segment.split_whitespace().collect();
        scan_command(&tokens, &mut refs);
    }

    let mut seen = Vec::new();
    refs.retain(|r| {
        if seen.contains(&r.name) {
            false
        } else {
            seen.push(r.name.clone());
            true
        }
    });
    refs
}

fn split_on_operators(script: &str) -> Vec<String> {
    script
        .replace("&&", "\u{0}")
        .replace("||", "\u{0}")
        .replace(';', "\u{0}")
        .replace('|', "\u{0}")
        .split('\u{0}')
        .map(|s| s.trim().trim_start_matches('(').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn scan_command(tokens: &[&str], refs: &mut Vec<BinaryRef>) {
    let mut idx = 0;

    // Leading VAR=value assignments
    while idx < tokens.len() && env_assignment_regex().is_match(tokens[idx]) {
        idx += 1;
    }
    let Some(&command) = tokens.get(idx) else { return };

    // Paths invoke local scripts, not installed binaries
    if command.starts_with('.') || command.starts_with('/') {
        return;
    }

    match command {
        "npx" | "pnpx" | "bunx" => {
            scan_runner(&tokens[idx + 1..], refs);
        }
        _ if PACKAGE_MANAGERS.contains(&command) => {
            let rest = &tokens[idx + 1..];
            match rest.first() {
                Some(&"exec") => scan_command(&rest[1..], refs),
                Some(&"dlx") => {
                    // dlx fetches on demand, like npx --yes
                    if let Some(&name) = rest.get(1) {
                        refs.push(BinaryRef {
                            name: strip_version(name).to_string(),
                            intentionally_unlisted: true,
                        });
                    }
                }
                // `npm run x`, `yarn build`, bare `npm install`: no binary
                _ => {}
            }
        }
        _ if COMMAND_WRAPPERS.contains(&command) => {
            refs.push(BinaryRef { name: command.to_string(), intentionally_unlisted: false });
            scan_command(&tokens[idx + 1..], refs);
        }
        _ => {
            refs.push(BinaryRef {
                name: strip_version(command).to_string(),
                intentionally_unlisted: false,
            });
        }
    }
}

/// Arguments after `npx` and friends: flags, then the package to run.
fn scan_runner(tokens: &[&str], refs: &mut Vec<BinaryRef>) {
    let mut on_demand = false;
    let mut idx = 0;

    while idx < tokens.len() {
        let token = tokens[idx];
        match token {
            "--yes" | "-y" => on_demand = true,
            "--no" | "--no-install" => on_demand = false,
            "--package" | "-p" => {
                if let Some(&pkg) = tokens.get(idx + 1) {
                    refs.push(BinaryRef {
                        name: strip_version(pkg).to_string(),
                        intentionally_unlisted: on_demand,
                    });
                }
                idx += 2;
                continue;
            }
            _ if token.starts_with('-') => {}
            _ => {
                refs.push(BinaryRef {
                    name: strip_version(token).to_string(),
                    intentionally_unlisted: on_demand,
                });
                return;
            }
        }
        idx += 1;
    }
}

/// Resolve a binary name against the workspace ancestry chain: an installed
/// `.bin` shim or a same-named declared dependency counts as installed.
pub fn resolve_binary(
    name: &str,
    chain_dirs: &[&Path],
    declared: impl Fn(&str) -> bool,
) -> BinaryResolution {
    for dir in chain_dirs {
        if dir.join("node_modules/.bin").join(name).exists() {
            return BinaryResolution::Installed;
        }
    }
    if declared(name) {
        return BinaryResolution::Installed;
    }
    if IGNORED_GLOBAL_BINARIES.contains(&name) {
        return BinaryResolution::Ignored;
    }
    BinaryResolution::Unlisted
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn names(script: &str) -> Vec<String> {
        binaries_in_script(script).into_iter().map(|r| r.name).collect()
    }

    #[test]
    fn plain_command() {
        assert_eq!(names("eslint ."), ["eslint"]);
    }

    #[test]
    fn env_assignments_are_skipped() {
        assert_eq!(names("NODE_ENV=production webpack --mode production"), ["webpack"]);
    }

    #[test]
    fn shell_operators_split_commands() {
        assert_eq!(names("tsc && eslint . || echo failed"), ["tsc", "eslint", "echo"]);
    }

    #[test]
    fn npx_yes_is_intentionally_unlisted() {
        let refs = binaries_in_script("npx --yes prettier .");
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].name, "prettier");
        assert!(refs[0].intentionally_unlisted);
    }

    #[test]
    fn npx_without_yes_must_be_listed() {
        let refs = binaries_in_script("npx prettier .");
        assert!(!refs[0].intentionally_unlisted);
        let refs = binaries_in_script("npx --no prettier .");
        assert!(!refs[0].intentionally_unlisted);
    }

    #[test]
    fn pnpm_exec_unwraps() {
        assert_eq!(names("pnpm exec vitest run"), ["vitest"]);
    }

    #[test]
    fn yarn_dlx_is_on_demand() {
        let refs = binaries_in_script("yarn dlx create-thing");
        assert!(refs[0].intentionally_unlisted);
    }

    #[test]
    fn npm_run_is_not_a_binary() {
        assert!(names("npm run build").is_empty());
    }

    #[test]
    fn wrappers_record_both_commands() {
        assert_eq!(names("cross-env NODE_ENV=test jest"), ["cross-env", "jest"]);
    }

    #[test]
    fn version_suffixes_are_stripped() {
        assert_eq!(names("npx prettier@3 --check ."), ["prettier"]);
        let refs = binaries_in_script("npx @scope/tool@1.2.3");
        assert_eq!(refs[0].name, "@scope/tool");
    }

    #[test]
    fn local_paths_are_ignored() {
        assert!(names("./scripts/build.sh").is_empty());
    }

    #[test]
    fn resolution_prefers_installed_bin() {
        let dir = tempdir().unwrap();
        let bin = dir.path().join("node_modules/.bin");
        fs::create_dir_all(&bin).unwrap();
        fs::write(bin.join("eslint"), "#!/bin/sh").unwrap();

        let chain = [dir.path()];
        assert_eq!(
            resolve_binary("eslint", &chain, |_| false),
            BinaryResolution::Installed
        );
        assert_eq!(resolve_binary("git", &chain, |_| false), BinaryResolution::Ignored);
        assert_eq!(
            resolve_binary("prettier", &chain, |_| false),
            BinaryResolution::Unlisted
        );
        assert_eq!(
            resolve_binary("prettier", &chain, |name| name == "prettier"),
            BinaryResolution::Installed
        );
    }
}
