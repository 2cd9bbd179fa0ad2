use super::{PluginContext, PluginDef, PluginError, PluginOutput};
use crate::binaries::binaries_in_script;
use crate::types::IGNORED_GLOBAL_BINARIES;

/// Git hook names husky may manage under .husky/.
const HOOK_FILES: &[&str] = &[
    ".husky/applypatch-msg",
    ".husky/commit-msg",
    ".husky/post-checkout",
    ".husky/post-commit",
    ".husky/post-merge",
    ".husky/pre-commit",
    ".husky/pre-push",
    ".husky/pre-rebase",
    ".husky/prepare-commit-msg",
];

pub const PLUGIN: PluginDef = PluginDef {
    name: "husky",
    enablers: &["husky"],
    config_files: HOOK_FILES,
    entry_patterns: &[],
    project_patterns: &[],
    dev_only: true,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let content = std::fs::read_to_string(ctx.config_path)?;
    let mut output = PluginOutput::default();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        for binary in binaries_in_script(line) {
            if binary.intentionally_unlisted {
                continue;
            }
            if IGNORED_GLOBAL_BINARIES.contains(&binary.name.as_str()) {
                continue;
            }
            output.references.push(binary.name);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageJson;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn hook_commands_become_references() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".husky")).unwrap();
        fs::write(
            dir.path().join(".husky/pre-commit"),
            "#!/usr/bin/env sh\n. \"$(dirname -- \"$0\")/_/husky.sh\"\n\nlint-staged\nnpx --yes commitlint --edit\n",
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join(".husky/pre-commit"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        assert!(output.references.contains(&"lint-staged".to_string()));
        // npx --yes is intentionally unlisted
        assert!(!output.references.contains(&"commitlint".to_string()));
    }
}
