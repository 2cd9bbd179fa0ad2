use super::js_config::{load_config_value, strings_anywhere};
use super::{PluginContext, PluginDef, PluginError, PluginOutput};
use crate::binaries::binaries_in_script;
use crate::types::IGNORED_GLOBAL_BINARIES;

pub const PLUGIN: PluginDef = PluginDef {
    name: "lint-staged",
    enablers: &["lint-staged"],
    config_files: &[
        ".lintstagedrc",
        ".lintstagedrc.json",
        ".lintstagedrc.js",
        ".lintstagedrc.cjs",
        ".lintstagedrc.mjs",
        "lint-staged.config.js",
        "lint-staged.config.cjs",
        "lint-staged.config.mjs",
        "package.json",
    ],
    entry_patterns: &[],
    project_patterns: &[],
    dev_only: true,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = if ctx.config_path.file_name().is_some_and(|n| n == "package.json") {
        let content = std::fs::read_to_string(ctx.config_path)?;
        let pkg: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| PluginError::ConfigParse(e.to_string()))?;
        match pkg.get("lint-staged") {
            Some(config) => config.clone(),
            None => return Ok(PluginOutput::default()),
        }
    } else {
        load_config_value(ctx.config_path)?
    };

    // Config values are commands keyed by glob; commands may nest in arrays.
    let mut commands = Vec::new();
    strings_anywhere(&value, &mut commands);

    let mut output = PluginOutput::default();
    for command in commands {
        for binary in binaries_in_script(&command) {
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
    fn commands_become_references() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".lintstagedrc.json"),
            r#"{ "*.ts": ["eslint --fix", "prettier --write"], "*.md": "markdownlint" }"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join(".lintstagedrc.json"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        assert!(output.references.contains(&"eslint".to_string()));
        assert!(output.references.contains(&"prettier".to_string()));
        assert!(output.references.contains(&"markdownlint".to_string()));
    }

    #[test]
    fn glob_keys_are_not_references() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(".lintstagedrc.json"), r#"{ "*.css": "stylelint" }"#).unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join(".lintstagedrc.json"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        assert_eq!(output.references, ["stylelint"]);
    }
}
