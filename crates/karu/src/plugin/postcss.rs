use super::js_config::load_config_value;
use super::{PluginContext, PluginDef, PluginError, PluginOutput};

pub const PLUGIN: PluginDef = PluginDef {
    name: "postcss",
    enablers: &["postcss", "postcss-cli", "postcss-loader"],
    config_files: &[
        "postcss.config.js",
        "postcss.config.cjs",
        "postcss.config.mjs",
        ".postcssrc",
        ".postcssrc.json",
        ".postcssrc.js",
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
        match pkg.get("postcss") {
            Some(postcss) => postcss.clone(),
            None => return Ok(PluginOutput::default()),
        }
    } else {
        load_config_value(ctx.config_path)?
    };

    let mut output = PluginOutput::default();

    // plugins: { "autoprefixer": {}, ... } or ["autoprefixer", ...]
    match value.get("plugins") {
        Some(serde_json::Value::Object(map)) => {
            for name in map.keys() {
                if !name.starts_with('.') {
                    output.references.push(name.clone());
                }
            }
        }
        Some(serde_json::Value::Array(items)) => {
            for item in items {
                let name = match item {
                    serde_json::Value::String(s) => Some(s.as_str()),
                    serde_json::Value::Array(pair) => pair.first().and_then(|v| v.as_str()),
                    _ => None,
                };
                if let Some(name) = name {
                    if !name.starts_with('.') {
                        output.references.push(name.to_string());
                    }
                }
            }
        }
        _ => {}
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageJson;
    use std::fs;
    use tempfile::tempdir;

    fn run(dir: &std::path::Path, config_name: &str) -> PluginOutput {
        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir,
            config_path: &dir.join(config_name),
            manifest: &manifest,
        };
        resolve(&ctx).unwrap()
    }

    #[test]
    fn plugin_map_keys_are_references() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join(".postcssrc"),
            r#"{ "plugins": { "autoprefixer": {}, "postcss-nested": {} } }"#,
        )
        .unwrap();

        let output = run(dir.path(), ".postcssrc");
        assert!(output.references.contains(&"autoprefixer".to_string()));
        assert!(output.references.contains(&"postcss-nested".to_string()));
    }

    #[test]
    fn package_json_postcss_key() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "t", "postcss": { "plugins": ["tailwindcss"] } }"#,
        )
        .unwrap();

        let output = run(dir.path(), "package.json");
        assert_eq!(output.references, ["tailwindcss"]);
    }
}
