use super::js_config::{load_config_value, string_array};
use super::{PluginContext, PluginDef, PluginError, PluginOutput};

pub const PLUGIN: PluginDef = PluginDef {
    name: "typescript",
    enablers: &["typescript"],
    config_files: &["tsconfig.json", "tsconfig.*.json"],
    entry_patterns: &[],
    project_patterns: &[],
    dev_only: false,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    if let Some(extends) = value.get("extends") {
        let parents: Vec<String> = match extends {
            serde_json::Value::String(s) => vec![s.clone()],
            serde_json::Value::Array(items) => {
                items.iter().filter_map(|v| v.as_str().map(String::from)).collect()
            }
            _ => Vec::new(),
        };
        for parent in parents {
            if !parent.starts_with('.') && !parent.starts_with('/') {
                output.references.push(parent);
            }
        }
    }

    let compiler_options = value
        .get("compilerOptions")
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    // `types` entries are bare names resolved as @types/<name> unless scoped
    for type_pkg in string_array(&compiler_options, "types") {
        if type_pkg.starts_with('@') || type_pkg.starts_with('.') {
            output.references.push(type_pkg);
        } else {
            output.references.push(format!("@types/{type_pkg}"));
        }
    }

    // Language service / transformer plugins
    if let Some(plugins) = compiler_options.get("plugins").and_then(|v| v.as_array()) {
        for plugin in plugins {
            let name = match plugin {
                serde_json::Value::String(s) => Some(s.as_str()),
                serde_json::Value::Object(map) => map.get("name").and_then(|v| v.as_str()),
                _ => None,
            };
            if let Some(name) = name {
                output.references.push(name.to_string());
            }
        }
    }

    if let Some(jsx_source) = compiler_options.get("jsxImportSource").and_then(|v| v.as_str()) {
        output.references.push(jsx_source.to_string());
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
    fn tsconfig_references() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tsconfig.json"),
            r#"{
  // jsonc is allowed here
  "extends": "@tsconfig/node20/tsconfig.json",
  "compilerOptions": {
    "types": ["node", "@cloudflare/workers-types"],
    "plugins": [{ "name": "typescript-plugin-css-modules" }],
    "jsxImportSource": "preact"
  }
}"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join("tsconfig.json"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        assert!(output.references.contains(&"@tsconfig/node20/tsconfig.json".to_string()));
        assert!(output.references.contains(&"@types/node".to_string()));
        assert!(output.references.contains(&"@cloudflare/workers-types".to_string()));
        assert!(output.references.contains(&"typescript-plugin-css-modules".to_string()));
        assert!(output.references.contains(&"preact".to_string()));
    }
}
