use super::js_config::{load_config_value, string_array};
use super::{EntryPattern, PluginContext, PluginDef, PluginError, PluginOutput};

/// Default test patterns used by Jest when no testMatch or testRegex is
/// specified, pre-expanded for the glob crate.
const DEFAULT_TEST_PATTERNS: &[&str] = &[
    "**/__tests__/**/*.{js,jsx,ts,tsx}",
    "**/*.spec.{js,jsx,ts,tsx}",
    "**/*.test.{js,jsx,ts,tsx}",
];

pub const PLUGIN: PluginDef = PluginDef {
    name: "jest",
    enablers: &["jest"],
    config_files: &[
        "jest.config.js",
        "jest.config.ts",
        "jest.config.mjs",
        "jest.config.cjs",
        "jest.config.json",
        "package.json",
    ],
    entry_patterns: DEFAULT_TEST_PATTERNS,
    project_patterns: &[],
    dev_only: true,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = if ctx.config_path.file_name().is_some_and(|n| n == "package.json") {
        let content = std::fs::read_to_string(ctx.config_path)?;
        let pkg: serde_json::Value = serde_json::from_str(&content)
            .map_err(|e| PluginError::ConfigParse(e.to_string()))?;
        match pkg.get("jest") {
            Some(jest) => jest.clone(),
            None => return Ok(PluginOutput::default()),
        }
    } else {
        load_config_value(ctx.config_path)?
    };

    let mut output = PluginOutput::default();

    for pattern in string_array(&value, "testMatch") {
        output.entries.push(EntryPattern::new(normalize_root_dir(&pattern)));
    }

    for key in ["setupFiles", "setupFilesAfterEnv"] {
        for item in string_array(&value, key) {
            push_entry_or_reference(&item, &mut output);
        }
    }
    for key in ["globalSetup", "globalTeardown"] {
        if let Some(item) = value.get(key).and_then(|v| v.as_str()) {
            push_entry_or_reference(item, &mut output);
        }
    }

    if let Some(preset) = value.get("preset").and_then(|v| v.as_str()) {
        push_entry_or_reference(preset, &mut output);
    }

    if let Some(environment) = value.get("testEnvironment").and_then(|v| v.as_str()) {
        if environment != "node" && !environment.starts_with('.') {
            // Shorthand "jsdom" means the jest-environment-jsdom package
            let package = if environment.starts_with("jest-environment-")
                || environment.starts_with('@')
            {
                environment.to_string()
            } else {
                format!("jest-environment-{environment}")
            };
            output.references.push(package);
        }
    }

    if let Some(transform) = value.get("transform").and_then(|v| v.as_object()) {
        for transformer in transform.values() {
            let name = match transformer {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Array(items) => {
                    items.first().and_then(|v| v.as_str()).map(String::from)
                }
                _ => None,
            };
            if let Some(name) = name {
                push_entry_or_reference(&name, &mut output);
            }
        }
    }

    if let Some(reporters) = value.get("reporters").and_then(|v| v.as_array()) {
        for reporter in reporters {
            let name = match reporter {
                serde_json::Value::String(s) => Some(s.as_str()),
                serde_json::Value::Array(items) => items.first().and_then(|v| v.as_str()),
                _ => None,
            };
            if let Some(name) = name {
                if name != "default" && name != "summary" {
                    push_entry_or_reference(name, &mut output);
                }
            }
        }
    }

    for plugin in string_array(&value, "watchPlugins") {
        push_entry_or_reference(&plugin, &mut output);
    }

    Ok(output)
}

fn normalize_root_dir(pattern: &str) -> String {
    pattern
        .trim_start_matches("<rootDir>/")
        .trim_start_matches("./")
        .to_string()
}

/// Relative paths become entries; bare specifiers are package references.
fn push_entry_or_reference(item: &str, output: &mut PluginOutput) {
    if item.starts_with('.') || item.starts_with('/') || item.starts_with("<rootDir>") {
        output.entries.push(EntryPattern::new(normalize_root_dir(item)));
    } else {
        output.references.push(item.to_string());
    }
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
    fn reads_test_match_and_setup_files() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("jest.config.js"),
            r#"module.exports = {
  testMatch: ['<rootDir>/tests/**/*.test.ts'],
  setupFilesAfterEnv: ['./jest.setup.ts', 'jest-extended'],
  preset: 'ts-jest',
};"#,
        )
        .unwrap();

        let output = run(dir.path(), "jest.config.js");

        let patterns: Vec<_> = output.entries.iter().map(|e| e.pattern.as_str()).collect();
        assert!(patterns.contains(&"tests/**/*.test.ts"));
        assert!(patterns.contains(&"jest.setup.ts"));
        assert!(output.references.contains(&"jest-extended".to_string()));
        assert!(output.references.contains(&"ts-jest".to_string()));
    }

    #[test]
    fn environment_shorthand_maps_to_package() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("jest.config.json"),
            r#"{ "testEnvironment": "jsdom" }"#,
        )
        .unwrap();

        let output = run(dir.path(), "jest.config.json");
        assert!(output.references.contains(&"jest-environment-jsdom".to_string()));
    }

    #[test]
    fn transform_values_are_references() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("jest.config.json"),
            r#"{ "transform": { "^.+\\.tsx?$": ["ts-jest", { "isolatedModules": true }] } }"#,
        )
        .unwrap();

        let output = run(dir.path(), "jest.config.json");
        assert!(output.references.contains(&"ts-jest".to_string()));
    }

    #[test]
    fn package_json_embedded_config() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("package.json"),
            r#"{ "name": "t", "jest": { "preset": "react-native" } }"#,
        )
        .unwrap();

        let output = run(dir.path(), "package.json");
        assert!(output.references.contains(&"react-native".to_string()));
    }

    #[test]
    fn missing_package_json_key_is_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), r#"{ "name": "t" }"#).unwrap();

        let output = run(dir.path(), "package.json");
        assert!(output.entries.is_empty());
        assert!(output.references.is_empty());
    }
}
