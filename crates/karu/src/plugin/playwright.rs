use super::js_config::{load_config_value, string_array};
use super::{normalize_pattern, EntryPattern, PluginContext, PluginDef, PluginError, PluginOutput};

pub const PLUGIN: PluginDef = PluginDef {
    name: "playwright",
    enablers: &["@playwright/test"],
    config_files: &[
        "playwright.config.js",
        "playwright.config.ts",
        "playwright.config.mjs",
        "playwright.config.cjs",
    ],
    entry_patterns: &["{e2e,tests}/**/*.{spec,test}.{js,ts,mjs}"],
    project_patterns: &[],
    dev_only: true,
    resolve,
};

/// Built-in reporter names shipped with @playwright/test.
const BUILTIN_REPORTERS: &[&str] =
    &["dot", "line", "list", "junit", "json", "html", "blob", "github", "null"];

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    let test_dir = value
        .get("testDir")
        .and_then(|v| v.as_str())
        .map(|dir| dir.trim_start_matches("./").to_string());

    let matches = string_array(&value, "testMatch");
    if let Some(dir) = &test_dir {
        if matches.is_empty() {
            output.entries.push(EntryPattern::new(format!(
                "{dir}/**/*.{{spec,test}}.{{js,ts,mjs}}"
            )));
        }
        for pattern in &matches {
            output.entries.push(EntryPattern::new(normalize_pattern(dir, pattern)));
        }
    } else {
        for pattern in &matches {
            output
                .entries
                .push(EntryPattern::new(pattern.trim_start_matches("./").to_string()));
        }
    }

    for key in ["globalSetup", "globalTeardown"] {
        for item in string_array(&value, key) {
            if item.starts_with('.') || item.starts_with('/') {
                output
                    .entries
                    .push(EntryPattern::new(item.trim_start_matches("./").to_string()));
            } else {
                output.references.push(item);
            }
        }
    }

    if let Some(reporters) = value.get("reporter") {
        let names: Vec<String> = match reporters {
            serde_json::Value::String(s) => vec![s.clone()],
            serde_json::Value::Array(items) => items
                .iter()
                .filter_map(|item| match item {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Array(pair) => {
                        pair.first().and_then(|v| v.as_str()).map(String::from)
                    }
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        };
        for name in names {
            if !BUILTIN_REPORTERS.contains(&name.as_str()) && !name.starts_with('.') {
                output.references.push(name);
            }
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
    fn test_dir_drives_default_match() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("playwright.config.ts"),
            r#"export default {
  testDir: './e2e',
  globalSetup: './e2e/setup.ts',
  reporter: [['list'], ['allure-playwright']],
};"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join("playwright.config.ts"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        let patterns: Vec<_> = output.entries.iter().map(|e| e.pattern.as_str()).collect();
        assert!(patterns.contains(&"e2e/**/*.{spec,test}.{js,ts,mjs}"));
        assert!(patterns.contains(&"e2e/setup.ts"));
        assert_eq!(output.references, ["allure-playwright"]);
    }
}
