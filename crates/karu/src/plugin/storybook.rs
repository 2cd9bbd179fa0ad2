use super::js_config::{load_config_value, string_array};
use super::{normalize_pattern, EntryPattern, PluginContext, PluginDef, PluginError, PluginOutput};
use regex::Regex;
use std::sync::OnceLock;

pub const PLUGIN: PluginDef = PluginDef {
    name: "storybook",
    enablers: &["storybook", "@storybook/*"],
    config_files: &[
        ".storybook/main.js",
        ".storybook/main.ts",
        ".storybook/main.mjs",
        ".storybook/main.cjs",
        ".storybook/main.mts",
        ".storybook/main.cts",
    ],
    entry_patterns: &["**/*.stories.{js,jsx,ts,tsx,mdx}", ".storybook/preview.{js,jsx,ts,tsx}"],
    project_patterns: &[".storybook/**/*.{js,jsx,ts,tsx}"],
    dev_only: true,
    resolve,
};

/// Convert Storybook's @() glob syntax to standard {} glob syntax.
/// Example: "**/*.stories.@(js|jsx|ts|tsx)" -> "**/*.stories.{js,jsx,ts,tsx}"
///
/// Handles nested patterns by processing inside-out.
fn convert_storybook_glob(pattern: &str) -> String {
    static STORYBOOK_GLOB_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = STORYBOOK_GLOB_REGEX.get_or_init(|| {
        // Match @(...) where the content is pipe-separated alternatives;
        // [^)]+ matches innermost patterns first (no nested parens)
        Regex::new(r"@\(([^)]+)\)").unwrap()
    });

    let mut result = pattern.to_string();
    loop {
        let new_result = regex
            .replace_all(&result, |caps: &regex::Captures| {
                let inner = &caps[1];
                format!("{{{}}}", inner.replace('|', ","))
            })
            .to_string();

        if new_result == result {
            break;
        }
        result = new_result;
    }
    result
}

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    // Story patterns are relative to the .storybook directory
    let base = ctx
        .config_path
        .parent()
        .and_then(|p| p.strip_prefix(ctx.workspace_dir).ok())
        .map(|p| p.to_string_lossy().replace('\\', "/"))
        .unwrap_or_default();

    for story in string_array(&value, "stories") {
        let converted = convert_storybook_glob(&story);
        output.entries.push(EntryPattern::new(normalize_pattern(&base, &converted)));
    }

    for addon in string_array(&value, "addons") {
        if !addon.starts_with('.') {
            output.references.push(addon);
        }
    }

    if let Some(framework) = value.get("framework") {
        let name = match framework {
            serde_json::Value::String(s) => Some(s.as_str()),
            serde_json::Value::Object(map) => map.get("name").and_then(|v| v.as_str()),
            _ => None,
        };
        if let Some(name) = name {
            output.references.push(name.to_string());
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
    fn glob_conversion() {
        assert_eq!(
            convert_storybook_glob("**/*.stories.@(js|jsx|ts|tsx)"),
            "**/*.stories.{js,jsx,ts,tsx}"
        );
        assert_eq!(
            convert_storybook_glob("**/*.@(mdx|stories.@(tsx|ts))"),
            "**/*.{mdx,stories.{tsx,ts}}"
        );
        assert_eq!(convert_storybook_glob("**/*.stories.tsx"), "**/*.stories.tsx");
    }

    #[test]
    fn stories_resolve_relative_to_storybook_dir() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join(".storybook")).unwrap();
        fs::write(
            dir.path().join(".storybook/main.ts"),
            r#"const config = {
  stories: ['../src/**/*.stories.@(ts|tsx)'],
  addons: ['@storybook/addon-links'],
  framework: { name: '@storybook/react-vite' },
};
export default config;"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join(".storybook/main.ts"),
            manifest: &manifest,
        };
        let output = super::resolve(&ctx).unwrap();

        assert_eq!(output.entries[0].pattern, "src/**/*.stories.{ts,tsx}");
        assert!(output.references.contains(&"@storybook/addon-links".to_string()));
        assert!(output.references.contains(&"@storybook/react-vite".to_string()));
    }
}
