use super::js_config::{load_config_value, string_array};
use super::{PluginContext, PluginDef, PluginError, PluginOutput};

pub const PLUGIN: PluginDef = PluginDef {
    name: "eslint",
    enablers: &["eslint"],
    config_files: &[
        ".eslintrc",
        ".eslintrc.json",
        ".eslintrc.js",
        ".eslintrc.cjs",
        ".eslintrc.yml",
        ".eslintrc.yaml",
        "eslint.config.js",
        "eslint.config.mjs",
        "eslint.config.cjs",
        "eslint.config.ts",
    ],
    entry_patterns: &[],
    project_patterns: &[],
    dev_only: true,
    resolve,
};

/// Map legacy eslintrc shorthand to the package it loads.
/// "airbnb" -> eslint-config-airbnb, "plugin:react/recommended" ->
/// eslint-plugin-react, "@scope" -> @scope/eslint-config.
fn extends_package(value: &str) -> Option<String> {
    if value.starts_with('.') || value.starts_with('/') || value == "eslint:recommended"
        || value == "eslint:all"
    {
        return None;
    }

    if let Some(plugin) = value.strip_prefix("plugin:") {
        let name = plugin.split('/').next().unwrap_or(plugin);
        return Some(plugin_package(name));
    }

    if value.starts_with('@') {
        // "@scope/name" may already be a full config package
        if value.contains("eslint-config") {
            return Some(value.split('/').take(2).collect::<Vec<_>>().join("/"));
        }
        let mut parts = value.splitn(2, '/');
        let scope = parts.next().unwrap_or(value);
        return match parts.next() {
            Some(rest) => Some(format!("{scope}/eslint-config-{rest}")),
            None => Some(format!("{scope}/eslint-config")),
        };
    }

    if value.starts_with("eslint-config-") {
        return Some(value.to_string());
    }
    Some(format!("eslint-config-{value}"))
}

fn plugin_package(name: &str) -> String {
    if name.starts_with('@') {
        match name.split_once('/') {
            Some(_) => name.to_string(),
            None => format!("{name}/eslint-plugin"),
        }
    } else if name.starts_with("eslint-plugin-") {
        name.to_string()
    } else {
        format!("eslint-plugin-{name}")
    }
}

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let file_name = ctx
        .config_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    // Flat configs export arrays of spreads and calls that rarely evaluate
    // statically; their own imports (collected by the host) carry the
    // references, so only legacy eslintrc shapes are mined here.
    if file_name.starts_with("eslint.config.") {
        return Ok(PluginOutput::default());
    }

    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    for item in string_array(&value, "extends") {
        if let Some(package) = extends_package(&item) {
            output.references.push(package);
        }
    }

    for name in string_array(&value, "plugins") {
        output.references.push(plugin_package(&name));
    }

    if let Some(parser) = value.get("parser").and_then(|v| v.as_str()) {
        if !parser.starts_with('.') {
            output.references.push(parser.to_string());
        }
    }

    Ok(output)
}
