use super::{PluginContext, PluginDef, PluginError, PluginOutput};

/// Tailwind's config mostly matters for its own imports (plugins are
/// `require(...)` calls), which the host collects when it registers the
/// config file as an entry.
pub const PLUGIN: PluginDef = PluginDef {
    name: "tailwind",
    enablers: &["tailwindcss"],
    config_files: &[
        "tailwind.config.js",
        "tailwind.config.ts",
        "tailwind.config.cjs",
        "tailwind.config.mjs",
    ],
    entry_patterns: &[],
    project_patterns: &[],
    dev_only: true,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let mut output = PluginOutput::default();

    // `plugins: [require('@tailwindcss/typography')]` does not evaluate to a
    // literal; scan the raw source for require specifiers instead.
    let content = std::fs::read_to_string(ctx.config_path)?;
    for capture in require_specifiers(&content) {
        if !capture.starts_with('.') {
            output.references.push(capture);
        }
    }

    Ok(output)
}

fn require_specifiers(content: &str) -> Vec<String> {
    use regex::Regex;
    use std::sync::OnceLock;

    static REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = REGEX
        .get_or_init(|| Regex::new(r#"require\(\s*['"]([^'"]+)['"]\s*\)"#).unwrap());

    regex.captures_iter(content).map(|cap| cap[1].to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageJson;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn require_plugins_are_references() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("tailwind.config.js"),
            r#"module.exports = {
  content: ['./src/**/*.tsx'],
  plugins: [require('@tailwindcss/typography'), require('./local-plugin')],
};"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join("tailwind.config.js"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        assert_eq!(output.references, ["@tailwindcss/typography"]);
    }
}
