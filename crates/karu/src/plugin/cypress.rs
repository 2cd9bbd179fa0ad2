use super::js_config::{load_config_value, string_at};
use super::{EntryPattern, PluginContext, PluginDef, PluginError, PluginOutput};

pub const PLUGIN: PluginDef = PluginDef {
    name: "cypress",
    enablers: &["cypress"],
    config_files: &[
        "cypress.config.js",
        "cypress.config.ts",
        "cypress.config.mjs",
        "cypress.config.cjs",
    ],
    entry_patterns: &[
        "cypress/e2e/**/*.cy.{js,jsx,ts,tsx}",
        "cypress/support/e2e.{js,jsx,ts,tsx}",
        "cypress/support/component.{js,jsx,ts,tsx}",
        "cypress/plugins/index.{js,ts}",
    ],
    project_patterns: &["cypress/**/*.{js,jsx,ts,tsx}"],
    dev_only: true,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    for key in ["e2e.specPattern", "component.specPattern"] {
        if let Some(pattern) = string_at(&value, key) {
            output
                .entries
                .push(EntryPattern::new(pattern.trim_start_matches("./").to_string()));
        }
    }
    for key in ["e2e.supportFile", "component.supportFile"] {
        if let Some(support) = string_at(&value, key) {
            if support != "false" {
                output
                    .entries
                    .push(EntryPattern::new(support.trim_start_matches("./").to_string()));
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
    fn spec_pattern_and_support_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("cypress.config.ts"),
            r#"export default {
  e2e: {
    specPattern: './tests/e2e/**/*.cy.ts',
    supportFile: './tests/support.ts',
  },
};"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join("cypress.config.ts"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        let patterns: Vec<_> = output.entries.iter().map(|e| e.pattern.as_str()).collect();
        assert_eq!(patterns, ["tests/e2e/**/*.cy.ts", "tests/support.ts"]);
    }
}
