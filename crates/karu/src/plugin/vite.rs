use super::js_config::load_config_value;
use super::{EntryPattern, PluginContext, PluginDef, PluginError, PluginOutput};

pub const PLUGIN: PluginDef = PluginDef {
    name: "vite",
    enablers: &["vite"],
    config_files: &[
        "vite.config.js",
        "vite.config.ts",
        "vite.config.mjs",
        "vite.config.cjs",
        "vite.config.mts",
        "vite.config.cts",
    ],
    entry_patterns: &["index.html"],
    project_patterns: &[],
    dev_only: false,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    // build.rollupOptions.input: string, array, or { name: path } map
    if let Some(input) = value
        .get("build")
        .and_then(|b| b.get("rollupOptions"))
        .and_then(|r| r.get("input"))
    {
        let mut inputs = Vec::new();
        match input {
            serde_json::Value::String(s) => inputs.push(s.clone()),
            serde_json::Value::Array(items) => {
                inputs.extend(items.iter().filter_map(|v| v.as_str().map(String::from)));
            }
            serde_json::Value::Object(map) => {
                inputs.extend(map.values().filter_map(|v| v.as_str().map(String::from)));
            }
            _ => {}
        }
        for input in inputs {
            output
                .entries
                .push(EntryPattern::new(input.trim_start_matches("./").to_string()));
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
    fn rollup_inputs_become_entries() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("vite.config.ts"),
            r#"import { defineConfig } from 'vite';
export default defineConfig({
  build: {
    rollupOptions: {
      input: { main: './src/main.ts', admin: './src/admin.ts' },
    },
  },
});"#,
        )
        .unwrap();

        let manifest = PackageJson::default();
        let ctx = PluginContext {
            workspace_dir: dir.path(),
            config_path: &dir.path().join("vite.config.ts"),
            manifest: &manifest,
        };
        let output = resolve(&ctx).unwrap();

        let mut patterns: Vec<_> =
            output.entries.iter().map(|e| e.pattern.as_str()).collect();
        patterns.sort_unstable();
        assert_eq!(patterns, ["src/admin.ts", "src/main.ts"]);
    }
}
