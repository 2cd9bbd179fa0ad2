use super::js_config::{load_config_value, string_array, string_at};
use super::{EntryPattern, PluginContext, PluginDef, PluginError, PluginOutput};

const DEFAULT_TEST_PATTERNS: &[&str] = &[
    "**/*.{test,spec}.{js,mjs,cjs,ts,mts,cts,jsx,tsx}",
    "**/*.{bench,benchmark}.{js,mjs,cjs,ts,mts,cts,jsx,tsx}",
];

pub const PLUGIN: PluginDef = PluginDef {
    name: "vitest",
    enablers: &["vitest"],
    config_files: &[
        "vitest.config.ts",
        "vitest.config.js",
        "vitest.config.mts",
        "vitest.config.mjs",
        "vitest.workspace.ts",
        "vite.config.ts",
        "vite.config.js",
    ],
    entry_patterns: DEFAULT_TEST_PATTERNS,
    project_patterns: &[],
    dev_only: true,
    resolve,
};

fn resolve(ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    let value = load_config_value(ctx.config_path)?;
    let mut output = PluginOutput::default();

    // The `test` key holds vitest options both in vitest.config and when
    // embedded in vite.config.
    let test = value.get("test").cloned().unwrap_or(serde_json::Value::Null);

    for pattern in string_array(&test, "include") {
        output.entries.push(EntryPattern::new(pattern.trim_start_matches("./").to_string()));
    }

    for setup in string_array(&test, "setupFiles").into_iter().chain(
        string_array(&test, "globalSetup"),
    ) {
        if setup.starts_with('.') || setup.starts_with('/') {
            output
                .entries
                .push(EntryPattern::new(setup.trim_start_matches("./").to_string()));
        } else {
            output.references.push(setup);
        }
    }

    if let Some(environment) = string_at(&test, "environment") {
        // node and jsdom-less defaults need no extra package
        match environment {
            "node" | "edge-runtime" => {}
            "jsdom" | "happy-dom" => output.references.push(environment.to_string()),
            other => output.references.push(other.to_string()),
        }
    }

    if let Some(provider) = string_at(&test, "coverage.provider") {
        output.references.push(format!("@vitest/coverage-{provider}"));
    }

    for reporter in string_array(&test, "reporters") {
        if !matches!(
            reporter.as_str(),
            "default" | "basic" | "verbose" | "dot" | "json" | "junit" | "tap" | "tap-flat"
                | "html" | "hanging-process"
        ) {
            output.references.push(reporter);
        }
    }

    Ok(output)
}
