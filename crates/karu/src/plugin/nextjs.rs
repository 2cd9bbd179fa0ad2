use super::{PluginContext, PluginDef, PluginError, PluginOutput};

/// Next.js discovers routes from the filesystem; the entry surface is the
/// conventions themselves, not the config file.
pub const PLUGIN: PluginDef = PluginDef {
    name: "nextjs",
    enablers: &["next"],
    config_files: &["next.config.js", "next.config.mjs", "next.config.ts"],
    entry_patterns: &[
        "middleware.{js,ts}",
        "instrumentation.{js,ts}",
        "app/**/{page,layout,loading,error,not-found,template,default,route,global-error}.{js,jsx,ts,tsx}",
        "app/**/{sitemap,robots,manifest,icon,apple-icon,opengraph-image,twitter-image}.{js,ts,tsx}",
        "pages/**/*.{js,jsx,ts,tsx}",
        "src/middleware.{js,ts}",
        "src/instrumentation.{js,ts}",
        "src/app/**/{page,layout,loading,error,not-found,template,default,route,global-error}.{js,jsx,ts,tsx}",
        "src/pages/**/*.{js,jsx,ts,tsx}",
    ],
    project_patterns: &[],
    dev_only: false,
    resolve,
};

fn resolve(_ctx: &PluginContext) -> Result<PluginOutput, PluginError> {
    // Route files are covered by the static entry patterns; the config file
    // itself is handled by the host (entry + import references).
    Ok(PluginOutput::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::PackageJson;
    use crate::plugin::builtin_plugins;

    #[test]
    fn enabled_by_next_dependency() {
        let manifest: PackageJson =
            serde_json::from_str(r#"{ "dependencies": { "next": "^14.0.0" } }"#).unwrap();
        let plugin = builtin_plugins().iter().find(|p| p.name == "nextjs").unwrap();
        assert!(plugin.is_enabled_by(&manifest));
        assert!(!plugin.dev_only);
    }
}
