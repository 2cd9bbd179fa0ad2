use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use karu::classifier::selected_kinds;
use karu::cli::{Cli, OutputFormat};
use karu::reporter::{report_json, report_text};
use karu::{analyze_project, FileConfig, KaruConfig, KaruError};

/// Find default config file in directory. A `karu` key in package.json is
/// the fallback container.
fn find_default_config(dir: &Path) -> Option<PathBuf> {
    let json_path = dir.join("karu.json");
    if json_path.exists() {
        return Some(json_path);
    }

    let jsonc_path = dir.join("karu.jsonc");
    if jsonc_path.exists() {
        return Some(jsonc_path);
    }

    None
}

/// Load config from file path, supporting .json and .jsonc
fn load_config_file(path: &Path) -> Result<FileConfig, Box<dyn std::error::Error>> {
    let mut content = fs::read_to_string(path)?;
    json_strip_comments::strip(&mut content)?;
    let config: FileConfig = serde_json::from_str(&content)?;
    Ok(config)
}

/// Load the `karu` key from package.json, if present.
fn load_manifest_config(dir: &Path) -> Option<FileConfig> {
    let content = fs::read_to_string(dir.join("package.json")).ok()?;
    let manifest: serde_json::Value = serde_json::from_str(&content).ok()?;
    let value = manifest.get("karu")?.clone();
    serde_json::from_value(value).ok()
}

fn run() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let run_dir = cli.run_dir();

    if cli.include_libs {
        // External d.ts traversal multiplies memory use and is not built
        let err = KaruError::Unsupported(
            "--include-libs (external-library type inspection)".to_string(),
        );
        eprintln!("Error: {err}");
        return Ok(ExitCode::from(2));
    }

    let file_config = if let Some(config_path) = &cli.config {
        if !config_path.exists() {
            eprintln!("Error: Config file not found: {}", config_path.display());
            return Ok(ExitCode::from(2));
        }
        Some(load_config_file(config_path)?)
    } else {
        match find_default_config(&run_dir) {
            Some(path) => match load_config_file(&path) {
                Ok(cfg) => Some(cfg),
                Err(e) => {
                    eprintln!("Error: invalid config file '{}': {e}", path.display());
                    return Ok(ExitCode::from(2));
                }
            },
            None => load_manifest_config(&run_dir),
        }
    };

    // File config first, CLI flags layered on top
    let mut config = KaruConfig { cwd: run_dir.clone(), ..Default::default() };
    if let Some(file_config) = file_config {
        file_config.apply(&mut config);
    }
    if !cli.entry.is_empty() {
        config.entry = cli.entry.clone();
    }
    if !cli.project.is_empty() {
        config.project = cli.project.clone();
    }
    if !cli.ignore.is_empty() {
        config.ignore = cli.ignore.clone();
    }
    config.production = cli.production;
    config.gitignore = !cli.no_gitignore;
    config.workspace = cli.workspace.clone();

    let included = selected_kinds(&cli.included_kinds(), &cli.excluded_kinds());

    match analyze_project(&config, &included) {
        Ok(report) => {
            match cli.reporter {
                OutputFormat::Text => report_text(&report),
                OutputFormat::Json => report_json(&report),
            }
            if report.has_issues() {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        }
        Err(KaruError::NoEntryFiles(patterns)) => {
            eprintln!("Error: No entry files found matching patterns: {patterns:?}");
            Ok(ExitCode::from(2))
        }
        Err(e) => {
            eprintln!("Error: {e}");
            Ok(ExitCode::from(2))
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(2)
        }
    }
}
