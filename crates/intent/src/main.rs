mod render;
mod watcher;

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use intent_diff::{Analyzer, AnalyzerConfig, ClassicDiff};
use log::{debug, info, warn};

use crate::watcher::InputWatcher;

#[derive(Parser, Debug)]
#[command(
    name = "intent",
    about = "Sort the differences between two files by what kind of edit they are",
    version
)]
struct Cli {
    /// The original file
    source: PathBuf,

    /// The edited file
    changed: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// JSON file with analyzer settings; missing fields keep their defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Re-run whenever either file changes
    #[arg(long)]
    watch: bool,

    /// Log each analysis phase
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Classic,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = load_config(cli.config.as_deref())?;
    let mut analyzer = Analyzer::new(config)?;

    print!("{}", run(&cli, &mut analyzer)?);

    if cli.watch {
        watch(&cli, &mut analyzer)?;
    }
    Ok(())
}

/// Read the analyzer settings, or fall back to the defaults.
fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let Some(path) = path else {
        return Ok(AnalyzerConfig::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config: AnalyzerConfig = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("invalid config {}", path.display()))?;
    debug!("loaded config from {}: {:?}", path.display(), config);
    Ok(config)
}

fn read_input(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

/// Analyze the two inputs once and render the result.
fn run(cli: &Cli, analyzer: &mut Analyzer) -> Result<String> {
    let source = read_input(&cli.source)?;
    let changed = read_input(&cli.changed)?;

    match cli.format {
        OutputFormat::Classic => render::classic(&ClassicDiff::new(&source, &changed)?),
        OutputFormat::Text => render::text(&analyzer.analyze(&source, &changed)),
        OutputFormat::Json => render::json(&analyzer.analyze(&source, &changed)),
    }
}

fn watch(cli: &Cli, analyzer: &mut Analyzer) -> Result<()> {
    let watcher = InputWatcher::new(&cli.source, &cli.changed)?;
    info!("watching for changes, press Ctrl-C to stop");

    loop {
        if let Some(kind) = watcher.poll_changes() {
            info!("{:?} input changed, re-running analysis", kind);
            match run(cli, analyzer) {
                Ok(output) => print!("\n{}", output),
                Err(e) => warn!("analysis failed: {:#}", e),
            }
        }
        thread::sleep(Duration::from_millis(200));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let file = write_temp(r#"{ "merge_max_gap": 3, "cache_limit": 500 }"#);
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.merge_max_gap, 3);
        assert_eq!(config.cache_limit, Some(500));
        assert_eq!(config.move_max_block, AnalyzerConfig::default().move_max_block);
    }

    #[test]
    fn no_config_means_defaults() {
        assert_eq!(load_config(None).unwrap(), AnalyzerConfig::default());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let file = write_temp(r#"{ "try_catch_similarity": 2.0 }"#);
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(format!("{:#}", err).contains("try_catch_similarity"));

        let broken = write_temp("{ not json");
        assert!(load_config(Some(broken.path())).is_err());
    }

    #[test]
    fn runs_on_files() {
        let source = write_temp("x = 5;\n");
        let changed = write_temp("x = 6;\n");
        let cli = Cli::parse_from([
            "intent",
            source.path().to_str().unwrap(),
            changed.path().to_str().unwrap(),
            "--format",
            "classic",
        ]);
        assert_eq!(cli.format, OutputFormat::Classic);

        let mut analyzer = Analyzer::default();
        let output = run(&cli, &mut analyzer).unwrap();
        assert!(output.contains("-x = 5;"));
        assert!(output.contains("+x = 6;"));
    }

    #[test]
    fn missing_input_is_an_error() {
        let cli = Cli::parse_from(["intent", "/nonexistent/old.js", "/nonexistent/new.js"]);
        let err = run(&cli, &mut Analyzer::default()).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
