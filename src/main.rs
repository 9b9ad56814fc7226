use affordability::{
    build_dataset,
    check::check_dataset,
    config::Config,
    document::{FileSystemSource, TableLocator},
    output::{read_payload, write_payload},
};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the combined affordability dataset
    Build {
        /// YAML config; built-in defaults when omitted
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Directory holding one folder per year
        #[arg(long, value_name = "DIR")]
        data_root: Option<PathBuf>,
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Summarise a built dataset
    Check {
        #[arg(value_name = "JSON")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Build {
            config,
            data_root,
            output,
        } => build(config.as_deref(), data_root, output),
        Commands::Check { path } => check(&path),
    }
}

fn build(config_path: Option<&Path>, data_root: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
    // ─── 2) resolve configuration ────────────────────────────────────
    let mut config = match config_path {
        Some(p) => Config::load_from_file(p)?,
        None => Config::default(),
    };
    if let Some(root) = data_root {
        config.data_root = root;
    }
    if let Some(out) = output {
        config.output = out;
    }
    info!(
        data_root = %config.data_root.display(),
        years = config.years.len(),
        geographies = config.geographies.len(),
        "startup"
    );

    // ─── 3) build ────────────────────────────────────────────────────
    let locator = TableLocator::new(&config.data_root, &config.primary.file_prefix);
    let source = FileSystemSource::new(locator, &config.secondary.files);
    let dataset = build_dataset(&config, &source).context("building dataset")?;

    if dataset.report.is_clean() {
        info!("every row matched its label");
    } else {
        warn!(
            fallbacks = dataset.report.fallback_count(),
            "some rows were taken by fallback; check the log above"
        );
    }

    if let Some(reason) = &dataset.secondary_error {
        warn!(%reason, "dataset has no benchmark values");
    }

    // ─── 4) write ────────────────────────────────────────────────────
    let output = config.output.clone();
    write_payload(&output, &dataset.into_payload())?;
    info!(path = %output.display(), "done");
    Ok(())
}

fn check(path: &Path) -> Result<()> {
    let payload = read_payload(path)?;
    let report = check_dataset(&payload.metrics);
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
