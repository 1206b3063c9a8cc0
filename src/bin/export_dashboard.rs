use anyhow::{Context, Result};
use clap::Parser;
use std::{fs, path::PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};
use ventas_eda::{config::DEFAULT_SOURCE, render::html::render_page, run_pipeline, LoadCache};

/// Run the dashboard pipeline once and write the result to a file.
#[derive(Parser, Debug)]
struct Args {
    /// Sales CSV to read
    #[arg(long, default_value = DEFAULT_SOURCE)]
    source: PathBuf,

    /// Where to write the page (or model)
    #[arg(long)]
    out: PathBuf,

    /// Write the JSON render model instead of HTML
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let cache = LoadCache::new(&args.source);
    let model = run_pipeline(&cache);
    if let Some(err) = cache.get().error() {
        warn!(source = %args.source.display(), error = %err, "load failed; exporting the error page");
    } else if model.is_halted() {
        warn!(source = %args.source.display(), "no rows; exporting the title page");
    }

    let body = if args.json {
        serde_json::to_string_pretty(&model).context("serialising render model")?
    } else {
        render_page(&model)
    };

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {}", parent.display()))?;
    }
    fs::write(&args.out, body).with_context(|| format!("writing {}", args.out.display()))?;
    info!(out = %args.out.display(), halted = model.is_halted(), "export written");
    Ok(())
}
