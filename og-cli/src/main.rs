//! # OG Studio
//!
//! Command-line editor and exporter for Open Graph images.

use clap::Parser;
use og_cli::{CliArgs, Studio, StudioConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,og_core=debug,og_renderer=debug"));

    // Logs go to stderr so command output can be piped.
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    // Use JSON format in production (RUST_LOG_FORMAT=json)
    if std::env::var("RUST_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = CliArgs::parse();
    let config = StudioConfig::from(&args);
    tracing::debug!("Data directory: {}", config.data_dir.display());

    let mut studio = Studio::open(config)?;
    let mut stdout = std::io::stdout().lock();
    studio.execute(args.command, &mut stdout).await?;
    Ok(())
}
