use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use resource_loader::{
    app::Application,
    cache::CacheHandle,
    compose::Control,
    config::Config,
    loader::Loader,
    transport::HttpTransport,
};

#[derive(Parser)]
#[command(name = "resource-loader")]
#[command(version)]
#[command(about = "Load remote images as data URIs through a persistent cache")]
#[command(long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (overrides config file)
    #[arg(short = 'v', long)]
    log_level: Option<String>,

    /// Cache database URL (overrides config file)
    #[arg(short = 'd', long, value_name = "URL")]
    database_url: Option<String>,

    /// Skip the persistent cache entirely
    #[arg(long)]
    no_cache: bool,

    /// Red channel, 0-255
    #[arg(long, value_name = "N")]
    red: Option<String>,

    /// Green channel, 0-255
    #[arg(long, value_name = "N")]
    green: Option<String>,

    /// Blue channel, 0-255
    #[arg(long, value_name = "N")]
    blue: Option<String>,

    /// Gaussian blur standard deviation
    #[arg(long, value_name = "N")]
    blur: Option<String>,

    /// Write results here instead of stdout, one per line
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    /// Resources to load, absolute or relative to `http.base_url`
    #[arg(required = true, value_name = "URL")]
    urls: Vec<String>,
}

impl Cli {
    fn controls(&self) -> Result<Vec<(Control, f64)>> {
        let raw = [
            (Control::Red, &self.red),
            (Control::Green, &self.green),
            (Control::Blue, &self.blue),
            (Control::Blur, &self.blur),
        ];
        raw.into_iter()
            .map(|(control, text)| match text {
                Some(text) => Control::parse_value(text)
                    .map(|value| (control, value))
                    .with_context(|| format!("Invalid {control:?} value '{text}'")),
                None => Ok((control, control.initial_value())),
            })
            .collect()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_from_file(&cli.config)?;
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    if let Some(database_url) = &cli.database_url {
        config.cache.database_url = database_url.clone();
    }
    if cli.no_cache {
        config.cache.enabled = false;
    }

    let log_filter = format!("resource_loader={}", config.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting resource-loader v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from: {}", cli.config);

    let controls = cli.controls()?;
    let cache = Arc::new(CacheHandle::new(config.cache.clone()));
    let transport = Arc::new(HttpTransport::new(&config.http)?);
    let mut loader = Loader::new(Application::new(controls), cache, transport);

    for url in &cli.urls {
        let before = loader.listener().loaded().len();
        loader.load(url).await;
        if loader.listener().loaded().len() == before {
            warn!("Nothing was delivered for '{}'", url);
        }
    }

    let mut lines = String::new();
    for resource in loader.listener().loaded() {
        lines.push_str(resource.display());
        lines.push('\n');
    }

    match &cli.output {
        Some(path) => {
            tokio::fs::write(path, lines)
                .await
                .with_context(|| format!("Failed to write {path}"))?;
            info!("Wrote {} resources to {}", loader.listener().loaded().len(), path);
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(lines.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    Ok(())
}
