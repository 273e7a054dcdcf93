use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use stringsvc::{config::StringSvcConfig, init_tracing, run};

/// String service with an optionally proxied uppercase operation
#[derive(Parser, Debug)]
#[command(name = "stringsvc", version, about)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP listen address (host:port)
    #[arg(short, long)]
    listen: Option<String>,

    /// Comma-separated instances to proxy uppercase requests to
    #[arg(short, long)]
    proxy: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => StringSvcConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => StringSvcConfig::default(),
    };

    // Command line flags take precedence over the file
    if let Some(listen) = &cli.listen {
        config.apply_listen(listen)?;
    }
    if let Some(proxy) = cli.proxy {
        config.proxy.instances = proxy;
    }

    run(config).await.context("String service error")?;

    Ok(())
}
