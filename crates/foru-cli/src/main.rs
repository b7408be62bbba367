mod cli;
mod config;

use clap::Parser;
use cli::{Cli, Commands};
use config::ForuConfig;
use tracing::debug;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ForuConfig::load_or_default(&cli.config);
    cli.apply_overrides(&mut config);
    debug!("Using base URL {}", config.base_url);

    let token = cli.token.as_deref();
    match cli.command {
        Commands::Sign(args) => cli::sign::run(args, &config, token).await,
        Commands::Metrics(args) => cli::metrics::run(args, &config, token).await,
        Commands::Fetch(args) => cli::fetch::run(args, &config, token).await,
        Commands::Config(cmd) => cli::config_cmd::run(cmd, &cli.config, &config),
    }
}
