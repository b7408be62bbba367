pub mod config_cmd;
pub mod fetch;
pub mod metrics;
pub mod sign;

use crate::config::ForuConfig;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "foru")]
#[command(version, about = "ForU backend client: signed requests and cached user metrics")]
pub struct Cli {
    /// Path to foru.toml
    #[arg(long, global = true, env = "FORU_CONFIG", default_value = "foru.toml")]
    pub config: PathBuf,

    /// Backend base URL (overrides config file)
    #[arg(long, global = true, env = "FORU_BASE_URL")]
    pub base_url: Option<String>,

    /// API key sent as x-foru-apikey (overrides config file)
    #[arg(long, global = true, env = "FORU_API_KEY")]
    pub api_key: Option<String>,

    /// Bearer token for user-scoped endpoints
    #[arg(long, global = true, env = "FORU_TOKEN")]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded file.
    pub fn apply_overrides(&self, config: &mut ForuConfig) {
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            config.api_key = key.clone();
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the signed header set for a request
    Sign(SignArgs),
    /// Fetch user metrics through the cache
    Metrics(MetricsArgs),
    /// Signed GET against any endpoint, printing the envelope data
    Fetch(FetchArgs),
    /// Configuration commands
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct SignArgs {
    /// HTTP method, signed as given
    pub method: String,

    /// Query string to sign (GET)
    #[arg(long, conflicts_with = "body")]
    pub query: Option<String>,

    /// JSON body to sign (POST/PUT)
    #[arg(long)]
    pub body: Option<String>,

    /// Epoch-millis timestamp; defaults to now
    #[arg(long)]
    pub timestamp: Option<String>,

    /// Output format: headers, json
    #[arg(long, default_value = "headers")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct MetricsArgs {
    /// One or more user handles
    #[arg(required = true)]
    pub users: Vec<String>,

    /// Skip the cache and always hit the backend
    #[arg(long)]
    pub force: bool,

    /// Output format: table, json
    #[arg(long, default_value = "table")]
    pub format: String,
}

#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Endpoint path relative to the base URL
    pub path: String,

    /// Query string
    #[arg(long, default_value = "")]
    pub query: String,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Validate foru.toml
    Validate,
    /// Print the effective configuration
    Show,
}
