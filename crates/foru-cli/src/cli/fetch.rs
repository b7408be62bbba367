use super::FetchArgs;
use crate::config::ForuConfig;
use anyhow::Result;
use foru_client::ForuClient;
use foru_core::ApiOutcome;
use serde_json::Value;

pub async fn run(args: FetchArgs, config: &ForuConfig, token: Option<&str>) -> Result<()> {
    let client = ForuClient::new(config.client_config(token), config.request_auth())?;

    match client.get::<Value>(&args.path, &args.query).await? {
        ApiOutcome::Success(Some(data)) => println!("{}", serde_json::to_string_pretty(&data)?),
        ApiOutcome::Success(None) => println!("(no data)"),
        ApiOutcome::NotFound => println!("(not found)"),
        ApiOutcome::Failed { code, message } => anyhow::bail!("backend returned {}: {}", code, message),
    }

    Ok(())
}
