use super::SignArgs;
use crate::config::ForuConfig;
use anyhow::Result;
use foru_core::{timestamp_millis, Payload};

pub fn payload(args: &SignArgs) -> Result<Payload> {
    match (&args.query, &args.body) {
        (Some(query), _) => Ok(Payload::query(query.clone())),
        (None, Some(body)) => {
            let value = serde_json::from_str(body)
                .map_err(|e| anyhow::anyhow!("--body is not valid JSON: {}", e))?;
            Ok(Payload::Json(value))
        }
        (None, None) => Ok(Payload::Empty),
    }
}

pub async fn run(args: SignArgs, config: &ForuConfig, token: Option<&str>) -> Result<()> {
    let payload = payload(&args)?;
    let auth = config.request_auth();
    let signer = auth.signer().await?;
    let timestamp = args.timestamp.clone().unwrap_or_else(timestamp_millis);
    let headers = signer.headers(&args.method, &payload, &timestamp, token);

    match args.format.as_str() {
        "json" => {
            let map: serde_json::Map<String, serde_json::Value> = headers
                .pairs()
                .into_iter()
                .map(|(name, value)| (name.to_string(), value.into()))
                .collect();
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
        _ => {
            for (name, value) in headers.pairs() {
                println!("{}: {}", name, value);
            }
        }
    }

    Ok(())
}
