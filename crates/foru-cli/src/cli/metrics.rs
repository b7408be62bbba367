use super::MetricsArgs;
use crate::config::ForuConfig;
use anyhow::Result;
use foru_client::Foru;
use tracing::debug;

pub async fn run(args: MetricsArgs, config: &ForuConfig, token: Option<&str>) -> Result<()> {
    let foru = Foru::new(
        config.client_config(token),
        config.metrics_settings(),
        config.request_auth(),
    )?;
    let cache = foru.metrics_cache();

    let lookups = args.users.iter().map(|user| cache.get(user, args.force));
    let results = futures::future::join_all(lookups).await;

    let stats = cache.stats();
    debug!(
        hits = stats.hits,
        fetches = stats.fetches,
        failures = stats.failures,
        "Metrics cache stats"
    );

    if args.format == "json" {
        let out: serde_json::Map<String, serde_json::Value> = args
            .users
            .iter()
            .zip(&results)
            .map(|(user, m)| Ok((user.clone(), serde_json::to_value(m)?)))
            .collect::<Result<_>>()?;
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!(
        "{:<24}  {:>9}  {:>9}  {:>10}  {:>10}  {:>9}",
        "USER", "IDENTIFI", "REACH", "IMPRESSION", "ENGAGEMENT", "ON-CHAIN"
    );
    println!("{}", "─".repeat(84));
    for (user, m) in args.users.iter().zip(&results) {
        println!(
            "{:<24}  {:>9.1}  {:>9.1}  {:>10.1}  {:>10.1}  {:>9.1}",
            user,
            m.identifi_score,
            m.reach_score,
            m.impression_score,
            m.engagement_score,
            m.on_chain_score
        );
    }

    Ok(())
}
