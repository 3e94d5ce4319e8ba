use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use travel_shards::TravelStore;
use travel_shards::config::AppConfig;
use travel_shards::domain::ShardCheck;

#[derive(Parser)]
#[command(name = "health-check")]
#[command(about = "Check connectivity and schema of the travel plan shards")]
struct Cli {
    /// Check only this shard.
    shard: Option<String>,
    /// Print the report as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to read configuration")?;
    let store = TravelStore::new(Arc::new(config.shard_context()?));

    let results = match &cli.shard {
        Some(shard) => {
            if !store.context().pools().contains(shard) {
                bail!("unknown shard '{shard}'");
            }
            vec![(shard.clone(), store.check_shard(shard).await)]
        }
        None => store.check_shards().await,
    };
    store.context().close().await;

    let unhealthy = if cli.json {
        print_json(&results)?
    } else {
        print_report(&results)
    };

    if unhealthy > 0 {
        bail!("{unhealthy} of {} shard(s) unhealthy", results.len());
    }
    Ok(())
}

fn is_healthy(result: &travel_shards::Result<ShardCheck>) -> bool {
    matches!(result, Ok(check) if check.schema_complete())
}

fn print_report(results: &[(String, travel_shards::Result<ShardCheck>)]) -> usize {
    let mut unhealthy = 0;
    for (shard, result) in results {
        match result {
            Ok(check) if check.schema_complete() => println!(
                "{shard}: OK ({} travel plans, {} locations)",
                check.travel_plans, check.locations
            ),
            Ok(check) => {
                unhealthy += 1;
                println!(
                    "{shard}: SCHEMA INCOMPLETE ({} of 2 tables present)",
                    check.tables_found
                );
            }
            Err(err) => {
                unhealthy += 1;
                println!("{shard}: ERROR ({err})");
            }
        }
    }

    println!(
        "{} of {} shard(s) healthy",
        results.len() - unhealthy,
        results.len()
    );
    unhealthy
}

fn print_json(results: &[(String, travel_shards::Result<ShardCheck>)]) -> Result<usize> {
    let report: Vec<serde_json::Value> = results
        .iter()
        .map(|(shard, result)| match result {
            Ok(check) => serde_json::json!({
                "shard": shard,
                "healthy": check.schema_complete(),
                "tables_found": check.tables_found,
                "travel_plans": check.travel_plans,
                "locations": check.locations,
            }),
            Err(err) => serde_json::json!({
                "shard": shard,
                "healthy": false,
                "error": err.to_string(),
            }),
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(results.iter().filter(|(_, result)| !is_healthy(result)).count())
}
