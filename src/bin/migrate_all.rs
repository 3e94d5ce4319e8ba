use anyhow::{Context, Result, anyhow};
use clap::Parser;
use travel_shards::{MIGRATOR, config::AppConfig};

#[derive(Parser)]
#[command(name = "migrate-all")]
#[command(about = "Apply the travel plan schema to every configured shard")]
struct Cli {
    /// Migrate only this shard.
    #[arg(long)]
    shard: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to read configuration")?;
    let ctx = config.shard_context()?;

    let targets: Vec<String> = match cli.shard {
        Some(shard) => {
            if !ctx.pools().contains(&shard) {
                return Err(anyhow!("unknown shard '{shard}'"));
            }
            vec![shard]
        }
        None => ctx.pools().names().map(str::to_string).collect(),
    };

    println!("Migrating {} shard(s)", targets.len());

    let mut migrated = 0;
    for shard in &targets {
        let pool = ctx
            .pools()
            .get(shard)
            .ok_or_else(|| anyhow!("unknown shard '{shard}'"))?;

        // Stop at the first failure so the remaining shards keep their old schema.
        if let Err(err) = MIGRATOR.run(pool).await {
            println!("  {shard}: FAILED ({err})");
            println!("Migrated {migrated}/{} shard(s)", targets.len());
            ctx.close().await;
            return Err(err).with_context(|| format!("migration failed on shard {shard}"));
        }

        migrated += 1;
        println!("  {shard}: ok");
    }

    println!("Migrated {migrated}/{} shard(s)", targets.len());
    ctx.close().await;
    Ok(())
}
