use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use hn_autoconfig::Orchestrator;
use hn_demo::{catalog, Partition, PartitionGenerator, PartitionInstance, PartitionLoader, PartitionValidator};
use hn_types::AutoconfigConfig;

/// Runs the number partitioning autoconfiguration.
///
/// Usage: `hn-autoconfig [config.json]`, or set `HONE_CONFIG`.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("HONE_CONFIG").ok());
    let config = match &config_path {
        Some(path) => AutoconfigConfig::from_file(path)
            .with_context(|| format!("failed to load configuration from {path}"))?,
        None => AutoconfigConfig::default(),
    }
    .with_env_overrides()?;
    info!(
        "Configuration: {}",
        config_path.as_deref().unwrap_or("built-in defaults")
    );

    let orchestrator = Orchestrator::<PartitionInstance, Partition>::builder(config)
        .generator(PartitionGenerator)
        .instance_loader(PartitionLoader)
        .validator(PartitionValidator)
        .catalog(catalog())
        .build()?;

    let report = orchestrator.run().await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
