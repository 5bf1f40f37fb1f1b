use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::fmt;
use trigger_trader::config::BotConfig;
use trigger_trader::factory::build_strategies;
use trigger_trader::strategy::Strategy;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The log verbosity level
    #[clap(short, long, default_value_t = Level::INFO)]
    pub verbosity: Level,
    /// The path to the config file
    #[clap(short, long)]
    pub config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Setup logger
    let subscriber = fmt().with_max_level(args.verbosity).finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;

    // Read config file
    let config = BotConfig::deserialize_from_file(&args.config).context("Failed to read config")?;

    // Build strategies from config
    let strategies = build_strategies(config).context("Failed to build strategies")?;

    // Fire up strategies
    let mut handles = Vec::new();
    for mut strategy in strategies {
        let handle = tokio::task::spawn(async move { strategy.run().await });
        handles.push(handle);
    }
    for result in futures::future::join_all(handles).await {
        result.context("Strategy task panicked")?;
    }
    info!("All feeds exhausted, shutting down");
    Ok(())
}
