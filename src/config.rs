use std::collections::HashMap;

use anyhow::Result;
use config::Value;
use serde::Deserialize;

use crate::strategy::trigger_buy::RemovalPolicy;

#[derive(Debug, Deserialize)]
pub struct BotConfig {
    pub brokers: Vec<BrokerConfig>,
    pub strategies: Vec<StrategyConfig>,
    pub data_feeds: Vec<DataFeedConfig>,
}

#[derive(Debug, Deserialize)]
pub struct BrokerConfig {
    pub name: String,
    pub r#type: BrokerType,
    pub params: Option<HashMap<String, Value>>,
}

#[derive(Debug, Deserialize)]
pub struct StrategyConfig {
    /// The name of the strategy
    pub name: String,
    /// The broker that should be used for the specific strategy
    pub broker: String,
    /// The data feed that should be used for the specific strategy
    pub data_feed: String,
    /// What to do with a fired watch when the broker rejects the order
    #[serde(default)]
    pub removal_policy: RemovalPolicy,
    /// Securities watched from startup
    #[serde(default)]
    pub watchlist: Vec<WatchEntryConfig>,
}

#[derive(Debug, Deserialize)]
pub struct WatchEntryConfig {
    pub security: String,
    pub volume: u32,
    pub trigger_price: f64,
}

#[derive(Debug, Deserialize)]
pub enum BrokerType {
    DummyBroker,
}

#[derive(Debug, Deserialize)]
pub struct DataFeedConfig {
    pub name: String,
    pub r#type: DataFeedType,
    pub params: HashMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub enum DataFeedType {
    CsvDataFeed,
}

impl BotConfig {
    pub fn deserialize_from_file(path: &str) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path))
            .build()?;
        let config = config.try_deserialize()?;
        Ok(config)
    }
}
