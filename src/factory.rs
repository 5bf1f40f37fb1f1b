use crate::{
    broker::{Broker, dummy::DummyBroker},
    config::{
        BotConfig, BrokerConfig, BrokerType, DataFeedConfig, DataFeedType, WatchEntryConfig,
    },
    data_feed::{DataFeed, csv_data_feed::CsvDataFeed},
    strategy::trigger_buy::TriggerBuyStrategy,
    watchlist::{AddOutcome, WatchEntry, Watchlist, WatchlistError},
};
use config::Value;
use std::{collections::HashMap, sync::Arc, time::Duration};
use thiserror::Error;
use tracing::{debug, warn};

pub fn build_strategies(bot_config: BotConfig) -> Result<Vec<TriggerBuyStrategy>, FactoryError> {
    let brokers = build_brokers(bot_config.brokers)?;
    let mut data_feeds = build_data_feeds(bot_config.data_feeds)?;
    let mut strategies = Vec::new();
    for config in bot_config.strategies {
        // Brokers are shared between strategies. That's why they stay in Arc
        let broker = brokers
            .get(&config.broker)
            .ok_or(FactoryError::UnknownBroker(config.broker))?;
        // Feeds stay at Box because each strategy should own its feed instance
        // (to avoid tick stealing)
        let data_feed = data_feeds
            .remove(&config.data_feed)
            .ok_or(FactoryError::UnknownDataFeed(config.data_feed))?;
        let watchlist = build_watchlist(&config.name, config.watchlist)?;
        debug!(
            "Strategy '{}' starts with {} watched securities ({:?})",
            config.name,
            watchlist.len(),
            config.removal_policy
        );
        let strategy = TriggerBuyStrategy::new(config.name, broker.clone())
            .with_data_feed(data_feed)
            .with_watchlist(watchlist)
            .with_removal_policy(config.removal_policy);
        strategies.push(strategy);
    }
    Ok(strategies)
}

fn build_watchlist(
    strategy: &str,
    entries: Vec<WatchEntryConfig>,
) -> Result<Watchlist, FactoryError> {
    let mut watchlist = Watchlist::new();
    for entry in entries {
        let outcome = WatchEntry::new(entry.volume, entry.trigger_price)
            .and_then(|watch| watchlist.add(&entry.security, watch))
            .map_err(|err| FactoryError::InvalidWatchEntry(strategy.to_string(), err))?;
        if let AddOutcome::Replaced { .. } = outcome {
            warn!(
                "Strategy '{strategy}' lists {} more than once, keeping the last entry",
                entry.security
            );
        }
    }
    Ok(watchlist)
}

fn build_brokers(
    configs: Vec<BrokerConfig>,
) -> Result<HashMap<String, Arc<dyn Broker>>, FactoryError> {
    let mut brokers = HashMap::new();
    for config in configs {
        let broker: Arc<dyn Broker> = match config.r#type {
            BrokerType::DummyBroker => {
                let params = config.params.as_ref();
                let reject_orders = get_bool_param(params, "reject_orders", false)?;
                let latency = Duration::from_millis(get_uint_param(params, "latency_ms", 0)?);
                let broker = if reject_orders {
                    DummyBroker::rejecting(config.name.clone())
                } else {
                    DummyBroker::new(config.name.clone())
                };
                Arc::new(broker.with_latency(latency))
            }
        };
        brokers.insert(config.name, broker);
    }
    Ok(brokers)
}

fn build_data_feeds(
    configs: Vec<DataFeedConfig>,
) -> Result<HashMap<String, Box<dyn DataFeed>>, FactoryError> {
    let mut data_feeds = HashMap::new();
    for config in configs {
        let data_feed: Box<dyn DataFeed> = match config.r#type {
            DataFeedType::CsvDataFeed => {
                let path_value = config
                    .params
                    .get("path")
                    .ok_or(FactoryError::CsvDataFeedWithoutPath)?;
                let path = path_value
                    .clone()
                    .into_string()
                    .map_err(|err| FactoryError::WrongCsvPathFormat(err.to_string()))?;
                Box::new(
                    CsvDataFeed::new(config.name.clone(), path)
                        .map_err(|err| FactoryError::CsvDataFeedInitError(err.to_string()))?,
                )
            }
        };
        data_feeds.insert(config.name, data_feed);
    }
    Ok(data_feeds)
}

fn get_bool_param(
    params: Option<&HashMap<String, Value>>,
    key: &str,
    default: bool,
) -> Result<bool, FactoryError> {
    match params.and_then(|p| p.get(key)) {
        None => Ok(default),
        Some(v) => v
            .clone()
            .into_bool()
            .map_err(|err| FactoryError::UnexpectedParameterType(err.to_string())),
    }
}

fn get_uint_param(
    params: Option<&HashMap<String, Value>>,
    key: &str,
    default: u64,
) -> Result<u64, FactoryError> {
    match params.and_then(|p| p.get(key)) {
        None => Ok(default),
        Some(v) => v
            .clone()
            .into_uint()
            .map_err(|err| FactoryError::UnexpectedParameterType(err.to_string())),
    }
}

#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("A different parameter type was expected: `{0}`")]
    UnexpectedParameterType(String),
    #[error("The broker `{0}` was not found in the config")]
    UnknownBroker(String),
    #[error("The data feed `{0}` was not found in the config")]
    UnknownDataFeed(String),
    #[error("The CSV Data Feed config does not contain a path parameter")]
    CsvDataFeedWithoutPath,
    #[error("The path of the CSV Data Feed config is not the expected format: `{0}`")]
    WrongCsvPathFormat(String),
    #[error("CSV Data Feed initialization failed: `{0}`")]
    CsvDataFeedInitError(String),
    #[error("Invalid watchlist entry in strategy `{0}`: {1}")]
    InvalidWatchEntry(String, WatchlistError),
}
