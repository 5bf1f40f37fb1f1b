#![allow(dead_code)]

use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use trigger_trader::broker::dummy::DummyBroker;
use trigger_trader::strategy::trigger_buy::TriggerBuyStrategy;

pub const STOCK: &str = "IBM";
pub const VOLUME: u32 = 150;
pub const PRICE: f64 = 200.0;

pub fn strategy_with_dummy_broker() -> (TriggerBuyStrategy, Arc<DummyBroker>) {
    let broker = Arc::new(DummyBroker::new("Dummy".to_string()));
    let strategy = TriggerBuyStrategy::new("TestTrigger".to_string(), broker.clone());
    (strategy, broker)
}

/// IBM drifts down from 210 to 190 while GIB stays flat at 50.
pub fn generate_ticks_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "symbol,price").unwrap();
    for i in 0..=20 {
        writeln!(file, "IBM,{}", 210.0 - i as f64).unwrap();
        writeln!(file, "GIB,50.0").unwrap();
    }
    file
}

pub fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}
