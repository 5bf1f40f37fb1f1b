use super::DataFeed;
use crate::data_feed::MarketData;
use async_trait::async_trait;
use csv::ReaderBuilder;
use serde::Deserialize;
use std::{collections::VecDeque, fs::File};
use thiserror::Error;

/// Replays `symbol,price` rows from a CSV file with a header line.
pub struct CsvDataFeed {
    name: String,
    data: VecDeque<MarketData>,
}

#[derive(Debug, Deserialize)]
struct CsvTick {
    symbol: String,
    price: f64,
}

impl CsvDataFeed {
    pub fn new(name: String, path: String) -> Result<Self, CsvDataFeedError> {
        let file = File::open(&path)
            .map_err(|err| CsvDataFeedError::FileOpenError(path.clone(), err.to_string()))?;
        let mut rdr = ReaderBuilder::new().trim(csv::Trim::All).from_reader(file);
        let mut data = VecDeque::new();
        for (line, result) in rdr.deserialize::<CsvTick>().enumerate() {
            // Header is line 1
            let record = result.map_err(|err| {
                CsvDataFeedError::InvalidRecord(path.clone(), line + 2, err.to_string())
            })?;
            data.push_back(MarketData {
                symbol: record.symbol,
                price: record.price,
            });
        }
        Ok(Self { name, data })
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }
}

#[async_trait]
impl DataFeed for CsvDataFeed {
    fn name(&self) -> &str {
        &self.name
    }
    async fn next_tick(&mut self) -> Option<MarketData> {
        self.data.pop_front()
    }
}

#[derive(Debug, Error)]
pub enum CsvDataFeedError {
    #[error("Failed to open CSV file ({0}): {1}")]
    FileOpenError(String, String),
    #[error("Invalid record in CSV file ({0}) at line {1}: {2}")]
    InvalidRecord(String, usize, String),
}
