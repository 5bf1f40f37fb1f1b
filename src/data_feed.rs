use async_trait::async_trait;

pub mod channel_data_feed;
pub mod csv_data_feed;

#[derive(Debug, Clone, PartialEq)]
pub struct MarketData {
    pub symbol: String,
    pub price: f64,
}

/// Source of price ticks. Ticks for one symbol arrive in time order; `None` ends the feed.
#[async_trait]
pub trait DataFeed: Send + Sync {
    fn name(&self) -> &str;
    async fn next_tick(&mut self) -> Option<MarketData>;
}
