use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::data_feed::{DataFeed, MarketData};

/// Feed driven from inside the process: whoever holds a [`PriceSender`] pushes ticks,
/// and the feed ends once every sender is dropped.
pub struct ChannelDataFeed {
    name: String,
    rx: mpsc::UnboundedReceiver<MarketData>,
}

#[derive(Debug, Clone)]
pub struct PriceSender {
    tx: mpsc::UnboundedSender<MarketData>,
}

impl PriceSender {
    /// Returns `false` if the feed has already been dropped.
    pub fn send(&self, symbol: impl Into<String>, price: f64) -> bool {
        self.tx
            .send(MarketData {
                symbol: symbol.into(),
                price,
            })
            .is_ok()
    }
}

impl ChannelDataFeed {
    pub fn new(name: String) -> (Self, PriceSender) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { name, rx }, PriceSender { tx })
    }
}

#[async_trait]
impl DataFeed for ChannelDataFeed {
    fn name(&self) -> &str {
        &self.name
    }
    async fn next_tick(&mut self) -> Option<MarketData> {
        self.rx.recv().await
    }
}
