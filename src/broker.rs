use crate::types::Order;
use async_trait::async_trait;
use thiserror::Error;

pub mod dummy;

/// Execution sink the strategies submit their orders to.
#[async_trait]
pub trait Broker: Send + Sync {
    fn name(&self) -> &str;
    async fn place_order(&self, order: &Order) -> Result<(), BrokerError>;
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrokerError {
    #[error("Order rejected by {broker}: {reason}")]
    Rejected { broker: String, reason: String },
}
