use crate::types::Order;
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::{Broker, BrokerError};

/// Paper broker that records every order it receives.
///
/// When built with [`DummyBroker::rejecting`] it still records the attempt but answers
/// every order with [`BrokerError::Rejected`]. [`DummyBroker::with_latency`] makes each
/// order take a while to answer, like a remote venue would.
pub struct DummyBroker {
    name: String,
    orders: Mutex<Vec<Order>>,
    reject_orders: bool,
    latency: Duration,
}

#[async_trait]
impl Broker for DummyBroker {
    fn name(&self) -> &str {
        &self.name
    }
    async fn place_order(&self, order: &Order) -> Result<(), BrokerError> {
        self.orders.lock().await.push(order.clone());
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if self.reject_orders {
            warn!("{} rejected {:?}", self.name, order);
            return Err(BrokerError::Rejected {
                broker: self.name.clone(),
                reason: "rejecting all orders".into(),
            });
        }
        info!(
            "{} filled buy of {} {} at {}",
            self.name, order.qty, order.symbol, order.price
        );
        Ok(())
    }
}

impl DummyBroker {
    pub fn new(name: String) -> Self {
        Self {
            name,
            orders: Default::default(),
            reject_orders: false,
            latency: Duration::ZERO,
        }
    }

    pub fn rejecting(name: String) -> Self {
        Self {
            reject_orders: true,
            ..Self::new(name)
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub async fn get_orders(&self) -> Vec<Order> {
        self.orders.lock().await.clone()
    }
}
