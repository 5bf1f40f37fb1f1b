use crate::{
    broker::{Broker, BrokerError},
    data_feed::DataFeed,
    strategy::Strategy,
    types::Order,
    watchlist::{AddOutcome, Trigger, WatchEntry, Watchlist, WatchlistError},
};
use async_trait::async_trait;
use chrono::Local;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, warn};

/// What happens to a fired entry when the broker refuses the order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub enum RemovalPolicy {
    /// The entry is gone as soon as the order is sent, whatever the broker answers.
    #[default]
    FireAndForget,
    /// A rejected order puts the entry back, unless it was re-added meanwhile.
    RestoreOnFailure,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RemoveOutcome {
    Removed(WatchEntry),
    NotMonitored,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PriceUpdateOutcome {
    NotMonitored,
    Holding {
        trigger_price: f64,
    },
    Bought(Order),
    BuyFailed {
        order: Order,
        error: BrokerError,
        /// Whether the entry was put back on the watchlist
        restored: bool,
    },
}

/// Everything that changes the watchlist, for observers that prefer a channel to logs.
///
/// Ticks that only hold or target an unwatched security send nothing, so the volume of
/// events is bounded by trader actions and fired entries, not by the feed rate.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    Added {
        security: String,
        entry: WatchEntry,
    },
    Replaced {
        security: String,
        previous: WatchEntry,
        current: WatchEntry,
    },
    Removed {
        security: String,
        entry: WatchEntry,
    },
    NotMonitored {
        security: String,
    },
    Cleared {
        count: usize,
    },
    Bought(Order),
    BuyFailed {
        order: Order,
        error: BrokerError,
        restored: bool,
    },
}

/// Buys a configured volume of a security once its price falls to or below a trigger.
///
/// Each entry fires at most once: the watchlist lock covers lookup, comparison and
/// removal, and is released before the broker is called. A second update for the same
/// security that races with an in-flight order finds nothing to fire.
pub struct TriggerBuyStrategy {
    name: String,
    broker: Arc<dyn Broker>,
    data_feed: Option<Box<dyn DataFeed>>,
    watchlist: Mutex<Watchlist>,
    removal_policy: RemovalPolicy,
    events: Option<mpsc::UnboundedSender<WatchEvent>>,
}

impl TriggerBuyStrategy {
    pub fn new(name: String, broker: Arc<dyn Broker>) -> Self {
        Self {
            name,
            broker,
            data_feed: None,
            watchlist: Mutex::new(Watchlist::new()),
            removal_policy: RemovalPolicy::default(),
            events: None,
        }
    }

    pub fn with_data_feed(mut self, data_feed: Box<dyn DataFeed>) -> Self {
        self.data_feed = Some(data_feed);
        self
    }

    pub fn with_watchlist(mut self, watchlist: Watchlist) -> Self {
        self.watchlist = Mutex::new(watchlist);
        self
    }

    pub fn with_removal_policy(mut self, removal_policy: RemovalPolicy) -> Self {
        self.removal_policy = removal_policy;
        self
    }

    pub fn with_event_sender(mut self, events: mpsc::UnboundedSender<WatchEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Starts watching `security`, replacing any entry it already had.
    pub async fn add_stock(
        &self,
        security: &str,
        volume: u32,
        trigger_price: f64,
    ) -> Result<AddOutcome, WatchlistError> {
        let added = match WatchEntry::new(volume, trigger_price) {
            Ok(entry) => self
                .watchlist
                .lock()
                .await
                .add(security, entry)
                .map(|outcome| (outcome, entry)),
            Err(err) => Err(err),
        };
        let (outcome, current) =
            added.inspect_err(|err| warn!("{}: rejected watch on {security}: {err}", self.name))?;
        match outcome {
            AddOutcome::Added => {
                info!(
                    "{}: watching {security}, buy {volume} at or below {trigger_price}",
                    self.name
                );
                self.emit(WatchEvent::Added {
                    security: security.to_string(),
                    entry: current,
                });
            }
            AddOutcome::Replaced { previous } => {
                warn!(
                    "{}: replacing watch on {security} ({} at {}) with {volume} at {trigger_price}",
                    self.name,
                    previous.volume(),
                    previous.trigger_price()
                );
                self.emit(WatchEvent::Replaced {
                    security: security.to_string(),
                    previous,
                    current,
                });
            }
        }
        Ok(outcome)
    }

    /// Stops watching `security`. An order of it still in flight is not recalled, but its
    /// entry will not be restored if that order is rejected.
    pub async fn remove_stock(&self, security: &str) -> RemoveOutcome {
        let removed = self.watchlist.lock().await.remove(security);
        match removed {
            Ok(entry) => {
                info!("{}: {security} removed", self.name);
                self.emit(WatchEvent::Removed {
                    security: security.to_string(),
                    entry,
                });
                RemoveOutcome::Removed(entry)
            }
            Err(err) => {
                warn!("{}: {err}", self.name);
                self.emit(WatchEvent::NotMonitored {
                    security: security.to_string(),
                });
                RemoveOutcome::NotMonitored
            }
        }
    }

    /// Stops watching everything. Returns how many entries were dropped.
    pub async fn clear_all_stocks(&self) -> usize {
        let count = self.watchlist.lock().await.clear();
        info!("{}: cleared {count} watched securities", self.name);
        self.emit(WatchEvent::Cleared { count });
        count
    }

    pub async fn is_being_monitored(&self, security: &str) -> bool {
        self.watchlist.lock().await.contains(security)
    }

    pub async fn watch_entry(&self, security: &str) -> Option<WatchEntry> {
        self.watchlist.lock().await.get(security)
    }

    pub async fn watched(&self) -> Vec<(String, WatchEntry)> {
        self.watchlist.lock().await.entries()
    }

    /// Reacts to a new price for `security`, buying if it breached the trigger.
    pub async fn on_price_update(&self, security: &str, price: f64) -> PriceUpdateOutcome {
        // Guard is dropped at the end of the statement, before any broker call
        let trigger = self.watchlist.lock().await.take_triggered(security, price);
        let (entry, ticket) = match trigger {
            Ok(Trigger::Fired { entry, ticket }) => (entry, ticket),
            Ok(Trigger::Holding(entry)) => {
                debug!(
                    "{}: {security} at {price} is above trigger {}",
                    self.name,
                    entry.trigger_price()
                );
                return PriceUpdateOutcome::Holding {
                    trigger_price: entry.trigger_price(),
                };
            }
            Err(err) => {
                // Expected for every security nobody watches, so no event
                debug!("{}: ignoring {price} tick, {err}", self.name);
                return PriceUpdateOutcome::NotMonitored;
            }
        };

        let volume = entry.volume();
        let order = Order::buy(security, volume, price, Local::now().naive_local());
        let placed = self.broker.place_order(&order).await;
        let restore =
            placed.is_err() && self.removal_policy == RemovalPolicy::RestoreOnFailure;
        let restored = self
            .watchlist
            .lock()
            .await
            .settle(security, ticket, restore);
        match placed {
            Ok(()) => {
                info!("{}: bought {volume} of {security} at {price}", self.name);
                self.emit(WatchEvent::Bought(order.clone()));
                PriceUpdateOutcome::Bought(order)
            }
            Err(err) => {
                error!(
                    "{}: failed to buy {volume} of {security} at {price} on {}: {err} \
                    (watch restored: {restored})",
                    self.name,
                    self.broker.name()
                );
                self.emit(WatchEvent::BuyFailed {
                    order: order.clone(),
                    error: err.clone(),
                    restored,
                });
                PriceUpdateOutcome::BuyFailed {
                    order,
                    error: err,
                    restored,
                }
            }
        }
    }

    fn emit(&self, event: WatchEvent) {
        if let Some(events) = &self.events {
            // Nobody listening is fine
            let _ = events.send(event);
        }
    }
}

#[async_trait]
impl Strategy for TriggerBuyStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&mut self) {
        let Some(mut data_feed) = self.data_feed.take() else {
            warn!("{} has no data feed attached, nothing to run", self.name);
            return;
        };
        info!(
            "Running {} using feed {} on broker {}",
            self.name,
            data_feed.name(),
            self.broker.name()
        );
        while let Some(data) = data_feed.next_tick().await {
            self.on_price_update(&data.symbol, data.price).await;
        }
        info!(
            "Feed {} ended, {} still watching {} securities",
            data_feed.name(),
            self.name,
            self.watchlist.lock().await.len()
        );
    }
}
