use std::collections::HashMap;
use thiserror::Error;

/// A pending conditional buy: `volume` units once the price is at or below `trigger_price`.
///
/// Only [`WatchEntry::new`] builds one, so every entry held by a [`Watchlist`] is valid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchEntry {
    volume: u32,
    trigger_price: f64,
}

impl WatchEntry {
    pub fn new(volume: u32, trigger_price: f64) -> Result<Self, WatchlistError> {
        if volume == 0 {
            return Err(WatchlistError::InvalidVolume(volume));
        }
        if !trigger_price.is_finite() || trigger_price < 0.0 {
            return Err(WatchlistError::InvalidTriggerPrice(trigger_price));
        }
        Ok(Self {
            volume,
            trigger_price,
        })
    }

    pub fn volume(&self) -> u32 {
        self.volume
    }

    pub fn trigger_price(&self) -> f64 {
        self.trigger_price
    }

    /// Equality counts as a breach.
    pub fn is_triggered_by(&self, price: f64) -> bool {
        price <= self.trigger_price
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AddOutcome {
    Added,
    Replaced { previous: WatchEntry },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Trigger {
    /// Price is above the trigger; the entry stays active.
    Holding(WatchEntry),
    /// Price breached the trigger; the entry left the watchlist and its order is in flight
    /// until settled with `ticket`.
    Fired { entry: WatchEntry, ticket: u64 },
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    ticket: u64,
    entry: WatchEntry,
}

/// Securities being watched, at most one active entry each.
///
/// Fired entries are remembered until their order settles, so removing or clearing a
/// security while its order is in flight cancels any later restore.
#[derive(Debug, Default)]
pub struct Watchlist {
    entries: HashMap<String, WatchEntry>,
    in_flight: HashMap<String, InFlight>,
    next_ticket: u64,
}

impl Watchlist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `security`. Nothing is mutated on invalid input.
    pub fn add(&mut self, security: &str, entry: WatchEntry) -> Result<AddOutcome, WatchlistError> {
        if security.trim().is_empty() {
            return Err(WatchlistError::EmptySecurity);
        }
        match self.entries.insert(security.to_string(), entry) {
            Some(previous) => Ok(AddOutcome::Replaced { previous }),
            None => Ok(AddOutcome::Added),
        }
    }

    /// Removes the active entry for `security` and cancels any order of it still in flight.
    pub fn remove(&mut self, security: &str) -> Result<WatchEntry, WatchlistError> {
        let active = self.entries.remove(security);
        let in_flight = self.in_flight.remove(security).map(|flight| flight.entry);
        active
            .or(in_flight)
            .ok_or_else(|| WatchlistError::NotMonitored(security.to_string()))
    }

    /// Drops every entry, in flight ones included, and returns how many securities were dropped.
    pub fn clear(&mut self) -> usize {
        let only_in_flight = self
            .in_flight
            .keys()
            .filter(|security| !self.entries.contains_key(*security))
            .count();
        let count = self.entries.len() + only_in_flight;
        self.entries.clear();
        self.in_flight.clear();
        count
    }

    pub fn contains(&self, security: &str) -> bool {
        self.entries.contains_key(security)
    }

    pub fn get(&self, security: &str) -> Option<WatchEntry> {
        self.entries.get(security).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of all active entries, ordered by security.
    pub fn entries(&self) -> Vec<(String, WatchEntry)> {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|(security, entry)| (security.clone(), *entry))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Looks up `security` and, if `price` breaches its trigger, moves the entry in flight.
    ///
    /// Lookup, comparison and removal happen in one call so a caller holding `&mut self`
    /// can never fire the same entry twice.
    pub fn take_triggered(
        &mut self,
        security: &str,
        price: f64,
    ) -> Result<Trigger, WatchlistError> {
        let entry = self
            .get(security)
            .ok_or_else(|| WatchlistError::NotMonitored(security.to_string()))?;
        if !entry.is_triggered_by(price) {
            return Ok(Trigger::Holding(entry));
        }
        self.entries.remove(security);
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.in_flight
            .insert(security.to_string(), InFlight { ticket, entry });
        Ok(Trigger::Fired { entry, ticket })
    }

    /// Ends the flight of `ticket`. With `restore` set the entry goes back on the watchlist,
    /// unless it was removed, cleared or replaced meanwhile. Returns whether it went back.
    pub(crate) fn settle(&mut self, security: &str, ticket: u64, restore: bool) -> bool {
        if self
            .in_flight
            .get(security)
            .is_none_or(|flight| flight.ticket != ticket)
        {
            return false;
        }
        let Some(flight) = self.in_flight.remove(security) else {
            return false;
        };
        if !restore || self.entries.contains_key(security) {
            return false;
        }
        self.entries.insert(security.to_string(), flight.entry);
        true
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum WatchlistError {
    #[error("{0} is not being monitored")]
    NotMonitored(String),
    #[error("Security identifier must not be empty")]
    EmptySecurity,
    #[error("Volume must be positive, got {0}")]
    InvalidVolume(u32),
    #[error("Trigger price must be a finite non-negative number, got {0}")]
    InvalidTriggerPrice(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(volume: u32, trigger_price: f64) -> WatchEntry {
        WatchEntry::new(volume, trigger_price).unwrap()
    }

    fn fire(watchlist: &mut Watchlist, security: &str, price: f64) -> u64 {
        match watchlist.take_triggered(security, price).unwrap() {
            Trigger::Fired { ticket, .. } => ticket,
            other => panic!("expected {security} to fire, got {other:?}"),
        }
    }

    #[test]
    fn add_then_replace_keeps_single_entry() {
        let mut watchlist = Watchlist::new();
        assert_eq!(watchlist.add("IBM", entry(150, 200.0)), Ok(AddOutcome::Added));
        let outcome = watchlist.add("IBM", entry(75, 180.0)).unwrap();
        assert_eq!(
            outcome,
            AddOutcome::Replaced {
                previous: entry(150, 200.0)
            }
        );
        assert_eq!(watchlist.len(), 1);
        assert_eq!(watchlist.get("IBM").unwrap().volume(), 75);
    }

    #[test]
    fn invalid_input_is_rejected() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();

        assert_eq!(
            watchlist.add("  ", entry(1, 1.0)),
            Err(WatchlistError::EmptySecurity)
        );
        assert_eq!(WatchEntry::new(0, 1.0), Err(WatchlistError::InvalidVolume(0)));
        assert!(matches!(
            WatchEntry::new(10, f64::NAN),
            Err(WatchlistError::InvalidTriggerPrice(_))
        ));
        assert_eq!(
            WatchEntry::new(10, -0.5),
            Err(WatchlistError::InvalidTriggerPrice(-0.5))
        );

        assert_eq!(watchlist.len(), 1);
        assert_eq!(watchlist.get("IBM"), Some(entry(150, 200.0)));
    }

    #[test]
    fn zero_trigger_price_is_allowed() {
        let mut watchlist = Watchlist::new();
        watchlist.add("PENNY", entry(10, 0.0)).unwrap();
        assert!(matches!(
            watchlist.take_triggered("PENNY", 0.01),
            Ok(Trigger::Holding(_))
        ));
        assert!(matches!(
            watchlist.take_triggered("PENNY", 0.0),
            Ok(Trigger::Fired { .. })
        ));
    }

    #[test]
    fn remove_distinguishes_missing_entries() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        assert!(watchlist.remove("IBM").is_ok());
        assert_eq!(
            watchlist.remove("IBM"),
            Err(WatchlistError::NotMonitored("IBM".into()))
        );
    }

    #[test]
    fn take_triggered_uses_inclusive_threshold() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();

        assert_eq!(
            watchlist.take_triggered("IBM", 200.01),
            Ok(Trigger::Holding(entry(150, 200.0)))
        );
        assert!(watchlist.contains("IBM"));

        assert!(matches!(
            watchlist.take_triggered("IBM", 200.0),
            Ok(Trigger::Fired { entry: fired, .. }) if fired == entry(150, 200.0)
        ));
        assert!(!watchlist.contains("IBM"));

        assert_eq!(
            watchlist.take_triggered("IBM", 1.0),
            Err(WatchlistError::NotMonitored("IBM".into()))
        );
    }

    #[test]
    fn nan_price_never_triggers() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        assert!(matches!(
            watchlist.take_triggered("IBM", f64::NAN),
            Ok(Trigger::Holding(_))
        ));
        assert!(watchlist.contains("IBM"));
    }

    #[test]
    fn settle_restores_only_when_asked() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        let ticket = fire(&mut watchlist, "IBM", 190.0);
        assert!(!watchlist.settle("IBM", ticket, false));
        assert!(!watchlist.contains("IBM"));
        // A settled ticket cannot be reused
        assert!(!watchlist.settle("IBM", ticket, true));

        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        let ticket = fire(&mut watchlist, "IBM", 190.0);
        assert!(watchlist.settle("IBM", ticket, true));
        assert_eq!(watchlist.get("IBM"), Some(entry(150, 200.0)));
    }

    #[test]
    fn settle_does_not_clobber_newer_entry() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        let ticket = fire(&mut watchlist, "IBM", 190.0);

        watchlist.add("IBM", entry(20, 150.0)).unwrap();
        assert!(!watchlist.settle("IBM", ticket, true));
        assert_eq!(watchlist.get("IBM"), Some(entry(20, 150.0)));
    }

    #[test]
    fn stale_ticket_does_not_settle_newer_flight() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        let first = fire(&mut watchlist, "IBM", 190.0);
        watchlist.add("IBM", entry(20, 150.0)).unwrap();
        let second = fire(&mut watchlist, "IBM", 140.0);

        assert!(!watchlist.settle("IBM", first, true));
        assert!(watchlist.settle("IBM", second, true));
        assert_eq!(watchlist.get("IBM"), Some(entry(20, 150.0)));
    }

    #[test]
    fn remove_cancels_in_flight_entry() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        let ticket = fire(&mut watchlist, "IBM", 190.0);

        assert_eq!(watchlist.remove("IBM"), Ok(entry(150, 200.0)));
        assert!(!watchlist.settle("IBM", ticket, true));
        assert!(!watchlist.contains("IBM"));
    }

    #[test]
    fn clear_cancels_in_flight_entries() {
        let mut watchlist = Watchlist::new();
        watchlist.add("IBM", entry(150, 200.0)).unwrap();
        watchlist.add("GIB", entry(10, 40.0)).unwrap();
        let ticket = fire(&mut watchlist, "IBM", 190.0);

        assert_eq!(watchlist.clear(), 2);
        assert!(!watchlist.settle("IBM", ticket, true));
        assert!(watchlist.is_empty());
    }

    #[test]
    fn clear_reports_count_and_entries_are_sorted() {
        let mut watchlist = Watchlist::new();
        for security in ["META", "IBM", "GIB"] {
            watchlist.add(security, entry(150, 200.0)).unwrap();
        }
        let names: Vec<_> = watchlist.entries().into_iter().map(|(s, _)| s).collect();
        assert_eq!(names, ["GIB", "IBM", "META"]);

        assert_eq!(watchlist.clear(), 3);
        assert!(watchlist.is_empty());
        assert_eq!(watchlist.clear(), 0);
    }
}
