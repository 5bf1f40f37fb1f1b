pub mod broker;
pub mod config;
pub mod data_feed;
pub mod factory;
pub mod strategy;
pub mod types;
pub mod watchlist;
