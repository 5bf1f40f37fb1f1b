use chrono::NaiveDateTime;

/// A market buy placed when a watched price breaches its trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub symbol: String,
    pub qty: u32,
    /// Live price that caused the order, not the configured trigger
    pub price: f64,
    pub timestamp: NaiveDateTime,
}

impl Order {
    pub fn buy(symbol: impl Into<String>, qty: u32, price: f64, timestamp: NaiveDateTime) -> Self {
        Self {
            symbol: symbol.into(),
            qty,
            price,
            timestamp,
        }
    }
}
