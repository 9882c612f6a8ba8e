//! Order line items.

use serde::{Deserialize, Serialize};

/// A single line item on an order: a named service and its price.
///
/// Line items are persisted as a JSON array in the order row's `services`
/// column and deserialized on every read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceItem {
    /// Human-readable name of the purchased service.
    pub service: String,
    /// Agreed price for this line item.
    pub price: f64,
}

impl ServiceItem {
    /// Create a new line item.
    #[must_use]
    pub fn new(service: impl Into<String>, price: f64) -> Self {
        Self {
            service: service.into(),
            price,
        }
    }
}
