//! Customer order model.

use chrono::NaiveDateTime;
use order_desk_core::{OrderId, OrderStatus, PaymentStatus, ServiceItem, UserId};
use serde::Serialize;

/// A customer order as read from the store.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    /// Auto-increment identity.
    pub id: OrderId,
    /// Owning user, `None` for orders placed without an account.
    pub user_id: Option<UserId>,
    /// Customer name as entered on the order form.
    pub name: String,
    /// Customer contact email.
    pub email: String,
    /// Customer Telegram handle.
    pub telegram: String,
    /// Headline service the order was placed for.
    pub service: String,
    /// Free-form message from the customer.
    pub message: String,
    /// Fulfillment status.
    pub status: OrderStatus,
    /// Payment status, independent of fulfillment.
    pub payment_status: PaymentStatus,
    /// Agreed total, `None` until a price has been set.
    pub total_amount: Option<f64>,
    /// Line items, deserialized from the stored JSON blob.
    pub services: Vec<ServiceItem>,
    /// Creation timestamp assigned by the store.
    pub created_at: NaiveDateTime,
}

/// Input for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    /// Owning user, `None` for anonymous orders.
    pub user_id: Option<UserId>,
    /// Customer name.
    pub name: String,
    /// Customer contact email.
    pub email: String,
    /// Customer Telegram handle.
    pub telegram: String,
    /// Headline service.
    pub service: String,
    /// Free-form message.
    pub message: String,
    /// Initial payment status. New orders usually start `Pending`.
    pub payment_status: PaymentStatus,
    /// Line items to serialize into the `services` column.
    pub services: Vec<ServiceItem>,
}

/// Fields for the transactional multi-field order update.
///
/// Only the supplied fields end up in the `SET` clause. An update with both
/// fields `None` is a no-op that reports zero changed rows.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrderUpdate {
    /// New fulfillment status, if changing.
    pub status: Option<OrderStatus>,
    /// New payment status, if changing.
    pub payment_status: Option<PaymentStatus>,
}

impl OrderUpdate {
    /// Whether any field was supplied.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.payment_status.is_none()
    }
}
