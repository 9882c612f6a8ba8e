//! Order repository.
//!
//! Status and payment-status changes go through the transactional update
//! path: one immediate-mode transaction per update, serialized like every
//! other write. Line items are stored as a JSON blob in the `services`
//! column and deserialized on every read.

use order_desk_core::{OrderId, OrderStatus, PaymentStatus, ServiceItem, UserId};
use tracing::{debug, instrument};

use super::statement::Statement;
use super::{Store, StoreError};
use crate::models::{NewOrder, Order, OrderUpdate};

/// Internal row type for order queries. Everything except the id decodes
/// as nullable; pre-reconciliation rows miss several columns.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: i64,
    user_id: Option<i64>,
    name: Option<String>,
    email: Option<String>,
    telegram: Option<String>,
    service: Option<String>,
    message: Option<String>,
    status: Option<String>,
    total_amount: Option<f64>,
    payment_status: Option<String>,
    services: Option<String>,
    created_at: Option<chrono::NaiveDateTime>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .as_deref()
            .unwrap_or(OrderStatus::Processing.as_str())
            .parse::<OrderStatus>()
            .map_err(|e| StoreError::DataCorruption(e.to_string()))?;
        let payment_status = row
            .payment_status
            .as_deref()
            .unwrap_or(PaymentStatus::Pending.as_str())
            .parse::<PaymentStatus>()
            .map_err(|e| StoreError::DataCorruption(e.to_string()))?;
        let services = parse_services(row.id, row.services.as_deref())?;
        let created_at = row.created_at.ok_or_else(|| {
            StoreError::DataCorruption(format!("order {} has no creation timestamp", row.id))
        })?;

        Ok(Self {
            id: OrderId::new(row.id),
            user_id: row.user_id.map(UserId::new),
            name: row.name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            telegram: row.telegram.unwrap_or_default(),
            service: row.service.unwrap_or_default(),
            message: row.message.unwrap_or_default(),
            status,
            payment_status,
            total_amount: row.total_amount,
            services,
            created_at,
        })
    }
}

/// Deserialize the line-item blob. An absent blob is an empty list; a
/// present but malformed one is a data-integrity failure, not a not-found.
fn parse_services(
    order_id: i64,
    blob: Option<&str>,
) -> Result<Vec<ServiceItem>, StoreError> {
    match blob {
        None | Some("") => Ok(Vec::new()),
        Some(raw) => serde_json::from_str(raw).map_err(|e| {
            StoreError::DataCorruption(format!("order {order_id} has a malformed line-item blob: {e}"))
        }),
    }
}

const SELECT_ORDER: &str = "
    SELECT id, user_id, name, email, telegram, service, message,
           status, total_amount, payment_status, services, created_at
    FROM orders";

/// Repository for order operations.
pub struct OrderRepository<'a> {
    store: &'a Store,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Save a new order and return its identity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn create(&self, order: NewOrder) -> Result<OrderId, StoreError> {
        let services = serde_json::to_string(&order.services).map_err(|e| {
            StoreError::DataCorruption(format!("failed to serialize line items: {e}"))
        })?;

        let stmt = Statement::new(
            "INSERT INTO orders (user_id, name, email, telegram, service, message,
                                 status, payment_status, services, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP)",
        )
        .bind(order.user_id.map(|id| id.as_i64()))
        .bind(order.name)
        .bind(order.email)
        .bind(order.telegram)
        .bind(order.service)
        .bind(order.message)
        .bind(OrderStatus::Processing.as_str())
        .bind(order.payment_status.as_str())
        .bind(services);

        let outcome = self.store.writer.enqueue(stmt).await?;
        Ok(OrderId::new(outcome.last_insert_rowid))
    }

    /// Fetch one order scoped to its owner. `None` means the order does
    /// not exist or belongs to someone else; callers map that to a
    /// not-found/forbidden response.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    /// Returns `StoreError::DataCorruption` if the stored row is invalid.
    pub async fn get(
        &self,
        order_id: OrderId,
        user_id: UserId,
    ) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query_as::<_, OrderRow>(
            &format!("{SELECT_ORDER} WHERE id = ? AND user_id = ?"),
        )
        .bind(order_id.as_i64())
        .bind(user_id.as_i64())
        .fetch_optional(&self.store.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List a user's orders.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    /// Returns `StoreError::DataCorruption` if any stored row is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!("{SELECT_ORDER} WHERE user_id = ?"))
            .bind(user_id.as_i64())
            .fetch_all(&self.store.pool)
            .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Atomically update the supplied status fields.
    ///
    /// Builds a `SET` clause from only the fields present and runs it
    /// inside one immediate-mode transaction, so a status and a payment
    /// status changed together are observed together. Returns the changed
    /// row count; 0 means no such order, a normal outcome the caller must
    /// check. An empty update performs no statement and reports 0.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RetriesExhausted` if the store stayed busy
    /// through the retry budget (the transaction is rolled back first), or
    /// `StoreError::Database` for permanent failures.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn update_fields(
        &self,
        order_id: OrderId,
        update: OrderUpdate,
    ) -> Result<u64, StoreError> {
        if update.is_empty() {
            debug!("empty order update, nothing to do");
            return Ok(0);
        }

        let mut assignments = Vec::new();
        let mut stmt_params = Vec::new();
        if let Some(status) = update.status {
            assignments.push("status = ?");
            stmt_params.push(status.as_str());
        }
        if let Some(payment_status) = update.payment_status {
            assignments.push("payment_status = ?");
            stmt_params.push(payment_status.as_str());
        }

        let mut stmt = Statement::new(format!(
            "UPDATE orders SET {} WHERE id = ?",
            assignments.join(", ")
        ));
        for param in stmt_params {
            stmt = stmt.bind(param);
        }
        stmt = stmt.bind(order_id.as_i64());

        let outcome = self.store.writer.enqueue_transactional(stmt).await?;
        Ok(outcome.rows_affected)
    }

    /// Set the agreed total for an order, inside its own transaction.
    ///
    /// Returns the changed row count; 0 means no such order.
    ///
    /// # Errors
    ///
    /// As [`update_fields`](Self::update_fields).
    pub async fn update_total(
        &self,
        order_id: OrderId,
        total_amount: f64,
    ) -> Result<u64, StoreError> {
        let stmt = Statement::new("UPDATE orders SET total_amount = ? WHERE id = ?")
            .bind(total_amount)
            .bind(order_id.as_i64());

        let outcome = self.store.writer.enqueue_transactional(stmt).await?;
        Ok(outcome.rows_affected)
    }
}
