//! Contact message repository. Append-only.

use order_desk_core::ContactMessageId;

use super::statement::Statement;
use super::{Store, StoreError};
use crate::models::NewContactMessage;

/// Repository for contact form submissions.
pub struct ContactMessageRepository<'a> {
    store: &'a Store,
}

impl<'a> ContactMessageRepository<'a> {
    /// Create a new contact message repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Save a contact message and return its identity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn create(
        &self,
        message: NewContactMessage,
    ) -> Result<ContactMessageId, StoreError> {
        let stmt = Statement::new(
            "INSERT INTO contact_messages (name, email, telegram, message) VALUES (?, ?, ?, ?)",
        )
        .bind(message.name)
        .bind(message.email)
        .bind(message.telegram)
        .bind(message.message);

        let outcome = self.store.writer.enqueue(stmt).await?;
        Ok(ContactMessageId::new(outcome.last_insert_rowid))
    }
}
