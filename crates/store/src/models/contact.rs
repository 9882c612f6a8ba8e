//! Contact form message model.

/// Input for saving a contact message. The table is append-only; nothing
/// in this layer reads messages back.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    /// Sender name.
    pub name: String,
    /// Sender contact email.
    pub email: String,
    /// Sender Telegram handle.
    pub telegram: String,
    /// Message body.
    pub message: String,
}
