//! User account model.

use order_desk_core::{Email, UserId};
use serde::Serialize;

/// A registered user account.
///
/// The credential hash is deliberately absent: it never leaves the
/// repository except through the `verify_credential` callback seam.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Auto-increment identity.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Unique login email.
    pub email: Email,
    /// Contact phone number, empty until the profile is filled in.
    pub phone: String,
    /// Postal address, empty until the profile is filled in.
    pub address: String,
    /// Path to the avatar image, backfilled with a default for old rows.
    pub avatar: String,
    /// TOTP secret, present once two-factor setup has started.
    pub two_factor_secret: Option<String>,
    /// Whether two-factor login is enforced for this account.
    pub two_factor_enabled: bool,
}

/// Profile fields updatable in one write.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    /// New display name.
    pub name: String,
    /// New login email.
    pub email: Email,
    /// New contact phone number.
    pub phone: String,
    /// New postal address.
    pub address: String,
    /// New avatar path; `None` restores the default avatar.
    pub avatar: Option<String>,
}
