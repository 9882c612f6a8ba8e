//! Customer review model.

use chrono::NaiveDateTime;
use order_desk_core::{ReviewId, UserId};
use serde::Serialize;

/// A review left by a registered user.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    /// Auto-increment identity.
    pub id: ReviewId,
    /// Author. Reviews are deletable only by their owner.
    pub user_id: UserId,
    /// Star rating.
    pub rating: i64,
    /// Review text.
    pub comment: String,
    /// Creation timestamp assigned by the store.
    pub created_at: NaiveDateTime,
}

/// A review joined with its author's public profile fields, for listing.
#[derive(Debug, Clone, Serialize)]
pub struct ReviewWithAuthor {
    /// The review itself.
    #[serde(flatten)]
    pub review: Review,
    /// Author display name.
    pub author_name: String,
    /// Author avatar path.
    pub author_avatar: String,
}
