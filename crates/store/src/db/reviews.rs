//! Review repository.
//!
//! Reviews are append-only and deletable only by their author: the delete
//! statement is scoped by both review id and user id, so a zero row count
//! covers "no such review" and "not yours" alike.

use order_desk_core::{ReviewId, UserId};

use super::schema::DEFAULT_AVATAR;
use super::statement::Statement;
use super::{Store, StoreError};
use crate::models::{Review, ReviewWithAuthor};

/// Internal row type for the review listing, joined with the author's
/// public profile fields.
#[derive(Debug, sqlx::FromRow)]
struct ReviewRow {
    id: i64,
    user_id: i64,
    rating: Option<i64>,
    comment: Option<String>,
    created_at: Option<chrono::NaiveDateTime>,
    author_name: Option<String>,
    author_avatar: Option<String>,
}

impl TryFrom<ReviewRow> for ReviewWithAuthor {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        let created_at = row.created_at.ok_or_else(|| {
            StoreError::DataCorruption(format!("review {} has no creation timestamp", row.id))
        })?;

        Ok(Self {
            review: Review {
                id: ReviewId::new(row.id),
                user_id: UserId::new(row.user_id),
                rating: row.rating.unwrap_or(0),
                comment: row.comment.unwrap_or_default(),
                created_at,
            },
            author_name: row.author_name.unwrap_or_default(),
            author_avatar: row.author_avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_owned()),
        })
    }
}

/// Repository for review operations.
pub struct ReviewRepository<'a> {
    store: &'a Store,
}

impl<'a> ReviewRepository<'a> {
    /// Create a new review repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Save a review and return its identity.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn create(
        &self,
        user_id: UserId,
        rating: i64,
        comment: &str,
    ) -> Result<ReviewId, StoreError> {
        let stmt = Statement::new(
            "INSERT INTO reviews (user_id, rating, comment) VALUES (?, ?, ?)",
        )
        .bind(user_id.as_i64())
        .bind(rating)
        .bind(comment);

        let outcome = self.store.writer.enqueue(stmt).await?;
        Ok(ReviewId::new(outcome.last_insert_rowid))
    }

    /// Delete a review, scoped to its author.
    ///
    /// Returns the changed row count; 0 means the review does not exist or
    /// belongs to someone else.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn delete(
        &self,
        review_id: ReviewId,
        user_id: UserId,
    ) -> Result<u64, StoreError> {
        let stmt = Statement::new("DELETE FROM reviews WHERE id = ? AND user_id = ?")
            .bind(review_id.as_i64())
            .bind(user_id.as_i64());

        Ok(self.store.writer.enqueue(stmt).await?.rows_affected)
    }

    /// List all reviews with their authors, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    /// Returns `StoreError::DataCorruption` if any stored row is invalid.
    pub async fn list(&self) -> Result<Vec<ReviewWithAuthor>, StoreError> {
        let rows = sqlx::query_as::<_, ReviewRow>(
            "SELECT r.id, r.user_id, r.rating, r.comment, r.created_at,
                    u.name AS author_name, u.avatar AS author_avatar
             FROM reviews r
             JOIN users u ON r.user_id = u.id
             ORDER BY r.created_at DESC",
        )
        .fetch_all(&self.store.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }
}
