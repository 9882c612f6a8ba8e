//! User account repository.
//!
//! Reads go straight to the read pool; every write routes through the
//! write queue. The credential hash is produced and checked by external
//! collaborators; this repository only stores it opaquely.

use order_desk_core::{Email, UserId};

use super::schema::DEFAULT_AVATAR;
use super::statement::Statement;
use super::{Store, StoreError, map_unique_violation};
use crate::models::{ProfileUpdate, User};

/// Internal row type for user queries.
///
/// Legacy rows may predate several columns, so everything except the id
/// decodes as nullable.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    avatar: Option<String>,
    two_factor_secret: Option<String>,
    two_factor_enabled: Option<i64>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let raw_email = row.email.ok_or_else(|| {
            StoreError::DataCorruption(format!("user {} has no email", row.id))
        })?;
        let email = Email::parse(&raw_email).map_err(|e| {
            StoreError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(row.id),
            name: row.name.unwrap_or_default(),
            email,
            phone: row.phone.unwrap_or_default(),
            address: row.address.unwrap_or_default(),
            avatar: row.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_owned()),
            two_factor_secret: row.two_factor_secret,
            two_factor_enabled: row.two_factor_enabled.unwrap_or(0) != 0,
        })
    }
}

const SELECT_USER: &str = "
    SELECT id, name, email, phone, address, avatar, two_factor_secret, two_factor_enabled
    FROM users
    WHERE email = ?";

/// Repository for user account operations.
pub struct UserRepository<'a> {
    store: &'a Store,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Create a user with an already-hashed credential.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the email already exists.
    /// Returns `StoreError::Database` for other database errors.
    pub async fn create(
        &self,
        name: &str,
        email: &Email,
        credential_hash: &str,
    ) -> Result<UserId, StoreError> {
        let stmt = Statement::new(
            "INSERT INTO users (name, email, password, phone, address, avatar, two_factor_enabled)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(name)
        .bind(email.as_str())
        .bind(credential_hash)
        .bind("")
        .bind("")
        .bind(DEFAULT_AVATAR)
        .bind(false);

        let outcome = self
            .store
            .writer
            .enqueue(stmt)
            .await
            .map_err(|e| map_unique_violation(e, "email already exists"))?;

        Ok(UserId::new(outcome.last_insert_rowid))
    }

    /// Fetch a user by email. `None` means no such account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the query fails.
    /// Returns `StoreError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<User>, StoreError> {
        let row = sqlx::query_as::<_, UserRow>(SELECT_USER)
            .bind(email.as_str())
            .fetch_optional(&self.store.pool)
            .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Check a login attempt against the stored credential hash.
    ///
    /// The comparison itself (e.g. bcrypt verification) belongs to the
    /// caller; `check` receives the stored hash. An unknown email or a row
    /// without a hash verifies as `false`, not as an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the lookup fails.
    pub async fn verify_credential<F>(&self, email: &Email, check: F) -> Result<bool, StoreError>
    where
        F: FnOnce(&str) -> bool,
    {
        let hash = sqlx::query_scalar::<_, Option<String>>(
            "SELECT password FROM users WHERE email = ?",
        )
        .bind(email.as_str())
        .fetch_optional(&self.store.pool)
        .await?;

        Ok(match hash.flatten() {
            Some(stored) => check(&stored),
            None => false,
        })
    }

    /// Update the user's profile fields in one write.
    ///
    /// Returns the changed row count; 0 means no such user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the new email is already taken.
    /// Returns `StoreError::Database` for other database errors.
    pub async fn update_profile(
        &self,
        id: UserId,
        update: ProfileUpdate,
    ) -> Result<u64, StoreError> {
        let stmt = Statement::new(
            "UPDATE users SET name = ?, email = ?, phone = ?, address = ?, avatar = ? WHERE id = ?",
        )
        .bind(update.name)
        .bind(update.email.into_inner())
        .bind(update.phone)
        .bind(update.address)
        .bind(update.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_owned()))
        .bind(id.as_i64());

        let outcome = self
            .store
            .writer
            .enqueue(stmt)
            .await
            .map_err(|e| map_unique_violation(e, "email already exists"))?;

        Ok(outcome.rows_affected)
    }

    /// Replace the stored credential hash.
    ///
    /// Returns the changed row count; 0 means no such user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn change_credential(
        &self,
        id: UserId,
        new_hash: &str,
    ) -> Result<u64, StoreError> {
        let stmt = Statement::new("UPDATE users SET password = ? WHERE id = ?")
            .bind(new_hash)
            .bind(id.as_i64());

        Ok(self.store.writer.enqueue(stmt).await?.rows_affected)
    }

    /// Store a fresh two-factor secret. Enrollment is not complete until
    /// the first code verifies, so this also clears the enabled flag.
    ///
    /// Returns the changed row count; 0 means no such user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn set_two_factor_secret(
        &self,
        id: UserId,
        secret: &str,
    ) -> Result<u64, StoreError> {
        let stmt = Statement::new(
            "UPDATE users SET two_factor_secret = ?, two_factor_enabled = 0 WHERE id = ?",
        )
        .bind(secret)
        .bind(id.as_i64());

        Ok(self.store.writer.enqueue(stmt).await?.rows_affected)
    }

    /// Switch two-factor enforcement on or off.
    ///
    /// Returns the changed row count; 0 means no such user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Database` if the write fails.
    pub async fn set_two_factor_enabled(
        &self,
        id: UserId,
        enabled: bool,
    ) -> Result<u64, StoreError> {
        let stmt = Statement::new("UPDATE users SET two_factor_enabled = ? WHERE id = ?")
            .bind(enabled)
            .bind(id.as_i64());

        Ok(self.store.writer.enqueue(stmt).await?.rows_affected)
    }
}
