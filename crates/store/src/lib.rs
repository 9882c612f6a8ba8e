//! Order Desk Store - serialized write access to the embedded database.
//!
//! This crate owns the single SQLite file behind the Order Desk backend and
//! guarantees that concurrent asynchronous writers cannot corrupt it:
//!
//! - All writes flow through a FIFO [`db::WriteSerializer`] that admits one
//!   statement at a time to the single write connection.
//! - Transient `SQLITE_BUSY`/`SQLITE_LOCKED` failures are retried with
//!   exponential backoff by the retrying executor in [`db::retry`].
//! - Multi-field order updates run inside an immediate-mode transaction that
//!   always commits or rolls back exactly once.
//! - Startup reconciles the live schema additively (missing columns are
//!   added, existing data is never dropped or renamed).
//!
//! Reads bypass the queue and go to a small read pool; SQLite's own WAL
//! isolation governs read consistency. Callers that need read-after-write
//! consistency must await the write before reading.
//!
//! # Entry point
//!
//! [`db::Store::open`] connects, creates missing tables, reconciles the
//! schema, and returns a cloneable handle. Entity access goes through the
//! repository views: [`db::Store::users`], [`db::Store::orders`],
//! [`db::Store::reviews`], [`db::Store::contact_messages`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod models;

pub use config::{ConfigError, StoreConfig};
pub use db::{Store, StoreError};
