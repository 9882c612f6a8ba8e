//! Order Desk Core - Shared types library.
//!
//! This crate provides common types used across all Order Desk components:
//! - `store` - The serialized write-access layer over the embedded database
//! - the HTTP layer (external to this repository) that consumes the store
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
