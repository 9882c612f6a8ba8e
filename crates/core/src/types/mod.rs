//! Core types for Order Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod service_item;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use service_item::ServiceItem;
pub use status::*;
