//! Domain models returned by the store's repositories.

pub mod contact;
pub mod order;
pub mod review;
pub mod user;

pub use contact::NewContactMessage;
pub use order::{NewOrder, Order, OrderUpdate};
pub use review::{Review, ReviewWithAuthor};
pub use user::{ProfileUpdate, User};
