//! Status enums for orders.
//!
//! Both enums are stored in the database as lowercase text and round-trip
//! through [`as_str`](OrderStatus::as_str) / [`FromStr`]. An unknown stored
//! value is a data-integrity problem and surfaces as a parse error.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a stored status value is not a known variant.
#[derive(thiserror::Error, Debug, Clone)]
#[error("unknown {kind} status: {value:?}")]
pub struct StatusParseError {
    /// Which status enum failed to parse ("order" or "payment").
    pub kind: &'static str,
    /// The offending stored value.
    pub value: String,
}

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order received and being worked on. Default for new orders.
    Processing,
    /// Work finished and delivered.
    Completed,
    /// Order cancelled; kept for the customer's history.
    Cancelled,
}

impl OrderStatus {
    /// The stored representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(Self::Processing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(StatusParseError {
                kind: "order",
                value: other.to_owned(),
            }),
        }
    }
}

/// Order payment status, independent of fulfillment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Payment not yet received. Default for new orders.
    Pending,
    /// Payment confirmed.
    Paid,
}

impl PaymentStatus {
    /// The stored representation of this status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = StatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            other => Err(StatusParseError {
                kind: "payment",
                value: other.to_owned(),
            }),
        }
    }
}
