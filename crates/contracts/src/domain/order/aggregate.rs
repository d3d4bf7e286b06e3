use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::enums::OrderStatus;

/// Order identifier as assigned by the ordering system.
/// Unique within a feed snapshot and stable across polls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn value(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Single order line
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    /// Unit price, 0 when the feed did not carry a parseable one
    pub unit_price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// Canonical order as produced by feed ingestion.
///
/// Orders are ephemeral: every successful poll replaces the working
/// list wholesale, there is no client-side store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub status: OrderStatus,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub delivery_address: Option<String>,
    /// Placement time in the business-local calendar. An order without
    /// one belongs to no date bucket but still counts toward all-time
    /// totals.
    pub order_time: Option<NaiveDateTime>,
    /// Present once the order has been delivered
    pub delivery_time: Option<NaiveDateTime>,
    /// 0 when missing or unparseable; the order still counts
    pub total_price: f64,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Preparation time in whole-fraction minutes, when both timestamps
    /// are present. Callers decide whether the gap is plausible.
    pub fn prep_minutes(&self) -> Option<f64> {
        let placed = self.order_time?;
        let delivered = self.delivery_time?;
        Some((delivered - placed).num_seconds() as f64 / 60.0)
    }
}

/// Rejected status transition request. Raised synchronously, before any
/// network call, and never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("unknown status '{0}'")]
    UnknownStatus(String),

    #[error("order {0} is not in the current list")]
    UnknownOrder(String),

    #[error("order {id}: transition {from} -> {to} is not allowed")]
    InvalidTransition {
        id: String,
        from: OrderStatus,
        to: OrderStatus,
    },
}
