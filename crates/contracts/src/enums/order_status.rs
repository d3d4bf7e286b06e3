use serde::{Deserialize, Serialize};

/// Order fulfillment lifecycle.
///
/// The lifecycle is strictly ordered:
/// pending_confirmation -> confirmed -> preparing -> out_for_delivery -> delivered,
/// with canceled reachable only from pending_confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingConfirmation,
    Confirmed,
    Preparing,
    OutForDelivery,
    Delivered,
    Canceled,
}

impl OrderStatus {
    /// Canonical wire code
    pub fn code(&self) -> &'static str {
        match self {
            OrderStatus::PendingConfirmation => "pending_confirmation",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::OutForDelivery => "out_for_delivery",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    /// Display name for card headers and logs
    pub fn display_name(&self) -> &'static str {
        match self {
            OrderStatus::PendingConfirmation => "Awaiting confirmation",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::OutForDelivery => "Out for delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Canceled => "Canceled",
        }
    }

    /// All statuses in lifecycle order
    pub fn all() -> Vec<OrderStatus> {
        vec![
            OrderStatus::PendingConfirmation,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::OutForDelivery,
            OrderStatus::Delivered,
            OrderStatus::Canceled,
        ]
    }

    /// Parse a raw feed status. Comparison is case-insensitive and the
    /// deployment spelling variants are canonicalized here, so nothing
    /// downstream ever touches a raw status string.
    ///
    /// `cancelled` maps to [`OrderStatus::Canceled`] and `completed` to
    /// [`OrderStatus::Delivered`].
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pending_confirmation" => Some(OrderStatus::PendingConfirmation),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "delivered" | "completed" => Some(OrderStatus::Delivered),
            "canceled" | "cancelled" => Some(OrderStatus::Canceled),
            _ => None,
        }
    }

    /// Terminal statuses accept no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled)
    }

    fn rank(&self) -> u8 {
        match self {
            OrderStatus::PendingConfirmation => 0,
            OrderStatus::Confirmed => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::OutForDelivery => 3,
            OrderStatus::Delivered => 4,
            // Canceled sits outside the forward chain
            OrderStatus::Canceled => u8::MAX,
        }
    }

    /// Whether the lifecycle allows moving from `self` to `next`.
    /// Forward jumps are allowed (a confirmed order may be marked
    /// delivered directly); backward moves never are.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == OrderStatus::Canceled {
            return *self == OrderStatus::PendingConfirmation;
        }
        next.rank() > self.rank()
    }

    /// Forward statuses a UI should offer for an order in this status
    pub fn next_actions(&self) -> Vec<OrderStatus> {
        OrderStatus::all()
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
