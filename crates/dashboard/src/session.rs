use std::collections::HashSet;

use chrono::{DateTime, Utc};
use contracts::domain::order::{Order, OrderId, ValidationError};
use contracts::enums::{ActiveFilter, OrderStatus};
use contracts::reports::FeedStats;
use serde_json::Value;
use uuid::Uuid;

use crate::feed::normalizer::{diff_new_orders, normalize};

/// A staged status transition awaiting confirmation.
///
/// Validation happened when it was staged; committing only means
/// sending it. The slot holding it must be cleared on every exit path
/// (commit, cancel, dismissal) so a stale action can never be replayed.
#[derive(Debug, Clone)]
pub struct PendingTransition {
    pub request_id: Uuid,
    pub order_id: OrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub actor: String,
    pub requested_at: DateTime<Utc>,
}

/// What a completed poll produced
#[derive(Debug, Default)]
pub struct FeedOutcome {
    /// Orders not seen on the previous poll (the notification hook)
    pub new_orders: Vec<Order>,
    /// Server-precomputed stats, when the feed carried any
    pub stats: Option<FeedStats>,
}

/// All mutable dashboard state, owned by the hosting application and
/// passed into each operation explicitly.
///
/// The order list is replaced wholesale per poll; only the seen-ID set
/// survives across polls, and only to recognize new arrivals.
pub struct DashboardSession {
    filter: ActiveFilter,
    orders: Vec<Order>,
    seen_ids: HashSet<OrderId>,
    pending: Option<PendingTransition>,
    connected: bool,
    failure_count: u32,
    last_refresh: Option<DateTime<Utc>>,
}

impl DashboardSession {
    pub fn new(filter: ActiveFilter) -> Self {
        Self {
            filter,
            orders: Vec::new(),
            seen_ids: HashSet::new(),
            pending: None,
            connected: false,
            failure_count: 0,
            last_refresh: None,
        }
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }

    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        self.last_refresh
    }

    pub fn pending(&self) -> Option<&PendingTransition> {
        self.pending.as_ref()
    }

    /// Ingest a raw feed response: normalize, diff new arrivals, then
    /// replace both the order list and the seen-ID set wholesale.
    ///
    /// Replacement is idempotent, so overlapping polls resolve to
    /// whichever response lands last. This runs for normalization-only
    /// degradations too (empty list); transport failures must go
    /// through [`DashboardSession::record_failure`] instead, which
    /// leaves the snapshot untouched.
    pub fn apply_feed(&mut self, raw: &Value) -> FeedOutcome {
        let feed = normalize(raw, self.filter);
        let new_orders = diff_new_orders(&self.seen_ids, &feed.orders);

        self.seen_ids = feed.orders.iter().map(|order| order.id.clone()).collect();
        self.orders = feed.orders;
        self.connected = true;
        self.failure_count = 0;
        self.last_refresh = Some(Utc::now());

        FeedOutcome {
            new_orders,
            stats: feed.stats,
        }
    }

    /// Record a failed poll. The order list and seen-ID set keep their
    /// last-good contents so a recovered connection does not
    /// re-announce orders it already knew about.
    pub fn record_failure(&mut self) -> u32 {
        self.connected = false;
        self.failure_count += 1;
        self.failure_count
    }

    /// Stage a status transition for the given order.
    ///
    /// Fails synchronously, before any confirmation or network call,
    /// when the target status does not parse, the order is not in the
    /// current list, or the lifecycle forbids the move.
    pub fn request_transition(
        &mut self,
        order_id: &str,
        new_status: &str,
        actor: &str,
    ) -> Result<&PendingTransition, ValidationError> {
        let to = OrderStatus::parse(new_status)
            .ok_or_else(|| ValidationError::UnknownStatus(new_status.to_string()))?;
        let order = self
            .orders
            .iter()
            .find(|order| order.id.value() == order_id)
            .ok_or_else(|| ValidationError::UnknownOrder(order_id.to_string()))?;
        if !order.status.can_transition_to(to) {
            return Err(ValidationError::InvalidTransition {
                id: order_id.to_string(),
                from: order.status,
                to,
            });
        }

        let pending = PendingTransition {
            request_id: Uuid::new_v4(),
            order_id: order.id.clone(),
            from: order.status,
            to,
            actor: actor.to_string(),
            requested_at: Utc::now(),
        };
        tracing::debug!(
            request_id = %pending.request_id,
            order_id = %pending.order_id,
            from = %pending.from,
            to = %pending.to,
            "transition staged, awaiting confirmation"
        );
        Ok(&*self.pending.insert(pending))
    }

    /// Confirm: hand over the staged transition, leaving the slot empty
    pub fn take_pending(&mut self) -> Option<PendingTransition> {
        self.pending.take()
    }

    /// Cancel or dismiss: discard whatever is staged
    pub fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(request_id = %pending.request_id, "pending transition dismissed");
        }
    }
}
