use std::collections::HashSet;

use contracts::domain::order::{Order, OrderId, OrderItem};
use contracts::enums::{ActiveFilter, OrderStatus};
use contracts::reports::FeedStats;
use serde_json::Value;

use super::dto::{parse_feed_timestamp, RawFeed, RawOrder};

/// Result of feed ingestion: the active order list plus any
/// server-precomputed stats the feed carried.
#[derive(Debug, Default)]
pub struct NormalizedFeed {
    pub orders: Vec<Order>,
    pub stats: Option<FeedStats>,
}

/// Ingest a raw webhook response.
///
/// Accepts the three shapes described by [`RawFeed`]; anything else
/// yields an empty list. Orders with a missing id, a missing or
/// unknown status, or a status in the filter's exclusion set are
/// dropped here, so everything downstream operates on the closed
/// [`OrderStatus`] enumeration.
pub fn normalize(raw: &Value, filter: ActiveFilter) -> NormalizedFeed {
    let shape = RawFeed::classify(raw);
    if matches!(shape, RawFeed::Malformed) {
        tracing::warn!("unexpected feed shape, treating as empty order list");
        return NormalizedFeed::default();
    }

    let (raw_orders, stats) = shape.into_parts();
    let mut orders = Vec::with_capacity(raw_orders.len());
    for raw_order in raw_orders {
        let Some(order) = canonicalize(raw_order) else {
            continue;
        };
        if filter.is_active(order.status) {
            orders.push(order);
        }
    }

    NormalizedFeed { orders, stats }
}

/// Orders present in `current` but not seen on the previous poll.
///
/// An empty previous set means this is the first poll: nothing is
/// reported as new, otherwise the initial load would announce every
/// open order at once.
pub fn diff_new_orders(previous: &HashSet<OrderId>, current: &[Order]) -> Vec<Order> {
    if previous.is_empty() {
        return Vec::new();
    }
    current
        .iter()
        .filter(|order| !previous.contains(&order.id))
        .cloned()
        .collect()
}

fn canonicalize(raw: RawOrder) -> Option<Order> {
    let Some(id) = raw.order_id else {
        tracing::debug!("dropping order without an order_id");
        return None;
    };
    let status = match raw.status.as_deref().and_then(OrderStatus::parse) {
        Some(status) => status,
        None => {
            tracing::debug!(order_id = %id, status = ?raw.status, "dropping order with unusable status");
            return None;
        }
    };

    let items = raw
        .order_items
        .into_iter()
        .map(|item| OrderItem {
            name: item.item_name.unwrap_or_default(),
            quantity: item.quantity.unwrap_or(1),
            unit_price: item.item_price.unwrap_or(0.0),
        })
        .collect();

    Some(Order {
        id: OrderId::new(id),
        status,
        customer_name: raw.customer_name,
        customer_phone: raw.customer_phone,
        delivery_address: raw.delivery_address,
        order_time: raw.order_time_cairo.as_deref().and_then(parse_feed_timestamp),
        delivery_time: raw.delivery_time.as_deref().and_then(parse_feed_timestamp),
        total_price: raw.total_price.unwrap_or(0.0),
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ids(feed: &NormalizedFeed) -> Vec<&str> {
        feed.orders.iter().map(|o| o.id.value()).collect()
    }

    #[test]
    fn test_all_three_shapes_yield_the_same_list() {
        let orders = json!([
            { "order_id": 1, "status": "confirmed" },
            { "order_id": 2, "status": "preparing" }
        ]);
        let plain = orders.clone();
        let object = json!({ "orders": orders });
        let wrapped = json!([{ "orders": orders }]);

        let from_plain = normalize(&plain, ActiveFilter::Terminal);
        let from_object = normalize(&object, ActiveFilter::Terminal);
        let from_wrapped = normalize(&wrapped, ActiveFilter::Terminal);

        assert_eq!(ids(&from_plain), vec!["1", "2"]);
        assert_eq!(from_plain.orders, from_object.orders);
        assert_eq!(from_plain.orders, from_wrapped.orders);
    }

    #[test]
    fn test_canceled_never_survives_canceled_only_filter() {
        let feed = json!([
            { "order_id": 1, "status": "canceled" },
            { "order_id": 2, "status": "CANCELLED" },
            { "order_id": 3, "status": "delivered" }
        ]);
        let normalized = normalize(&feed, ActiveFilter::CanceledOnly);
        assert_eq!(ids(&normalized), vec!["3"]);
    }

    #[test]
    fn test_terminal_filter_drops_completed_spelling() {
        let feed = json!([
            { "order_id": 1, "status": "completed" },
            { "order_id": 2, "status": "preparing" }
        ]);
        let normalized = normalize(&feed, ActiveFilter::Terminal);
        assert_eq!(ids(&normalized), vec!["2"]);
    }

    #[test]
    fn test_orders_with_unusable_status_or_id_are_dropped() {
        let feed = json!([
            { "order_id": 1 },
            { "order_id": 2, "status": "" },
            { "order_id": 3, "status": "weird" },
            { "status": "confirmed" },
            { "order_id": 4, "status": "confirmed" }
        ]);
        let normalized = normalize(&feed, ActiveFilter::Terminal);
        assert_eq!(ids(&normalized), vec!["4"]);
    }

    #[test]
    fn test_malformed_feed_degrades_to_empty() {
        let normalized = normalize(&json!({ "message": "oops" }), ActiveFilter::Terminal);
        assert!(normalized.orders.is_empty());
        assert!(normalized.stats.is_none());
    }

    #[test]
    fn test_stats_pass_through() {
        let feed = json!({
            "orders": [],
            "stats": { "total_active": 9, "confirmed": 4, "delivered": 2 }
        });
        let normalized = normalize(&feed, ActiveFilter::Terminal);
        let stats = normalized.stats.unwrap();
        assert_eq!(stats.total_active, 9);
        assert_eq!(stats.confirmed, 4);
        assert_eq!(stats.out_for_delivery, 0);
    }

    #[test]
    fn test_item_fields_are_canonicalized() {
        let feed = json!([{
            "order_id": 5,
            "status": "confirmed",
            "order_items": [
                { "name": "espresso", "quantity": 2, "price": "20" },
                { "item_name": "croissant" }
            ]
        }]);
        let normalized = normalize(&feed, ActiveFilter::Terminal);
        let items = &normalized.orders[0].items;
        assert_eq!(items[0].name, "espresso");
        assert_eq!(items[0].unit_price, 20.0);
        assert_eq!(items[1].quantity, 1);
        assert_eq!(items[1].unit_price, 0.0);
    }

    #[test]
    fn test_diff_new_orders_first_poll_is_never_new() {
        let feed = json!([
            { "order_id": 1, "status": "confirmed" },
            { "order_id": 2, "status": "confirmed" }
        ]);
        let normalized = normalize(&feed, ActiveFilter::Terminal);
        assert!(diff_new_orders(&HashSet::new(), &normalized.orders).is_empty());
    }

    #[test]
    fn test_diff_new_orders_returns_only_unseen() {
        let feed = json!([
            { "order_id": 1, "status": "confirmed" },
            { "order_id": 3, "status": "confirmed" }
        ]);
        let normalized = normalize(&feed, ActiveFilter::Terminal);
        let previous: HashSet<OrderId> =
            [OrderId::new("1"), OrderId::new("2")].into_iter().collect();
        let new_orders = diff_new_orders(&previous, &normalized.orders);
        assert_eq!(new_orders.len(), 1);
        assert_eq!(new_orders[0].id.value(), "3");
    }
}
