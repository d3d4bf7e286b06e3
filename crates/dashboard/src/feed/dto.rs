use chrono::{NaiveDate, NaiveDateTime};
use contracts::reports::FeedStats;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Object shape carrying `orders` and optional precomputed `stats`
#[derive(Debug, Clone, Deserialize)]
pub struct FeedEnvelope {
    #[serde(default)]
    pub orders: Vec<RawOrder>,
    #[serde(default)]
    pub stats: Option<FeedStats>,
}

/// Order as it arrives on the wire. Every field is tolerant: the
/// upstream webhook is not contractually stable.
#[derive(Debug, Clone, Deserialize)]
pub struct RawOrder {
    /// May arrive as a number or a string
    #[serde(default, deserialize_with = "de_opt_id")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<String>,
    /// Placement time in the business-local calendar
    #[serde(default)]
    pub order_time_cairo: Option<String>,
    #[serde(default)]
    pub delivery_time: Option<String>,
    /// May arrive as a number, a numeric string, or not at all
    #[serde(default, deserialize_with = "de_opt_price")]
    pub total_price: Option<f64>,
    #[serde(default, alias = "items")]
    pub order_items: Vec<RawOrderItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawOrderItem {
    #[serde(default, alias = "name")]
    pub item_name: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// The unit price has appeared under three different names
    #[serde(
        default,
        alias = "price",
        alias = "unit_price",
        deserialize_with = "de_opt_price"
    )]
    pub item_price: Option<f64>,
}

/// The three feed shapes the webhook has been observed to return,
/// resolved once at the boundary instead of shape-sniffing downstream.
#[derive(Debug)]
pub enum RawFeed {
    /// Array whose first element carries `orders` (and maybe `stats`)
    Wrapped(FeedEnvelope),
    /// Plain array of orders
    Plain(Vec<RawOrder>),
    /// Object with `orders` and optional `stats`
    Object(FeedEnvelope),
    /// Anything else degrades to an empty order list
    Malformed,
}

impl RawFeed {
    pub fn classify(value: &Value) -> RawFeed {
        match value {
            Value::Array(elements) => {
                if let Some(first) = elements.first() {
                    if first.get("orders").is_some() {
                        return serde_json::from_value(first.clone())
                            .map(RawFeed::Wrapped)
                            .unwrap_or(RawFeed::Malformed);
                    }
                }
                serde_json::from_value(value.clone())
                    .map(RawFeed::Plain)
                    .unwrap_or(RawFeed::Malformed)
            }
            Value::Object(map) if map.contains_key("orders") => {
                serde_json::from_value(value.clone())
                    .map(RawFeed::Object)
                    .unwrap_or(RawFeed::Malformed)
            }
            _ => RawFeed::Malformed,
        }
    }

    pub fn into_parts(self) -> (Vec<RawOrder>, Option<FeedStats>) {
        match self {
            RawFeed::Wrapped(envelope) | RawFeed::Object(envelope) => {
                (envelope.orders, envelope.stats)
            }
            RawFeed::Plain(orders) => (orders, None),
            RawFeed::Malformed => (Vec::new(), None),
        }
    }
}

/// Tolerant timestamp parsing: RFC 3339, ISO without offset, the
/// space-separated variant, or a bare date.
pub fn parse_feed_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_local());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0)
}

fn de_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }))
}

fn de_opt_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_order_id_accepts_number_and_string() {
        let order: RawOrder = serde_json::from_value(json!({ "order_id": 17 })).unwrap();
        assert_eq!(order.order_id.as_deref(), Some("17"));

        let order: RawOrder = serde_json::from_value(json!({ "order_id": "ORD-17" })).unwrap();
        assert_eq!(order.order_id.as_deref(), Some("ORD-17"));
    }

    #[test]
    fn test_total_price_tolerance() {
        let order: RawOrder = serde_json::from_value(json!({ "total_price": 100.5 })).unwrap();
        assert_eq!(order.total_price, Some(100.5));

        let order: RawOrder = serde_json::from_value(json!({ "total_price": "49.5" })).unwrap();
        assert_eq!(order.total_price, Some(49.5));

        let order: RawOrder = serde_json::from_value(json!({ "total_price": "abc" })).unwrap();
        assert_eq!(order.total_price, None);

        let order: RawOrder = serde_json::from_value(json!({})).unwrap();
        assert_eq!(order.total_price, None);
    }

    #[test]
    fn test_item_price_under_any_of_three_names() {
        for key in ["item_price", "price", "unit_price"] {
            let item: RawOrderItem =
                serde_json::from_value(json!({ "item_name": "mint tea", key: 15 })).unwrap();
            assert_eq!(item.item_price, Some(15.0), "field {key}");
        }
    }

    #[test]
    fn test_classify_wrapped_array() {
        let value = json!([{ "orders": [{ "order_id": 1 }], "stats": { "confirmed": 2 } }]);
        let (orders, stats) = RawFeed::classify(&value).into_parts();
        assert_eq!(orders.len(), 1);
        assert_eq!(stats.unwrap().confirmed, 2);
    }

    #[test]
    fn test_classify_plain_array() {
        let value = json!([{ "order_id": 1 }, { "order_id": 2 }]);
        assert!(matches!(RawFeed::classify(&value), RawFeed::Plain(ref v) if v.len() == 2));
    }

    #[test]
    fn test_classify_object_with_orders() {
        let value = json!({ "orders": [{ "order_id": 3 }] });
        assert!(matches!(RawFeed::classify(&value), RawFeed::Object(_)));
    }

    #[test]
    fn test_classify_anything_else_is_malformed() {
        for value in [json!("orders"), json!(42), json!({ "items": [] }), json!(null)] {
            assert!(matches!(RawFeed::classify(&value), RawFeed::Malformed));
        }
    }

    #[test]
    fn test_empty_array_is_an_empty_plain_feed() {
        let (orders, stats) = RawFeed::classify(&json!([])).into_parts();
        assert!(orders.is_empty());
        assert!(stats.is_none());
    }

    #[test]
    fn test_parse_feed_timestamp_formats() {
        assert!(parse_feed_timestamp("2025-03-10T12:30:00Z").is_some());
        assert!(parse_feed_timestamp("2025-03-10T12:30:00+02:00").is_some());
        assert!(parse_feed_timestamp("2025-03-10T12:30:00").is_some());
        assert!(parse_feed_timestamp("2025-03-10 12:30:00").is_some());
        assert!(parse_feed_timestamp("2025-03-10").is_some());
        assert!(parse_feed_timestamp("next tuesday").is_none());
        assert!(parse_feed_timestamp("").is_none());
    }
}
