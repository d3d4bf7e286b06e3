use serde::{Deserialize, Serialize};

/// Headline counts precomputed by the feed server.
///
/// When present these are authoritative: the dashboard shows them
/// verbatim so every consumer of the same feed agrees on the numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedStats {
    #[serde(default)]
    pub total_active: u32,
    #[serde(default)]
    pub confirmed: u32,
    #[serde(default)]
    pub preparing: u32,
    #[serde(default)]
    pub out_for_delivery: u32,
    #[serde(default)]
    pub delivered: u32,
}

/// Navigation-bar counters, either taken from [`FeedStats`] or
/// recomputed locally when the feed carries none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickStats {
    pub total_active: u32,
    pub confirmed: u32,
    pub preparing: u32,
    pub out_for_delivery: u32,
    pub delivered: u32,
}

impl QuickStats {
    /// Server counts are copied verbatim, never adjusted
    pub fn from_feed(stats: &FeedStats) -> Self {
        Self {
            total_active: stats.total_active,
            confirmed: stats.confirmed,
            preparing: stats.preparing,
            out_for_delivery: stats.out_for_delivery,
            delivered: stats.delivered,
        }
    }
}

/// Sales and operations report over the current order list.
/// Recomputed on every poll, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportSnapshot {
    pub today_sales: f64,
    pub yesterday_sales: f64,
    pub week_sales: f64,
    pub month_sales: f64,
    pub total_sales: f64,

    pub today_orders: u32,
    pub yesterday_orders: u32,
    pub week_orders: u32,
    pub month_orders: u32,
    pub total_orders: u32,

    /// All-time sales over all-time count, 0 when the list is empty
    pub avg_order_value: f64,
    /// delivered / (delivered + canceled) in percent, 0 when neither exists
    pub success_rate: f64,
    /// Mean preparation minutes over delivered orders with a plausible
    /// gap, 0 when none qualifies
    pub avg_prep_time_minutes: f64,
}
