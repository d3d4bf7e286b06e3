use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use contracts::domain::order::Order;
use contracts::enums::OrderStatus;
use contracts::reports::{FeedStats, QuickStats, ReportSnapshot};

/// Longest preparation gap considered plausible; anything at or above
/// this (or non-positive) is bad input data and excluded from the mean.
const MAX_PREP_MINUTES: f64 = 1440.0;

/// Compute the sales/operations report over the current order list.
///
/// All period boundaries are relative to `now` in the business-local
/// calendar. Today and yesterday are exact calendar-date matches; week
/// (most recent Sunday) and month (the 1st) are inclusive "since"
/// boundaries, open-ended upward. Orders without a placement time
/// belong to no date bucket but still count toward all-time totals.
pub fn aggregate(orders: &[Order], now: NaiveDateTime) -> ReportSnapshot {
    let today = now.date();
    let yesterday = today.pred_opt().unwrap_or(today);
    let week_start = (today
        - Duration::days(today.weekday().num_days_from_sunday() as i64))
    .and_time(NaiveTime::MIN);
    let month_start = today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN);

    let mut snapshot = ReportSnapshot::default();
    let mut delivered = 0u32;
    let mut canceled = 0u32;
    let mut prep_minutes_sum = 0.0;
    let mut prep_samples = 0u32;

    for order in orders {
        snapshot.total_sales += order.total_price;
        snapshot.total_orders += 1;

        match order.status {
            OrderStatus::Delivered => {
                delivered += 1;
                if let Some(minutes) = order.prep_minutes() {
                    if minutes > 0.0 && minutes < MAX_PREP_MINUTES {
                        prep_minutes_sum += minutes;
                        prep_samples += 1;
                    }
                }
            }
            OrderStatus::Canceled => canceled += 1,
            _ => {}
        }

        let Some(placed) = order.order_time else {
            continue;
        };
        if placed.date() == today {
            snapshot.today_sales += order.total_price;
            snapshot.today_orders += 1;
        }
        if placed.date() == yesterday {
            snapshot.yesterday_sales += order.total_price;
            snapshot.yesterday_orders += 1;
        }
        if placed >= week_start {
            snapshot.week_sales += order.total_price;
            snapshot.week_orders += 1;
        }
        if placed >= month_start {
            snapshot.month_sales += order.total_price;
            snapshot.month_orders += 1;
        }
    }

    if snapshot.total_orders > 0 {
        snapshot.avg_order_value = snapshot.total_sales / snapshot.total_orders as f64;
    }
    let settled = delivered + canceled;
    if settled > 0 {
        snapshot.success_rate = delivered as f64 / settled as f64 * 100.0;
    }
    if prep_samples > 0 {
        snapshot.avg_prep_time_minutes = prep_minutes_sum / prep_samples as f64;
    }

    snapshot
}

/// Headline counters for the navigation bar.
///
/// When the feed carries server-computed stats they are used verbatim,
/// so this dashboard and every other consumer of the same feed agree on
/// the numbers. Only when absent are counts derived locally.
pub fn quick_stats(orders: &[Order], server: Option<&FeedStats>) -> QuickStats {
    if let Some(stats) = server {
        return QuickStats::from_feed(stats);
    }

    let count = |status: OrderStatus| orders.iter().filter(|o| o.status == status).count() as u32;
    QuickStats {
        total_active: orders.len() as u32,
        confirmed: count(OrderStatus::Confirmed),
        preparing: count(OrderStatus::Preparing),
        out_for_delivery: count(OrderStatus::OutForDelivery),
        delivered: count(OrderStatus::Delivered),
    }
}
