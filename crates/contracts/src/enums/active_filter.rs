use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Which statuses the feed treats as no longer active.
///
/// The two deployment variants disagree on this: the reports page only
/// hides canceled orders, while the orders board also hides delivered
/// ones. The choice is configuration, never hard-coded, because it
/// changes every reported total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActiveFilter {
    /// Exclude canceled orders only (reports deployment)
    CanceledOnly,
    /// Exclude both terminal statuses, delivered and canceled (orders board)
    Terminal,
}

impl ActiveFilter {
    pub fn code(&self) -> &'static str {
        match self {
            ActiveFilter::CanceledOnly => "canceled-only",
            ActiveFilter::Terminal => "terminal",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "canceled-only" => Some(ActiveFilter::CanceledOnly),
            "terminal" => Some(ActiveFilter::Terminal),
            _ => None,
        }
    }

    /// Statuses excluded from the active order list
    pub fn excluded(&self) -> &'static [OrderStatus] {
        match self {
            ActiveFilter::CanceledOnly => &[OrderStatus::Canceled],
            ActiveFilter::Terminal => &[OrderStatus::Delivered, OrderStatus::Canceled],
        }
    }

    pub fn is_active(&self, status: OrderStatus) -> bool {
        !self.excluded().contains(&status)
    }
}
