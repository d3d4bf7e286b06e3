pub mod dto;

pub use dto::{FeedStats, QuickStats, ReportSnapshot};
