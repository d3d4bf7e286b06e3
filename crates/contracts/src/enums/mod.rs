pub mod active_filter;
pub mod order_status;

pub use active_filter::ActiveFilter;
pub use order_status::OrderStatus;
