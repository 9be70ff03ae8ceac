// Member earnings dashboards: totals, pipeline value, success rate, monthly series.

pub mod aggregator;
pub mod handlers;
