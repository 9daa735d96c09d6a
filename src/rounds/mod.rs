/// Round aggregation module
///
/// Builds numbered round records from scanner boundaries and derives
/// session statistics and reports from them.

pub mod aggregator;
pub mod report;

pub use aggregator::{RoundAggregator, RoundRecord, SessionSummary};
pub use report::{render_report, write_report};
