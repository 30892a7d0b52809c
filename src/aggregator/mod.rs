/// Report aggregation and severity resolution
pub mod report_aggregator;

pub use report_aggregator::{
    count_totals, recommend, resolve_severity, Aggregator, Period, Report, Scope, SeverityPolicy,
};
