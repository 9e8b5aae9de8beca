//! Read-only summaries derived from the caller's expenses: the dashboard
//! overview and period reports.

mod aggregation;
mod endpoints;

pub use endpoints::{
    CategoryTotal, DailyTotal, DashboardSummary, ReportParams, ReportPeriod, ReportSummary,
    get_dashboard, get_report,
};
