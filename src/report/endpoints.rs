//! Route handlers for the dashboard summary and period reports.
//!
//! Both handlers fetch the caller's records through the ledger's list
//! operation and derive every number from that one owner-scoped result set.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month, OffsetDateTime};

use crate::{
    Error,
    auth::Identity,
    expense::{
        LedgerState,
        core::{Category, Expense, PaymentMethod},
        query::{ExpenseFilter, list_expenses},
    },
    report::aggregation,
};

/// How many records the dashboard shows as "recent".
const RECENT_EXPENSE_COUNT: usize = 6;

/// The dashboard summary for the landing page.
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardSummary {
    /// Total spend across all of the caller's records.
    pub total_spent: f64,
    /// Spend in the current calendar month.
    pub month_spent: f64,
    /// The category with the highest all-time spend.
    pub top_category: Option<Category>,
    /// The most recent records, newest date first.
    pub recent: Vec<Expense>,
}

/// One category's share of a report.
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryTotal {
    /// The category.
    pub category: Category,
    /// Total spend in this category over the report period.
    pub total: f64,
}

/// One day's spend within a report.
#[derive(Debug, Serialize, Deserialize)]
pub struct DailyTotal {
    /// The calendar day.
    pub date: Date,
    /// Total spend on that day.
    pub total: f64,
}

/// The report over a selected period.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Total spend over the period.
    pub total_spent: f64,
    /// Mean spend per day over the days the period's records span.
    pub average_daily: f64,
    /// The category with the highest spend in the period.
    pub top_category: Option<Category>,
    /// The payment method with the highest spend in the period.
    pub top_payment_method: Option<PaymentMethod>,
    /// Per-category totals, largest first.
    pub category_totals: Vec<CategoryTotal>,
    /// Per-day totals in chronological order, for charting.
    pub daily_totals: Vec<DailyTotal>,
}

/// The selectable report periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportPeriod {
    /// The last seven days.
    Weekly,
    /// The current calendar month.
    Monthly,
    /// The current calendar year.
    Yearly,
    /// An explicit date range from the query parameters.
    Custom,
}

/// The query parameters accepted by the report endpoint.
#[derive(Debug, Deserialize)]
pub struct ReportParams {
    /// The period to report over. Defaults to the current month.
    pub period: Option<ReportPeriod>,
    /// Inclusive lower bound for a custom period.
    pub start_date: Option<Date>,
    /// Inclusive upper bound for a custom period.
    pub end_date: Option<Date>,
}

/// A route handler for the dashboard summary.
pub async fn get_dashboard(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<DashboardSummary>, Error> {
    let expenses = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        list_expenses(&identity.email, &ExpenseFilter::default(), &connection)?
    };

    let today = OffsetDateTime::now_utc().date();

    let summary = DashboardSummary {
        total_spent: aggregation::total_spent(&expenses),
        month_spent: aggregation::sum_in_month(&expenses, today.year(), today.month()),
        top_category: aggregation::top_category(&expenses),
        recent: expenses.into_iter().take(RECENT_EXPENSE_COUNT).collect(),
    };

    Ok(Json(summary))
}

/// A route handler for a spend report over the selected period.
pub async fn get_report(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ReportParams>,
) -> Result<Json<ReportSummary>, Error> {
    let today = OffsetDateTime::now_utc().date();
    let (start_date, end_date) = period_bounds(&params, today);

    let filter = ExpenseFilter {
        search: None,
        start_date,
        end_date,
    };

    let expenses = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        list_expenses(&identity.email, &filter, &connection)?
    };

    Ok(Json(build_report(&expenses)))
}

/// The inclusive date bounds for the requested period.
fn period_bounds(params: &ReportParams, today: Date) -> (Option<Date>, Option<Date>) {
    match params.period.unwrap_or(ReportPeriod::Monthly) {
        ReportPeriod::Weekly => (Some(today - Duration::days(7)), None),
        ReportPeriod::Monthly => (Some(today.replace_day(1).unwrap()), None),
        ReportPeriod::Yearly => (
            Some(Date::from_calendar_date(today.year(), Month::January, 1).unwrap()),
            None,
        ),
        ReportPeriod::Custom => (params.start_date, params.end_date),
    }
}

fn build_report(expenses: &[Expense]) -> ReportSummary {
    let mut category_totals: Vec<_> = aggregation::sum_by_category(expenses)
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    category_totals.sort_by(|a, b| b.total.total_cmp(&a.total));

    let daily_totals = aggregation::daily_totals(expenses)
        .into_iter()
        .map(|(date, total)| DailyTotal { date, total })
        .collect();

    ReportSummary {
        total_spent: aggregation::total_spent(expenses),
        average_daily: aggregation::average_daily_spend(expenses),
        top_category: aggregation::top_category(expenses),
        top_payment_method: aggregation::top_payment_method(expenses),
        category_totals,
        daily_totals,
    }
}
