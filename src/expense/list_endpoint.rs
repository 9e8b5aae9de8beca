//! Defines the endpoint for listing and searching expenses.

use axum::{
    Extension, Json,
    extract::{Query, State},
};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::Identity,
    expense::{
        LedgerState,
        core::Expense,
        query::{ExpenseFilter, list_expenses},
    },
};

/// The query parameters accepted when listing or exporting expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Case-insensitive substring match over category, payment method, and
    /// notes.
    pub search: Option<String>,
    /// Inclusive lower bound on the expense date.
    pub start_date: Option<Date>,
    /// Inclusive upper bound on the expense date.
    pub end_date: Option<Date>,
}

impl From<ListParams> for ExpenseFilter {
    fn from(params: ListParams) -> Self {
        Self {
            // An empty search box means no filter.
            search: params.search.filter(|search| !search.is_empty()),
            start_date: params.start_date,
            end_date: params.end_date,
        }
    }
}

/// A route handler for listing the authenticated caller's expenses, newest
/// date first.
pub async fn list_expenses_endpoint(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Expense>>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = list_expenses(&identity.email, &params.into(), &connection)?;

    Ok(Json(expenses))
}
