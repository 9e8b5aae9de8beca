//! Defines the endpoint for recording a new expense.

use axum::{Extension, Json, extract::State, http::StatusCode};

use crate::{
    Error,
    auth::Identity,
    expense::{
        LedgerState,
        core::{Expense, ExpenseData, create_expense},
    },
};

/// A route handler for recording a new expense owned by the authenticated
/// caller.
///
/// Returns the stored record, including its assigned ID and creation
/// timestamp, with status 201.
pub async fn create_expense_endpoint(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
    Json(data): Json<ExpenseData>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = create_expense(&identity.email, data, &connection)?;

    Ok((StatusCode::CREATED, Json(expense)))
}
