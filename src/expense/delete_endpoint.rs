//! Defines the endpoint for deleting an expense.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    Error,
    auth::Identity,
    expense::{
        LedgerState,
        core::{ExpenseId, delete_expense},
    },
};

/// A route handler for deleting one of the authenticated caller's expenses.
///
/// Always answers 204: deleting an expense that does not exist, or that
/// belongs to someone else, is a silent no-op.
pub async fn delete_expense_endpoint(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
    Path(expense_id): Path<ExpenseId>,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    delete_expense(expense_id, &identity.email, &connection)?;

    Ok(StatusCode::NO_CONTENT)
}
