//! Defines the endpoint for editing an existing expense.

use axum::{
    Extension, Json,
    extract::{Path, State},
};

use crate::{
    Error,
    auth::Identity,
    expense::{
        LedgerState,
        core::{Expense, ExpenseData, ExpenseId, get_expense, update_expense},
    },
};

/// A route handler for replacing the caller-supplied fields of one of the
/// authenticated caller's expenses.
///
/// Supplying the ID of an expense that does not exist, or that belongs to
/// someone else, fails with 404 without revealing which of the two it was.
pub async fn update_expense_endpoint(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
    Path(expense_id): Path<ExpenseId>,
    Json(data): Json<ExpenseData>,
) -> Result<Json<Expense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_expense(expense_id, &identity.email, data, &connection)?;

    let expense = get_expense(expense_id, &identity.email, &connection)?;

    Ok(Json(expense))
}

#[cfg(test)]
mod tests {
    use axum::{
        Extension, Json,
        extract::{Path, State},
    };
    use time::macros::date;

    use crate::{
        Error,
        auth::Identity,
        expense::{
            core::{Category, ExpenseData, PaymentMethod, create_expense, get_expense},
            test_utils::get_test_ledger_state,
        },
    };

    use super::update_expense_endpoint;

    fn get_test_data() -> ExpenseData {
        ExpenseData {
            category: Category::Food,
            amount: 12.50,
            payment_method: PaymentMethod::Card,
            date: date!(2024 - 01 - 05),
            notes: Some("lunch".to_owned()),
        }
    }

    #[tokio::test]
    async fn can_update_expense() {
        let state = get_test_ledger_state();
        let created = {
            let connection = state.db_connection.lock().unwrap();
            create_expense("a@x.com", get_test_data(), &connection).unwrap()
        };

        let new_data = ExpenseData {
            category: Category::Shopping,
            amount: 45.0,
            payment_method: PaymentMethod::Cash,
            date: date!(2024 - 01 - 06),
            notes: None,
        };
        let Json(updated) = update_expense_endpoint(
            State(state.clone()),
            Extension(Identity::test("a@x.com")),
            Path(created.id),
            Json(new_data.clone()),
        )
        .await
        .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.category, new_data.category);
        assert_eq!(updated.amount, new_data.amount);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_fails_for_missing_expense() {
        let state = get_test_ledger_state();

        let result = update_expense_endpoint(
            State(state),
            Extension(Identity::test("a@x.com")),
            Path(1337),
            Json(get_test_data()),
        )
        .await;

        assert!(
            matches!(result, Err(Error::UpdateMissingExpense)),
            "got {result:?}, want Err(UpdateMissingExpense)"
        );
    }

    #[tokio::test]
    async fn update_fails_for_someone_elses_expense() {
        let state = get_test_ledger_state();
        let created = {
            let connection = state.db_connection.lock().unwrap();
            create_expense("a@x.com", get_test_data(), &connection).unwrap()
        };

        let result = update_expense_endpoint(
            State(state.clone()),
            Extension(Identity::test("b@y.com")),
            Path(created.id),
            Json(get_test_data()),
        )
        .await;

        assert!(
            matches!(result, Err(Error::UpdateMissingExpense)),
            "got {result:?}, want Err(UpdateMissingExpense)"
        );

        let connection = state.db_connection.lock().unwrap();
        let unchanged = get_expense(created.id, "a@x.com", &connection).unwrap();
        assert_eq!(unchanged, created, "the record should be unchanged");
    }
}
