//! The expense ledger: an owner-scoped CRUD store over a single SQLite
//! table, plus the route handlers that expose it.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use rusqlite::Connection;

use crate::AppState;

pub(crate) mod core;
mod create_endpoint;
mod delete_endpoint;
mod export_endpoint;
mod list_endpoint;
pub(crate) mod query;
mod update_endpoint;

pub use core::{Category, Expense, ExpenseData, ExpenseId, PaymentMethod, create_expense_table};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use export_endpoint::export_expenses_endpoint;
pub use list_endpoint::{ListParams, list_expenses_endpoint};
pub use query::ExpenseFilter;
pub use update_endpoint::update_expense_endpoint;

/// The state needed by the ledger route handlers.
#[derive(Clone)]
pub struct LedgerState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for LedgerState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}
