//! Defines the endpoint for downloading expenses as a CSV file.

use axum::{
    Extension,
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use crate::{
    Error,
    auth::Identity,
    expense::{LedgerState, core::Expense, list_endpoint::ListParams, query::list_expenses},
};

/// A route handler for downloading the authenticated caller's expenses as a
/// CSV attachment. Accepts the same filters as the list endpoint.
pub async fn export_expenses_endpoint(
    State(state): State<LedgerState>,
    Extension(identity): Extension<Identity>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, Error> {
    let expenses = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        list_expenses(&identity.email, &params.into(), &connection)?
    };

    let csv_text = expenses_to_csv(&expenses)?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"expenses.csv\"",
            ),
        ],
        csv_text,
    ))
}

/// Serialize `expenses` as CSV with a header row.
fn expenses_to_csv(expenses: &[Expense]) -> Result<String, Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "ID",
            "User Email",
            "Category",
            "Amount",
            "Payment Method",
            "Date",
            "Notes",
            "Created At",
        ])
        .map_err(|error| Error::CsvError(error.to_string()))?;

    for expense in expenses {
        writer
            .write_record([
                expense.id.to_string(),
                expense.owner_email.clone(),
                expense.category.to_string(),
                format!("{:.2}", expense.amount),
                expense.payment_method.to_string(),
                expense.date.to_string(),
                expense.notes.clone().unwrap_or_default(),
                expense.created_at.to_string(),
            ])
            .map_err(|error| Error::CsvError(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::CsvError(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::CsvError(error.to_string()))
}
