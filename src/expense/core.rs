//! Defines the core data models and database operations for expenses.
//!
//! Every operation takes the owner's email and folds it into the SQL
//! predicate. That predicate is the only access-control mechanism in the
//! application, so no operation ever trusts an id on its own.

use rusqlite::{
    Connection, Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::Error;

// ============================================================================
// MODELS
// ============================================================================

/// The type of an expense record's ID.
pub type ExpenseId = i64;

/// A label parse failure for [Category] or [PaymentMethod].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("unrecognized label {0:?}")]
pub struct UnknownLabel(String);

/// What an expense was spent on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Groceries and eating out.
    Food,
    /// Transport, flights, accommodation.
    Travel,
    /// Movies, games, going out.
    Entertainment,
    /// Doctor visits, medicine.
    Healthcare,
    /// Clothes, gadgets, everything retail.
    Shopping,
    /// Rent, utilities, subscriptions.
    Bills,
    /// Anything that does not fit the other categories.
    Other,
}

impl Category {
    /// The label stored in the database and shown to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Food => "Food",
            Category::Travel => "Travel",
            Category::Entertainment => "Entertainment",
            Category::Healthcare => "Healthcare",
            Category::Shopping => "Shopping",
            Category::Bills => "Bills",
            Category::Other => "Other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Food" => Ok(Category::Food),
            "Travel" => Ok(Category::Travel),
            "Entertainment" => Ok(Category::Entertainment),
            "Healthcare" => Ok(Category::Healthcare),
            "Shopping" => Ok(Category::Shopping),
            "Bills" => Ok(Category::Bills),
            "Other" => Ok(Category::Other),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

impl ToSql for Category {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Category {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: UnknownLabel| FromSqlError::Other(Box::new(error)))
    }
}

/// How an expense was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// Physical cash.
    Cash,
    /// Debit or credit card.
    Card,
    /// Unified Payments Interface transfer.
    #[serde(rename = "UPI")]
    Upi,
    /// Any other payment method.
    Other,
}

impl PaymentMethod {
    /// The label stored in the database and shown to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "Cash",
            PaymentMethod::Card => "Card",
            PaymentMethod::Upi => "UPI",
            PaymentMethod::Other => "Other",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Cash" => Ok(PaymentMethod::Cash),
            "Card" => Ok(PaymentMethod::Card),
            "UPI" => Ok(PaymentMethod::Upi),
            "Other" => Ok(PaymentMethod::Other),
            other => Err(UnknownLabel(other.to_owned())),
        }
    }
}

impl ToSql for PaymentMethod {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for PaymentMethod {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|error: UnknownLabel| FromSqlError::Other(Box::new(error)))
    }
}

/// One expense record, the unit of CRUD in the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense, assigned on creation and stable for the
    /// record's life.
    pub id: ExpenseId,
    /// The email address of the owner. Immutable after creation; every query
    /// and mutation is scoped by it.
    pub owner_email: String,
    /// What the money was spent on.
    pub category: Category,
    /// The amount of money spent. Always greater than zero.
    pub amount: f64,
    /// How the expense was paid.
    pub payment_method: PaymentMethod,
    /// The calendar date the expense happened on, as supplied by the user.
    pub date: Date,
    /// Free-text notes.
    pub notes: Option<String>,
    /// When the record was created. Server-assigned and immutable.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// The caller-supplied fields of an expense, used for both create and
/// update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseData {
    /// What the money was spent on.
    pub category: Category,
    /// The amount of money spent. Must be greater than zero.
    pub amount: f64,
    /// How the expense was paid.
    pub payment_method: PaymentMethod,
    /// The calendar date the expense happened on.
    pub date: Date,
    /// Free-text notes.
    #[serde(default)]
    pub notes: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Create a new expense owned by `owner_email`.
///
/// # Errors
/// This function will return an:
/// - [Error::NonPositiveAmount] if the amount is zero or less, in which case
///   nothing is written,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    owner_email: &str,
    data: ExpenseData,
    connection: &Connection,
) -> Result<Expense, Error> {
    validate_amount(data.amount)?;

    let created_at = OffsetDateTime::now_utc();

    let expense = connection
        .prepare(
            "INSERT INTO expense (user_email, category, amount, payment_method, date, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             RETURNING id, user_email, category, amount, payment_method, date, notes, created_at",
        )?
        .query_row(
            (
                owner_email,
                data.category,
                data.amount,
                data.payment_method,
                data.date,
                data.notes,
                created_at,
            ),
            map_expense_row,
        )?;

    Ok(expense)
}

/// Replace the caller-supplied fields of the expense matching
/// `(id, owner_email)`. The ID, owner, and creation timestamp never change.
///
/// # Errors
/// This function will return an:
/// - [Error::NonPositiveAmount] if the new amount is zero or less,
/// - or [Error::UpdateMissingExpense] if no expense matches the ID and owner
///   pair (including an ID that belongs to someone else),
/// - or [Error::SqlError] if there is some other SQL error.
///
/// In every error case the ledger is left unchanged.
pub fn update_expense(
    id: ExpenseId,
    owner_email: &str,
    data: ExpenseData,
    connection: &Connection,
) -> Result<(), Error> {
    validate_amount(data.amount)?;

    let rows_changed = connection.execute(
        "UPDATE expense SET category = ?1, amount = ?2, payment_method = ?3, date = ?4, notes = ?5
         WHERE id = ?6 AND user_email = ?7",
        (
            data.category,
            data.amount,
            data.payment_method,
            data.date,
            data.notes,
            id,
            owner_email,
        ),
    )?;

    if rows_changed == 0 {
        return Err(Error::UpdateMissingExpense);
    }

    Ok(())
}

/// Delete the expense matching `(id, owner_email)`.
///
/// Deleting an expense that does not exist, or that belongs to someone else,
/// is silently a no-op.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_expense(
    id: ExpenseId,
    owner_email: &str,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "DELETE FROM expense WHERE id = ?1 AND user_email = ?2",
        (id, owner_email),
    )?;

    Ok(())
}

/// Retrieve the expense matching `(id, owner_email)`.
///
/// # Errors
/// This function will return an:
/// - [Error::NotFound] if no expense matches the ID and owner pair,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(
    id: ExpenseId,
    owner_email: &str,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(
            "SELECT id, user_email, category, amount, payment_method, date, notes, created_at
             FROM expense WHERE id = :id AND user_email = :user_email",
        )?
        .query_row(
            &[
                (":id", &id as &dyn ToSql),
                (":user_email", &owner_email as &dyn ToSql),
            ],
            map_expense_row,
        )?;

    Ok(expense)
}

/// Create the expense table and its owner/date index in the database.
///
/// # Errors
/// Returns an error if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_email TEXT NOT NULL,
                category TEXT NOT NULL,
                amount REAL NOT NULL,
                payment_method TEXT NOT NULL,
                date TEXT NOT NULL,
                notes TEXT,
                created_at TEXT NOT NULL
                )",
        (),
    )?;

    // Supports the owner-scoped, date-ordered queries.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_owner_date ON expense (user_email, date)",
        (),
    )?;

    Ok(())
}

/// Map a database row to an [Expense].
///
/// Expects the row to contain all the table columns in the order they were
/// defined.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        owner_email: row.get(1)?,
        category: row.get(2)?,
        amount: row.get(3)?,
        payment_method: row.get(4)?,
        date: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn validate_amount(amount: f64) -> Result<(), Error> {
    if amount > 0.0 {
        Ok(())
    } else {
        Err(Error::NonPositiveAmount)
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod label_tests {
    use super::{Category, PaymentMethod};

    #[test]
    fn category_labels_round_trip() {
        for category in [
            Category::Food,
            Category::Travel,
            Category::Entertainment,
            Category::Healthcare,
            Category::Shopping,
            Category::Bills,
            Category::Other,
        ] {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
    }

    #[test]
    fn unknown_category_label_is_rejected() {
        assert!("Gambling".parse::<Category>().is_err());
    }

    #[test]
    fn payment_method_serializes_as_label() {
        let json = serde_json::to_string(&PaymentMethod::Upi).unwrap();

        assert_eq!(json, r#""UPI""#);
    }
}
