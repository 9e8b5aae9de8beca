//! Filtered retrieval of a user's expenses.

use rusqlite::{Connection, params_from_iter};

use crate::Error;

use super::core::{Expense, map_expense_row};

/// Optional filters for listing expenses.
///
/// All filters combine with AND; an empty filter returns everything the
/// owner has recorded.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ExpenseFilter {
    /// Case-insensitive substring match over category, payment method, and
    /// notes.
    pub search: Option<String>,
    /// Inclusive lower bound on the expense date.
    pub start_date: Option<time::Date>,
    /// Inclusive upper bound on the expense date.
    pub end_date: Option<time::Date>,
}

/// List the expenses owned by `owner_email`, newest date first.
///
/// Records are sorted by date descending with the ID as a stable tiebreak.
/// A filter that matches nothing yields an empty vector, not an error.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn list_expenses(
    owner_email: &str,
    filter: &ExpenseFilter,
    connection: &Connection,
) -> Result<Vec<Expense>, Error> {
    let mut query = String::from(
        "SELECT id, user_email, category, amount, payment_method, date, notes, created_at
         FROM expense WHERE user_email = ?",
    );
    let mut params = vec![owner_email.to_owned()];

    if let Some(search) = &filter.search {
        query.push_str(" AND (category LIKE ? OR payment_method LIKE ? OR notes LIKE ?)");
        let pattern = format!("%{search}%");
        params.extend([pattern.clone(), pattern.clone(), pattern]);
    }

    if let Some(start_date) = filter.start_date {
        query.push_str(" AND date >= ?");
        params.push(start_date.to_string());
    }

    if let Some(end_date) = filter.end_date {
        query.push_str(" AND date <= ?");
        params.push(end_date.to_string());
    }

    // Sort by date, and then ID to keep the order stable after updates.
    query.push_str(" ORDER BY date DESC, id ASC");

    connection
        .prepare(&query)?
        .query_map(params_from_iter(&params), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::SqlError))
        .collect()
}

#[cfg(test)]
mod query_tests {
    use rusqlite::Connection;
    use time::{Date, macros::date};

    use crate::{
        db::initialize,
        expense::core::{Category, ExpenseData, PaymentMethod, create_expense},
    };

    use super::{ExpenseFilter, list_expenses};

    const OWNER: &str = "a@x.com";
    const SOMEONE_ELSE: &str = "b@y.com";

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn insert_expense(
        conn: &Connection,
        owner: &str,
        category: Category,
        payment_method: PaymentMethod,
        date: Date,
        notes: Option<&str>,
    ) {
        create_expense(
            owner,
            ExpenseData {
                category,
                amount: 10.0,
                payment_method,
                date,
                notes: notes.map(str::to_owned),
            },
            conn,
        )
        .unwrap();
    }

    #[test]
    fn list_with_no_expenses_is_empty() {
        let conn = get_test_connection();

        let expenses = list_expenses(OWNER, &Default::default(), &conn).unwrap();

        assert_eq!(expenses, []);
    }

    #[test]
    fn list_never_returns_someone_elses_expenses() {
        let conn = get_test_connection();
        insert_expense(
            &conn,
            OWNER,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 01 - 05),
            None,
        );
        insert_expense(
            &conn,
            SOMEONE_ELSE,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 01 - 06),
            None,
        );

        let expenses = list_expenses(OWNER, &Default::default(), &conn).unwrap();

        assert_eq!(expenses.len(), 1, "got {} expenses, want 1", expenses.len());
        assert!(
            expenses.iter().all(|expense| expense.owner_email == OWNER),
            "got an expense owned by someone else"
        );
    }

    #[test]
    fn list_sorts_by_date_descending() {
        let conn = get_test_connection();
        for date in [
            date!(2024 - 01 - 05),
            date!(2024 - 03 - 01),
            date!(2024 - 02 - 14),
            date!(2024 - 03 - 01),
        ] {
            insert_expense(&conn, OWNER, Category::Food, PaymentMethod::Card, date, None);
        }

        let expenses = list_expenses(OWNER, &Default::default(), &conn).unwrap();

        let dates: Vec<_> = expenses.iter().map(|expense| expense.date).collect();
        assert!(
            dates.windows(2).all(|pair| pair[0] >= pair[1]),
            "got dates {dates:?}, want non-increasing"
        );
    }

    #[test]
    fn list_search_is_case_insensitive() {
        let conn = get_test_connection();
        insert_expense(
            &conn,
            OWNER,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 01 - 05),
            Some("Lunch with the team"),
        );
        insert_expense(
            &conn,
            OWNER,
            Category::Bills,
            PaymentMethod::Upi,
            date!(2024 - 01 - 06),
            Some("electricity"),
        );

        let filter = ExpenseFilter {
            search: Some("lunch".to_owned()),
            ..Default::default()
        };
        let expenses = list_expenses(OWNER, &filter, &conn).unwrap();

        assert_eq!(expenses.len(), 1, "got {} expenses, want 1", expenses.len());
        assert_eq!(expenses[0].notes.as_deref(), Some("Lunch with the team"));
    }

    #[test]
    fn list_search_matches_category_and_payment_method() {
        let conn = get_test_connection();
        insert_expense(
            &conn,
            OWNER,
            Category::Travel,
            PaymentMethod::Cash,
            date!(2024 - 01 - 05),
            None,
        );
        insert_expense(
            &conn,
            OWNER,
            Category::Bills,
            PaymentMethod::Upi,
            date!(2024 - 01 - 06),
            None,
        );

        let by_category = list_expenses(
            OWNER,
            &ExpenseFilter {
                search: Some("travel".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].category, Category::Travel);

        let by_payment = list_expenses(
            OWNER,
            &ExpenseFilter {
                search: Some("upi".to_owned()),
                ..Default::default()
            },
            &conn,
        )
        .unwrap();
        assert_eq!(by_payment.len(), 1);
        assert_eq!(by_payment[0].payment_method, PaymentMethod::Upi);
    }

    #[test]
    fn list_start_date_excludes_older_expenses() {
        let conn = get_test_connection();
        insert_expense(
            &conn,
            OWNER,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 01 - 01),
            None,
        );
        insert_expense(
            &conn,
            OWNER,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 02 - 01),
            None,
        );

        let filter = ExpenseFilter {
            start_date: Some(date!(2024 - 01 - 15)),
            ..Default::default()
        };
        let expenses = list_expenses(OWNER, &filter, &conn).unwrap();

        assert_eq!(expenses.len(), 1, "got {} expenses, want 1", expenses.len());
        assert_eq!(expenses[0].date, date!(2024 - 02 - 01));
    }

    #[test]
    fn list_date_bounds_are_inclusive() {
        let conn = get_test_connection();
        for date in [
            date!(2024 - 01 - 01),
            date!(2024 - 01 - 15),
            date!(2024 - 01 - 31),
        ] {
            insert_expense(&conn, OWNER, Category::Food, PaymentMethod::Card, date, None);
        }

        let filter = ExpenseFilter {
            start_date: Some(date!(2024 - 01 - 01)),
            end_date: Some(date!(2024 - 01 - 31)),
            ..Default::default()
        };
        let expenses = list_expenses(OWNER, &filter, &conn).unwrap();

        assert_eq!(expenses.len(), 3, "both boundary dates should be included");
    }

    #[test]
    fn list_combines_search_and_date_filters() {
        let conn = get_test_connection();
        insert_expense(
            &conn,
            OWNER,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 01 - 05),
            Some("groceries"),
        );
        insert_expense(
            &conn,
            OWNER,
            Category::Food,
            PaymentMethod::Card,
            date!(2024 - 03 - 05),
            Some("groceries"),
        );

        let filter = ExpenseFilter {
            search: Some("groceries".to_owned()),
            end_date: Some(date!(2024 - 01 - 31)),
            ..Default::default()
        };
        let expenses = list_expenses(OWNER, &filter, &conn).unwrap();

        assert_eq!(expenses.len(), 1, "got {} expenses, want 1", expenses.len());
        assert_eq!(expenses[0].date, date!(2024 - 01 - 05));
    }
}
