//! Expense aggregation for the dashboard and reports.
//!
//! Every function here is a pure derivation over an already-fetched,
//! owner-scoped slice of expenses. Nothing in this module queries the
//! database or filters by anything other than what it was handed.

use std::collections::HashMap;

use time::{Date, Month};

use crate::expense::core::{Category, Expense, PaymentMethod};

/// Sum the amounts of all expenses in the slice.
pub(super) fn total_spent(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|expense| expense.amount).sum()
}

/// Aggregate expense amounts by category.
pub(super) fn sum_by_category(expenses: &[Expense]) -> HashMap<Category, f64> {
    let mut totals = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category).or_insert(0.0) += expense.amount;
    }

    totals
}

/// Aggregate expense amounts by payment method.
pub(super) fn sum_by_payment_method(expenses: &[Expense]) -> HashMap<PaymentMethod, f64> {
    let mut totals = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.payment_method).or_insert(0.0) += expense.amount;
    }

    totals
}

/// The category with the highest total spend, if any expenses exist.
///
/// Ties go to the alphabetically first label so the result is deterministic.
pub(super) fn top_category(expenses: &[Expense]) -> Option<Category> {
    sum_by_category(expenses)
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.as_str().cmp(a.0.as_str())))
        .map(|(category, _)| category)
}

/// The payment method with the highest total spend, if any expenses exist.
///
/// Ties go to the alphabetically first label so the result is deterministic.
pub(super) fn top_payment_method(expenses: &[Expense]) -> Option<PaymentMethod> {
    sum_by_payment_method(expenses)
        .into_iter()
        .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.as_str().cmp(a.0.as_str())))
        .map(|(payment_method, _)| payment_method)
}

/// Aggregate expense amounts per calendar day, in chronological order.
pub(super) fn daily_totals(expenses: &[Expense]) -> Vec<(Date, f64)> {
    let mut totals = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    let mut sorted: Vec<_> = totals.into_iter().collect();
    sorted.sort_by_key(|(date, _)| *date);
    sorted
}

/// Sum the amounts of the expenses dated in the given month.
pub(super) fn sum_in_month(expenses: &[Expense], year: i32, month: Month) -> f64 {
    expenses
        .iter()
        .filter(|expense| expense.date.year() == year && expense.date.month() == month)
        .map(|expense| expense.amount)
        .sum()
}

/// The mean spend per day over the days spanned by the expenses (first to
/// last date, inclusive). Zero when the slice is empty.
pub(super) fn average_daily_spend(expenses: &[Expense]) -> f64 {
    let (min_date, max_date) = match (
        expenses.iter().map(|expense| expense.date).min(),
        expenses.iter().map(|expense| expense.date).max(),
    ) {
        (Some(min_date), Some(max_date)) => (min_date, max_date),
        _ => return 0.0,
    };

    let days_spanned = (max_date - min_date).whole_days() + 1;

    total_spent(expenses) / days_spanned as f64
}

#[cfg(test)]
mod aggregation_tests {
    use time::{Date, Month, OffsetDateTime, macros::date};

    use crate::expense::core::{Category, Expense, PaymentMethod};

    use super::{
        average_daily_spend, daily_totals, sum_by_category, sum_in_month, top_category,
        top_payment_method, total_spent,
    };

    fn make_expense(
        amount: f64,
        date: Date,
        category: Category,
        payment_method: PaymentMethod,
    ) -> Expense {
        Expense {
            id: 1,
            owner_email: "a@x.com".to_owned(),
            category,
            amount,
            payment_method,
            date,
            notes: None,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn total_spent_sums_all_amounts() {
        let expenses = [
            make_expense(10.0, date!(2024 - 01 - 01), Category::Food, PaymentMethod::Card),
            make_expense(2.5, date!(2024 - 01 - 02), Category::Bills, PaymentMethod::Upi),
        ];

        assert_eq!(total_spent(&expenses), 12.5);
    }

    #[test]
    fn total_spent_of_nothing_is_zero() {
        assert_eq!(total_spent(&[]), 0.0);
    }

    #[test]
    fn sums_group_by_category() {
        let expenses = [
            make_expense(10.0, date!(2024 - 01 - 01), Category::Food, PaymentMethod::Card),
            make_expense(5.0, date!(2024 - 01 - 02), Category::Food, PaymentMethod::Cash),
            make_expense(20.0, date!(2024 - 01 - 03), Category::Bills, PaymentMethod::Upi),
        ];

        let totals = sum_by_category(&expenses);

        assert_eq!(totals[&Category::Food], 15.0);
        assert_eq!(totals[&Category::Bills], 20.0);
    }

    #[test]
    fn top_category_is_the_largest_total() {
        let expenses = [
            make_expense(10.0, date!(2024 - 01 - 01), Category::Food, PaymentMethod::Card),
            make_expense(5.0, date!(2024 - 01 - 02), Category::Food, PaymentMethod::Cash),
            make_expense(12.0, date!(2024 - 01 - 03), Category::Bills, PaymentMethod::Upi),
        ];

        assert_eq!(top_category(&expenses), Some(Category::Food));
    }

    #[test]
    fn top_category_of_nothing_is_none() {
        assert_eq!(top_category(&[]), None);
        assert_eq!(top_payment_method(&[]), None);
    }

    #[test]
    fn top_payment_method_is_the_largest_total() {
        let expenses = [
            make_expense(10.0, date!(2024 - 01 - 01), Category::Food, PaymentMethod::Card),
            make_expense(15.0, date!(2024 - 01 - 02), Category::Food, PaymentMethod::Cash),
        ];

        assert_eq!(top_payment_method(&expenses), Some(PaymentMethod::Cash));
    }

    #[test]
    fn daily_totals_are_chronological() {
        let expenses = [
            make_expense(5.0, date!(2024 - 01 - 03), Category::Food, PaymentMethod::Card),
            make_expense(10.0, date!(2024 - 01 - 01), Category::Food, PaymentMethod::Card),
            make_expense(2.0, date!(2024 - 01 - 01), Category::Bills, PaymentMethod::Upi),
        ];

        let totals = daily_totals(&expenses);

        assert_eq!(
            totals,
            vec![(date!(2024 - 01 - 01), 12.0), (date!(2024 - 01 - 03), 5.0)]
        );
    }

    #[test]
    fn sum_in_month_ignores_other_months() {
        let expenses = [
            make_expense(10.0, date!(2024 - 01 - 31), Category::Food, PaymentMethod::Card),
            make_expense(7.0, date!(2024 - 02 - 01), Category::Food, PaymentMethod::Card),
            make_expense(1.0, date!(2023 - 01 - 15), Category::Food, PaymentMethod::Card),
        ];

        assert_eq!(sum_in_month(&expenses, 2024, Month::January), 10.0);
    }

    #[test]
    fn average_daily_spend_divides_by_days_spanned() {
        let expenses = [
            make_expense(10.0, date!(2024 - 01 - 01), Category::Food, PaymentMethod::Card),
            make_expense(20.0, date!(2024 - 01 - 03), Category::Food, PaymentMethod::Card),
        ];

        // 30.0 over three days (1st through 3rd inclusive).
        assert_eq!(average_daily_spend(&expenses), 10.0);
    }

    #[test]
    fn average_daily_spend_of_nothing_is_zero() {
        assert_eq!(average_daily_spend(&[]), 0.0);
    }
}
