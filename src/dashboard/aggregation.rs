//! Expense aggregation for the dashboard, reports and summary APIs.
//!
//! Queries a simplified expense view (amount, date, category name) and
//! provides the grouping functions the charts and tables are built from.

use std::{
    collections::HashMap,
    ops::RangeInclusive,
};

use rusqlite::Connection;
use time::{Date, Duration, Month};

use crate::Error;

/// The label used for expenses without a category.
pub(super) const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// A simplified expense view for aggregation.
///
/// Separate from the main Transaction model because the dashboard only needs
/// the amount, date and category name.
#[derive(Debug)]
pub(super) struct ExpenseRecord {
    pub amount: f64,
    pub date: Date,
    pub category: String,
}

/// Get all balance-affecting expenses within a date range.
///
/// Uncategorized expenses are labelled [UNCATEGORIZED_LABEL].
pub(super) fn get_expenses_in_date_range(
    date_range: RangeInclusive<Date>,
    connection: &Connection,
) -> Result<Vec<ExpenseRecord>, Error> {
    connection
        .prepare(
            "SELECT t.amount, t.date, COALESCE(category.name, :label)
            FROM \"transaction\" t
            LEFT JOIN category ON category.id = t.category_id
            WHERE t.kind = 'expense'
                AND t.affects_balance = 1
                AND t.date BETWEEN :start AND :end",
        )?
        .query_map(
            &[
                (":label", &UNCATEGORIZED_LABEL.to_owned()),
                (":start", &date_range.start().to_string()),
                (":end", &date_range.end().to_string()),
            ],
            |row| {
                Ok(ExpenseRecord {
                    amount: row.get(0)?,
                    date: row.get(1)?,
                    category: row.get(2)?,
                })
            },
        )?
        .map(|maybe_record| maybe_record.map_err(Error::from))
        .collect()
}

/// Sum expenses by category, largest total first.
pub(super) fn total_by_category(expenses: &[ExpenseRecord]) -> Vec<(String, f64)> {
    let mut totals: HashMap<&str, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category.as_str()).or_insert(0.0) += expense.amount;
    }

    let mut sorted: Vec<(String, f64)> = totals
        .into_iter()
        .map(|(category, total)| (category.to_owned(), total))
        .collect();
    sorted.sort_by(|a, b| b.1.total_cmp(&a.1));

    sorted
}

/// The category names present in `expenses`, sorted alphabetically with
/// [UNCATEGORIZED_LABEL] last.
pub(super) fn sorted_categories(expenses: &[ExpenseRecord]) -> Vec<String> {
    let mut names: Vec<&str> = expenses
        .iter()
        .map(|expense| expense.category.as_str())
        .filter(|&name| name != UNCATEGORIZED_LABEL)
        .collect();
    names.sort_unstable();
    names.dedup();

    let mut sorted: Vec<String> = names.into_iter().map(str::to_owned).collect();

    if expenses
        .iter()
        .any(|expense| expense.category == UNCATEGORIZED_LABEL)
    {
        sorted.push(UNCATEGORIZED_LABEL.to_owned());
    }

    sorted
}

/// The unique months covered by `expenses` in chronological order, each as a
/// date with the day set to 1.
pub(super) fn get_sorted_months(expenses: &[ExpenseRecord]) -> Vec<Date> {
    let mut months: Vec<Date> = expenses
        .iter()
        .map(|expense| first_of_month(expense.date))
        .collect();
    months.sort_unstable();
    months.dedup();

    months
}

/// Format months as "Jan 2025" style labels.
pub(super) fn format_month_labels(months: &[Date]) -> Vec<String> {
    months
        .iter()
        .map(|month| format!("{} {}", month_abbreviation(month.month()), month.year()))
        .collect()
}

/// Monthly expense totals per category.
///
/// Returns one `(category, monthly_totals)` pair per category in the order of
/// [sorted_categories], where `monthly_totals` has one entry per month in
/// `sorted_months` and `None` for months without expenses in that category.
pub(super) fn monthly_totals_by_category(
    expenses: &[ExpenseRecord],
    sorted_months: &[Date],
) -> Vec<(String, Vec<Option<f64>>)> {
    sorted_categories(expenses)
        .into_iter()
        .map(|category| {
            let mut totals_by_month: HashMap<Date, f64> = HashMap::new();

            for expense in expenses
                .iter()
                .filter(|expense| expense.category == category)
            {
                *totals_by_month
                    .entry(first_of_month(expense.date))
                    .or_insert(0.0) += expense.amount;
            }

            let monthly_totals = sorted_months
                .iter()
                .map(|month| totals_by_month.get(month).copied())
                .collect();

            (category, monthly_totals)
        })
        .collect()
}

/// Expense totals per day across `date_range`, zero-filled so that every day
/// in the range appears exactly once.
pub(super) fn daily_totals(
    expenses: &[ExpenseRecord],
    date_range: RangeInclusive<Date>,
) -> Vec<(Date, f64)> {
    let mut totals_by_day: HashMap<Date, f64> = HashMap::new();

    for expense in expenses {
        *totals_by_day.entry(expense.date).or_insert(0.0) += expense.amount;
    }

    let mut totals = Vec::new();
    let mut day = *date_range.start();

    while day <= *date_range.end() {
        totals.push((day, totals_by_day.get(&day).copied().unwrap_or(0.0)));
        day += Duration::days(1);
    }

    totals
}

fn first_of_month(date: Date) -> Date {
    date.replace_day(1).expect("day 1 is valid in every month")
}

fn month_abbreviation(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}
