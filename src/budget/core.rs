//! Core budget domain types and database operations.
//!
//! A budget sets a monthly spending limit for one category. At most one
//! budget may exist per category and month.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, category::CategoryId};

/// Database identifier for a budget.
pub type BudgetId = i64;

/// A monthly spending limit for a category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    /// The budget's database ID.
    pub id: BudgetId,
    /// The category the budget applies to.
    pub category_id: CategoryId,
    /// The spending limit in dollars.
    pub amount: f64,
    /// The month the budget applies to, 1 through 12.
    pub month: u8,
    /// The year the budget applies to.
    pub year: i32,
}

/// Parse a month input string such as "2025-03" into a year and month.
pub fn parse_month_input(month_input: &str) -> Result<(i32, u8), Error> {
    sscanf::sscanf!(month_input, "{i32}-{u8}")
        .filter(|(_, month)| (1..=12).contains(month))
        .ok_or_else(|| {
            Error::InvalidDateFormat(
                "expected a month in the format YYYY-MM".to_owned(),
                month_input.to_owned(),
            )
        })
}

/// How much of a budget's limit has been spent, as a percentage.
///
/// A zero or negative limit reports zero progress rather than dividing by
/// zero.
pub fn progress_percent(spent: f64, limit: f64) -> f64 {
    if limit <= 0.0 {
        return 0.0;
    }

    spent / limit * 100.0
}

/// Initialize the budget table.
pub fn create_budget_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS budget (
            id INTEGER PRIMARY KEY,
            category_id INTEGER NOT NULL REFERENCES category(id) ON DELETE CASCADE,
            amount REAL NOT NULL,
            month INTEGER NOT NULL,
            year INTEGER NOT NULL,
            UNIQUE(category_id, month, year)
        )",
        (),
    )?;

    Ok(())
}

/// Create a budget and return it with its generated ID.
///
/// # Errors
/// This function will return a:
/// - [Error::DuplicateBudget] if a budget for the category and month already exists,
/// - or [Error::InvalidCategory] if the category does not exist,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_budget(
    category_id: CategoryId,
    amount: f64,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Budget, Error> {
    connection
        .execute(
            "INSERT INTO budget (category_id, amount, month, year) VALUES (?1, ?2, ?3, ?4)",
            (category_id, amount, month, year),
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                _,
            ) => Error::DuplicateBudget,
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::InvalidCategory(Some(category_id)),
            error => error.into(),
        })?;

    Ok(Budget {
        id: connection.last_insert_rowid(),
        category_id,
        amount,
        month,
        year,
    })
}

/// Retrieve a single budget by ID.
pub fn get_budget(budget_id: BudgetId, connection: &Connection) -> Result<Budget, Error> {
    connection
        .prepare("SELECT id, category_id, amount, month, year FROM budget WHERE id = :id")?
        .query_row(&[(":id", &budget_id)], map_row)
        .map_err(|error| error.into())
}

/// Retrieve all budgets for a month, ordered by category name.
pub fn get_budgets_for_month(
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<Vec<Budget>, Error> {
    connection
        .prepare(
            "SELECT budget.id, budget.category_id, budget.amount, budget.month, budget.year
            FROM budget
            INNER JOIN category ON category.id = budget.category_id
            WHERE budget.month = ?1 AND budget.year = ?2
            ORDER BY category.name ASC",
        )?
        .query_map((month, year), map_row)?
        .map(|maybe_budget| maybe_budget.map_err(Error::from))
        .collect()
}

/// Update a budget's limit. Returns an error if the budget doesn't exist.
pub fn update_budget(
    budget_id: BudgetId,
    amount: f64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE budget SET amount = ?1 WHERE id = ?2",
        (amount, budget_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingBudget);
    }

    Ok(())
}

/// Delete a budget by ID. Returns an error if the budget doesn't exist.
pub fn delete_budget(budget_id: BudgetId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM budget WHERE id = ?1", [budget_id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingBudget);
    }

    Ok(())
}

/// The total spent on expenses in a category during a month.
pub fn spent_in_category_for_month(
    category_id: CategoryId,
    month: u8,
    year: i32,
    connection: &Connection,
) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT COALESCE(SUM(amount), 0.0) FROM \"transaction\"
            WHERE kind = 'expense'
                AND category_id = ?1
                AND CAST(strftime('%m', date) AS INTEGER) = ?2
                AND CAST(strftime('%Y', date) AS INTEGER) = ?3",
            (category_id, month, year),
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

fn map_row(row: &Row) -> Result<Budget, rusqlite::Error> {
    Ok(Budget {
        id: row.get(0)?,
        category_id: row.get(1)?,
        amount: row.get(2)?,
        month: row.get(3)?,
        year: row.get(4)?,
    })
}
