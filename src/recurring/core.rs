//! Data model and database queries for recurring transaction rules.
//!
//! A rule is a template for transactions that repeat on a fixed schedule,
//! e.g. rent or a salary. The engine in [crate::recurring::engine] turns due
//! rules into concrete transactions.

use rusqlite::{Connection, Row, types::FromSqlError};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

use crate::{
    Error, account::AccountId, category::CategoryId, transaction::TransactionKind,
};

/// Database identifier for a recurring rule.
pub type RecurringRuleId = i64;

/// How often a recurring rule fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Interval {
    /// The string stored in the database for this interval.
    pub fn as_str(self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Yearly => "yearly",
        }
    }

    /// Parse the database string for an interval.
    pub fn from_db_string(interval: &str) -> Result<Self, FromSqlError> {
        match interval {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            "yearly" => Ok(Interval::Yearly),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// A rule describing a transaction that repeats on a schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringRule {
    pub id: RecurringRuleId,
    /// The monetary amount of each generated transaction. Always positive.
    pub amount: f64,
    /// Whether the generated transactions are income or expenses.
    pub kind: TransactionKind,
    /// How often the rule fires.
    pub interval: Interval,
    /// A human-readable description, copied onto each generated transaction.
    pub description: String,
    /// The first date the rule was due.
    pub start_date: Date,
    /// The next date the rule is due. The rule is due when this is today or
    /// earlier. Only ever moves forward.
    pub next_due_date: Date,
    /// The due date most recently turned into a transaction, if any.
    pub last_processed_date: Option<Date>,
    /// The account the generated transactions belong to.
    pub account_id: AccountId,
    /// The category of the generated transactions.
    pub category_id: Option<CategoryId>,
}

/// The fields needed to create or update a recurring rule.
///
/// `next_due_date` starts at `start_date` for a new rule.
#[derive(Debug, Clone, PartialEq)]
pub struct RecurringRuleDraft {
    pub amount: f64,
    pub kind: TransactionKind,
    pub interval: Interval,
    pub description: String,
    pub start_date: Date,
    pub account_id: AccountId,
    pub category_id: Option<CategoryId>,
}

impl RecurringRuleDraft {
    fn validate(&self) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        Ok(())
    }
}

/// The date one interval after `date`.
///
/// Monthly and yearly advancement preserves the day-of-month where possible
/// and clamps to the target month's last day otherwise, so a monthly rule due
/// on the 31st of January is next due on the 28th (or 29th) of February.
pub fn advance_date(date: Date, interval: Interval) -> Date {
    match interval {
        Interval::Daily => date + Duration::days(1),
        Interval::Weekly => date + Duration::weeks(1),
        Interval::Monthly => {
            let (year, month) = match date.month() {
                Month::December => (date.year() + 1, Month::January),
                month => (date.year(), month.next()),
            };
            let day = date.day().min(last_day_of_month(year, month));

            Date::from_calendar_date(year, month, day).expect("invalid advanced monthly date")
        }
        Interval::Yearly => {
            let year = date.year() + 1;
            let day = date.day().min(last_day_of_month(year, date.month()));

            Date::from_calendar_date(year, date.month(), day).expect("invalid advanced yearly date")
        }
    }
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Create the recurring rule table in the database.
pub fn create_recurring_rule_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS recurring_rule (
                id INTEGER PRIMARY KEY,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                interval TEXT NOT NULL,
                description TEXT NOT NULL,
                start_date TEXT NOT NULL,
                next_due_date TEXT NOT NULL,
                last_processed_date TEXT,
                account_id INTEGER NOT NULL,
                category_id INTEGER,
                FOREIGN KEY(account_id) REFERENCES account(id),
                FOREIGN KEY(category_id) REFERENCES category(id)
                    ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create a recurring rule. Its first due date is its start date.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero, negative, or not finite,
/// - or [Error::InvalidAccount] if the account ID does not refer to a real account,
/// - or [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_recurring_rule(
    draft: RecurringRuleDraft,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    draft.validate()?;

    connection
        .prepare(
            "INSERT INTO recurring_rule
                (amount, kind, interval, description, start_date, next_due_date,
                last_processed_date, account_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5, NULL, ?6, ?7)
             RETURNING id, amount, kind, interval, description, start_date, next_due_date,
                last_processed_date, account_id, category_id",
        )?
        .query_row(
            (
                draft.amount,
                draft.kind.as_str(),
                draft.interval.as_str(),
                &draft.description,
                draft.start_date,
                draft.account_id,
                draft.category_id,
            ),
            map_rule_row,
        )
        .map_err(|error| map_constraint_error(error, draft.account_id, draft.category_id, connection))
}

/// Update a rule's template fields.
///
/// If the start date moved forward past the next due date, the next due date
/// follows it. The next due date never moves backwards, so already-processed
/// periods are not fired again.
pub fn update_recurring_rule(
    id: RecurringRuleId,
    draft: RecurringRuleDraft,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    draft.validate()?;

    connection
        .prepare(
            "UPDATE recurring_rule
             SET amount = ?1, kind = ?2, interval = ?3, description = ?4, start_date = ?5,
                next_due_date = MAX(next_due_date, ?5), account_id = ?6, category_id = ?7
             WHERE id = ?8
             RETURNING id, amount, kind, interval, description, start_date, next_due_date,
                last_processed_date, account_id, category_id",
        )?
        .query_row(
            (
                draft.amount,
                draft.kind.as_str(),
                draft.interval.as_str(),
                &draft.description,
                draft.start_date,
                draft.account_id,
                draft.category_id,
                id,
            ),
            map_rule_row,
        )
        .map_err(|error| {
            match map_constraint_error(error, draft.account_id, draft.category_id, connection) {
                Error::NotFound => Error::UpdateMissingRule,
                error => error,
            }
        })
}

/// Delete a recurring rule by ID. Transactions already generated by the rule
/// are left in place.
pub fn delete_recurring_rule(id: RecurringRuleId, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute("DELETE FROM recurring_rule WHERE id = ?1", [id])?;

    if rows_affected == 0 {
        return Err(Error::DeleteMissingRule);
    }

    Ok(())
}

/// Retrieve a recurring rule from the database by its `id`.
pub fn get_recurring_rule(
    id: RecurringRuleId,
    connection: &Connection,
) -> Result<RecurringRule, Error> {
    let rule = connection
        .prepare(
            "SELECT id, amount, kind, interval, description, start_date, next_due_date,
                last_processed_date, account_id, category_id
            FROM recurring_rule WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_rule_row)?;

    Ok(rule)
}

/// Retrieve all recurring rules ordered by next due date, soonest first.
pub fn get_all_recurring_rules(connection: &Connection) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, interval, description, start_date, next_due_date,
                last_processed_date, account_id, category_id
            FROM recurring_rule
            ORDER BY next_due_date ASC, id ASC",
        )?
        .query_map([], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(Error::from))
        .collect()
}

/// Retrieve the rules that are due on or before `today`.
pub fn get_due_rules(today: Date, connection: &Connection) -> Result<Vec<RecurringRule>, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, interval, description, start_date, next_due_date,
                last_processed_date, account_id, category_id
            FROM recurring_rule
            WHERE next_due_date <= ?1
            ORDER BY next_due_date ASC, id ASC",
        )?
        .query_map([today], map_rule_row)?
        .map(|maybe_rule| maybe_rule.map_err(Error::from))
        .collect()
}

/// Record that a rule's due date was turned into a transaction and schedule
/// the next occurrence. `next_due` must be after the stored due date.
pub(crate) fn mark_rule_processed(
    id: RecurringRuleId,
    processed_date: Date,
    next_due: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE recurring_rule SET last_processed_date = ?1, next_due_date = ?2 WHERE id = ?3",
        (processed_date, next_due, id),
    )?;

    if rows_affected == 0 {
        return Err(Error::UpdateMissingRule);
    }

    Ok(())
}

/// Convert a database row into a [RecurringRule].
///
/// Expects the columns id, amount, kind, interval, description, start_date,
/// next_due_date, last_processed_date, account_id, category_id.
pub fn map_rule_row(row: &Row) -> Result<RecurringRule, rusqlite::Error> {
    let kind: String = row.get(2)?;
    let interval: String = row.get(3)?;

    Ok(RecurringRule {
        id: row.get(0)?,
        amount: row.get(1)?,
        kind: TransactionKind::from_db_string(&kind)?,
        interval: Interval::from_db_string(&interval)?,
        description: row.get(4)?,
        start_date: row.get(5)?,
        next_due_date: row.get(6)?,
        last_processed_date: row.get(7)?,
        account_id: row.get(8)?,
        category_id: row.get(9)?,
    })
}

/// SQLite reports which constraint failed but not which foreign key, so check
/// the account to decide which ID was invalid.
fn map_constraint_error(
    error: rusqlite::Error,
    account_id: AccountId,
    category_id: Option<CategoryId>,
    connection: &Connection,
) -> Error {
    match error {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
            },
            _,
        ) => {
            let account_exists = connection
                .query_row(
                    "SELECT COUNT(1) FROM account WHERE id = ?1",
                    [account_id],
                    |row| row.get::<_, i64>(0),
                )
                .unwrap_or(0)
                > 0;

            if account_exists {
                Error::InvalidCategory(category_id)
            } else {
                Error::InvalidAccount(Some(account_id))
            }
        }
        error => error.into(),
    }
}

#[cfg(test)]
mod advance_date_tests {
    use time::macros::date;

    use super::{Interval, advance_date};

    #[test]
    fn daily_advances_one_day() {
        assert_eq!(
            advance_date(date!(2025 - 06 - 30), Interval::Daily),
            date!(2025 - 07 - 01)
        );
    }

    #[test]
    fn weekly_advances_seven_days() {
        assert_eq!(
            advance_date(date!(2025 - 12 - 29), Interval::Weekly),
            date!(2026 - 01 - 05)
        );
    }

    #[test]
    fn monthly_preserves_day_of_month() {
        assert_eq!(
            advance_date(date!(2025 - 04 - 15), Interval::Monthly),
            date!(2025 - 05 - 15)
        );
    }

    #[test]
    fn monthly_clamps_to_end_of_shorter_month() {
        assert_eq!(
            advance_date(date!(2025 - 01 - 31), Interval::Monthly),
            date!(2025 - 02 - 28)
        );
    }

    #[test]
    fn monthly_clamps_to_leap_day() {
        assert_eq!(
            advance_date(date!(2024 - 01 - 31), Interval::Monthly),
            date!(2024 - 02 - 29)
        );
    }

    #[test]
    fn monthly_wraps_year_end() {
        assert_eq!(
            advance_date(date!(2025 - 12 - 31), Interval::Monthly),
            date!(2026 - 01 - 31)
        );
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(
            advance_date(date!(2024 - 02 - 29), Interval::Yearly),
            date!(2025 - 02 - 28)
        );
    }
}

#[cfg(test)]
mod recurring_rule_query_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{Error, db::initialize, transaction::TransactionKind};

    use super::{
        Interval, RecurringRuleDraft, create_recurring_rule, delete_recurring_rule, get_due_rules,
        get_recurring_rule, mark_rule_processed, update_recurring_rule,
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 100.0, 100.0)",
                (),
            )
            .unwrap();

        connection
    }

    fn rent_draft() -> RecurringRuleDraft {
        RecurringRuleDraft {
            amount: 500.0,
            kind: TransactionKind::Expense,
            interval: Interval::Monthly,
            description: "Rent".to_owned(),
            start_date: date!(2025 - 01 - 31),
            account_id: 1,
            category_id: None,
        }
    }

    #[test]
    fn create_sets_next_due_to_start_date() {
        let connection = get_test_connection();

        let rule = create_recurring_rule(rent_draft(), &connection).unwrap();

        assert_eq!(rule.next_due_date, rule.start_date);
        assert_eq!(rule.last_processed_date, None);
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        let connection = get_test_connection();

        let result = create_recurring_rule(
            RecurringRuleDraft {
                amount: 0.0,
                ..rent_draft()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn create_rejects_missing_account() {
        let connection = get_test_connection();

        let result = create_recurring_rule(
            RecurringRuleDraft {
                account_id: 999,
                ..rent_draft()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::InvalidAccount(Some(999)))));
    }

    #[test]
    fn create_rejects_missing_category() {
        let connection = get_test_connection();

        let result = create_recurring_rule(
            RecurringRuleDraft {
                category_id: Some(999),
                ..rent_draft()
            },
            &connection,
        );

        assert!(matches!(result, Err(Error::InvalidCategory(Some(999)))));
    }

    #[test]
    fn get_due_rules_excludes_future_rules() {
        let connection = get_test_connection();
        create_recurring_rule(rent_draft(), &connection).unwrap();
        create_recurring_rule(
            RecurringRuleDraft {
                description: "Insurance".to_owned(),
                start_date: date!(2025 - 06 - 01),
                ..rent_draft()
            },
            &connection,
        )
        .unwrap();

        let due = get_due_rules(date!(2025 - 02 - 15), &connection).unwrap();

        assert_eq!(due.len(), 1);
        assert_eq!(due[0].description, "Rent");
    }

    #[test]
    fn update_does_not_move_next_due_backwards() {
        let connection = get_test_connection();
        let rule = create_recurring_rule(rent_draft(), &connection).unwrap();
        mark_rule_processed(
            rule.id,
            date!(2025 - 01 - 31),
            date!(2025 - 02 - 28),
            &connection,
        )
        .unwrap();

        let updated = update_recurring_rule(
            rule.id,
            RecurringRuleDraft {
                start_date: date!(2025 - 01 - 01),
                ..rent_draft()
            },
            &connection,
        )
        .unwrap();

        assert_eq!(updated.next_due_date, date!(2025 - 02 - 28));
    }

    #[test]
    fn update_missing_rule_is_an_error() {
        let connection = get_test_connection();

        let result = update_recurring_rule(999, rent_draft(), &connection);

        assert!(matches!(result, Err(Error::UpdateMissingRule)));
    }

    #[test]
    fn delete_removes_rule() {
        let connection = get_test_connection();
        let rule = create_recurring_rule(rent_draft(), &connection).unwrap();

        delete_recurring_rule(rule.id, &connection).unwrap();

        assert!(matches!(
            get_recurring_rule(rule.id, &connection),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn delete_missing_rule_is_an_error() {
        let connection = get_test_connection();

        assert!(matches!(
            delete_recurring_rule(999, &connection),
            Err(Error::DeleteMissingRule)
        ));
    }
}
