//! Defines the core data models and database queries for transactions.
//!
//! Every mutation here keeps the owning account's balance in step with the
//! transaction rows, see [crate::transaction::reconcile].

use rusqlite::{Connection, Row, types::FromSqlError};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::AccountId,
    category::CategoryId,
    transaction::reconcile::{apply_balance_delta, signed_effect},
};

/// Database identifier for a transaction.
pub type TransactionId = i64;

/// Whether a transaction adds money to an account or removes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money coming into the account, e.g. salary.
    Income,
    /// Money leaving the account, e.g. groceries.
    Expense,
}

impl TransactionKind {
    /// The string stored in the database for this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }

    /// Parse the database string for a transaction kind.
    pub fn from_db_string(kind: &str) -> Result<Self, FromSqlError> {
        match kind {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            _ => Err(FromSqlError::InvalidType),
        }
    }
}

/// An expense or income, i.e. an event where money was either spent or earned.
///
/// Amounts are always positive. Whether a transaction adds to or subtracts
/// from its account's balance is determined by `kind` and `affects_balance`.
///
/// To create a new `Transaction`, use [Transaction::build].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The amount of money spent or earned in this transaction.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// When the transaction happened.
    pub date: Date,
    /// A text description of what the transaction was for.
    pub description: String,
    /// Free-form notes.
    pub notes: String,
    /// Whether the transaction counts towards its account's balance.
    ///
    /// Reimbursed work expenses and the like are recorded for reporting but
    /// should not move the balance.
    pub affects_balance: bool,
    /// The ID of the import that this transaction belongs to.
    pub import_id: Option<i64>,
    /// The ID of the account the transaction belongs to.
    pub account_id: AccountId,
    /// The ID of the category the transaction belongs to.
    pub category_id: Option<CategoryId>,
}

impl Transaction {
    /// Create a new transaction.
    ///
    /// Shortcut for [TransactionBuilder] for discoverability.
    pub fn build(
        amount: f64,
        kind: TransactionKind,
        date: Date,
        description: &str,
        account_id: AccountId,
    ) -> TransactionBuilder {
        TransactionBuilder {
            amount,
            kind,
            date,
            description: description.to_owned(),
            notes: String::new(),
            affects_balance: true,
            import_id: None,
            account_id,
            category_id: None,
        }
    }
}

/// A builder for creating [Transaction] instances.
#[derive(Debug, PartialEq, Clone)]
pub struct TransactionBuilder {
    /// The monetary amount of the transaction. Must be a positive number.
    pub amount: f64,
    /// Whether the transaction is income or an expense.
    pub kind: TransactionKind,
    /// The date when the transaction occurred. Must not be in the future.
    pub date: Date,
    /// A human-readable description of the transaction.
    pub description: String,
    /// Free-form notes.
    pub notes: String,
    /// Whether the transaction counts towards its account's balance.
    pub affects_balance: bool,
    /// Optional unique identifier for imported transactions.
    ///
    /// The database enforces uniqueness on this field so the same CSV file
    /// can be imported multiple times safely.
    pub import_id: Option<i64>,
    /// The account the transaction belongs to.
    pub account_id: AccountId,
    /// The category of the transaction, e.g. "Groceries", "Rent".
    pub category_id: Option<CategoryId>,
}

impl TransactionBuilder {
    /// Set the notes for the transaction.
    pub fn notes(mut self, notes: &str) -> Self {
        self.notes = notes.to_owned();
        self
    }

    /// Set whether the transaction counts towards its account's balance.
    pub fn affects_balance(mut self, affects_balance: bool) -> Self {
        self.affects_balance = affects_balance;
        self
    }

    /// Set the import ID for the transaction.
    pub fn import_id(mut self, import_id: Option<i64>) -> Self {
        self.import_id = import_id;
        self
    }

    /// Set the category ID for the transaction.
    pub fn category_id(mut self, category_id: Option<CategoryId>) -> Self {
        self.category_id = category_id;
        self
    }

    pub(crate) fn validate(&self, today: Date) -> Result<(), Error> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidAmount(self.amount));
        }

        if self.date > today {
            return Err(Error::FutureDate(self.date));
        }

        Ok(())
    }
}

/// Create a new transaction and apply its effect to the owning account's
/// balance. The row insert and the balance update happen in one database
/// transaction.
///
/// `today` is the current date in the user's timezone, used to reject future
/// dates.
///
/// # Errors
/// This function will return a:
/// - [Error::InvalidAmount] if the amount is zero, negative, or not finite,
/// - or [Error::FutureDate] if the date is after `today`,
/// - or [Error::InvalidAccount] if the account ID does not refer to a real account,
/// - or [Error::InvalidCategory] if the category ID does not refer to a real category,
/// - or [Error::DuplicateImportId] if a transaction with the specified import ID already exists,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_transaction(
    builder: TransactionBuilder,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate(today)?;

    let sql_transaction = connection.unchecked_transaction()?;
    let transaction = insert_transaction(builder, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(transaction)
}

/// Insert a transaction row and apply its effect to the owning account's
/// balance, without managing a database transaction.
///
/// The caller is responsible for wrapping this in a database transaction and
/// for validating the builder. Used by [create_transaction], the recurring
/// rule engine and the CSV import, which batch several statements into one
/// database transaction.
pub(crate) fn insert_transaction(
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "INSERT INTO \"transaction\"
                (amount, kind, date, description, notes, affects_balance, import_id,
                account_id, category_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             RETURNING id, amount, kind, date, description, notes, affects_balance, import_id,
                account_id, category_id",
        )?
        .query_row(
            (
                builder.amount,
                builder.kind.as_str(),
                builder.date,
                &builder.description,
                &builder.notes,
                builder.affects_balance,
                builder.import_id,
                builder.account_id,
                builder.category_id,
            ),
            map_transaction_row,
        )
        .map_err(|error| {
            map_constraint_error(error, builder.account_id, builder.category_id, connection)
        })?;

    let effect = signed_effect(
        transaction.kind,
        transaction.amount,
        transaction.affects_balance,
    );
    apply_balance_delta(transaction.account_id, effect, connection)?;

    Ok(transaction)
}

/// Update a transaction and move its effect between accounts as needed.
///
/// The old effect is removed from the old account and the new effect applied
/// to the new account, all in one database transaction. This handles amount,
/// kind, account and `affects_balance` changes uniformly.
pub fn update_transaction(
    id: TransactionId,
    builder: TransactionBuilder,
    today: Date,
    connection: &Connection,
) -> Result<Transaction, Error> {
    builder.validate(today)?;

    let sql_transaction = connection.unchecked_transaction()?;
    let updated = apply_transaction_update(id, builder, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(updated)
}

/// Update a transaction row and move its balance effect between accounts,
/// without managing a database transaction.
///
/// The caller is responsible for wrapping this in a database transaction and
/// for validating the builder. Used by [update_transaction] and the endpoint
/// that updates a transaction together with its tags.
pub(crate) fn apply_transaction_update(
    id: TransactionId,
    builder: TransactionBuilder,
    connection: &Connection,
) -> Result<Transaction, Error> {
    let old = match get_transaction(id, connection) {
        Ok(old) => old,
        Err(Error::NotFound) => return Err(Error::UpdateMissingTransaction),
        Err(error) => return Err(error),
    };

    let updated = connection
        .prepare(
            "UPDATE \"transaction\"
             SET amount = ?1, kind = ?2, date = ?3, description = ?4, notes = ?5,
                affects_balance = ?6, account_id = ?7, category_id = ?8
             WHERE id = ?9
             RETURNING id, amount, kind, date, description, notes, affects_balance, import_id,
                account_id, category_id",
        )?
        .query_row(
            (
                builder.amount,
                builder.kind.as_str(),
                builder.date,
                &builder.description,
                &builder.notes,
                builder.affects_balance,
                builder.account_id,
                builder.category_id,
                id,
            ),
            map_transaction_row,
        )
        .map_err(|error| {
            map_constraint_error(error, builder.account_id, builder.category_id, connection)
        })?;

    let old_effect = signed_effect(old.kind, old.amount, old.affects_balance);
    apply_balance_delta(old.account_id, -old_effect, connection)?;

    let new_effect = signed_effect(updated.kind, updated.amount, updated.affects_balance);
    apply_balance_delta(updated.account_id, new_effect, connection)?;

    Ok(updated)
}

/// Delete a transaction and remove its effect from the owning account's
/// balance.
pub fn delete_transaction(id: TransactionId, connection: &Connection) -> Result<(), Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let old = match get_transaction(id, &sql_transaction) {
        Ok(old) => old,
        Err(Error::NotFound) => return Err(Error::DeleteMissingTransaction),
        Err(error) => return Err(error),
    };

    sql_transaction.execute("DELETE FROM \"transaction\" WHERE id = ?1", [id])?;

    let effect = signed_effect(old.kind, old.amount, old.affects_balance);
    apply_balance_delta(old.account_id, -effect, &sql_transaction)?;

    sql_transaction.commit()?;

    Ok(())
}

/// Retrieve a transaction from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let transaction = connection
        .prepare(
            "SELECT id, amount, kind, date, description, notes, affects_balance, import_id,
                account_id, category_id
            FROM \"transaction\" WHERE id = :id",
        )?
        .query_one(&[(":id", &id)], map_transaction_row)?;

    Ok(transaction)
}

/// Retrieve a page of transactions ordered from newest to oldest.
pub fn get_transactions_page(
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<Transaction>, Error> {
    connection
        .prepare(
            "SELECT id, amount, kind, date, description, notes, affects_balance, import_id,
                account_id, category_id
            FROM \"transaction\"
            ORDER BY date DESC, id DESC
            LIMIT ?1 OFFSET ?2",
        )?
        .query_map([limit as i64, offset as i64], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect()
}

/// Get the total number of transactions in the database.
pub fn count_transactions(connection: &Connection) -> Result<u64, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM \"transaction\"", [], |row| {
            row.get::<_, i64>(0).map(|count| count as u64)
        })
        .map_err(|error| error.into())
}

/// Create the transaction table in the database.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                amount REAL NOT NULL,
                kind TEXT NOT NULL,
                date TEXT NOT NULL,
                description TEXT NOT NULL,
                notes TEXT NOT NULL DEFAULT '',
                affects_balance INTEGER NOT NULL DEFAULT 1,
                import_id INTEGER UNIQUE,
                account_id INTEGER NOT NULL,
                category_id INTEGER,
                FOREIGN KEY(account_id) REFERENCES account(id),
                FOREIGN KEY(category_id) REFERENCES category(id)
                    ON UPDATE CASCADE ON DELETE SET NULL
                )",
        (),
    )?;

    // Ensure the sequence starts at 1
    connection.execute(
        "INSERT OR IGNORE INTO sqlite_sequence (name, seq) VALUES ('transaction', 0)",
        (),
    )?;

    // Composite indexes used by the dashboard and account detail pages.
    connection.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_transaction_date_category
            ON \"transaction\"(date, category_id);
        CREATE INDEX IF NOT EXISTS idx_transaction_account ON \"transaction\"(account_id);",
    )?;

    Ok(())
}

/// Map a database row to a Transaction.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let kind_string: String = row.get(2)?;
    let kind_type = row.get_ref(2)?.data_type();
    let kind = TransactionKind::from_db_string(&kind_string)
        .map_err(|error| rusqlite::Error::FromSqlConversionFailure(2, kind_type, Box::new(error)))?;

    Ok(Transaction {
        id: row.get(0)?,
        amount: row.get(1)?,
        kind,
        date: row.get(3)?,
        description: row.get(4)?,
        notes: row.get(5)?,
        affects_balance: row.get(6)?,
        import_id: row.get(7)?,
        account_id: row.get(8)?,
        category_id: row.get(9)?,
    })
}

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
            // SQLite doesn't say which foreign key failed, so check whether
            // the account exists to pick the right error.
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
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error {
                code: _,
                extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
            },
            _,
        ) => Error::DuplicateImportId,
        error => error.into(),
    }
}
