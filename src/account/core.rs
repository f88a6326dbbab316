use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

pub type AccountId = i64;

/// The kind of account, mirroring the choices on the account form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Checking,
    Savings,
    CreditCard,
    Cash,
    Investment,
}

impl AccountKind {
    /// The string stored in the database and used as the form option value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Checking => "checking",
            Self::Savings => "savings",
            Self::CreditCard => "credit_card",
            Self::Cash => "cash",
            Self::Investment => "investment",
        }
    }

    /// The human readable name shown in tables and forms.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Checking => "Checking",
            Self::Savings => "Savings",
            Self::CreditCard => "Credit Card",
            Self::Cash => "Cash",
            Self::Investment => "Investment",
        }
    }

    /// All kinds, in the order they appear in form dropdowns.
    pub fn all() -> [AccountKind; 5] {
        [
            Self::Checking,
            Self::Savings,
            Self::CreditCard,
            Self::Cash,
            Self::Investment,
        ]
    }

    fn from_db_string(kind: &str) -> Result<Self, rusqlite::Error> {
        match kind {
            "checking" => Ok(Self::Checking),
            "savings" => Ok(Self::Savings),
            "credit_card" => Ok(Self::CreditCard),
            "cash" => Ok(Self::Cash),
            "investment" => Ok(Self::Investment),
            _ => Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                rusqlite::types::Type::Text,
                format!("unknown account kind: {kind}").into(),
            )),
        }
    }
}

/// A bank account, credit card or cash pot and its current balance.
///
/// The balance is maintained incrementally: every transaction mutation
/// applies its signed effect to the owning account, and the original balance
/// entered at creation time is kept so the running balance can be audited
/// against the transaction history.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// The id for the account.
    pub id: AccountId,
    /// The name of the account.
    pub name: String,
    /// The kind of account.
    pub kind: AccountKind,
    /// The running balance.
    pub balance: f64,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            kind TEXT NOT NULL,
            initial_balance REAL NOT NULL,
            balance REAL NOT NULL
        )",
        (),
    )?;

    Ok(())
}

pub fn map_row_to_account(row: &rusqlite::Row) -> Result<Account, rusqlite::Error> {
    let id = row.get(0)?;
    let name = row.get(1)?;
    let kind: String = row.get(2)?;
    let balance = row.get(3)?;

    Ok(Account {
        id,
        name,
        kind: AccountKind::from_db_string(&kind)?,
        balance,
    })
}

/// Retrieve an account by its ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no account with the given ID.
pub fn get_account(id: AccountId, connection: &Connection) -> Result<Account, Error> {
    connection
        .query_one(
            "SELECT id, name, kind, balance FROM account WHERE id = ?1",
            [id],
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// All accounts, ordered by name.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn get_all_accounts(connection: &Connection) -> Result<Vec<Account>, Error> {
    connection
        .prepare("SELECT id, name, kind, balance FROM account ORDER BY name ASC")?
        .query_map([], map_row_to_account)?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}

/// Get the total balance across all accounts.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn get_total_account_balance(connection: &Connection) -> Result<f64, Error> {
    let mut stmt = connection.prepare("SELECT COALESCE(SUM(balance), 0) FROM account")?;

    let total: f64 = stmt.query_row([], |row| row.get(0))?;

    Ok(total)
}

/// Recompute an account's balance from first principles.
///
/// The result is the balance the account should have: the balance entered at
/// creation time plus the signed effect of every balance-affecting
/// transaction attributed to the account. The running balance column is
/// expected to always equal this value; tests and maintenance tasks use this
/// query to verify that.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no account with the given ID.
pub fn reconciled_balance(id: AccountId, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_one(
            "SELECT account.initial_balance + COALESCE(SUM(
                CASE
                    WHEN \"transaction\".affects_balance = 0 THEN 0.0
                    WHEN \"transaction\".kind = 'income' THEN \"transaction\".amount
                    ELSE -\"transaction\".amount
                END), 0.0)
            FROM account
            LEFT JOIN \"transaction\" ON \"transaction\".account_id = account.id
            WHERE account.id = ?1
            GROUP BY account.id",
            [id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// The number of transactions attributed to an account.
///
/// Used to refuse deleting accounts that still have transactions.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn count_account_transactions(id: AccountId, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(id) FROM \"transaction\" WHERE account_id = ?1",
            [id],
            |row| row.get(0),
        )
        .map_err(Error::from)
}

#[cfg(test)]
mod create_table_tests {
    use rusqlite::Connection;

    use super::create_account_table;

    #[test]
    fn sql_is_valid() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");

        assert_eq!(Ok(()), create_account_table(&connection));
    }
}
