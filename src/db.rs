//! Database initialization.

use rusqlite::{Connection, Transaction as SqlTransaction};

use crate::{
    account::create_account_table, budget::create_budget_table, category::create_category_table,
    portfolio::create_portfolio_tables, recurring::create_recurring_rule_table,
    tag::create_tag_tables, transaction::create_transaction_table, user::create_user_table,
};

/// Create the application's tables if they do not exist.
///
/// All tables are created in a single exclusive transaction so that a
/// half-initialized database is never left behind.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.pragma_update(None, "foreign_keys", true)?;

    let transaction =
        SqlTransaction::new_unchecked(connection, rusqlite::TransactionBehavior::Exclusive)?;

    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_category_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_tag_tables(&transaction)?;
    create_budget_table(&transaction)?;
    create_recurring_rule_table(&transaction)?;
    create_portfolio_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}
