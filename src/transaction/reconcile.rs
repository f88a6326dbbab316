//! Keeps account balances in step with their transactions.
//!
//! A transaction's signed effect on its account is `+amount` for income,
//! `-amount` for an expense, and zero when it does not affect the balance.
//! Inserting adds the effect, deleting removes it, and updating removes the
//! old effect before adding the new one. Each mutation and its balance
//! adjustment run in one database transaction, so the invariant
//! `balance = initial_balance + sum of signed effects` holds at every commit.

use rusqlite::Connection;

use crate::{Error, account::AccountId};

use super::core::TransactionKind;

/// The signed amount a transaction contributes to its account's balance.
pub fn signed_effect(kind: TransactionKind, amount: f64, affects_balance: bool) -> f64 {
    if !affects_balance {
        return 0.0;
    }

    match kind {
        TransactionKind::Income => amount,
        TransactionKind::Expense => -amount,
    }
}

/// Add `delta` to the balance of the account with `account_id`.
///
/// Must be called inside the same database transaction as the row change the
/// delta derives from.
pub(crate) fn apply_balance_delta(
    account_id: AccountId,
    delta: f64,
    connection: &Connection,
) -> Result<(), Error> {
    if delta == 0.0 {
        return Ok(());
    }

    let rows_affected = connection.execute(
        "UPDATE account SET balance = balance + ?1 WHERE id = ?2",
        (delta, account_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::InvalidAccount(Some(account_id)));
    }

    Ok(())
}


#[cfg(test)]
mod reconciliation_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        account::{AccountForm, AccountKind, create_account, get_account, reconciled_balance},
        db::initialize,
        transaction::{
            Transaction, TransactionBuilder, TransactionKind, create_transaction,
            delete_transaction, update_transaction,
        },
    };

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    fn create_test_account(name: &str, balance: f64, connection: &Connection) -> i64 {
        create_account(
            &AccountForm {
                name: name.to_owned(),
                kind: AccountKind::Checking,
                balance,
            },
            connection,
        )
        .expect("Could not create test account")
        .id
    }

    fn assert_balance(account_id: i64, want: f64, connection: &Connection) {
        let account = get_account(account_id, connection).unwrap();
        assert_eq!(
            account.balance, want,
            "want balance {want}, got {}",
            account.balance
        );
        assert_eq!(
            reconciled_balance(account_id, connection).unwrap(),
            account.balance,
            "stored balance does not match the reconciled balance"
        );
    }

    #[test]
    fn balance_follows_inserts_updates_and_deletes() {
        let connection = get_test_connection();
        let account_id = create_test_account("Everyday", 100.0, &connection);

        let income = create_transaction(
            Transaction::build(50.0, TransactionKind::Income, TODAY, "pay", account_id),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 150.0, &connection);

        let expense = create_transaction(
            Transaction::build(
                30.0,
                TransactionKind::Expense,
                TODAY,
                "groceries",
                account_id,
            ),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 120.0, &connection);

        delete_transaction(expense.id, &connection).unwrap();
        assert_balance(account_id, 150.0, &connection);

        update_transaction(
            income.id,
            TransactionBuilder {
                amount: 20.0,
                ..Transaction::build(50.0, TransactionKind::Income, TODAY, "pay", account_id)
            },
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 120.0, &connection);
    }

    #[test]
    fn moving_a_transaction_between_accounts_moves_its_effect() {
        let connection = get_test_connection();
        let account_a = create_test_account("Everyday", 100.0, &connection);
        let account_b = create_test_account("Savings", 200.0, &connection);

        let expense = create_transaction(
            Transaction::build(25.0, TransactionKind::Expense, TODAY, "fuel", account_a),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_a, 75.0, &connection);
        assert_balance(account_b, 200.0, &connection);

        update_transaction(
            expense.id,
            Transaction::build(25.0, TransactionKind::Expense, TODAY, "fuel", account_b),
            TODAY,
            &connection,
        )
        .unwrap();

        assert_balance(account_a, 100.0, &connection);
        assert_balance(account_b, 175.0, &connection);
    }

    #[test]
    fn toggling_affects_balance_adds_and_removes_the_effect() {
        let connection = get_test_connection();
        let account_id = create_test_account("Everyday", 100.0, &connection);

        let expense = create_transaction(
            Transaction::build(40.0, TransactionKind::Expense, TODAY, "lunch", account_id)
                .affects_balance(false),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 100.0, &connection);

        update_transaction(
            expense.id,
            Transaction::build(40.0, TransactionKind::Expense, TODAY, "lunch", account_id)
                .affects_balance(true),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 60.0, &connection);

        update_transaction(
            expense.id,
            Transaction::build(40.0, TransactionKind::Expense, TODAY, "lunch", account_id)
                .affects_balance(false),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 100.0, &connection);
    }

    #[test]
    fn changing_kind_flips_the_effect() {
        let connection = get_test_connection();
        let account_id = create_test_account("Everyday", 100.0, &connection);

        let transaction = create_transaction(
            Transaction::build(10.0, TransactionKind::Expense, TODAY, "refund", account_id),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 90.0, &connection);

        update_transaction(
            transaction.id,
            Transaction::build(10.0, TransactionKind::Income, TODAY, "refund", account_id),
            TODAY,
            &connection,
        )
        .unwrap();
        assert_balance(account_id, 110.0, &connection);
    }
}
