//! Defines the endpoint for deleting a transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert, transaction::core::delete_transaction};

use super::core::TransactionId;

/// The state needed to delete a transaction.
#[derive(Debug, Clone)]
pub struct DeleteTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Deletes the transaction with `transaction_id` and removes its effect from
/// the owning account's balance.
///
/// Returns 200 OK on success so HTMX removes the table row.
pub async fn delete_transaction_endpoint(
    State(state): State<DeleteTransactionState>,
    Path(transaction_id): Path<TransactionId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_transaction(transaction_id, &connection) {
        Ok(()) => Alert::Success {
            message: "Transaction deleted".to_owned(),
            details: String::new(),
        }
        .into_markup()
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete transaction {transaction_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_transaction_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, AccountKind, create_account, get_account},
        db::initialize,
        transaction::{Transaction, TransactionKind, create_transaction, get_transaction},
    };

    use super::{DeleteTransactionState, delete_transaction_endpoint};

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn get_test_state() -> DeleteTransactionState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                kind: AccountKind::Checking,
                balance: 100.0,
            },
            &connection,
        )
        .unwrap();

        DeleteTransactionState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deletes_transaction_and_restores_balance() {
        let state = get_test_state();
        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            create_transaction(
                Transaction::build(30.0, TransactionKind::Expense, TODAY, "groceries", 1),
                TODAY,
                &connection,
            )
            .unwrap()
            .id
        };

        let response = delete_transaction_endpoint(State(state.clone()), Path(transaction_id)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_transaction(transaction_id, &connection),
            Err(Error::NotFound)
        );
        assert_eq!(get_account(1, &connection).unwrap().balance, 100.0);
    }

    #[tokio::test]
    async fn deleting_missing_transaction_returns_alert() {
        let state = get_test_state();

        let response = delete_transaction_endpoint(State(state), Path(42)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
