//! Defines the route handler for deleting a recurring rule.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert};

use super::core::{RecurringRuleId, delete_recurring_rule};

/// The state needed to delete a recurring rule.
#[derive(Debug, Clone)]
pub struct DeleteRuleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteRuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a recurring rule. Transactions the rule already created are kept.
///
/// On success, responds with OK and an alert so HTMX can remove the rule's
/// table row.
pub async fn delete_recurring_endpoint(
    State(state): State<DeleteRuleState>,
    Path(rule_id): Path<RecurringRuleId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_recurring_rule(rule_id, &connection) {
        Ok(()) => Alert::Success {
            message: "Recurring rule deleted".to_owned(),
            details: "Transactions created by the rule have been kept.".to_owned(),
        }
        .into_markup()
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete recurring rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_recurring_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        recurring::{
            core::{Interval, RecurringRuleDraft, create_recurring_rule},
            engine::process_due_rules,
        },
        transaction::TransactionKind,
    };

    use super::{DeleteRuleState, delete_recurring_endpoint};

    fn get_test_state() -> DeleteRuleState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 0.0, 0.0)",
                (),
            )
            .unwrap();

        create_recurring_rule(
            RecurringRuleDraft {
                amount: 500.0,
                kind: TransactionKind::Expense,
                interval: Interval::Monthly,
                description: "Rent".to_owned(),
                start_date: date!(2025 - 06 - 01),
                account_id: 1,
                category_id: None,
            },
            &connection,
        )
        .unwrap();

        DeleteRuleState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn deleting_rule_keeps_generated_transactions() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            process_due_rules(date!(2025 - 06 - 15), &connection).unwrap();
        }

        let response = delete_recurring_endpoint(State(state.clone()), Path(1)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        let rule_count: i64 = connection
            .query_row("SELECT COUNT(1) FROM recurring_rule", (), |row| row.get(0))
            .unwrap();
        assert_eq!(rule_count, 0);
        let transaction_count: i64 = connection
            .query_row("SELECT COUNT(1) FROM \"transaction\"", (), |row| row.get(0))
            .unwrap();
        assert_eq!(transaction_count, 1);
    }

    #[tokio::test]
    async fn deleting_missing_rule_is_not_found() {
        let state = get_test_state();

        let response = delete_recurring_endpoint(State(state), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
