//! Delete a budget.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert};

use super::core::{BudgetId, delete_budget};

/// The state needed to delete a budget.
#[derive(Debug, Clone)]
pub struct DeleteBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Delete a budget. On success, responds with OK and an alert so HTMX can
/// remove the budget's card from the page.
pub async fn delete_budget_endpoint(
    State(state): State<DeleteBudgetState>,
    Path(budget_id): Path<BudgetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_budget(budget_id, &connection) {
        Ok(()) => Alert::Success {
            message: "Budget deleted".to_owned(),
            details: "The budget was successfully deleted.".to_owned(),
        }
        .into_markup()
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod delete_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;

    use crate::{
        budget::create_budget,
        category::{CategoryName, create_category},
        db::initialize,
    };

    use super::{DeleteBudgetState, delete_budget_endpoint};

    fn get_test_state() -> DeleteBudgetState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();
        create_budget(1, 120.0, 6, 2025, &connection).unwrap();

        DeleteBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn can_delete_budget() {
        let state = get_test_state();

        let response = delete_budget_endpoint(State(state.clone()), Path(1)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(1) FROM budget", (), |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn deleting_missing_budget_is_not_found() {
        let state = get_test_state();

        let response = delete_budget_endpoint(State(state), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
