//! Defines the route handler for updating a recurring rule.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form parses an empty category string as None, axum's does not.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, endpoints};

use super::{
    core::{RecurringRuleId, update_recurring_rule},
    form::RecurringRuleForm,
};

/// The state needed to update a recurring rule.
#[derive(Debug, Clone)]
pub struct EditRuleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditRuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Update a recurring rule from form data and redirect to the rules page.
pub async fn update_recurring_endpoint(
    State(state): State<EditRuleState>,
    Path(rule_id): Path<RecurringRuleId>,
    Form(form): Form<RecurringRuleForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_recurring_rule(rule_id, form.to_draft(), &connection) {
        Ok(_) => (
            HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update recurring rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod update_recurring_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{Path, State},
        http::StatusCode,
    };
    use axum_extra::extract::Form;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        recurring::{
            core::{Interval, RecurringRuleDraft, create_recurring_rule, get_recurring_rule},
            form::RecurringRuleForm,
        },
        transaction::TransactionKind,
    };

    use super::{EditRuleState, update_recurring_endpoint};

    fn get_test_state() -> EditRuleState {
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
                start_date: date!(2025 - 07 - 01),
                account_id: 1,
                category_id: None,
            },
            &connection,
        )
        .unwrap();

        EditRuleState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    fn test_form() -> RecurringRuleForm {
        RecurringRuleForm {
            amount: 550.0,
            kind: TransactionKind::Expense,
            interval: Interval::Monthly,
            description: "Rent".to_owned(),
            start_date: date!(2025 - 07 - 01),
            account_id: 1,
            category_id: None,
        }
    }

    #[tokio::test]
    async fn can_update_rule() {
        let state = get_test_state();

        let response =
            update_recurring_endpoint(State(state.clone()), Path(1), Form(test_form())).await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let rule = get_recurring_rule(1, &connection).unwrap();
        assert_eq!(rule.amount, 550.0);
    }

    #[tokio::test]
    async fn updating_missing_rule_is_not_found() {
        let state = get_test_state();

        let response = update_recurring_endpoint(State(state), Path(999), Form(test_form())).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
