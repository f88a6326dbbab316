//! Update a budget's spending limit.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, endpoints};

use super::core::{BudgetId, update_budget};

/// The state needed to update a budget.
#[derive(Debug, Clone)]
pub struct EditBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for updating a budget's limit.
#[derive(Debug, Deserialize)]
pub struct EditBudgetForm {
    pub amount: f64,
}

/// Update a budget's limit and redirect to the budgets page.
pub async fn update_budget_endpoint(
    State(state): State<EditBudgetState>,
    Path(budget_id): Path<BudgetId>,
    Form(form): Form<EditBudgetForm>,
) -> Response {
    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Error::InvalidAmount(form.amount).into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_budget(budget_id, form.amount, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update budget {budget_id}: {error}");
            error.into_alert_response()
        }
    }
}
