//! Defines the route handler for creating a recurring rule.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// axum_extra's Form parses an empty category string as None, axum's does not.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, endpoints};

use super::{core::create_recurring_rule, form::RecurringRuleForm};

/// The state needed to create a recurring rule.
#[derive(Debug, Clone)]
pub struct CreateRuleState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create a recurring rule from form data and redirect to the rules page.
pub async fn create_recurring_endpoint(
    State(state): State<CreateRuleState>,
    Form(form): Form<RecurringRuleForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_recurring_rule(form.to_draft(), &connection) {
        Ok(_) => (
            HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create recurring rule: {error}");
            error.into_alert_response()
        }
    }
}
