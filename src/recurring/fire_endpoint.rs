//! Defines the route handler for firing a recurring rule immediately.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, endpoints, timezone::local_date_today};

use super::{core::RecurringRuleId, engine::fire_rule};

/// The state needed to fire a recurring rule.
#[derive(Debug, Clone)]
pub struct FireRuleState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for FireRuleState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Fire a recurring rule once, creating a transaction dated today, then
/// redirect to the rules page so the updated schedule is shown.
pub async fn fire_recurring_endpoint(
    State(state): State<FireRuleState>,
    Path(rule_id): Path<RecurringRuleId>,
) -> Response {
    let Some(today) = local_date_today(&state.local_timezone) else {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        return Error::InvalidTimezoneError(state.local_timezone).into_alert_response();
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match fire_rule(rule_id, today, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::RECURRING_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not fire recurring rule {rule_id}: {error}");
            error.into_alert_response()
        }
    }
}
