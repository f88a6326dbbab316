//! Route handlers for creating and deleting holdings.

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
use time::Date;

use crate::{AppState, Error, alert::Alert, endpoints};

use super::core::{AssetId, HoldingId, create_holding, delete_holding};

/// The state needed to create or delete a holding.
#[derive(Debug, Clone)]
pub struct HoldingEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for HoldingEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a holding.
#[derive(Debug, Deserialize)]
pub struct HoldingForm {
    pub asset_id: AssetId,
    pub quantity: f64,
    /// The price per unit paid at purchase.
    pub purchase_price: f64,
    pub purchase_date: Date,
}

/// Create a holding from form data and redirect to the portfolio page.
pub async fn create_holding_endpoint(
    State(state): State<HoldingEndpointState>,
    Form(form): Form<HoldingForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_holding(
        form.asset_id,
        form.quantity,
        form.purchase_price,
        form.purchase_date,
        &connection,
    ) {
        Ok(_) => (
            HxRedirect(endpoints::PORTFOLIO_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create holding: {error}");
            error.into_alert_response()
        }
    }
}

/// Delete a holding. On success, responds with OK and an alert so HTMX can
/// remove the holding's table row.
pub async fn delete_holding_endpoint(
    State(state): State<HoldingEndpointState>,
    Path(holding_id): Path<HoldingId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_holding(holding_id, &connection) {
        Ok(()) => Alert::Success {
            message: "Holding deleted".to_owned(),
            details: String::new(),
        }
        .into_markup()
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete holding {holding_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod holding_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        db::initialize,
        portfolio::core::{AssetDraft, AssetType, create_asset, create_holding},
    };

    use super::{
        HoldingEndpointState, HoldingForm, create_holding_endpoint, delete_holding_endpoint,
    };

    fn get_test_state() -> HoldingEndpointState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        create_asset(
            AssetDraft {
                name: "Vanguard S&P 500 ETF".to_owned(),
                ticker: "VOO".to_owned(),
                asset_type: AssetType::Etf,
                latest_price: 550.0,
                price_updated: date!(2025 - 06 - 01),
            },
            &connection,
        )
        .unwrap();

        HoldingEndpointState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn can_create_holding() {
        let state = get_test_state();

        let response = create_holding_endpoint(
            State(state.clone()),
            Form(HoldingForm {
                asset_id: 1,
                quantity: 2.0,
                purchase_price: 500.0,
                purchase_date: date!(2025 - 01 - 15),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let connection = state.db_connection.lock().unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(1) FROM holding", (), |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn holding_for_missing_asset_is_rejected() {
        let state = get_test_state();

        let response = create_holding_endpoint(
            State(state),
            Form(HoldingForm {
                asset_id: 999,
                quantity: 2.0,
                purchase_price: 500.0,
                purchase_date: date!(2025 - 01 - 15),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn can_delete_holding() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_holding(1, 2.0, 500.0, date!(2025 - 01 - 15), &connection).unwrap();
        }

        let response = delete_holding_endpoint(State(state.clone()), Path(1)).await;

        assert_eq!(response.status(), StatusCode::OK);

        let connection = state.db_connection.lock().unwrap();
        let count: i64 = connection
            .query_row("SELECT COUNT(1) FROM holding", (), |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn deleting_missing_holding_is_not_found() {
        let state = get_test_state();

        let response = delete_holding_endpoint(State(state), Path(999)).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
