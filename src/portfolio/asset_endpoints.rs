//! Route handlers for creating, updating, and deleting assets.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert, endpoints};

use super::{
    asset_form::AssetForm,
    core::{AssetId, create_asset, delete_asset, update_asset},
};

/// The state needed to create, update, or delete an asset.
#[derive(Debug, Clone)]
pub struct AssetEndpointState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AssetEndpointState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Create an asset from form data and redirect to the portfolio page.
pub async fn create_asset_endpoint(
    State(state): State<AssetEndpointState>,
    Form(form): Form<AssetForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_asset(form.to_draft(), &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PORTFOLIO_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create asset: {error}");
            error.into_alert_response()
        }
    }
}

/// Update an asset from form data and redirect to the portfolio page.
pub async fn update_asset_endpoint(
    State(state): State<AssetEndpointState>,
    Path(asset_id): Path<AssetId>,
    Form(form): Form<AssetForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_asset(asset_id, form.to_draft(), &connection) {
        Ok(_) => (
            HxRedirect(endpoints::PORTFOLIO_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not update asset {asset_id}: {error}");
            error.into_alert_response()
        }
    }
}

/// Delete an asset and its holdings. On success, responds with OK and an
/// alert so HTMX can remove the asset's card.
pub async fn delete_asset_endpoint(
    State(state): State<AssetEndpointState>,
    Path(asset_id): Path<AssetId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_asset(asset_id, &connection) {
        Ok(()) => Alert::Success {
            message: "Asset deleted".to_owned(),
            details: "The asset and its holdings were deleted.".to_owned(),
        }
        .into_markup()
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete asset {asset_id}: {error}");
            error.into_alert_response()
        }
    }
}
