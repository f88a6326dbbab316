//! The endpoint for deleting categories.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{AppState, Error, alert::Alert};

use super::core::{CategoryId, delete_category};

/// The state needed to delete a category.
#[derive(Debug, Clone)]
pub struct DeleteCategoryState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteCategoryState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Deletes the category with `category_id`.
///
/// Returns 200 OK on success so HTMX removes the table row. Transactions in
/// the category are left uncategorized rather than deleted.
pub async fn delete_category_endpoint(
    State(state): State<DeleteCategoryState>,
    Path(category_id): Path<CategoryId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_category(category_id, &connection) {
        Ok(()) => Alert::Success {
            message: "Category deleted".to_owned(),
            details: String::new(),
        }
        .into_markup()
        .into_response(),
        Err(error) => {
            tracing::error!("could not delete category {category_id}: {error}");
            error.into_alert_response()
        }
    }
}
