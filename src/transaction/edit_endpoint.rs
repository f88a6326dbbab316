//! Defines the endpoint for updating an existing transaction.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Must use axum_extra's Form since that parses an empty string as None instead
// of crashing like axum::Form.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    tag::process_tags,
    timezone::local_date_today,
    transaction::core::{TransactionId, apply_transaction_update},
};

use super::form::TransactionForm;

/// The state needed to update a transaction.
#[derive(Debug, Clone)]
pub struct EditTransactionState {
    /// The database connection for managing transactions.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for EditTransactionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A route handler for updating a transaction, redirects to the transactions
/// view on success.
///
/// The owning account's balance is adjusted for the change, including when
/// the transaction moves between accounts.
pub async fn update_transaction_endpoint(
    State(state): State<EditTransactionState>,
    Path(transaction_id): Path<TransactionId>,
    Form(form): Form<TransactionForm>,
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

    if let Err(error) = update_with_tags(transaction_id, &form, today, &connection) {
        tracing::error!("could not update transaction {transaction_id}: {error}");
        return error.into_alert_response();
    }

    (
        HxRedirect(endpoints::TRANSACTIONS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Apply the row update and replace its tags in one database transaction, so
/// a tag failure rolls back the update and the balance change.
fn update_with_tags(
    transaction_id: TransactionId,
    form: &TransactionForm,
    today: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let builder = form.to_builder();
    builder.validate(today)?;

    let sql_transaction = connection.unchecked_transaction()?;
    apply_transaction_update(transaction_id, builder, &sql_transaction)?;
    process_tags(&form.tags, transaction_id, &sql_transaction)?;
    sql_transaction.commit()?;

    Ok(())
}
