//! Defines the endpoint for updating an account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{AppState, Error, account::core::AccountId, account::core::AccountKind, endpoints};

/// The state needed to edit an account.
#[derive(Debug, Clone)]
pub struct EditAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditAccountForm {
    name: String,
    kind: AccountKind,
    balance: f64,
}

pub async fn edit_account_endpoint(
    State(state): State<EditAccountState>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<EditAccountForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match update_account(account_id, &form, &connection) {
        Ok(row_affected) if row_affected != 0 => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Ok(_) => Error::UpdateMissingAccount.into_alert_response(),
        Err(error) => {
            tracing::error!("Could not update account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

type RowsAffected = usize;

/// Overwrite an account's name, kind and balance.
///
/// Manually editing the balance shifts the recorded starting balance by the
/// same amount, so the audit invariant (balance = initial balance + signed
/// transaction effects) keeps holding afterwards.
fn update_account(
    id: AccountId,
    account: &EditAccountForm,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "UPDATE account
            SET name = ?1,
                kind = ?2,
                initial_balance = initial_balance + (?3 - balance),
                balance = ?3
            WHERE id = ?4;",
            params![account.name, account.kind.as_str(), account.balance, id],
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(account.name.clone())
            }
            error => error.into(),
        })
}
