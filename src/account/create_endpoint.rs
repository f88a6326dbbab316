//! Defines the endpoint for creating a new account.
use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_htmx::HxRedirect;
use rusqlite::{Connection, params};
use serde::Deserialize;

use crate::{
    AppState, Error,
    account::core::{Account, AccountKind},
    alert::AlertView,
    endpoints,
    shared_templates::render,
};

/// The state needed to create an account.
#[derive(Debug, Clone)]
pub struct CreateAccountState {
    /// The database connection for managing accounts.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateAccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    /// The account name.
    pub name: String,
    /// The kind of account.
    pub kind: AccountKind,
    /// The starting balance in dollars.
    pub balance: f64,
}

/// A route handler for creating a new account, redirects to accounts view on success.
pub async fn create_account_endpoint(
    State(state): State<CreateAccountState>,
    Form(form): Form<AccountForm>,
) -> impl IntoResponse {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(&form, &connection) {
        Ok(_) => {}
        Err(Error::DuplicateAccountName(name)) => {
            return render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Duplicate Account Name",
                    &format!(
                        "The account {name} already exists in the database. \
                        Choose a different account name, or edit or delete the existing account.",
                    ),
                ),
            );
        }
        Err(error) => {
            tracing::error!(
                "Could not create account with {form:?}, got an unexpected error: {error}"
            );
            return error.into_alert_response();
        }
    }

    (
        HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

pub fn create_account(form: &AccountForm, connection: &Connection) -> Result<Account, Error> {
    connection
        .execute(
            "INSERT INTO account (name, kind, initial_balance, balance) VALUES (?1, ?2, ?3, ?3)",
            params![form.name, form.kind.as_str(), form.balance],
        )
        .map_err(|error| match error {
            // Handle unique account name constraint violation
            rusqlite::Error::SqliteFailure(error, Some(_)) if error.extended_code == 2067 => {
                Error::DuplicateAccountName(form.name.clone())
            }
            error => error.into(),
        })?;

    let id = connection.last_insert_rowid();

    Ok(Account {
        id,
        name: form.name.clone(),
        kind: form.kind,
        balance: form.balance,
    })
}
