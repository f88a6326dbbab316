//! Tally is a web app for tracking your personal finances: accounts,
//! transactions, budgets, recurring payments and a simple investment
//! portfolio.
//!
//! This library provides a REST API that directly serves HTML pages.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use time::Date;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod budget;
mod category;
mod csv_export;
mod csv_import;
mod dashboard;
mod db;
mod endpoints;
mod forgot_password;
mod html;
mod internal_server_error;
mod log_in;
mod log_out;
mod logging;
mod navigation;
mod not_found;
mod pagination;
mod password;
mod portfolio;
mod recurring;
mod register_user;
mod routing;
mod shared_templates;
mod tag;
mod timezone;
mod transaction;
mod user;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use db::initialize as initialize_db;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use password::{PasswordHash, ValidatedPassword};
pub use recurring::process_due_rules;
pub use routing::build_router;
pub use timezone::local_date_today;
pub use user::{User, UserID, create_user, get_user_by_id, set_user_password};

use crate::{
    account::AccountId,
    alert::AlertView,
    category::CategoryId,
    internal_server_error::{InternalServerErrorPageTemplate, render_internal_server_error},
    not_found::get_404_not_found_response,
    shared_templates::render,
};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Either the user ID or expiry cookie is missing from the cookie jar in
    /// the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// There was an error parsing the date in the cookie or creating the new
    /// expiry date time.
    ///
    /// Callers should pass in the original error as a string and the date
    /// string that caused the error.
    #[error("could not format expiry cookie date-time string \"{1}\": {0}")]
    InvalidDateFormat(String, String),

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    /// When communicating with the application client this error should be
    /// replaced with a general error type indicating an internal server error.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// Registration was attempted after a user had already been created.
    ///
    /// Tally is a single-household app, so registration closes once the
    /// first user exists. Further users must be created by resetting the
    /// database.
    #[error("a user already exists, registration is closed")]
    RegistrationClosed,

    /// A transaction amount was zero, negative, or not a finite number.
    ///
    /// Amounts are stored as positive numbers; whether they add to or
    /// subtract from an account is determined by the transaction kind.
    #[error("{0} is not a valid amount, amounts must be positive numbers")]
    InvalidAmount(f64),

    /// A date in the future was used to create a transaction.
    ///
    /// Transactions record events that have already happened, therefore future
    /// dates are not allowed.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// The account ID used to create or edit a transaction did not match a
    /// valid account.
    #[error("the account ID does not refer to a valid account")]
    InvalidAccount(Option<AccountId>),

    /// The category ID used to create or edit a record did not match a valid
    /// category.
    #[error("the category ID does not refer to a valid category")]
    InvalidCategory(Option<CategoryId>),

    /// An empty string was used to create a category name.
    #[error("Category name cannot be empty")]
    EmptyCategoryName,

    /// The specified category name already exists in the database.
    ///
    /// Category names are compared case-insensitively, so "Groceries" and
    /// "groceries" are the same category.
    #[error("the category \"{0}\" already exists in the database")]
    DuplicateCategoryName(String),

    /// The specified account name already exists in the database.
    #[error("the account \"{0}\" already exists in the database")]
    DuplicateAccountName(String),

    /// A budget for the same category, month and year already exists.
    #[error("a budget for this category and month already exists")]
    DuplicateBudget,

    /// The specified ticker symbol already exists in the database.
    #[error("the asset \"{0}\" already exists in the database")]
    DuplicateTicker(String),

    /// Tried to delete an account that still has transactions attributed to
    /// it. Deleting such an account would orphan its transactions and break
    /// the balance audit trail.
    #[error("cannot delete an account that has transactions")]
    AccountHasTransactions,

    /// The specified import ID already exists in the database.
    ///
    /// When importing transactions from a CSV file, an import ID is used to
    /// uniquely identify each transaction. Rejecting duplicate import IDs
    /// avoids importing the same transaction multiple times, which is likely
    /// to happen if the user imports CSV files that overlap in time.
    #[error("the import ID already exists in the database")]
    DuplicateImportId,

    /// The multipart form could not be parsed as a list of CSV files.
    #[error("Could not parse multipart form: {0}")]
    MultipartError(String),

    /// The multipart form did not contain a CSV file.
    #[error("File is not a CSV")]
    NotCSV,

    /// The CSV had issues that prevented it from being parsed.
    #[error("Could not parse the CSV file: {0}")]
    InvalidCSV(String),

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// Tried to delete a transaction that does not exist
    #[error("tried to delete a transaction that is not in the database")]
    DeleteMissingTransaction,

    /// Tried to update a transaction that does not exist
    #[error("tried to update a transaction that is not in the database")]
    UpdateMissingTransaction,

    /// Tried to delete an account that does not exist
    #[error("tried to delete an account that is not in the database")]
    DeleteMissingAccount,

    /// Tried to update an account that does not exist
    #[error("tried to update an account that is not in the database")]
    UpdateMissingAccount,

    /// Tried to delete a category that does not exist
    #[error("tried to delete a category that is not in the database")]
    DeleteMissingCategory,

    /// Tried to update a budget that does not exist
    #[error("tried to update a budget that is not in the database")]
    UpdateMissingBudget,

    /// Tried to delete a budget that does not exist
    #[error("tried to delete a budget that is not in the database")]
    DeleteMissingBudget,

    /// Tried to update a recurring rule that does not exist
    #[error("tried to update a recurring rule that is not in the database")]
    UpdateMissingRule,

    /// Tried to delete a recurring rule that does not exist
    #[error("tried to delete a recurring rule that is not in the database")]
    DeleteMissingRule,

    /// Tried to update an asset that does not exist
    #[error("tried to update an asset that is not in the database")]
    UpdateMissingAsset,

    /// Tried to delete an asset that does not exist
    #[error("tried to delete an asset that is not in the database")]
    DeleteMissingAsset,

    /// Tried to delete a holding that does not exist
    #[error("tried to delete a holding that is not in the database")]
    DeleteMissingHolding,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            // Code 2067 occurs when a UNIQUE constraint failed.
            rusqlite::Error::SqliteFailure(sql_error, Some(ref desc))
                if sql_error.extended_code == 2067 && desc.ends_with("transaction.import_id") =>
            {
                Error::DuplicateImportId
            }
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => get_404_not_found_response(),
            Error::InvalidTimezoneError(timezone) => {
                render_internal_server_error(InternalServerErrorPageTemplate {
                    description: "Invalid Timezone Settings",
                    fix: &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                })
            }
            Error::DatabaseLockError => render_internal_server_error(Default::default()),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                render_internal_server_error(Default::default())
            }
        }
    }
}

impl Error {
    fn into_alert_response(self) -> Response {
        match self {
            Error::NotFound => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Not Found",
                    "The requested item could not be found. \
                    Try refreshing the page to see if it has been deleted.",
                ),
            ),
            Error::InvalidTimezoneError(timezone) => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertView::error(
                    "Invalid Timezone Settings",
                    &format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to a valid, canonical timezone string"
                    ),
                ),
            ),
            Error::FutureDate(date) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Invalid transaction date",
                    &format!("{date} is a date in the future, which is not allowed."),
                ),
            ),
            Error::InvalidAmount(amount) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Invalid amount",
                    &format!("{amount} is not a valid amount. Enter a positive number."),
                ),
            ),
            Error::InvalidAccount(account_id) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Invalid account ID",
                    &format!("Could not find an account with the ID {account_id:?}"),
                ),
            ),
            Error::InvalidCategory(category_id) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Invalid category ID",
                    &format!("Could not find a category with the ID {category_id:?}"),
                ),
            ),
            Error::AccountHasTransactions => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Could not delete account",
                    "The account still has transactions. \
                    Delete or reassign its transactions first.",
                ),
            ),
            Error::DuplicateBudget => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Duplicate Budget",
                    "A budget for this category and month already exists. \
                    Edit the existing budget instead.",
                ),
            ),
            Error::UpdateMissingTransaction => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not update transaction",
                    "The transaction could not be found.",
                ),
            ),
            Error::DeleteMissingTransaction => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete transaction",
                    "The transaction could not be found. \
                    Try refreshing the page to see if the transaction has already been deleted.",
                ),
            ),
            Error::UpdateMissingAccount => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not update account",
                    "The account could not be found.",
                ),
            ),
            Error::DeleteMissingAccount => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete account",
                    "The account could not be found. \
                    Try refreshing the page to see if the account has already been deleted.",
                ),
            ),
            Error::DeleteMissingCategory => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete category",
                    "The category could not be found. \
                    Try refreshing the page to see if the category has already been deleted.",
                ),
            ),
            Error::UpdateMissingBudget => render(
                StatusCode::NOT_FOUND,
                AlertView::error("Could not update budget", "The budget could not be found."),
            ),
            Error::DeleteMissingBudget => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete budget",
                    "The budget could not be found. \
                    Try refreshing the page to see if the budget has already been deleted.",
                ),
            ),
            Error::UpdateMissingRule => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not update recurring rule",
                    "The recurring rule could not be found.",
                ),
            ),
            Error::DeleteMissingRule => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete recurring rule",
                    "The recurring rule could not be found. \
                    Try refreshing the page to see if the rule has already been deleted.",
                ),
            ),
            Error::UpdateMissingAsset => render(
                StatusCode::NOT_FOUND,
                AlertView::error("Could not update asset", "The asset could not be found."),
            ),
            Error::DeleteMissingAsset => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete asset",
                    "The asset could not be found. \
                    Try refreshing the page to see if the asset has already been deleted.",
                ),
            ),
            Error::DeleteMissingHolding => render(
                StatusCode::NOT_FOUND,
                AlertView::error(
                    "Could not delete holding",
                    "The holding could not be found. \
                    Try refreshing the page to see if the holding has already been deleted.",
                ),
            ),
            Error::DuplicateAccountName(name) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Duplicate Account Name",
                    &format!(
                        "The account {name} already exists in the database. \
                        Choose a different account name, or edit or delete the existing account.",
                    ),
                ),
            ),
            Error::InvalidDateFormat(reason, date_string) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Invalid Date",
                    &format!("\"{date_string}\" is not a valid date: {reason}."),
                ),
            ),
            Error::EmptyCategoryName => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Invalid Category Name",
                    "The category name cannot be empty.",
                ),
            ),
            Error::DuplicateCategoryName(name) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Duplicate Category Name",
                    &format!(
                        "The category {name} already exists in the database. \
                        Choose a different category name.",
                    ),
                ),
            ),
            Error::DuplicateTicker(ticker) => render(
                StatusCode::BAD_REQUEST,
                AlertView::error(
                    "Duplicate Ticker Symbol",
                    &format!(
                        "The asset {ticker} already exists in the database. \
                        Edit the existing asset instead.",
                    ),
                ),
            ),
            _ => render(
                StatusCode::INTERNAL_SERVER_ERROR,
                AlertView::error(
                    "Something went wrong",
                    "An unexpected error occurred, check the server logs for more details.",
                ),
            ),
        }
    }
}
