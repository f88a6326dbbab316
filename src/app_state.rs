//! Shared state handed to every route handler.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{
    Error, auth::cookie::DEFAULT_COOKIE_DURATION, db::initialize, pagination::PaginationConfig,
};

/// Everything the route handlers need: the database, the cookie signing key
/// and the display configuration.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The key used for signing and encrypting private cookies.
    pub cookie_key: Key,

    /// How long an auth cookie stays valid.
    pub cookie_duration: Duration,

    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Controls how large pages of data are and how page links are rendered.
    pub pagination_config: PaginationConfig,

    /// The database connection, shared between handlers.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the application state and set up the database schema on
    /// `db_connection`.
    ///
    /// `local_timezone` should be a valid, canonical timezone name, e.g. "Pacific/Auckland".
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

// Lets `PrivateCookieJar` get the key out of the application state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive a cookie signing key from a `secret` string.
///
/// The same secret always yields the same key, so cookies survive a server
/// restart as long as the secret does not change.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::pagination::PaginationConfig;

    use super::{AppState, create_cookie_key};

    #[test]
    fn same_secret_yields_same_cookie_key() {
        assert_eq!(
            create_cookie_key("opensesame").master(),
            create_cookie_key("opensesame").master()
        );
        assert_ne!(
            create_cookie_key("opensesame").master(),
            create_cookie_key("letmein").master()
        );
    }

    #[test]
    fn new_initializes_database_tables() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "42",
            "Pacific/Auckland",
            PaginationConfig::default(),
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'transaction'",
                [],
                |row| row.get(0),
            )
            .unwrap();

        assert_eq!(table_count, 1);
    }
}
