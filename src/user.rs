//! The user model and its database functions.
//!
//! The application is single-household: the first registered user owns the
//! database and registration is closed once a user row exists.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, password::PasswordHash};

/// The ID for a [User].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    ///
    /// The caller should ensure that `id` refers to a user that exists in the
    /// application database.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// The integer form of the ID, for use in SQL queries.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

/// A registered user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    id: UserID,
    email: String,
    password_hash: PasswordHash,
}

impl User {
    /// The user's ID.
    pub fn id(&self) -> UserID {
        self.id
    }

    /// The email address the user logs in with.
    pub fn email(&self) -> &str {
        &self.email
    }

    /// The user's salted and hashed password.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }
}

/// Create the user table in the database.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

/// Add a user to the database.
///
/// # Errors
///
/// Returns [Error::RegistrationClosed] if a user already exists, or
/// [Error::SqlError] if there is an unexpected SQL error.
pub fn create_user(
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    if count_users(connection)? > 0 {
        return Err(Error::RegistrationClosed);
    }

    connection.execute(
        "INSERT INTO user (email, password) VALUES (?1, ?2)",
        (email, password_hash.as_ref()),
    )?;

    let id = connection.last_insert_rowid();

    Ok(User {
        id: UserID::new(id),
        email: email.to_string(),
        password_hash,
    })
}

/// Retrieve a user from the database by their ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no user with the given ID.
pub fn get_user_by_id(id: UserID, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, email, password FROM user WHERE id = ?1")?
        .query_row([id.as_i64()], map_user_row)?;

    Ok(user)
}

/// Retrieve a user from the database by their email address.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no user with the given email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    let user = connection
        .prepare("SELECT id, email, password FROM user WHERE email = ?1")?
        .query_row([email], map_user_row)?;

    Ok(user)
}

/// The number of registered users.
///
/// # Errors
///
/// Returns an error if there is an SQL error.
pub fn count_users(connection: &Connection) -> Result<i64, rusqlite::Error> {
    connection.query_row("SELECT COUNT(id) FROM user", (), |row| row.get(0))
}

/// Overwrite the stored password hash for a user.
///
/// # Errors
///
/// Returns [Error::NotFound] if there is no user with the given ID.
pub fn set_user_password(
    id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let id = row.get(0)?;
    let email = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserID::new(id),
        email,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        password::PasswordHash,
        user::{
            UserID, count_users, create_user, create_user_table, get_user_by_email,
            get_user_by_id, set_user_password,
        },
    };

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        create_user_table(&connection).unwrap();

        connection
    }

    fn test_password_hash() -> PasswordHash {
        PasswordHash::new_unchecked("hashedPassword")
    }

    #[test]
    fn create_and_retrieve_user() {
        let connection = get_test_connection();

        let inserted = create_user("hello@example.com", test_password_hash(), &connection)
            .expect("Could not create user");

        let selected = get_user_by_id(inserted.id(), &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_user_by_email_finds_user() {
        let connection = get_test_connection();
        let email = "hello@example.com";

        let inserted = create_user(email, test_password_hash(), &connection).unwrap();

        let selected = get_user_by_email(email, &connection);

        assert_eq!(Ok(inserted), selected);
    }

    #[test]
    fn get_user_fails_on_invalid_id() {
        let connection = get_test_connection();
        create_user("hello@example.com", test_password_hash(), &connection).unwrap();

        let selected = get_user_by_id(UserID::new(42), &connection);

        assert_eq!(Err(Error::NotFound), selected);
    }

    #[test]
    fn create_user_fails_once_a_user_exists() {
        let connection = get_test_connection();
        create_user("first@example.com", test_password_hash(), &connection).unwrap();

        let result = create_user("second@example.com", test_password_hash(), &connection);

        assert_eq!(Err(Error::RegistrationClosed), result);
        assert_eq!(Ok(1), count_users(&connection).map_err(|_| ()));
    }

    #[test]
    fn set_user_password_overwrites_hash() {
        let connection = get_test_connection();
        let user = create_user("hello@example.com", test_password_hash(), &connection).unwrap();
        let new_hash = PasswordHash::new_unchecked("newHashedPassword");

        set_user_password(user.id(), &new_hash, &connection).unwrap();

        let selected = get_user_by_id(user.id(), &connection).unwrap();
        assert_eq!(&new_hash, selected.password_hash());
    }
}
