//! Defines functions for handling user authentication with cookies.

use std::cmp::max;

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{
    Duration, OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description,
};

use crate::{Error, user::UserID};

pub(crate) const COOKIE_USER_ID: &str = "user_id";
pub(crate) const COOKIE_EXPIRY: &str = "expiry";
/// The default duration for which auth cookies are valid.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

const DATE_TIME_FORMAT: &[BorrowedFormatItem] = format_description!(
    "[year]-[month]-[day] [hour padding:zero]:[minute padding:zero]:[second padding:zero] [offset_hour sign:mandatory]:[offset_minute]"
);

/// Add an auth cookie to the cookie jar, indicating that a user is logged in and authenticated.
///
/// Sets the initial expiry of the cookie to `duration` from the current time.
///
/// Returns the cookie jar with the cookie added.
///
/// # Errors
///
/// Returns an [Error::InvalidDateFormat] if the expiry time cannot be formatted.
pub(crate) fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry = OffsetDateTime::now_utc() + duration;
    // Use format instead of to_string to avoid errors at midnight when the
    // hour is printed as a single digit when the format expects two digits.
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), expiry.to_string()))?;

    Ok(jar
        .add(
            Cookie::build((COOKIE_USER_ID, user_id.as_i64().to_string()))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        )
        .add(
            Cookie::build((COOKIE_EXPIRY, expiry_string))
                .expires(expiry)
                .http_only(true)
                .same_site(SameSite::Strict)
                .secure(true),
        ))
}

/// Set the auth cookie to an invalid value and set its max age to zero, which
/// should delete the cookie on the client side.
pub(crate) fn invalidate_auth_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_USER_ID, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
    .add(
        Cookie::build((COOKIE_EXPIRY, "deleted"))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Get the logged-in user's ID from the cookie jar.
///
/// # Errors
///
/// Returns:
/// - [Error::CookieMissing] if the user ID or expiry cookie is not in the jar.
/// - [Error::InvalidCredentials] if the cookie has expired or does not
///   contain a valid user ID.
pub(crate) fn get_user_id_from_cookies(jar: &PrivateCookieJar) -> Result<UserID, Error> {
    let user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::CookieMissing)?;
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;

    let expiry = extract_date_time(&expiry_cookie)?;

    if expiry < OffsetDateTime::now_utc() {
        return Err(Error::InvalidCredentials);
    }

    user_id_cookie
        .value()
        .parse::<i64>()
        .map(UserID::new)
        .map_err(|_| Error::InvalidCredentials)
}

/// Set the expiry of the auth cookie in `jar` to the latest of UTC now
/// plus `duration` and the cookie's current expiry.
///
/// # Errors
///
/// The cookie jar is not modified if an error is returned.
///
/// Returns:
/// - [Error::CookieMissing] if the auth cookie or expiry cookie are not in the cookie jar.
/// - [Error::InvalidDateFormat] if the new expiry date time cannot be formatted.
pub(crate) fn extend_auth_cookie_duration_if_needed(
    jar: PrivateCookieJar,
    duration: Duration,
) -> Result<PrivateCookieJar, Error> {
    let expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;
    let current_expiry = extract_date_time(&expiry_cookie)?;

    let new_expiry = OffsetDateTime::now_utc()
        .checked_add(duration)
        .ok_or(Error::CookieMissing)?;

    let expiry = max(current_expiry, new_expiry);

    set_auth_cookie_expiry(jar, expiry)
}

fn set_auth_cookie_expiry(
    jar: PrivateCookieJar,
    expiry: OffsetDateTime,
) -> Result<PrivateCookieJar, Error> {
    let expiry_string = expiry
        .format(DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), expiry.to_string()))?;

    let mut user_id_cookie = jar.get(COOKIE_USER_ID).ok_or(Error::CookieMissing)?;
    let mut expiry_cookie = jar.get(COOKIE_EXPIRY).ok_or(Error::CookieMissing)?;

    user_id_cookie.set_expires(expiry);
    expiry_cookie.set_expires(expiry);
    expiry_cookie.set_value(expiry_string);

    Ok(jar.add(user_id_cookie).add(expiry_cookie))
}

fn extract_date_time(cookie: &Cookie) -> Result<OffsetDateTime, Error> {
    OffsetDateTime::parse(cookie.value(), DATE_TIME_FORMAT)
        .map_err(|error| Error::InvalidDateFormat(error.to_string(), cookie.value().to_owned()))
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use time::{Duration, OffsetDateTime};

    use crate::{Error, user::UserID};

    use super::{
        COOKIE_EXPIRY, COOKIE_USER_ID, extend_auth_cookie_duration_if_needed,
        get_user_id_from_cookies, invalidate_auth_cookie, set_auth_cookie,
    };

    fn get_test_jar() -> PrivateCookieJar {
        PrivateCookieJar::new(Key::generate())
    }

    #[test]
    fn set_auth_cookie_stores_user_id() {
        let jar = get_test_jar();
        let want_user_id = UserID::new(42);

        let jar = set_auth_cookie(jar, want_user_id, Duration::minutes(5))
            .expect("could not set auth cookie");

        let got_user_id = get_user_id_from_cookies(&jar).expect("could not get user id");
        assert_eq!(want_user_id, got_user_id);
    }

    #[test]
    fn get_user_id_fails_on_empty_jar() {
        let jar = get_test_jar();

        let result = get_user_id_from_cookies(&jar);

        assert_eq!(Err(Error::CookieMissing), result);
    }

    #[test]
    fn get_user_id_fails_on_expired_cookie() {
        let jar = get_test_jar();
        let jar = set_auth_cookie(jar, UserID::new(1), Duration::minutes(-5))
            .expect("could not set auth cookie");

        let result = get_user_id_from_cookies(&jar);

        assert_eq!(Err(Error::InvalidCredentials), result);
    }

    #[test]
    fn invalidate_auth_cookie_deletes_credentials() {
        let jar = get_test_jar();
        let jar = set_auth_cookie(jar, UserID::new(1), Duration::minutes(5))
            .expect("could not set auth cookie");

        let jar = invalidate_auth_cookie(jar);

        assert_eq!("deleted", jar.get(COOKIE_USER_ID).unwrap().value());
        assert_eq!("deleted", jar.get(COOKIE_EXPIRY).unwrap().value());
    }

    #[test]
    fn extend_does_not_shorten_expiry() {
        let jar = get_test_jar();
        let jar = set_auth_cookie(jar, UserID::new(1), Duration::hours(2))
            .expect("could not set auth cookie");

        let jar = extend_auth_cookie_duration_if_needed(jar, Duration::minutes(5))
            .expect("could not extend cookie duration");

        let expiry_cookie = jar.get(COOKIE_EXPIRY).unwrap();
        let expiry = super::extract_date_time(&expiry_cookie).unwrap();
        assert!(expiry > OffsetDateTime::now_utc() + Duration::hours(1));
    }
}
