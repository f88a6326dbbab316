/*! Helpers for turning maud markup into HTTP responses. */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::Markup;

/// Render `markup` as an HTML response with `status_code`.
#[inline]
pub fn render(status_code: StatusCode, markup: Markup) -> Response {
    (status_code, markup).into_response()
}
