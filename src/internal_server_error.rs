//! The 500 internal server error page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::html;

use crate::{
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base},
    shared_templates::render,
};

/// The description and suggested fix shown on the 500 page.
pub struct InternalServerErrorPageTemplate<'a> {
    pub description: &'a str,
    pub fix: &'a str,
}

impl Default for InternalServerErrorPageTemplate<'_> {
    fn default() -> Self {
        Self {
            description: "Sorry, something went wrong.",
            fix: "Try again later or check the server logs",
        }
    }
}

/// The route handler for the 500 error page.
pub async fn get_internal_server_error_page() -> Response {
    render_internal_server_error(Default::default())
}

/// An HTMX redirect to the 500 error page, for fallible API endpoints.
pub fn get_internal_server_error_redirect() -> Response {
    (
        HxRedirect(endpoints::INTERNAL_ERROR_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Render the 500 error page with `template`.
pub fn render_internal_server_error(template: InternalServerErrorPageTemplate) -> Response {
    let content = html!(
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-4xl font-bold" { "500" }
            p class="mt-2" { (template.description) }
            p class="mt-1 text-gray-500 dark:text-gray-400" { (template.fix) }
        }
    );

    render(
        StatusCode::INTERNAL_SERVER_ERROR,
        base("Internal Server Error", &[], &content),
    )
}
