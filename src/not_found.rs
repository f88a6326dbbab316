//! The 404 not found page.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use maud::html;

use crate::{
    endpoints,
    html::{LINK_STYLE, PAGE_CONTAINER_STYLE, base},
    shared_templates::render,
};

/// The route handler for unmatched paths.
pub async fn get_404_not_found() -> Response {
    get_404_not_found_response()
}

/// Build the 404 response directly, for use outside a route handler.
pub fn get_404_not_found_response() -> Response {
    let content = html!(
        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-4xl font-bold" { "404" }
            p class="mt-2" { "The page you were looking for could not be found." }
            p class="mt-4"
            {
                a href=(endpoints::DASHBOARD_VIEW) class=(LINK_STYLE)
                {
                    "Back to the dashboard"
                }
            }
        }
    );

    render(StatusCode::NOT_FOUND, base("Not Found", &[], &content)).into_response()
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;

    use super::get_404_not_found;

    #[tokio::test]
    async fn returns_not_found_status() {
        let response = get_404_not_found().await;

        assert_eq!(StatusCode::NOT_FOUND, response.status());
    }
}
