//! Defines the route handler for the page for creating an account.

use axum::response::{IntoResponse, Response};
use maud::html;

use crate::{
    account::core::AccountKind,
    endpoints,
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
};

/// Renders the page for creating an account.
pub async fn get_create_account_page() -> Response {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "New Account" }

            form
                hx-post=(endpoints::POST_ACCOUNT)
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                div
                {
                    label for="name" class=(FORM_LABEL_STYLE) { "Name" }
                    input
                        type="text"
                        name="name"
                        id="name"
                        placeholder="Everyday Checking"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required
                        autofocus;
                }

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                    {
                        @for kind in AccountKind::all() {
                            option value=(kind.as_str()) { (kind.display_name()) }
                        }
                    }
                }

                div
                {
                    label for="balance" class=(FORM_LABEL_STYLE) { "Starting Balance" }
                    div class="input-wrapper w-full"
                    {
                        input
                            type="number"
                            name="balance"
                            id="balance"
                            step="0.01"
                            value="0.00"
                            class=(FORM_TEXT_INPUT_STYLE)
                            required;
                    }
                }

                button
                    type="submit"
                    class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600
                        hover:dark:bg-blue-700 text-white rounded"
                {
                    "Create Account"
                }
            }
        }
    );

    base("New Account", &[dollar_input_styles()], &content).into_response()
}

#[cfg(test)]
mod create_account_page_tests {
    use crate::{
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_status_ok,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    use super::get_create_account_page;

    #[tokio::test]
    async fn page_renders_account_form() {
        let response = get_create_account_page().await;

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::POST_ACCOUNT, "hx-post");
        assert_form_input(&form, "name", "text");
        assert_form_input(&form, "kind", "select");
        assert_form_input(&form, "balance", "number");
        assert_form_submit_button(&form);
    }
}
