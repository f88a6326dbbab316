//! Defines the route handler for the page for editing an account.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::core::{AccountId, AccountKind, get_account},
    endpoints::{self, format_endpoint},
    html::{
        FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE, base,
        dollar_input_styles,
    },
    navigation::NavBar,
};

/// The state needed to render the edit account page.
#[derive(Debug, Clone)]
pub struct EditAccountPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditAccountPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing an account.
pub async fn get_edit_account_page(
    State(state): State<EditAccountPageState>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let account = {
        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        get_account(account_id, &connection)?
    };

    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();
    let update_url = format_endpoint(endpoints::PUT_ACCOUNT, account_id);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Edit Account" }

            form
                hx-put=(update_url)
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
                        value=(account.name)
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div
                {
                    label for="kind" class=(FORM_LABEL_STYLE) { "Type" }
                    select name="kind" id="kind" class=(FORM_SELECT_STYLE)
                    {
                        @for kind in AccountKind::all() {
                            option
                                value=(kind.as_str())
                                selected[kind == account.kind]
                            {
                                (kind.display_name())
                            }
                        }
                    }
                }

                div
                {
                    label for="balance" class=(FORM_LABEL_STYLE) { "Balance" }
                    div class="input-wrapper w-full"
                    {
                        input
                            type="number"
                            name="balance"
                            id="balance"
                            step="0.01"
                            value=(format!("{:.2}", account.balance))
                            class=(FORM_TEXT_INPUT_STYLE)
                            required;
                    }
                }

                button
                    type="submit"
                    class="w-full px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:bg-blue-600
                        hover:dark:bg-blue-700 text-white rounded"
                {
                    "Save Changes"
                }
            }
        }
    );

    Ok(base("Edit Account", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod edit_account_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;

    use crate::{
        Error,
        account::{
            AccountKind,
            create_endpoint::{AccountForm, create_account},
            edit_page::{EditAccountPageState, get_edit_account_page},
        },
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_status_ok, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    fn get_test_state() -> EditAccountPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        EditAccountPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn form_is_prefilled_with_account() {
        let state = get_test_state();
        let account = create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                kind: AccountKind::Checking,
                balance: 123.45,
            },
            &state.db_connection.lock().unwrap(),
        )
        .unwrap();

        let response = get_edit_account_page(State(state), Path(account.id))
            .await
            .unwrap();

        assert_status_ok(&response);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::PUT_ACCOUNT, account.id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "name", "text", "Everyday");
        assert_form_input_with_value(&form, "balance", "number", "123.45");
    }

    #[tokio::test]
    async fn missing_account_returns_not_found() {
        let state = get_test_state();

        let result = get_edit_account_page(State(state), Path(42)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
