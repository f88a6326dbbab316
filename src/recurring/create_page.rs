//! Defines the route handler for the page for creating a new recurring rule.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    timezone::local_date_today,
};

use super::form::{RuleFormPrefill, rule_form_fields};

fn create_rule_view(today: Date, accounts: &[Account], categories: &[Category]) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();
    let spinner = loading_spinner();
    let prefill = RuleFormPrefill::empty(today);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-post=(endpoints::POST_RECURRING)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "New Recurring Rule" }

                (rule_form_fields(&prefill, accounts, categories))

                div id="alert-container" {}

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Create Rule"
                }
            }
        }
    };

    base("Create Recurring Rule", &[dollar_input_styles()], &content)
}

/// The state needed for the create new recurring rule page.
#[derive(Debug, Clone)]
pub struct CreateRulePageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateRulePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for creating a recurring rule.
pub async fn get_create_recurring_page(
    State(state): State<CreateRulePageState>,
) -> Result<Response, Error> {
    let (accounts, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let accounts = get_all_accounts(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve accounts for new rule page: {error}")
        })?;
        let categories = get_all_categories(&connection).inspect_err(|error| {
            tracing::error!("Failed to retrieve categories for new rule page: {error}")
        })?;

        (accounts, categories)
    };

    let today = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    Ok(create_rule_view(today, &accounts, &categories).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;

    use crate::{
        account::{AccountForm, AccountKind, create_account},
        db::initialize,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    use super::{CreateRulePageState, get_create_recurring_page};

    fn get_test_state() -> CreateRulePageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        create_account(
            &AccountForm {
                name: "Everyday".to_owned(),
                kind: AccountKind::Checking,
                balance: 0.0,
            },
            &connection,
        )
        .unwrap();

        CreateRulePageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn new_rule_returns_form() {
        let state = get_test_state();

        let response = get_create_recurring_page(State(state)).await.unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::POST_RECURRING, "hx-post");
        assert_form_input(&form, "description", "text");
        assert_form_input(&form, "amount", "number");
        assert_form_input(&form, "kind", "select");
        assert_form_input(&form, "interval", "select");
        assert_form_input(&form, "start_date", "date");
        assert_form_input(&form, "account_id", "select");
        assert_form_input(&form, "category_id", "select");
        assert_form_submit_button(&form);
    }
}
