//! Defines the route handler for the page for editing a recurring rule.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::get_all_accounts,
    category::get_all_categories,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
};

use super::{
    core::{RecurringRuleId, get_recurring_rule},
    form::{RuleFormPrefill, rule_form_fields},
};

/// The state needed for the edit recurring rule page.
#[derive(Debug, Clone)]
pub struct EditRulePageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditRulePageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a recurring rule, prefilled with its current
/// values.
pub async fn get_edit_recurring_page(
    State(state): State<EditRulePageState>,
    Path(rule_id): Path<RecurringRuleId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rule = get_recurring_rule(rule_id, &connection)
        .inspect_err(|error| tracing::error!("could not get recurring rule {rule_id}: {error}"))?;
    let accounts = get_all_accounts(&connection)?;
    let categories = get_all_categories(&connection)?;

    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();
    let spinner = loading_spinner();
    let prefill = RuleFormPrefill::from_rule(&rule);
    let update_url = format_endpoint(endpoints::PUT_RECURRING, rule_id);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_url)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Recurring Rule" }

                (rule_form_fields(&prefill, &accounts, &categories))

                div id="alert-container" {}

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save"
                }
            }
        }
    };

    Ok(base("Edit Recurring Rule", &[dollar_input_styles()], &content).into_response())
}

#[cfg(test)]
mod view_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        db::initialize,
        endpoints::{self, format_endpoint},
        recurring::core::{Interval, RecurringRuleDraft, create_recurring_rule},
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, must_get_form, parse_html_document,
        },
        transaction::TransactionKind,
    };

    use super::{EditRulePageState, get_edit_recurring_page};

    fn get_test_state() -> EditRulePageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 0.0, 0.0)",
                (),
            )
            .unwrap();

        create_recurring_rule(
            RecurringRuleDraft {
                amount: 500.0,
                kind: TransactionKind::Expense,
                interval: Interval::Monthly,
                description: "Rent".to_owned(),
                start_date: date!(2025 - 07 - 01),
                account_id: 1,
                category_id: None,
            },
            &connection,
        )
        .unwrap();

        EditRulePageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn page_prefills_rule_and_targets_put_endpoint() {
        let state = get_test_state();

        let response = get_edit_recurring_page(State(state), Path(1)).await.unwrap();

        let document = parse_html_document(response).await;
        let form = must_get_form(&document);

        assert_hx_endpoint(&form, &format_endpoint(endpoints::PUT_RECURRING, 1), "hx-put");
        assert_form_input_with_value(&form, "description", "text", "Rent");
        assert_form_input_with_value(&form, "amount", "number", "500.00");
        assert_form_input_with_value(&form, "start_date", "date", "2025-07-01");
    }

    #[tokio::test]
    async fn missing_rule_is_not_found() {
        let state = get_test_state();

        let result = get_edit_recurring_page(State(state), Path(999)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
