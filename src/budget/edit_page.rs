//! Edit the spending limit of an existing budget.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::html;
use rusqlite::Connection;

use crate::{
    AppState, Error,
    category::get_category,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, base,
    },
    navigation::NavBar,
};

use super::core::{BudgetId, get_budget};

/// The state needed for the edit budget page.
#[derive(Debug, Clone)]
pub struct EditBudgetPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditBudgetPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Render the form for editing a budget's limit.
///
/// The category and month of a budget are fixed once created. To move a budget
/// the user deletes it and creates a new one.
pub async fn get_edit_budget_page(
    State(state): State<EditBudgetPageState>,
    Path(budget_id): Path<BudgetId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budget = get_budget(budget_id, &connection)
        .inspect_err(|error| tracing::error!("could not get budget {budget_id}: {error}"))?;
    let category = get_category(budget.category_id, &connection)?;

    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let update_url = format_endpoint(endpoints::PUT_BUDGET, budget_id);
    let month_label = format!("{}-{:02}", budget.year, budget.month);

    let content = html!(
        (nav_bar)

        main class=(FORM_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold" { "Edit Budget" }

            p class="text-sm text-gray-500 dark:text-gray-400"
            {
                (category.name) " for " (month_label)
            }

            form
                class="space-y-4"
                hx-put=(update_url)
                hx-target-error="#alert-container"
            {
                div
                {
                    label for="amount" class=(FORM_LABEL_STYLE) { "Limit" }
                    input
                        type="number"
                        name="amount"
                        id="amount"
                        step="0.01"
                        min="0.01"
                        value=(format!("{:.2}", budget.amount))
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div id="alert-container" {}

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
            }
        }
    );

    Ok(base("Edit Budget", &[], &content).into_response())
}

#[cfg(test)]
mod edit_budget_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;

    use crate::{
        Error,
        budget::create_budget,
        category::{CategoryName, create_category},
        db::initialize,
        endpoints::{self, format_endpoint},
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, must_get_form, parse_html_document,
        },
    };

    use super::{EditBudgetPageState, get_edit_budget_page};

    fn get_test_state() -> EditBudgetPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();
        create_budget(1, 120.0, 6, 2025, &connection).unwrap();

        EditBudgetPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn page_prefills_amount_and_targets_put_endpoint() {
        let state = get_test_state();

        let response = get_edit_budget_page(State(state), Path(1)).await.unwrap();

        let document = parse_html_document(response).await;
        let form = must_get_form(&document);

        assert_hx_endpoint(&form, &format_endpoint(endpoints::PUT_BUDGET, 1), "hx-put");
        assert_form_input_with_value(&form, "amount", "number", "120.00");
    }

    #[tokio::test]
    async fn missing_budget_is_not_found() {
        let state = get_test_state();

        let result = get_edit_budget_page(State(state), Path(999)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
