//! Budgets listing page with progress bars and an inline creation form.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    category::{Category, get_all_categories, get_category},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_SELECT_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    timezone::local_date_today,
};

use super::core::{
    Budget, get_budgets_for_month, parse_month_input, progress_percent,
    spent_in_category_for_month,
};

/// The state needed for the budgets page.
#[derive(Debug, Clone)]
pub struct BudgetsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for BudgetsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The query parameters for the budgets page.
#[derive(Debug, Deserialize)]
pub struct BudgetsQuery {
    /// The month to display in the format "YYYY-MM". Defaults to the current
    /// month.
    pub month: Option<String>,
}

/// A budget with its progress resolved for template rendering.
#[derive(Debug, Clone)]
struct BudgetProgressRow {
    budget: Budget,
    category_name: String,
    spent: f64,
    percent: f64,
}

/// Render the budgets page for the requested month.
pub async fn get_budgets_page(
    State(state): State<BudgetsPageState>,
    Query(query): Query<BudgetsQuery>,
) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let (year, month) = match &query.month {
        Some(month_input) => parse_month_input(month_input)?,
        None => (today.year(), today.month() as u8),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let budgets = get_budgets_for_month(month, year, &connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;

    let mut rows = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let category = get_category(budget.category_id, &connection)?;
        let spent = spent_in_category_for_month(budget.category_id, month, year, &connection)?;

        rows.push(BudgetProgressRow {
            percent: progress_percent(spent, budget.amount),
            category_name: category.name.to_string(),
            spent,
            budget,
        });
    }

    let categories = get_all_categories(&connection)?;

    Ok(budgets_view(&rows, &categories, month, year).into_response())
}

fn budgets_view(
    budgets: &[BudgetProgressRow],
    categories: &[Category],
    month: u8,
    year: i32,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::BUDGETS_VIEW).into_html();
    let month_value = format!("{year}-{month:02}");

    let budget_card = |row: &BudgetProgressRow| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_BUDGET_VIEW, row.budget.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_BUDGET, row.budget.id);
        let confirm_message = format!(
            "Are you sure you want to delete the budget for '{}'?",
            row.category_name
        );
        // Cap the bar width, overspending is shown by color instead.
        let bar_width = row.percent.min(100.0);
        let bar_color = if row.percent > 100.0 {
            "bg-red-500"
        } else if row.percent > 80.0 {
            "bg-yellow-400"
        } else {
            "bg-blue-500"
        };

        html!(
            li
                class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm
                    dark:border-gray-700 dark:bg-gray-800 space-y-2"
                data-budget-card="true"
            {
                div class="flex items-start justify-between gap-3"
                {
                    span class="font-medium text-gray-900 dark:text-white"
                    {
                        (row.category_name)
                    }

                    span class="text-sm tabular-nums text-gray-500 dark:text-gray-400"
                    {
                        (format_currency(row.spent))
                        " of "
                        (format_currency(row.budget.amount))
                        " (" (format!("{:.0}%", row.percent)) ")"
                    }
                }

                div class="w-full h-2 rounded bg-gray-200 dark:bg-gray-700"
                {
                    div
                        class={ "h-2 rounded " (bar_color) }
                        style={ "width: " (format!("{bar_width:.0}")) "%" } {}
                }

                div class="flex items-center gap-4 text-sm"
                {
                    (edit_delete_action_links(
                        &edit_url,
                        &delete_url,
                        &confirm_message,
                        "closest [data-budget-card='true']",
                        "delete",
                    ))
                }
            }
        )
    };

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Budgets" }

                    form method="get" action=(endpoints::BUDGETS_VIEW) class="flex gap-2 items-end"
                    {
                        div
                        {
                            label for="month" class=(FORM_LABEL_STYLE) { "Month" }
                            input
                                type="month"
                                name="month"
                                id="month"
                                value=(month_value)
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Show" }
                    }
                }

                form
                    class="flex gap-2 items-end flex-wrap"
                    hx-post=(endpoints::POST_BUDGET)
                    hx-target-error="#alert-container"
                {
                    div
                    {
                        label for="category_id" class=(FORM_LABEL_STYLE) { "Category" }
                        select
                            name="category_id"
                            id="category_id"
                            required
                            class=(FORM_SELECT_STYLE)
                        {
                            @for category in categories {
                                option value=(category.id) { (category.name) }
                            }
                        }
                    }

                    div
                    {
                        label for="amount" class=(FORM_LABEL_STYLE) { "Limit" }
                        input
                            type="number"
                            name="amount"
                            id="amount"
                            step="0.01"
                            min="0.01"
                            placeholder="0.00"
                            required
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    input type="hidden" name="month" value=(month_value);

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add Budget" }
                }

                div id="alert-container" {}

                ul class="space-y-4 lg:max-w-5xl lg:mx-auto lg:w-full"
                {
                    @for row in budgets {
                        (budget_card(row))
                    }

                    @if budgets.is_empty() {
                        li
                            class="rounded border border-dashed border-gray-300 bg-white px-4 py-6
                                text-center text-sm text-gray-500 dark:border-gray-700
                                dark:bg-gray-800 dark:text-gray-400"
                        {
                            "No budgets for this month yet. \
                            Use the form above to set a spending limit."
                        }
                    }
                }
            }
        }
    );

    base("Budgets", &[], &content)
}

#[cfg(test)]
mod budgets_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        budget::create_budget,
        category::{CategoryName, create_category},
        db::initialize,
        endpoints,
        test_utils::{assert_valid_html, parse_html_document},
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{BudgetsPageState, BudgetsQuery, get_budgets_page};

    fn get_test_state() -> BudgetsPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();
        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 0.0, 0.0)",
                (),
            )
            .unwrap();

        BudgetsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[tokio::test]
    async fn page_shows_budget_progress() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            create_budget(1, 120.0, 3, 2025, &connection).unwrap();

            let date = time::macros::date!(2025 - 03 - 10);
            create_transaction(
                Transaction::build(30.0, TransactionKind::Expense, date, "apples", 1)
                    .category_id(Some(1)),
                date,
                &connection,
            )
            .unwrap();
        }

        let response = get_budgets_page(
            State(state),
            Query(BudgetsQuery {
                month: Some("2025-03".to_owned()),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let body_text = document.root_element().text().collect::<String>();
        assert!(body_text.contains("Groceries"));
        assert!(body_text.contains("(25%)"), "want 25% progress in {body_text}");
    }

    #[tokio::test]
    async fn page_has_inline_create_form() {
        let state = get_test_state();

        let response = get_budgets_page(State(state), Query(BudgetsQuery { month: None }))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let form_selector = Selector::parse(&format!(
            "form[hx-post='{}']",
            endpoints::POST_BUDGET
        ))
        .unwrap();
        assert!(document.select(&form_selector).next().is_some());
    }

    #[tokio::test]
    async fn invalid_month_query_is_an_error() {
        let state = get_test_state();

        let result = get_budgets_page(
            State(state),
            Query(BudgetsQuery {
                month: Some("not-a-month".to_owned()),
            }),
        )
        .await;

        assert!(result.is_err());
    }
}
