//! Lists recurring rules with their schedules and a "fire now" action.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
    transaction::TransactionKind,
};

use super::core::Interval;

/// The state needed for the recurring rules page.
#[derive(Debug, Clone)]
pub struct RulesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RulesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A recurring rule with its account and category names resolved.
#[derive(Debug)]
struct RuleTableRow {
    id: i64,
    description: String,
    signed_amount: f64,
    interval: Interval,
    next_due_date: String,
    last_processed_date: Option<String>,
    account_name: String,
    category_name: Option<String>,
}

/// Render a table of all recurring rules ordered by next due date.
pub async fn get_recurring_page(State(state): State<RulesPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rules = get_rule_table_rows(&connection)
        .inspect_err(|error| tracing::error!("could not get recurring rules: {error}"))?;

    Ok(rules_view(&rules).into_response())
}

fn get_rule_table_rows(connection: &Connection) -> Result<Vec<RuleTableRow>, Error> {
    connection
        .prepare(
            "SELECT r.id, r.description, r.amount, r.kind, r.interval, r.next_due_date,
                r.last_processed_date, account.name, category.name
            FROM recurring_rule r
            INNER JOIN account ON account.id = r.account_id
            LEFT JOIN category ON category.id = r.category_id
            ORDER BY r.next_due_date ASC, r.id ASC",
        )?
        .query_map([], |row| {
            let amount: f64 = row.get(2)?;
            let kind: String = row.get(3)?;
            let interval: String = row.get(4)?;
            let signed_amount = if kind == TransactionKind::Income.as_str() {
                amount
            } else {
                -amount
            };

            Ok(RuleTableRow {
                id: row.get(0)?,
                description: row.get(1)?,
                signed_amount,
                interval: Interval::from_db_string(&interval)?,
                next_due_date: row.get(5)?,
                last_processed_date: row.get(6)?,
                account_name: row.get(7)?,
                category_name: row.get(8)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn rules_view(rules: &[RuleTableRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::RECURRING_VIEW).into_html();

    let table_row = |row: &RuleTableRow| {
        let edit_url = endpoints::format_endpoint(endpoints::EDIT_RECURRING_VIEW, row.id);
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_RECURRING, row.id);
        let fire_url = endpoints::format_endpoint(endpoints::FIRE_RECURRING, row.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? \
            Transactions it already created will be kept.",
            row.description
        );
        let fire_confirm_message = format!(
            "Create a transaction for '{}' dated today?",
            row.description
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (row.description) }

                td class="px-6 py-4 text-right" { (format_currency(row.signed_amount)) }

                td class=(TABLE_CELL_STYLE) { (repeats_label(row.interval)) }

                td class=(TABLE_CELL_STYLE) { (row.next_due_date) }

                td class=(TABLE_CELL_STYLE)
                {
                    @match &row.last_processed_date {
                        Some(date) => { (date) }
                        None => { span class="text-gray-400" { "Never" } }
                    }
                }

                td class=(TABLE_CELL_STYLE) { (row.account_name) }

                td class=(TABLE_CELL_STYLE)
                {
                    @match &row.category_name {
                        Some(name) => { (name) }
                        None => { span class="text-gray-400" { "Uncategorized" } }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        button
                            type="button"
                            class=(LINK_STYLE)
                            hx-post=(fire_url)
                            hx-confirm=(fire_confirm_message)
                            hx-target-error="#alert-container"
                        {
                            "Fire now"
                        }

                        (edit_delete_action_links(
                            &edit_url,
                            &delete_url,
                            &confirm_message,
                            "closest tr",
                            "delete",
                        ))
                    }
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
                    h1 class="text-xl font-bold" { "Recurring" }

                    a href=(endpoints::NEW_RECURRING_VIEW) class=(LINK_STYLE) { "Create Rule" }
                }

                div id="alert-container" {}

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Repeats" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Next Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Last Processed" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rules {
                                (table_row(row))
                            }

                            @if rules.is_empty() {
                                tr
                                {
                                    td
                                        colspan="8"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No recurring rules yet. "
                                        a href=(endpoints::NEW_RECURRING_VIEW) class=(LINK_STYLE)
                                        {
                                            "Create your first rule"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Recurring", &[], &content)
}

fn repeats_label(interval: Interval) -> &'static str {
    match interval {
        Interval::Daily => "Daily",
        Interval::Weekly => "Weekly",
        Interval::Monthly => "Monthly",
        Interval::Yearly => "Yearly",
    }
}
