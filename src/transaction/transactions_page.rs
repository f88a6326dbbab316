//! Defines the route handler for the page that displays transactions as a table.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use serde::Deserialize;
use time::Date;

use crate::{
    AppState, Error, endpoints,
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TAG_BADGE_STYLE, base, edit_delete_action_links, format_currency, truncate_text,
    },
    navigation::NavBar,
    pagination::{PaginationConfig, PaginationIndicator, create_pagination_indicators},
};

use super::core::count_transactions;

/// The state needed for the transactions page.
#[derive(Debug, Clone)]
pub struct TransactionsViewState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for TransactionsViewState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// The query parameters for the transactions page.
#[derive(Debug, Deserialize)]
pub struct TransactionsQuery {
    /// The page number to display, starting from one.
    pub page: Option<u64>,
}

/// A transaction with display fields resolved for template rendering.
#[derive(Debug, Clone, PartialEq)]
struct TransactionTableRow {
    date: Date,
    description: String,
    signed_amount: f64,
    affects_balance: bool,
    account_name: String,
    category_name: Option<String>,
    tags: Vec<String>,
    edit_url: String,
    delete_url: String,
}

/// Render an overview of the user's transactions, paginated from newest to
/// oldest.
pub async fn get_transactions_page(
    State(state): State<TransactionsViewState>,
    Query(query): Query<TransactionsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let page_size = state.pagination_config.default_page_size;
    let transaction_count = count_transactions(&connection)
        .inspect_err(|error| tracing::error!("could not count transactions: {error}"))?;
    let page_count = transaction_count.div_ceil(page_size).max(1);
    let curr_page = query
        .page
        .unwrap_or(state.pagination_config.default_page)
        .clamp(1, page_count);

    let rows = get_transaction_table_rows(page_size, (curr_page - 1) * page_size, &connection)
        .inspect_err(|error| tracing::error!("could not get transaction rows: {error}"))?;

    let indicators =
        create_pagination_indicators(curr_page, page_count, state.pagination_config.max_pages);

    Ok(transactions_view(&rows, &indicators).into_response())
}

fn get_transaction_table_rows(
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<TransactionTableRow>, Error> {
    connection
        .prepare(
            "SELECT t.id, t.date, t.description, t.amount, t.kind, t.affects_balance,
                account.name, category.name,
                (SELECT GROUP_CONCAT(tag.name, ',') FROM tag
                    INNER JOIN transaction_tag ON transaction_tag.tag_id = tag.id
                    WHERE transaction_tag.transaction_id = t.id)
            FROM \"transaction\" t
            INNER JOIN account ON account.id = t.account_id
            LEFT JOIN category ON category.id = t.category_id
            ORDER BY t.date DESC, t.id DESC
            LIMIT ?1 OFFSET ?2",
        )?
        .query_map([limit as i64, offset as i64], |row| {
            let id: i64 = row.get(0)?;
            let amount: f64 = row.get(3)?;
            let kind: String = row.get(4)?;
            let signed_amount = if kind == "income" { amount } else { -amount };
            let tag_list: Option<String> = row.get(8)?;

            Ok(TransactionTableRow {
                date: row.get(1)?,
                description: row.get(2)?,
                signed_amount,
                affects_balance: row.get(5)?,
                account_name: row.get(6)?,
                category_name: row.get(7)?,
                tags: tag_list
                    .map(|tags| tags.split(',').map(str::to_owned).collect())
                    .unwrap_or_default(),
                edit_url: endpoints::format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, id),
                delete_url: endpoints::format_endpoint(endpoints::DELETE_TRANSACTION, id),
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

fn transactions_view(
    transactions: &[TransactionTableRow],
    indicators: &[PaginationIndicator],
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let table_row = |row: &TransactionTableRow| {
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? Its account's balance will be adjusted.",
            row.description
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE) { (row.date) }

                td class=(TABLE_CELL_STYLE)
                {
                    (truncate_text(&row.description, 40))

                    @if !row.affects_balance {
                        span class="ml-2 text-xs text-gray-400" { "(tracked only)" }
                    }

                    @for tag in &row.tags {
                        " "
                        span class=(TAG_BADGE_STYLE) { (tag) }
                    }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    @match &row.category_name {
                        Some(name) => { (name) }
                        None => { span class="text-gray-400" { "Uncategorized" } }
                    }
                }

                td class=(TABLE_CELL_STYLE) { (row.account_name) }

                td class="px-6 py-4 text-right" { (format_currency(row.signed_amount)) }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (edit_delete_action_links(
                            &row.edit_url,
                            &row.delete_url,
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
                    h1 class="text-xl font-bold" { "Transactions" }

                    div class="flex gap-4"
                    {
                        a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "Import CSV" }
                        a href=(endpoints::EXPORT_TRANSACTIONS) class=(LINK_STYLE) { "Export CSV" }
                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                        {
                            "Create Transaction"
                        }
                    }
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in transactions {
                                (table_row(row))
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="6"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions yet. "
                                        a href=(endpoints::NEW_TRANSACTION_VIEW) class=(LINK_STYLE)
                                        {
                                            "Create your first transaction"
                                        }
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_widget(indicators))
            }
        }
    );

    base("Transactions", &[], &content)
}

fn pagination_widget(indicators: &[PaginationIndicator]) -> Markup {
    let page_url = |page: u64| format!("{}?page={page}", endpoints::TRANSACTIONS_VIEW);
    let link_style = "px-3 py-1 rounded hover:bg-gray-100 dark:hover:bg-gray-700";

    html!(
        nav class="flex justify-center gap-1 text-sm" aria-label="pagination"
        {
            @for indicator in indicators {
                @match indicator {
                    PaginationIndicator::BackButton(page) => {
                        a href=(page_url(*page)) class=(link_style) { "Previous" }
                    }
                    PaginationIndicator::Page(page) => {
                        a href=(page_url(*page)) class=(link_style) { (page) }
                    }
                    PaginationIndicator::CurrPage(page) => {
                        span class="px-3 py-1 rounded bg-blue-500 text-white" { (page) }
                    }
                    PaginationIndicator::Ellipsis => {
                        span class="px-3 py-1" { "…" }
                    }
                    PaginationIndicator::NextButton(page) => {
                        a href=(page_url(*page)) class=(link_style) { "Next" }
                    }
                }
            }
        }
    )
}
