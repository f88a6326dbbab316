//! Displays a single account and the transactions attributed to it.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    AppState, Error,
    account::core::{Account, AccountId, get_account},
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency, truncate_text,
    },
    navigation::NavBar,
};

/// The state needed to render the account detail page.
#[derive(Debug, Clone)]
pub struct AccountDetailState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountDetailState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A transaction shown on the account detail page.
#[derive(Debug, PartialEq)]
struct TransactionRow {
    date: Date,
    description: String,
    signed_amount: f64,
    affects_balance: bool,
    edit_url: String,
}

fn account_detail_view(account: &Account, transactions: &[TransactionRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    div
                    {
                        h1 class="text-xl font-bold" { (account.name) }
                        p class="text-sm text-gray-500 dark:text-gray-400"
                        {
                            (account.kind.display_name())
                        }
                    }

                    p class="text-lg font-semibold" { (format_currency(account.balance)) }
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
                                th scope="col" class="px-6 py-3 text-right" { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for transaction in transactions {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (transaction.date) }

                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(transaction.edit_url) class=(LINK_STYLE)
                                        {
                                            (truncate_text(&transaction.description, 40))
                                        }

                                        @if !transaction.affects_balance {
                                            span class="ml-2 text-xs text-gray-400"
                                            {
                                                "(tracked only)"
                                            }
                                        }
                                    }

                                    td class="px-6 py-4 text-right"
                                    {
                                        (format_currency(transaction.signed_amount))
                                    }
                                }
                            }

                            @if transactions.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center text-gray-500 dark:text-gray-400"
                                    {
                                        "No transactions for this account yet."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base(&account.name, &[], &content)
}

/// Renders the detail page for one account, listing its transactions.
pub async fn get_account_detail_page(
    State(state): State<AccountDetailState>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(account_id, &connection)?;
    let transactions = get_account_transactions(account_id, &connection)?;

    Ok(account_detail_view(&account, &transactions).into_response())
}

fn get_account_transactions(
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<TransactionRow>, Error> {
    connection
        .prepare(
            "SELECT id, date, description, amount, kind, affects_balance
            FROM \"transaction\"
            WHERE account_id = ?1
            ORDER BY date DESC, id DESC",
        )?
        .query_map([account_id], |row| {
            let id: i64 = row.get(0)?;
            let amount: f64 = row.get(3)?;
            let kind: String = row.get(4)?;
            let signed_amount = if kind == "income" { amount } else { -amount };

            Ok(TransactionRow {
                date: row.get(1)?,
                description: row.get(2)?,
                signed_amount,
                affects_balance: row.get(5)?,
                edit_url: format_endpoint(endpoints::EDIT_TRANSACTION_VIEW, id),
            })
        })?
        .map(|row_result| row_result.map_err(Error::from))
        .collect()
}
