//! Displays accounts and their balances.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::core::AccountKind,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, edit_delete_action_links, format_currency,
    },
    navigation::NavBar,
};

/// The state needed for the [get_accounts_page](crate::account::get_accounts_page) route handler.
#[derive(Debug, Clone)]
pub struct AccountState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AccountState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The account data to display in the view
#[derive(Debug, PartialEq)]
struct AccountTableRow {
    name: String,
    kind: AccountKind,
    balance: f64,
    detail_url: String,
    edit_url: String,
    delete_url: String,
}

fn accounts_view(accounts: &[AccountTableRow], total_balance: f64) -> Markup {
    let create_account_page_url = endpoints::NEW_ACCOUNT_VIEW;
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let table_row = |account: &AccountTableRow| {
        let balance_str = format_currency(account.balance);
        let action_links = edit_delete_action_links(
            &account.edit_url,
            &account.delete_url,
            &format!(
                "Are you sure you want to delete the account '{}'? This cannot be undone.",
                account.name
            ),
            "closest tr",
            "delete",
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                th
                    scope="row"
                    class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                {
                    a href=(account.detail_url) class=(LINK_STYLE) { (account.name) }
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (account.kind.display_name())
                }

                td class="px-6 py-4 text-right"
                {
                    (balance_str)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    div class="flex gap-4"
                    {
                        (action_links)
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
                    h1 class="text-xl font-bold" { "Accounts" }

                    a href=(create_account_page_url) class=(LINK_STYLE)
                    {
                        "Add Account"
                    }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Total balance: "
                    span class="font-semibold text-gray-900 dark:text-white"
                    {
                        (format_currency(total_balance))
                    }
                }

                section class="w-full overflow-x-auto lg:overflow-visible dark:bg-gray-800 lg:max-w-5xl lg:w-full lg:mx-auto"
                {
                    table class="w-full text-sm text-left rtl:text-right
                        text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Name"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Type"
                                }
                                th scope="col" class="px-6 py-3 text-right"
                                {
                                    "Balance"
                                }
                                th scope="col" class=(TABLE_CELL_STYLE)
                                {
                                    "Actions"
                                }
                            }
                        }

                        tbody
                        {
                            @for account in accounts {
                                (table_row(account))
                            }

                            @if accounts.is_empty() {
                                tr
                                {
                                    td
                                        colspan="4"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No accounts found. Create an account "
                                        a href=(create_account_page_url) class=(LINK_STYLE)
                                        {
                                            "here"
                                        }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Accounts", &[], &content)
}

/// Renders the accounts page showing all accounts.
pub async fn get_accounts_page(State(state): State<AccountState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts: Vec<AccountTableRow> = get_all_account_rows(&connection)
        .inspect_err(|error| tracing::error!("could not get all accounts: {error}"))?;

    let total_balance = accounts.iter().map(|account| account.balance).sum();

    Ok(accounts_view(&accounts, total_balance).into_response())
}

fn get_all_account_rows(connection: &Connection) -> Result<Vec<AccountTableRow>, Error> {
    connection
        .prepare("SELECT id, name, kind, balance FROM account ORDER BY name ASC;")?
        .query_map([], |row| {
            let id: i64 = row.get(0)?;
            let kind: String = row.get(2)?;

            Ok(AccountTableRow {
                name: row.get(1)?,
                kind: match kind.as_str() {
                    "savings" => AccountKind::Savings,
                    "credit_card" => AccountKind::CreditCard,
                    "cash" => AccountKind::Cash,
                    "investment" => AccountKind::Investment,
                    _ => AccountKind::Checking,
                },
                balance: row.get(3)?,
                detail_url: format_endpoint(endpoints::ACCOUNT_DETAIL_VIEW, id),
                edit_url: format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, id),
                delete_url: format_endpoint(endpoints::DELETE_ACCOUNT, id),
            })
        })?
        .map(|account_result| account_result.map_err(Error::from))
        .collect()
}


#[cfg(test)]
mod accounts_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::{extract::State, http::StatusCode};
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        account::{accounts_page::AccountState, create_account_table, get_accounts_page},
        endpoints,
        html::format_currency,
        test_utils::{assert_content_type, assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn page_lists_accounts_with_balances() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
        create_account_table(&connection).expect("Could not create accounts table");
        connection
            .execute(
                "INSERT INTO account (id, name, kind, initial_balance, balance)
                VALUES (1, 'Everyday', 'checking', 1234.56, 1234.56)",
                (),
            )
            .expect("Could not insert test data into database");

        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_accounts_page(State(state)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");
        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let row_selector = Selector::parse("tbody tr").unwrap();
        let rows = html.select(&row_selector).collect::<Vec<_>>();
        assert_eq!(rows.len(), 1, "want 1 table row, got {}", rows.len());
        let row_text = rows[0].text().collect::<String>();
        assert!(row_text.contains("Everyday"));
        assert!(row_text.contains(&format_currency(1234.56)));
        assert!(row_text.contains("Checking"));
    }

    #[tokio::test]
    async fn empty_page_links_to_create_account() {
        let connection =
            Connection::open_in_memory().expect("Could not initialise in-memory SQLite database");
        create_account_table(&connection).expect("Could not create accounts table");
        let state = AccountState {
            db_connection: Arc::new(Mutex::new(connection)),
        };

        let response = get_accounts_page(State(state)).await.unwrap();

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let empty_cell_selector = Selector::parse("td[colspan='4'] a").unwrap();
        let link = html
            .select(&empty_cell_selector)
            .next()
            .expect("Could not find create account link in empty table");
        assert_eq!(link.attr("href"), Some(endpoints::NEW_ACCOUNT_VIEW));
    }
}
