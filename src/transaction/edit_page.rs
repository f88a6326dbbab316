//! Defines the route handler for the page for editing an existing transaction.

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
    account::{Account, get_all_accounts},
    category::{Category, get_all_categories},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, base, dollar_input_styles, loading_spinner,
    },
    navigation::NavBar,
    tag::tags_for_transaction,
    timezone::local_date_today,
    transaction::core::{Transaction, TransactionId, get_transaction},
};

use super::form::{TransactionFormPrefill, transaction_form_fields};

fn edit_transaction_view(
    transaction: &Transaction,
    tags: &str,
    max_date: Date,
    accounts: &[Account],
    categories: &[Category],
) -> Markup {
    let update_route = format_endpoint(endpoints::PUT_TRANSACTION, transaction.id);
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();
    let spinner = loading_spinner();
    let prefill = TransactionFormPrefill::from_transaction(transaction, tags);

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            form
                hx-put=(update_route)
                hx-target-error="#alert-container"
                class="w-full space-y-4 md:space-y-6"
            {
                h2 class="text-xl font-bold" { "Edit Transaction" }

                (transaction_form_fields(&prefill, max_date, accounts, categories))

                div id="alert-container" {}

                button type="submit" id="submit-button" tabindex="0" class=(BUTTON_PRIMARY_STYLE)
                {
                    span
                        id="indicator"
                        class="inline htmx-indicator"
                    {
                        (spinner)
                    }
                    " Save Changes"
                }
            }
        }
    };

    base("Edit Transaction", &[dollar_input_styles()], &content)
}

/// The state needed for the edit transaction page.
#[derive(Debug, Clone)]
pub struct EditTransactionPageState {
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// The database connection.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for EditTransactionPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            local_timezone: state.local_timezone.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Renders the page for editing a transaction, prefilled with its current
/// values.
pub async fn get_edit_transaction_page(
    State(state): State<EditTransactionPageState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Response, Error> {
    let (transaction, tags, accounts, categories) = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        let transaction = get_transaction(transaction_id, &connection)?;
        let tags = tags_for_transaction(transaction_id, &connection)?
            .into_iter()
            .map(|tag| tag.name)
            .collect::<Vec<_>>()
            .join(", ");
        let accounts = get_all_accounts(&connection)?;
        let categories = get_all_categories(&connection)?;

        (transaction, tags, accounts, categories)
    };

    let max_date = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    Ok(
        edit_transaction_view(&transaction, &tags, max_date, &accounts, &categories)
            .into_response(),
    )
}

#[cfg(test)]
mod edit_transaction_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Path, State};
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountForm, AccountKind, create_account},
        db::initialize,
        endpoints::{self, format_endpoint},
        tag::process_tags,
        test_utils::{
            assert_form_input_with_value, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document,
        },
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{EditTransactionPageState, get_edit_transaction_page};

    const TODAY: time::Date = date!(2025 - 06 - 15);

    fn get_test_state() -> EditTransactionPageState {
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

        EditTransactionPageState {
            local_timezone: "Etc/UTC".to_owned(),
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn page_prefills_transaction_values() {
        let state = get_test_state();
        let transaction_id = {
            let connection = state.db_connection.lock().unwrap();
            let transaction = create_transaction(
                Transaction::build(42.5, TransactionKind::Expense, TODAY, "groceries", 1),
                TODAY,
                &connection,
            )
            .unwrap();
            process_tags("food", transaction.id, &connection).unwrap();

            transaction.id
        };

        let response = get_edit_transaction_page(State(state), Path(transaction_id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let form = must_get_form(&document);
        assert_hx_endpoint(
            &form,
            &format_endpoint(endpoints::PUT_TRANSACTION, transaction_id),
            "hx-put",
        );
        assert_form_input_with_value(&form, "amount", "number", "42.50");
        assert_form_input_with_value(&form, "description", "text", "groceries");
        assert_form_input_with_value(&form, "tags", "text", "food");
    }

    #[tokio::test]
    async fn missing_transaction_returns_not_found() {
        let state = get_test_state();

        let result = get_edit_transaction_page(State(state), Path(42)).await;

        assert!(matches!(result, Err(Error::NotFound)));
    }
}
