//! Exporting all transactions as a CSV download.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    http::{HeaderValue, header},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::get_all_accounts,
    category::get_all_categories,
    transaction::{Transaction, map_transaction_row},
};

/// The header row written to exported CSV files. Imports expect the same
/// layout.
pub(crate) const CSV_HEADER: [&str; 7] = [
    "Date",
    "Description",
    "Amount",
    "Type",
    "Account",
    "Category",
    "Notes",
];

/// The state needed for exporting transactions.
#[derive(Debug, Clone)]
pub struct ExportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// Download all transactions as a CSV attachment.
pub async fn export_transactions(State(state): State<ExportState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let csv_text = write_transactions_csv(&connection)
        .inspect_err(|error| tracing::error!("could not export transactions: {error}"))?;

    let mut response = csv_text.into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    response.headers_mut().insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=\"transactions.csv\""),
    );

    Ok(response)
}

/// Render all transactions as CSV text, oldest first.
pub(crate) fn write_transactions_csv(connection: &Connection) -> Result<String, Error> {
    let account_names: HashMap<_, _> = get_all_accounts(connection)?
        .into_iter()
        .map(|account| (account.id, account.name))
        .collect();
    let category_names: HashMap<_, _> = get_all_categories(connection)?
        .into_iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();

    let transactions: Vec<Transaction> = connection
        .prepare(
            "SELECT id, amount, kind, date, description, notes, affects_balance, import_id,
                account_id, category_id
            FROM \"transaction\"
            ORDER BY date ASC, id ASC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::from))
        .collect::<Result<_, _>>()?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(CSV_HEADER)
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    for transaction in transactions {
        let account_name = account_names
            .get(&transaction.account_id)
            .cloned()
            .unwrap_or_default();
        let category_name = transaction
            .category_id
            .and_then(|id| category_names.get(&id).cloned())
            .unwrap_or_default();

        writer
            .write_record([
                transaction.date.to_string().as_str(),
                &transaction.description,
                &format!("{:.2}", transaction.amount),
                transaction.kind.as_str(),
                &account_name,
                &category_name,
                &transaction.notes,
            ])
            .map_err(|error| Error::InvalidCSV(error.to_string()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    String::from_utf8(bytes).map_err(|error| Error::InvalidCSV(error.to_string()))
}

#[cfg(test)]
mod export_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
        test_utils::get_header,
        transaction::{Transaction, TransactionKind, create_transaction},
    };

    use super::{ExportState, export_transactions, write_transactions_csv};

    fn get_test_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 1000.0, 1000.0)",
                (),
            )
            .unwrap();
        connection
    }

    #[test]
    fn csv_has_header_and_one_row_per_transaction() {
        let connection = get_test_connection();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();

        let today = date!(2025 - 03 - 31);
        create_transaction(
            Transaction::build(30.0, TransactionKind::Expense, date!(2025 - 03 - 10), "apples", 1)
                .category_id(Some(1))
                .notes("weekly shop"),
            today,
            &connection,
        )
        .unwrap();
        create_transaction(
            Transaction::build(500.0, TransactionKind::Income, date!(2025 - 03 - 01), "pay", 1),
            today,
            &connection,
        )
        .unwrap();

        let csv_text = write_transactions_csv(&connection).unwrap();
        let lines: Vec<&str> = csv_text.trim_end().lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Description,Amount,Type,Account,Category,Notes");
        // Oldest transaction first.
        assert_eq!(lines[1], "2025-03-01,pay,500.00,income,Everyday,,");
        assert_eq!(
            lines[2],
            "2025-03-10,apples,30.00,expense,Everyday,Groceries,weekly shop"
        );
    }

    #[tokio::test]
    async fn response_is_a_csv_attachment() {
        let state = ExportState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
        };

        let response = export_transactions(State(state)).await.unwrap();

        assert_eq!(
            get_header(&response, "content-type"),
            "text/csv; charset=utf-8"
        );
        assert_eq!(
            get_header(&response, "content-disposition"),
            "attachment; filename=\"transactions.csv\""
        );
    }
}
