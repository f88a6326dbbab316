//! Importing transactions from uploaded CSV files.
//!
//! Rows that were imported before (matched by import id) are skipped so
//! overlapping exports can be uploaded safely.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, Multipart, State, multipart::Field},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    account::get_all_accounts,
    alert::Alert,
    category::{CategoryId, CategoryName, create_category, get_all_categories},
    csv_import::csv::{CsvTransaction, parse_transactions_csv},
    transaction::{Transaction, insert_transaction},
};

/// The state needed for importing transactions.
#[derive(Debug, Clone)]
pub struct ImportState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ImportState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// What happened during an import.
struct ImportOutcome {
    imported: usize,
    skipped: usize,
}

/// Route handler for importing transactions from uploaded CSV files.
///
/// All files are imported in one database transaction, so a bad row in any
/// file aborts the whole upload.
pub async fn import_transactions(
    State(state): State<ImportState>,
    mut multipart: Multipart,
) -> Result<Response, Response> {
    let mut rows: Vec<CsvTransaction> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(error) => {
                tracing::error!("could not read multipart field: {error}");
                return Err(alert_response(
                    StatusCode::BAD_REQUEST,
                    "Upload failed",
                    "The uploaded form data could not be read.",
                ));
            }
        };

        let csv_data = parse_multipart_field(field).await.map_err(|error| match error {
            Error::NotCSV => {
                alert_response(StatusCode::BAD_REQUEST, "File type must be CSV.", "")
            }
            error => {
                tracing::error!("could not parse multipart field: {error}");
                error.into_alert_response()
            }
        })?;

        let parsed = parse_transactions_csv(&csv_data)
            .inspect_err(|error| tracing::debug!("could not parse CSV: {error}"))
            .map_err(|error| {
                let details = match error {
                    Error::InvalidCSV(reason) => reason,
                    _ => "Check that the file matches the export layout.".to_owned(),
                };
                alert_response(StatusCode::BAD_REQUEST, "Failed to parse CSV", &details)
            })?;

        rows.extend(parsed);
    }

    let connection = state.db_connection.lock().map_err(|error| {
        tracing::error!("could not acquire database lock: {error}");
        Error::DatabaseLockError.into_alert_response()
    })?;

    let outcome = run_import(rows, &connection).map_err(|error| match error {
        Error::InvalidCSV(reason) => {
            alert_response(StatusCode::BAD_REQUEST, "Failed to import CSV", &reason)
        }
        error => {
            tracing::error!("could not import transactions: {error}");
            alert_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Import failed",
                "An unexpected error occurred, please try again later.",
            )
        }
    })?;

    tracing::info!(
        "imported {} transaction(s), skipped {} duplicate(s)",
        outcome.imported,
        outcome.skipped
    );

    Ok((
        StatusCode::CREATED,
        Alert::Success {
            message: "Import completed successfully!".to_owned(),
            details: format!(
                "Imported {} transaction(s) and skipped {} duplicate(s).",
                outcome.imported, outcome.skipped
            ),
        }
        .into_markup(),
    )
        .into_response())
}

/// Insert the parsed rows inside one database transaction.
///
/// Rows whose import id already exists are skipped. Unknown account names
/// abort the import, unknown categories are created.
fn run_import(rows: Vec<CsvTransaction>, connection: &Connection) -> Result<ImportOutcome, Error> {
    let sql_transaction = connection.unchecked_transaction()?;

    let account_ids: HashMap<String, i64> = get_all_accounts(&sql_transaction)?
        .into_iter()
        .map(|account| (account.name.to_lowercase(), account.id))
        .collect();
    let mut category_ids: HashMap<String, CategoryId> = get_all_categories(&sql_transaction)?
        .into_iter()
        .map(|category| (category.name.to_string().to_lowercase(), category.id))
        .collect();

    let mut outcome = ImportOutcome {
        imported: 0,
        skipped: 0,
    };

    for row in rows {
        if import_id_exists(row.import_id, &sql_transaction)? {
            outcome.skipped += 1;
            continue;
        }

        let account_id = *account_ids.get(&row.account.to_lowercase()).ok_or_else(|| {
            Error::InvalidCSV(format!("there is no account named '{}'", row.account))
        })?;

        let category_id = match &row.category {
            Some(name) => Some(resolve_category(name, &mut category_ids, &sql_transaction)?),
            None => None,
        };

        insert_transaction(
            Transaction::build(row.amount, row.kind, row.date, &row.description, account_id)
                .notes(&row.notes)
                .category_id(category_id)
                .import_id(Some(row.import_id)),
            &sql_transaction,
        )?;
        outcome.imported += 1;
    }

    sql_transaction.commit()?;

    Ok(outcome)
}

fn import_id_exists(import_id: i64, connection: &Connection) -> Result<bool, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(1) FROM \"transaction\" WHERE import_id = ?1",
        [import_id],
        |row| row.get(0),
    )?;

    Ok(count > 0)
}

/// Look up a category by name, creating it when it does not exist yet.
fn resolve_category(
    name: &str,
    category_ids: &mut HashMap<String, CategoryId>,
    connection: &Connection,
) -> Result<CategoryId, Error> {
    if let Some(id) = category_ids.get(&name.to_lowercase()) {
        return Ok(*id);
    }

    let category = create_category(CategoryName::new(name)?, connection)?;
    category_ids.insert(name.to_lowercase(), category.id);

    Ok(category.id)
}

async fn parse_multipart_field(field: Field<'_>) -> Result<String, Error> {
    if field.content_type() != Some("text/csv") {
        return Err(Error::NotCSV);
    }

    let file_name = field.file_name().unwrap_or("<unnamed>").to_owned();

    let data = field.text().await.map_err(|error| {
        tracing::error!("could not read data from multipart form field: {error}");
        Error::MultipartError("Could not read data from multipart form field.".to_owned())
    })?;

    tracing::debug!("received file '{}' that is {} bytes", file_name, data.len());

    Ok(data)
}

fn alert_response(status: StatusCode, message: &str, details: &str) -> Response {
    (
        status,
        Alert::Error {
            message: message.to_owned(),
            details: details.to_owned(),
        }
        .into_markup(),
    )
        .into_response()
}

#[cfg(test)]
mod import_transactions_tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        extract::{FromRequest, Multipart, State},
        http::{Request, StatusCode},
        response::Response,
    };
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        endpoints,
        test_utils::{assert_content_type, assert_valid_html, parse_html_fragment},
        transaction::count_transactions,
    };

    use super::{ImportState, import_transactions};

    const VALID_CSV: &str = "Date,Description,Amount,Type,Account,Category,Notes\n\
        2025-03-01,pay,500.00,income,Everyday,,\n\
        2025-03-10,apples,30.00,expense,Everyday,Groceries,weekly shop";

    fn get_test_state() -> ImportState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 1000.0, 1000.0)",
                (),
            )
            .unwrap();

        ImportState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn imports_rows_and_reconciles_balances() {
        let state = get_test_state();

        let response = import_transactions(
            State(state.clone()),
            must_make_multipart_csv(&[VALID_CSV]).await,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_alert_message(response, "Import completed successfully!").await;

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 2);

        // 1000 + 500 income - 30 expense
        let balance: f64 = connection
            .query_row("SELECT balance FROM account WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(balance, 1470.0);

        // The category from the CSV was created on the fly.
        let category_count: i64 = connection
            .query_row(
                "SELECT COUNT(1) FROM category WHERE name = 'Groceries'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(category_count, 1);
    }

    #[tokio::test]
    async fn reimporting_the_same_rows_is_a_no_op() {
        let state = get_test_state();

        import_transactions(
            State(state.clone()),
            must_make_multipart_csv(&[VALID_CSV]).await,
        )
        .await
        .unwrap();
        let response = import_transactions(
            State(state.clone()),
            must_make_multipart_csv(&[VALID_CSV]).await,
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 2);

        // The balance was not changed by the duplicate upload.
        let balance: f64 = connection
            .query_row("SELECT balance FROM account WHERE id = 1", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(balance, 1470.0);
    }

    #[tokio::test]
    async fn unknown_account_aborts_the_whole_import() {
        let state = get_test_state();
        let csv = "Date,Description,Amount,Type,Account,Category,Notes\n\
            2025-03-01,pay,500.00,income,Everyday,,\n\
            2025-03-02,pay,500.00,income,No Such Account,,";

        let response = import_transactions(
            State(state.clone()),
            must_make_multipart_csv(&[csv]).await,
        )
        .await
        .unwrap_err();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_csv_renders_error_message() {
        let state = get_test_state();

        let response = import_transactions(
            State(state.clone()),
            must_make_multipart_csv(&["Date,Amount\n2025-03-01,5.00"]).await,
        )
        .await
        .unwrap_err();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_content_type(&response, "text/html; charset=utf-8");
        assert_alert_message(response, "Failed to parse CSV").await;

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_transactions(&connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn invalid_file_type_renders_error_message() {
        let state = get_test_state();

        let response = import_transactions(
            State(state.clone()),
            must_make_multipart(&["text/plain"]).await,
        )
        .await
        .unwrap_err();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_alert_message(response, "File type must be CSV.").await;
    }

    async fn assert_alert_message(response: Response, expected_message: &str) {
        let html = parse_html_fragment(response).await;
        assert_valid_html(&html);

        let message_selector = scraper::Selector::parse("[role='alert'] p.font-medium").unwrap();
        let message = html
            .select(&message_selector)
            .next()
            .expect("no alert message found")
            .text()
            .collect::<String>();

        assert_eq!(message.trim(), expected_message);
    }

    async fn must_make_multipart_csv(csv_strings: &[&str]) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";
        let boundary_start = format!("--{boundary}");
        let boundary_end = format!("--{boundary}--");

        let mut lines: Vec<&str> = Vec::new();

        for csv_string in csv_strings {
            lines.push(&boundary_start);
            lines.push("Content-Disposition: form-data; name=\"files\"; filename=\"export.csv\";");
            lines.push("Content-Type: text/csv");
            lines.push("");
            lines.push(csv_string);
        }

        lines.push(&boundary_end);

        let data = lines.join("\r\n").into_bytes();

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::IMPORT)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(data.into())
            .unwrap();

        Multipart::from_request(request, &{}).await.unwrap()
    }

    async fn must_make_multipart(file_types: &[&str]) -> Multipart {
        let boundary = "MY_BOUNDARY123456789";
        let boundary_start = format!("--{boundary}");
        let boundary_end = format!("--{boundary}--");

        let mut lines: Vec<String> = Vec::new();

        for file_type in file_types {
            lines.push(boundary_start.clone());
            lines.push(
                "Content-Disposition: form-data; name=\"files\"; filename=\"export.csv\";"
                    .to_owned(),
            );
            lines.push(format!("Content-Type: {file_type}"));
            lines.push("".to_owned());
            lines.push("foo".to_owned());
        }

        lines.push(boundary_end);

        let data = lines.join("\r\n").into_bytes();

        let request = Request::builder()
            .method("POST")
            .uri(endpoints::IMPORT)
            .header(
                "Content-Type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(data.into())
            .unwrap();

        Multipart::from_request(request, &{}).await.unwrap()
    }
}
