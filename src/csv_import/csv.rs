//! Parsing CSV files in the transaction export layout.

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::{Error, csv_export::CSV_HEADER, transaction::TransactionKind};

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// One transaction parsed from a CSV row, not yet resolved against the
/// database.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct CsvTransaction {
    pub date: Date,
    pub description: String,
    pub amount: f64,
    pub kind: TransactionKind,
    pub account: String,
    pub category: Option<String>,
    pub notes: String,
    /// Hash of the raw row, used to skip rows that were imported before.
    pub import_id: i64,
}

/// Parse CSV text in the export layout
/// (`Date,Description,Amount,Type,Account,Category,Notes`).
///
/// Returns [Error::InvalidCSV] if the header or any row does not match the
/// expected layout.
pub(super) fn parse_transactions_csv(text: &str) -> Result<Vec<CsvTransaction>, Error> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|error| Error::InvalidCSV(error.to_string()))?;

    if headers.iter().ne(CSV_HEADER) {
        return Err(Error::InvalidCSV(format!(
            "expected the header '{}', got '{}'",
            CSV_HEADER.join(","),
            headers.iter().collect::<Vec<_>>().join(",")
        )));
    }

    let mut transactions = Vec::new();

    for (line_number, record) in reader.records().enumerate() {
        let record = record.map_err(|error| Error::InvalidCSV(error.to_string()))?;
        let row_text = record.iter().collect::<Vec<_>>().join(",");

        let transaction = parse_record(&record).map_err(|reason| {
            Error::InvalidCSV(format!("row {}: {reason}", line_number + 2))
        })?;

        transactions.push(CsvTransaction {
            import_id: create_import_id(&row_text),
            ..transaction
        });
    }

    Ok(transactions)
}

fn parse_record(record: &csv::StringRecord) -> Result<CsvTransaction, String> {
    if record.len() != CSV_HEADER.len() {
        return Err(format!(
            "expected {} columns, got {}",
            CSV_HEADER.len(),
            record.len()
        ));
    }

    let date = Date::parse(&record[0], DATE_FORMAT)
        .map_err(|error| format!("'{}' is not a valid date: {error}", &record[0]))?;

    let amount: f64 = record[2]
        .parse()
        .map_err(|_| format!("'{}' is not a valid amount", &record[2]))?;

    if !amount.is_finite() || amount <= 0.0 {
        return Err(format!("the amount must be a positive number, got {amount}"));
    }

    let kind = TransactionKind::from_db_string(&record[3].to_lowercase())
        .map_err(|_| format!("'{}' is not a valid transaction type", &record[3]))?;

    let account = record[4].trim().to_owned();

    if account.is_empty() {
        return Err("the account name must not be empty".to_owned());
    }

    let category = Some(record[5].trim())
        .filter(|name| !name.is_empty())
        .map(str::to_owned);

    Ok(CsvTransaction {
        date,
        description: record[1].to_owned(),
        amount,
        kind,
        account,
        category,
        notes: record[6].to_owned(),
        // Filled in by the caller from the raw row text.
        import_id: 0,
    })
}

/// Hash a CSV row into an import id.
///
/// Not sure how likely collisions are, should be fine ¯\_(ツ)_/¯
pub(super) fn create_import_id(row_text: &str) -> i64 {
    let hash_128 = md5::compute(row_text);
    let mut hash_64 = [0; 8];
    hash_64.copy_from_slice(&hash_128[0..8]);
    i64::from_le_bytes(hash_64)
}

#[cfg(test)]
mod parse_csv_tests {
    use time::macros::date;

    use crate::transaction::TransactionKind;

    use super::{create_import_id, parse_transactions_csv};

    const VALID_CSV: &str = "Date,Description,Amount,Type,Account,Category,Notes\n\
        2025-03-01,pay,500.00,income,Everyday,,\n\
        2025-03-10,apples,30.00,expense,Everyday,Groceries,weekly shop";

    #[test]
    fn parses_rows_in_export_layout() {
        let transactions = parse_transactions_csv(VALID_CSV).unwrap();

        assert_eq!(transactions.len(), 2);

        assert_eq!(transactions[0].date, date!(2025 - 03 - 01));
        assert_eq!(transactions[0].description, "pay");
        assert_eq!(transactions[0].amount, 500.0);
        assert_eq!(transactions[0].kind, TransactionKind::Income);
        assert_eq!(transactions[0].account, "Everyday");
        assert_eq!(transactions[0].category, None);

        assert_eq!(transactions[1].kind, TransactionKind::Expense);
        assert_eq!(transactions[1].category, Some("Groceries".to_owned()));
        assert_eq!(transactions[1].notes, "weekly shop");
    }

    #[test]
    fn import_ids_are_stable_and_distinct() {
        let transactions = parse_transactions_csv(VALID_CSV).unwrap();
        let reparsed = parse_transactions_csv(VALID_CSV).unwrap();

        assert_eq!(transactions[0].import_id, reparsed[0].import_id);
        assert_ne!(transactions[0].import_id, transactions[1].import_id);
    }

    #[test]
    fn rejects_wrong_header() {
        let result = parse_transactions_csv("Date,Amount\n2025-03-01,5.00");

        assert!(result.is_err());
    }

    #[test]
    fn rejects_bad_amount() {
        let csv = "Date,Description,Amount,Type,Account,Category,Notes\n\
            2025-03-01,pay,lots,income,Everyday,,";

        assert!(parse_transactions_csv(csv).is_err());
    }

    #[test]
    fn rejects_non_positive_amount() {
        let csv = "Date,Description,Amount,Type,Account,Category,Notes\n\
            2025-03-01,pay,-5.00,income,Everyday,,";

        assert!(parse_transactions_csv(csv).is_err());
    }

    #[test]
    fn rejects_missing_account() {
        let csv = "Date,Description,Amount,Type,Account,Category,Notes\n\
            2025-03-01,pay,5.00,income,,,";

        assert!(parse_transactions_csv(csv).is_err());
    }

    #[test]
    fn import_id_is_a_hash_of_the_row() {
        assert_eq!(
            create_import_id("2025-03-01,pay,500.00,income,Everyday,,"),
            create_import_id("2025-03-01,pay,500.00,income,Everyday,,"),
        );
        assert_ne!(
            create_import_id("2025-03-01,pay,500.00,income,Everyday,,"),
            create_import_id("2025-03-02,pay,500.00,income,Everyday,,"),
        );
    }
}
