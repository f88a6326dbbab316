//! Core tag domain types and database operations.
//!
//! Tags are free-form labels attached to transactions through a join table.
//! They are created implicitly, the transaction forms accept a comma
//! separated list and [process_tags] finds or creates each one.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{Error, transaction::TransactionId};

/// Database identifier for a tag.
pub type TagId = i64;

/// A free-form label for transactions (e.g., 'holiday', 'work').
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct Tag {
    /// The tag's database ID.
    pub id: TagId,
    /// The tag's name.
    pub name: String,
}

/// Initialize the tag table and the transaction-tag join table.
pub fn create_tag_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS tag (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE COLLATE NOCASE
        );

        CREATE TABLE IF NOT EXISTS transaction_tag (
            transaction_id INTEGER NOT NULL REFERENCES \"transaction\"(id) ON DELETE CASCADE,
            tag_id INTEGER NOT NULL REFERENCES tag(id) ON DELETE CASCADE,
            PRIMARY KEY (transaction_id, tag_id)
        );",
    )?;

    Ok(())
}

/// Attach the tags in `tag_list` to the transaction with `transaction_id`.
///
/// `tag_list` is a comma separated string such as "holiday, work". Each name
/// is trimmed, empty entries are skipped, and names are matched
/// case-insensitively against existing tags. Missing tags are created.
///
/// Any tags previously attached to the transaction are replaced.
pub fn process_tags(
    tag_list: &str,
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Tag>, Error> {
    connection.execute(
        "DELETE FROM transaction_tag WHERE transaction_id = ?1",
        [transaction_id],
    )?;

    let mut tags = Vec::new();

    for name in tag_list.split(',') {
        let name = name.trim();

        if name.is_empty() {
            continue;
        }

        let tag = find_or_create_tag(name, connection)?;

        // INSERT OR IGNORE keeps duplicate entries in the list harmless.
        connection.execute(
            "INSERT OR IGNORE INTO transaction_tag (transaction_id, tag_id) VALUES (?1, ?2)",
            [transaction_id, tag.id],
        )?;

        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    Ok(tags)
}

fn find_or_create_tag(name: &str, connection: &Connection) -> Result<Tag, Error> {
    let existing = connection
        .prepare("SELECT id, name FROM tag WHERE name = ?1")?
        .query_row([name], map_row);

    match existing {
        Ok(tag) => Ok(tag),
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            connection.execute("INSERT INTO tag (name) VALUES (?1)", [name])?;

            Ok(Tag {
                id: connection.last_insert_rowid(),
                name: name.to_string(),
            })
        }
        Err(error) => Err(error.into()),
    }
}

/// Retrieve the tags attached to a transaction, ordered by name.
pub fn tags_for_transaction(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<Tag>, Error> {
    connection
        .prepare(
            "SELECT tag.id, tag.name FROM tag
            INNER JOIN transaction_tag ON transaction_tag.tag_id = tag.id
            WHERE transaction_tag.transaction_id = ?1
            ORDER BY tag.name ASC",
        )?
        .query_map([transaction_id], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

/// Retrieve all tags ordered alphabetically by name.
pub fn get_all_tags(connection: &Connection) -> Result<Vec<Tag>, Error> {
    connection
        .prepare("SELECT id, name FROM tag ORDER BY name ASC")?
        .query_map([], map_row)?
        .map(|maybe_tag| maybe_tag.map_err(|error| error.into()))
        .collect()
}

fn map_row(row: &Row) -> Result<Tag, rusqlite::Error> {
    Ok(Tag {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

#[cfg(test)]
mod tag_tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    use super::{get_all_tags, process_tags, tags_for_transaction};

    fn get_test_db_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        connection
            .execute(
                "INSERT INTO account (name, kind, initial_balance, balance)
                VALUES ('Everyday', 'checking', 0.0, 0.0)",
                (),
            )
            .unwrap();
        connection
            .execute(
                "INSERT INTO \"transaction\"
                    (amount, kind, date, description, affects_balance, account_id)
                VALUES
                    (10.0, 'expense', '2025-01-01', 'flights', 1, 1),
                    (20.0, 'expense', '2025-01-02', 'hotel', 1, 1)",
                (),
            )
            .unwrap();

        connection
    }

    #[test]
    fn process_tags_creates_missing_tags() {
        let connection = get_test_db_connection();

        let tags = process_tags("holiday, work", 1, &connection).unwrap();

        assert_eq!(tags.len(), 2);
        assert_eq!(tags[0].name, "holiday");
        assert_eq!(tags[1].name, "work");
        assert_eq!(get_all_tags(&connection).unwrap().len(), 2);
    }

    #[test]
    fn process_tags_reuses_existing_tags_case_insensitively() {
        let connection = get_test_db_connection();
        process_tags("Holiday", 1, &connection).unwrap();

        let tags = process_tags("holiday", 2, &connection).unwrap();

        assert_eq!(tags.len(), 1);
        assert_eq!(get_all_tags(&connection).unwrap().len(), 1);
    }

    #[test]
    fn process_tags_skips_empty_and_duplicate_entries() {
        let connection = get_test_db_connection();

        let tags = process_tags("holiday, , holiday,", 1, &connection).unwrap();

        assert_eq!(tags.len(), 1);
        assert_eq!(tags_for_transaction(1, &connection).unwrap().len(), 1);
    }

    #[test]
    fn process_tags_replaces_previous_tags() {
        let connection = get_test_db_connection();
        process_tags("old", 1, &connection).unwrap();

        process_tags("new", 1, &connection).unwrap();

        let tags = tags_for_transaction(1, &connection).unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "new");
    }

    #[test]
    fn tags_for_transaction_only_returns_attached_tags() {
        let connection = get_test_db_connection();
        process_tags("holiday", 1, &connection).unwrap();
        process_tags("work", 2, &connection).unwrap();

        let tags = tags_for_transaction(1, &connection).unwrap();

        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].name, "holiday");
    }
}
