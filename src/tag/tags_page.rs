//! Tags listing page.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;

use crate::{
    AppState, Error, endpoints,
    html::{
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        TAG_BADGE_STYLE, base,
    },
    navigation::NavBar,
};

use super::core::{Tag, TagId, get_all_tags};

/// The state needed for the tags listing page.
#[derive(Debug, Clone)]
pub struct TagsPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for TagsPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A tag with its usage count for template rendering.
#[derive(Debug, Clone)]
struct TagRow {
    tag: Tag,
    transaction_count: u32,
}

/// Render the tags listing page with transaction counts.
///
/// Tags are created from the transaction forms, so this page is read-only.
pub async fn get_tags_page(State(state): State<TagsPageState>) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let tags = get_all_tags(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve tags: {error}"))?;

    let transactions_per_tag = count_transactions_per_tag(&connection)
        .inspect_err(|error| tracing::error!("Could not count transactions per tag: {error}"))?;

    let rows = tags
        .into_iter()
        .map(|tag| {
            let transaction_count = *transactions_per_tag.get(&tag.id).unwrap_or(&0);

            TagRow {
                tag,
                transaction_count,
            }
        })
        .collect::<Vec<_>>();

    Ok(tags_view(&rows).into_response())
}

fn count_transactions_per_tag(connection: &Connection) -> Result<HashMap<TagId, u32>, Error> {
    let result: Result<HashMap<TagId, u32>, rusqlite::Error> = connection
        .prepare("SELECT tag_id, COUNT(1) FROM transaction_tag GROUP BY tag_id")?
        .query_map((), |row| {
            let tag_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((tag_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

fn tags_view(tags: &[TagRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::TAGS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="space-y-4"
            {
                header class="flex justify-between flex-wrap items-end"
                {
                    h1 class="text-xl font-bold" { "Tags" }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Tags are created from the transaction forms. \
                    Add a comma separated list of tags when creating or editing a transaction."
                }

                section class="w-full overflow-x-auto dark:bg-gray-800 lg:max-w-5xl lg:mx-auto"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                            }
                        }

                        tbody
                        {
                            @for row in tags {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        span class=(TAG_BADGE_STYLE) { (row.tag.name) }
                                    }

                                    td class=(TABLE_CELL_STYLE) { (row.transaction_count) }
                                }
                            }

                            @if tags.is_empty() {
                                tr
                                {
                                    td
                                        colspan="2"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No tags yet. Tag a transaction to see it here."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Tags", &[], &content)
}

#[cfg(test)]
mod tags_page_tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use rusqlite::Connection;
    use scraper::Selector;

    use crate::{
        db::initialize,
        tag::process_tags,
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{TagsPageState, get_tags_page};

    fn get_test_state() -> TagsPageState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();

        TagsPageState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn page_lists_tags_with_counts() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
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
            process_tags("holiday", 1, &connection).unwrap();
            process_tags("holiday, work", 2, &connection).unwrap();
        }

        let response = get_tags_page(State(state)).await.unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);

        let row_selector = Selector::parse("tbody tr").unwrap();
        let rows = document.select(&row_selector).collect::<Vec<_>>();
        assert_eq!(rows.len(), 2, "want 2 table rows, got {}", rows.len());

        let holiday_row_text = rows[0].text().collect::<String>();
        assert!(holiday_row_text.contains("holiday"));
        assert!(holiday_row_text.contains('2'));
    }

    #[tokio::test]
    async fn page_shows_empty_state() {
        let state = get_test_state();

        let response = get_tags_page(State(state)).await.unwrap();

        let document = parse_html_document(response).await;
        let body_text = document.root_element().text().collect::<String>();
        assert!(body_text.contains("No tags yet"));
    }
}
