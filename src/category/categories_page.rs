//! Categories listing page with an inline creation form.

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
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
    },
    navigation::NavBar,
};

use super::core::{Category, CategoryId, get_all_categories};

/// The state needed for the categories page.
#[derive(Debug, Clone)]
pub struct CategoriesPageState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CategoriesPageState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A category with its transaction count for template rendering.
#[derive(Debug, Clone)]
struct CategoryRow {
    category: Category,
    transaction_count: u32,
}

/// Render the categories page with transaction counts.
pub async fn get_categories_page(
    State(state): State<CategoriesPageState>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let categories = get_all_categories(&connection)
        .inspect_err(|error| tracing::error!("Failed to retrieve categories: {error}"))?;

    let transactions_per_category = count_transactions_per_category(&connection)
        .inspect_err(|error| {
            tracing::error!("Could not count transactions per category: {error}")
        })?;

    let rows = categories
        .into_iter()
        .map(|category| {
            let transaction_count = *transactions_per_category.get(&category.id).unwrap_or(&0);

            CategoryRow {
                category,
                transaction_count,
            }
        })
        .collect::<Vec<_>>();

    Ok(categories_view(&rows).into_response())
}

fn count_transactions_per_category(
    connection: &Connection,
) -> Result<HashMap<CategoryId, u32>, Error> {
    let result: Result<HashMap<CategoryId, u32>, rusqlite::Error> = connection
        .prepare(
            "SELECT category_id, COUNT(1) FROM \"transaction\"
            WHERE category_id IS NOT NULL
            GROUP BY category_id",
        )?
        .query_map((), |row| {
            let category_id = row.get(0)?;
            let count = row.get(1)?;

            Ok((category_id, count))
        })?
        .collect();

    result.map_err(Error::from)
}

fn categories_view(categories: &[CategoryRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::CATEGORIES_VIEW).into_html();

    let table_row = |row: &CategoryRow| {
        let delete_url = endpoints::format_endpoint(endpoints::DELETE_CATEGORY, row.category.id);
        let confirm_message = format!(
            "Are you sure you want to delete '{}'? {} transaction(s) will be left uncategorized.",
            row.category.name, row.transaction_count
        );

        html!(
            tr class=(TABLE_ROW_STYLE)
            {
                td class=(TABLE_CELL_STYLE)
                {
                    (row.category.name)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    (row.transaction_count)
                }

                td class=(TABLE_CELL_STYLE)
                {
                    button
                        class="font-medium text-red-600 dark:text-red-500 hover:underline
                            cursor-pointer"
                        hx-delete=(delete_url)
                        hx-confirm=(confirm_message)
                        hx-target="closest tr"
                        hx-swap="delete"
                    {
                        "Delete"
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
                    h1 class="text-xl font-bold" { "Categories" }
                }

                form
                    class="flex gap-2 items-end"
                    hx-post=(endpoints::POST_CATEGORY)
                    hx-target-error="#alert-container"
                {
                    div class="grow"
                    {
                        label for="name" class=(FORM_LABEL_STYLE)
                        {
                            "New category"
                        }
                        input
                            type="text"
                            name="name"
                            id="name"
                            class=(FORM_TEXT_INPUT_STYLE)
                            placeholder="e.g. Groceries"
                            required;
                    }

                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Transactions" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in categories {
                                (table_row(row))
                            }

                            @if categories.is_empty() {
                                tr
                                {
                                    td
                                        colspan="3"
                                        class="px-6 py-4 text-center
                                            text-gray-500 dark:text-gray-400"
                                    {
                                        "No categories created yet. \
                                        Use the form above to create your first category."
                                    }
                                }
                            }
                        }
                    }
                }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Looking for free-form labels? See "
                    a href=(endpoints::TAGS_VIEW) class=(LINK_STYLE) { "tags" }
                    "."
                }
            }
        }
    );

    base("Categories", &[], &content)
}
