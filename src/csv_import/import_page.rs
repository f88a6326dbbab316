//! The page for uploading transaction CSV files.

use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, base, loading_spinner,
    },
    navigation::NavBar,
};

use crate::csv_export::CSV_HEADER;

/// Render the CSV import page.
pub async fn get_import_page() -> Response {
    import_view().into_response()
}

fn import_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="w-full max-w-lg mx-auto space-y-4"
            {
                h1 class="text-xl font-bold" { "Import transactions" }

                p class="text-sm text-gray-500 dark:text-gray-400"
                {
                    "Upload one or more CSV files with the columns "
                    code { (CSV_HEADER.join(",")) }
                    ", the same layout that "
                    a href=(endpoints::EXPORT_TRANSACTIONS) class=(LINK_STYLE) { "export" }
                    " produces. Rows that were imported before are skipped, so \
                    overlapping files are safe to upload."
                }

                form
                    hx-post=(endpoints::IMPORT)
                    enctype="multipart/form-data"
                    hx-disabled-elt="#files, #submit-button"
                    hx-indicator="#indicator"
                    hx-swap="none"
                    hx-target-error="#alert-container"
                {
                    div class="mb-4"
                    {
                        label for="files" class=(FORM_LABEL_STYLE) { "CSV files" }
                        input
                            type="file"
                            name="files"
                            id="files"
                            class=(FORM_TEXT_INPUT_STYLE)
                            accept="text/csv"
                            multiple
                            required;
                    }

                    button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
                    {
                        span id="indicator" class="htmx-indicator" { (loading_spinner()) }
                        "Import"
                    }
                }

                div id="alert-container" {}
            }
        }
    );

    base("Import Transactions", &[], &content)
}
