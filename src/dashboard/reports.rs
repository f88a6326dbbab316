//! The reports page, a monthly expense summary grouped by category.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Duration;

use crate::{
    AppState, Error,
    dashboard::aggregation::{
        format_month_labels, get_expenses_in_date_range, get_sorted_months,
        monthly_totals_by_category,
    },
    endpoints,
    html::{
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE, base,
        format_currency,
    },
    navigation::NavBar,
    timezone::local_date_today,
};

/// How many days of history the report covers.
const REPORT_PERIOD_DAYS: i64 = 365;

/// The state needed for the reports page.
#[derive(Debug, Clone)]
pub struct ReportsState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for ReportsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display monthly expense totals per category for the last year.
pub async fn get_reports_page(State(state): State<ReportsState>) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let one_year_ago = today - Duration::days(REPORT_PERIOD_DAYS);
    let expenses = get_expenses_in_date_range(one_year_ago..=today, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses for report: {error}"))?;

    let sorted_months = get_sorted_months(&expenses);
    let month_labels = format_month_labels(&sorted_months);
    let rows = monthly_totals_by_category(&expenses, &sorted_months);

    Ok(reports_view(&month_labels, &rows).into_response())
}

fn reports_view(month_labels: &[String], rows: &[(String, Vec<Option<f64>>)]) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            h1 class="text-xl font-bold mb-4" { "Monthly Expenses by Category" }

            @if rows.is_empty() {
                p class="text-gray-500 dark:text-gray-400"
                {
                    "No expenses recorded in the last year."
                }
            } @else {
                div class="overflow-x-auto rounded-lg shadow"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                                @for label in month_labels {
                                    th scope="col" class={ (TABLE_CELL_STYLE) " text-right" }
                                    {
                                        (label)
                                    }
                                }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right font-bold" }
                                {
                                    "Total"
                                }
                            }
                        }

                        tbody
                        {
                            @for (category, monthly_totals) in rows {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    th
                                        scope="row"
                                        class={ (TABLE_CELL_STYLE)
                                            " font-medium text-gray-900 dark:text-white" }
                                    {
                                        (category)
                                    }

                                    @for total in monthly_totals {
                                        td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" }
                                        {
                                            @match total {
                                                Some(total) => { (format_currency(*total)) }
                                                None => { "—" }
                                            }
                                        }
                                    }

                                    @let row_total: f64 =
                                        monthly_totals.iter().flatten().sum();
                                    td
                                        class={ (TABLE_CELL_STYLE)
                                            " text-right tabular-nums font-bold" }
                                    {
                                        (format_currency(row_total))
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    base("Reports", &[], &content)
}
