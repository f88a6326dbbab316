//! The dashboard page, the landing page for logged in users.
//!
//! Shows account balances, current-month budget progress, the most recent
//! transactions and an expenses-by-category chart.

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
use time::Date;

use crate::{
    AppState, Error,
    account::{Account, get_all_accounts, get_total_account_balance},
    budget::{
        get_budgets_for_month, progress_percent, spent_in_category_for_month,
    },
    category::{get_all_categories, get_category},
    dashboard::{
        aggregation::{
            UNCATEGORIZED_LABEL, get_expenses_in_date_range, total_by_category,
        },
        charts::{DashboardChart, charts_script, expenses_by_category_chart},
    },
    endpoints,
    html::{
        HeadElement, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency, link,
    },
    navigation::NavBar,
    timezone::local_date_today,
    transaction::{TransactionKind, count_transactions, query_transactions_page},
};

/// How many transactions to show in the recent transactions table.
const RECENT_TRANSACTION_COUNT: u64 = 10;

/// The state needed for the dashboard page.
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for DashboardState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// A budget with its progress resolved for rendering.
struct BudgetProgress {
    category_name: String,
    spent: f64,
    limit: f64,
    percent: f64,
}

/// A recent transaction with its account and category names resolved.
struct RecentTransaction {
    date: String,
    description: String,
    signed_amount: f64,
    account_name: String,
    category_name: String,
}

/// Display a page with an overview of the user's data.
pub async fn get_dashboard_page(State(state): State<DashboardState>) -> Result<Response, Error> {
    let today = local_date_today(&state.local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {}", state.local_timezone);
        Error::InvalidTimezoneError(state.local_timezone.clone())
    })?;

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW);

    if count_transactions(&connection)? == 0 {
        return Ok(dashboard_no_data_view(nav_bar).into_response());
    }

    let accounts = get_all_accounts(&connection)
        .inspect_err(|error| tracing::error!("could not get accounts: {error}"))?;
    let total_balance = get_total_account_balance(&connection)?;

    let budgets = budget_progress_for_month(today, &connection)?;
    let recent = recent_transactions(&connection)?;

    let month_start = today.replace_day(1).expect("day 1 is valid in every month");
    let expenses = get_expenses_in_date_range(month_start..=today, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses for chart: {error}"))?;
    let category_totals = total_by_category(&expenses);

    let chart = (!category_totals.is_empty()).then(|| DashboardChart {
        id: "expenses-chart",
        options: expenses_by_category_chart(&category_totals).to_string(),
    });

    Ok(
        dashboard_view(nav_bar, total_balance, &accounts, &budgets, &recent, chart)
            .into_response(),
    )
}

/// Resolve the current month's budgets with progress.
fn budget_progress_for_month(
    today: Date,
    connection: &Connection,
) -> Result<Vec<BudgetProgress>, Error> {
    let month = today.month() as u8;
    let year = today.year();

    let budgets = get_budgets_for_month(month, year, connection)
        .inspect_err(|error| tracing::error!("could not get budgets: {error}"))?;

    let mut rows = Vec::with_capacity(budgets.len());
    for budget in budgets {
        let category = get_category(budget.category_id, connection)?;
        let spent = spent_in_category_for_month(budget.category_id, month, year, connection)?;

        rows.push(BudgetProgress {
            percent: progress_percent(spent, budget.amount),
            category_name: category.name.to_string(),
            spent,
            limit: budget.amount,
        });
    }

    Ok(rows)
}

/// Fetch the newest transactions with account and category names resolved.
fn recent_transactions(connection: &Connection) -> Result<Vec<RecentTransaction>, Error> {
    let account_names: HashMap<_, _> = get_all_accounts(connection)?
        .into_iter()
        .map(|account| (account.id, account.name))
        .collect();
    let category_names: HashMap<_, _> = get_all_categories(connection)?
        .into_iter()
        .map(|category| (category.id, category.name.to_string()))
        .collect();

    let transactions = query_transactions_page(RECENT_TRANSACTION_COUNT, 0, connection)
        .inspect_err(|error| tracing::error!("could not get recent transactions: {error}"))?;

    let rows = transactions
        .into_iter()
        .map(|transaction| {
            let signed_amount = match transaction.kind {
                TransactionKind::Income => transaction.amount,
                TransactionKind::Expense => -transaction.amount,
            };

            RecentTransaction {
                date: transaction.date.to_string(),
                description: transaction.description,
                signed_amount,
                account_name: account_names
                    .get(&transaction.account_id)
                    .cloned()
                    .unwrap_or_default(),
                category_name: transaction
                    .category_id
                    .and_then(|id| category_names.get(&id).cloned())
                    .unwrap_or_else(|| UNCATEGORIZED_LABEL.to_owned()),
            }
        })
        .collect();

    Ok(rows)
}

/// Renders the dashboard page when no transaction data exists.
fn dashboard_no_data_view(nav_bar: NavBar) -> Markup {
    let nav_bar = nav_bar.into_html();
    let new_transaction_link = link(endpoints::NEW_TRANSACTION_VIEW, "manually");
    let import_transaction_link = link(endpoints::IMPORT_VIEW, "importing");

    let content = html!(
        (nav_bar)

        div class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your balances, budgets and charts will show up here once you
                add some transactions. You can add transactions "
                (new_transaction_link) " or by " (import_transaction_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn dashboard_view(
    nav_bar: NavBar,
    total_balance: f64,
    accounts: &[Account],
    budgets: &[BudgetProgress],
    recent: &[RecentTransaction],
    chart: Option<DashboardChart>,
) -> Markup {
    let nav_bar = nav_bar.into_html();

    let content = html!(
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            section class="mb-8"
            {
                h2 class="text-xl font-semibold mb-4" { "Balances" }

                div
                    class="rounded border border-gray-200 bg-white px-4 py-3 mb-4 shadow-sm
                        dark:border-gray-700 dark:bg-gray-800"
                {
                    span class="text-sm text-gray-500 dark:text-gray-400" { "Total balance" }
                    p class="text-2xl font-bold tabular-nums" { (format_currency(total_balance)) }
                }

                ul class="grid grid-cols-1 md:grid-cols-2 xl:grid-cols-3 gap-4"
                {
                    @for account in accounts {
                        li
                            class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm
                                dark:border-gray-700 dark:bg-gray-800"
                        {
                            div class="flex items-center justify-between gap-3"
                            {
                                div
                                {
                                    span class="font-medium text-gray-900 dark:text-white"
                                    {
                                        (account.name)
                                    }
                                    p class="text-xs text-gray-500 dark:text-gray-400"
                                    {
                                        (account.kind.display_name())
                                    }
                                }

                                span class="tabular-nums" { (format_currency(account.balance)) }
                            }
                        }
                    }
                }
            }

            @if !budgets.is_empty() {
                section class="mb-8"
                {
                    h2 class="text-xl font-semibold mb-4"
                    {
                        (link(endpoints::BUDGETS_VIEW, "Budgets this month"))
                    }

                    ul class="space-y-3"
                    {
                        @for budget in budgets {
                            (budget_progress_bar(budget))
                        }
                    }
                }
            }

            @if let Some(chart) = &chart {
                section class="mb-8"
                {
                    div
                        id=(chart.id)
                        class="min-h-[380px] rounded dark:bg-gray-100"
                    {}
                }
            }

            section
            {
                h2 class="text-xl font-semibold mb-4"
                {
                    (link(endpoints::TRANSACTIONS_VIEW, "Recent Transactions"))
                }

                div class="overflow-x-auto rounded-lg shadow"
                {
                    table class="w-full text-sm text-left text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class={ (TABLE_CELL_STYLE) " text-right" } { "Amount" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Category" }
                            }
                        }

                        tbody
                        {
                            @for transaction in recent {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td class=(TABLE_CELL_STYLE) { (transaction.date) }
                                    td class=(TABLE_CELL_STYLE) { (transaction.description) }
                                    td class={ (TABLE_CELL_STYLE) " text-right tabular-nums" }
                                    {
                                        (format_currency(transaction.signed_amount))
                                    }
                                    td class=(TABLE_CELL_STYLE) { (transaction.account_name) }
                                    td class=(TABLE_CELL_STYLE) { (transaction.category_name) }
                                }
                            }
                        }
                    }
                }
            }
        }
    );

    let head_elements: Vec<HeadElement> = match chart {
        Some(chart) => vec![
            HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
            charts_script(&[chart]),
        ],
        None => Vec::new(),
    };

    base("Dashboard", &head_elements, &content)
}

fn budget_progress_bar(budget: &BudgetProgress) -> Markup {
    // Cap the bar width, overspending is shown by color instead.
    let bar_width = budget.percent.min(100.0);
    let bar_color = if budget.percent > 100.0 {
        "bg-red-500"
    } else if budget.percent > 80.0 {
        "bg-yellow-400"
    } else {
        "bg-blue-500"
    };

    html!(
        li
            class="rounded border border-gray-200 bg-white px-4 py-3 shadow-sm
                dark:border-gray-700 dark:bg-gray-800 space-y-2"
        {
            div class="flex items-start justify-between gap-3"
            {
                span class="font-medium text-gray-900 dark:text-white"
                {
                    (budget.category_name)
                }

                span class="text-sm tabular-nums text-gray-500 dark:text-gray-400"
                {
                    (format_currency(budget.spent))
                    " of "
                    (format_currency(budget.limit))
                    " (" (format!("{:.0}%", budget.percent)) ")"
                }
            }

            div class="w-full h-2 rounded bg-gray-200 dark:bg-gray-700"
            {
                div
                    class={ "h-2 rounded " (bar_color) }
                    style={ "width: " (format!("{bar_width:.0}")) "%" } {}
            }
        }
    )
}
