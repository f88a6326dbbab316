//! JSON endpoints for category spending summaries and daily expense trends.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::{
    AppState, Error,
    dashboard::aggregation::{
        daily_totals, get_expenses_in_date_range, total_by_category,
    },
    timezone::local_date_today,
};

/// How many days the summaries cover when no explicit range is given.
const DEFAULT_PERIOD_DAYS: i64 = 30;

/// The state needed for the summary API endpoints.
#[derive(Debug, Clone)]
pub struct SummaryApiState {
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for SummaryApiState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Query parameters selecting the date range to summarize.
///
/// Both dates default to a thirty day window ending today.
#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub end_date: Option<Date>,
}

/// Total spending per category over a date range.
#[derive(Debug, Serialize)]
struct TransactionSummary {
    start_date: String,
    end_date: String,
    total: f64,
    categories: Vec<CategoryTotal>,
}

#[derive(Debug, Serialize)]
struct CategoryTotal {
    category: String,
    total: f64,
}

/// Expense totals per day over a date range.
#[derive(Debug, Serialize)]
struct DailyExpenseTrend {
    start_date: String,
    end_date: String,
    days: Vec<DayTotal>,
}

#[derive(Debug, Serialize)]
struct DayTotal {
    date: String,
    total: f64,
}

/// A JSON summary of spending per category over a date range.
pub async fn get_transaction_summary(
    State(state): State<SummaryApiState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, Error> {
    let (start_date, end_date) = match resolve_date_range(&query, &state.local_timezone)? {
        Ok(range) => range,
        Err(response) => return Ok(response),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_expenses_in_date_range(start_date..=end_date, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses for summary: {error}"))?;

    let categories: Vec<CategoryTotal> = total_by_category(&expenses)
        .into_iter()
        .map(|(category, total)| CategoryTotal { category, total })
        .collect();
    let total = categories.iter().map(|entry| entry.total).sum();

    Ok(Json(TransactionSummary {
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        total,
        categories,
    })
    .into_response())
}

/// A JSON series of daily expense totals over a date range, zero-filled so
/// every day in the range appears.
pub async fn get_daily_expense_trend(
    State(state): State<SummaryApiState>,
    Query(query): Query<DateRangeQuery>,
) -> Result<Response, Error> {
    let (start_date, end_date) = match resolve_date_range(&query, &state.local_timezone)? {
        Ok(range) => range,
        Err(response) => return Ok(response),
    };

    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let expenses = get_expenses_in_date_range(start_date..=end_date, &connection)
        .inspect_err(|error| tracing::error!("could not get expenses for trend: {error}"))?;

    let days = daily_totals(&expenses, start_date..=end_date)
        .into_iter()
        .map(|(date, total)| DayTotal {
            date: date.to_string(),
            total,
        })
        .collect();

    Ok(Json(DailyExpenseTrend {
        start_date: start_date.to_string(),
        end_date: end_date.to_string(),
        days,
    })
    .into_response())
}

/// Fill in default dates and reject inverted ranges with a JSON 400.
fn resolve_date_range(
    query: &DateRangeQuery,
    local_timezone: &str,
) -> Result<Result<(Date, Date), Response>, Error> {
    let today = local_date_today(local_timezone).ok_or_else(|| {
        tracing::error!("Invalid timezone {local_timezone}");
        Error::InvalidTimezoneError(local_timezone.to_owned())
    })?;

    let end_date = query.end_date.unwrap_or(today);
    let start_date = query
        .start_date
        .unwrap_or(end_date - Duration::days(DEFAULT_PERIOD_DAYS));

    if start_date > end_date {
        let response = (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "start_date must not be after end_date",
            })),
        )
            .into_response();

        return Ok(Err(response));
    }

    Ok(Ok((start_date, end_date)))
}
