//! The dashboard, reports and summary API routes.

mod aggregation;
mod charts;
mod handlers;
mod reports;
mod summary_api;

pub use handlers::{DashboardState, get_dashboard_page};
pub use reports::{ReportsState, get_reports_page};
pub use summary_api::{SummaryApiState, get_daily_expense_trend, get_transaction_summary};
