//! Monthly spending limits per category.

mod budgets_page;
mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;

pub use budgets_page::get_budgets_page;
pub use core::{
    Budget, BudgetId, create_budget, create_budget_table, delete_budget, get_budget,
    get_budgets_for_month, parse_month_input, progress_percent, spent_in_category_for_month,
    update_budget,
};
pub use create_endpoint::create_budget_endpoint;
pub use delete_endpoint::delete_budget_endpoint;
pub use edit_endpoint::update_budget_endpoint;
pub use edit_page::get_edit_budget_page;
