//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}/edit',
//! use [format_endpoint].

/// The root route which redirects to the dashboard or log in page.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The page for displaying transactions.
pub const TRANSACTIONS_VIEW: &str = "/transactions";
/// The page for creating a new transaction.
pub const NEW_TRANSACTION_VIEW: &str = "/transactions/new";
/// The page for editing an existing transaction.
pub const EDIT_TRANSACTION_VIEW: &str = "/transactions/{transaction_id}/edit";
/// The page for listing all accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for displaying a single account and its transactions.
pub const ACCOUNT_DETAIL_VIEW: &str = "/accounts/{account_id}";
/// The page for creating a new account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an existing account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The page for listing categories and creating new ones.
pub const CATEGORIES_VIEW: &str = "/categories";
/// The page for listing all tags.
pub const TAGS_VIEW: &str = "/tags";
/// The page for listing budgets and their progress.
pub const BUDGETS_VIEW: &str = "/budgets";
/// The page for editing an existing budget.
pub const EDIT_BUDGET_VIEW: &str = "/budgets/{budget_id}/edit";
/// The page for listing recurring rules.
pub const RECURRING_VIEW: &str = "/recurring";
/// The page for creating a new recurring rule.
pub const NEW_RECURRING_VIEW: &str = "/recurring/new";
/// The page for editing an existing recurring rule.
pub const EDIT_RECURRING_VIEW: &str = "/recurring/{rule_id}/edit";
/// The page for the investment portfolio.
pub const PORTFOLIO_VIEW: &str = "/portfolio";
/// The page for creating a new asset.
pub const NEW_ASSET_VIEW: &str = "/portfolio/assets/new";
/// The page for editing an existing asset.
pub const EDIT_ASSET_VIEW: &str = "/portfolio/assets/{asset_id}/edit";
/// The page showing the monthly expense report.
pub const REPORTS_VIEW: &str = "/reports";
/// The page for importing transactions from a CSV file.
pub const IMPORT_VIEW: &str = "/transactions/import";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for instructions for resetting the user's password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";

/// The route to request a cup of coffee (experimental).
pub const COFFEE: &str = "/api/coffee";
/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route to access users.
pub const USERS: &str = "/api/users";
/// The route to create a transaction.
pub const TRANSACTIONS_API: &str = "/api/transactions";
/// The route to update a transaction.
pub const PUT_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to delete a transaction.
pub const DELETE_TRANSACTION: &str = "/api/transactions/{transaction_id}";
/// The route to create an account.
pub const POST_ACCOUNT: &str = "/api/accounts";
/// The route to update an account.
pub const PUT_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to delete an account.
pub const DELETE_ACCOUNT: &str = "/api/accounts/{account_id}";
/// The route to create a category.
pub const POST_CATEGORY: &str = "/api/categories";
/// The route to delete a category.
pub const DELETE_CATEGORY: &str = "/api/categories/{category_id}";
/// The route to create a budget.
pub const POST_BUDGET: &str = "/api/budgets";
/// The route to update a budget.
pub const PUT_BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to delete a budget.
pub const DELETE_BUDGET: &str = "/api/budgets/{budget_id}";
/// The route to create a recurring rule.
pub const POST_RECURRING: &str = "/api/recurring";
/// The route to update a recurring rule.
pub const PUT_RECURRING: &str = "/api/recurring/{rule_id}";
/// The route to delete a recurring rule.
pub const DELETE_RECURRING: &str = "/api/recurring/{rule_id}";
/// The route to manually fire a recurring rule.
pub const FIRE_RECURRING: &str = "/api/recurring/{rule_id}/fire";
/// The route to create an asset.
pub const POST_ASSET: &str = "/api/portfolio/assets";
/// The route to update an asset.
pub const PUT_ASSET: &str = "/api/portfolio/assets/{asset_id}";
/// The route to delete an asset.
pub const DELETE_ASSET: &str = "/api/portfolio/assets/{asset_id}";
/// The route to create a holding.
pub const POST_HOLDING: &str = "/api/portfolio/holdings";
/// The route to delete a holding.
pub const DELETE_HOLDING: &str = "/api/portfolio/holdings/{holding_id}";
/// The route to download all transactions as a CSV file.
pub const EXPORT_TRANSACTIONS: &str = "/api/export/transactions";
/// The route to upload CSV files for importing transactions.
pub const IMPORT: &str = "/api/import";
/// The route for the expenses-by-category JSON summary.
pub const TRANSACTION_SUMMARY_API: &str = "/api/transaction_summary";
/// The route for the daily expense trend JSON data.
pub const DAILY_TREND_API: &str = "/api/daily_expense_trend";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}'
/// is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (index, character) in endpoint_path.char_indices() {
        match character {
            '{' => param_start = Some(index),
            '}' => {
                param_end = Some(index);
                break;
            }
            _ => {}
        }
    }

    match (param_start, param_end) {
        (Some(start), Some(end)) if start < end => {
            let mut formatted = String::with_capacity(endpoint_path.len());
            formatted.push_str(&endpoint_path[..start]);
            formatted.push_str(&id.to_string());
            formatted.push_str(&endpoint_path[end + 1..]);
            formatted
        }
        _ => endpoint_path.to_owned(),
    }
}

#[cfg(test)]
mod format_endpoint_tests {
    use super::format_endpoint;

    #[test]
    fn replaces_parameter_with_id() {
        let got = format_endpoint("/accounts/{account_id}/edit", 42);

        assert_eq!("/accounts/42/edit", got);
    }

    #[test]
    fn replaces_trailing_parameter() {
        let got = format_endpoint("/api/recurring/{rule_id}", 7);

        assert_eq!("/api/recurring/7", got);
    }

    #[test]
    fn returns_path_unchanged_without_parameter() {
        let got = format_endpoint("/transactions", 1);

        assert_eq!("/transactions", got);
    }
}
