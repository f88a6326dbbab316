//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        create_account_endpoint, delete_account_endpoint, edit_account_endpoint,
        get_account_detail_page, get_accounts_page, get_create_account_page, get_edit_account_page,
    },
    auth::{auth_guard, auth_guard_hx},
    budget::{
        create_budget_endpoint, delete_budget_endpoint, get_budgets_page, get_edit_budget_page,
        update_budget_endpoint,
    },
    category::{create_category_endpoint, delete_category_endpoint, get_categories_page},
    csv_export::export_transactions,
    csv_import::{get_import_page, import_transactions},
    dashboard::{
        get_daily_expense_trend, get_dashboard_page, get_reports_page, get_transaction_summary,
    },
    endpoints,
    forgot_password::get_forgot_password_page,
    internal_server_error::get_internal_server_error_page,
    log_in::{get_log_in_page, post_log_in},
    log_out::get_log_out,
    not_found::get_404_not_found,
    portfolio::{
        create_asset_endpoint, create_holding_endpoint, delete_asset_endpoint,
        delete_holding_endpoint, get_create_asset_page, get_edit_asset_page, get_portfolio_page,
        update_asset_endpoint,
    },
    recurring::{
        create_recurring_endpoint, delete_recurring_endpoint, fire_recurring_endpoint,
        get_create_recurring_page, get_edit_recurring_page, get_recurring_page,
        update_recurring_endpoint,
    },
    register_user::{get_register_page, register_user},
    tag::get_tags_page,
    transaction::{
        create_transaction_endpoint, delete_transaction_endpoint, get_create_transaction_page,
        get_edit_transaction_page, get_transactions_page, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::USERS, post(register_user))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::TRANSACTIONS_VIEW, get(get_transactions_page))
        .route(
            endpoints::NEW_TRANSACTION_VIEW,
            get(get_create_transaction_page),
        )
        .route(
            endpoints::EDIT_TRANSACTION_VIEW,
            get(get_edit_transaction_page),
        )
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_create_account_page))
        .route(endpoints::ACCOUNT_DETAIL_VIEW, get(get_account_detail_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::CATEGORIES_VIEW, get(get_categories_page))
        .route(endpoints::TAGS_VIEW, get(get_tags_page))
        .route(endpoints::BUDGETS_VIEW, get(get_budgets_page))
        .route(endpoints::EDIT_BUDGET_VIEW, get(get_edit_budget_page))
        .route(endpoints::RECURRING_VIEW, get(get_recurring_page))
        .route(
            endpoints::NEW_RECURRING_VIEW,
            get(get_create_recurring_page),
        )
        .route(endpoints::EDIT_RECURRING_VIEW, get(get_edit_recurring_page))
        .route(endpoints::PORTFOLIO_VIEW, get(get_portfolio_page))
        .route(endpoints::NEW_ASSET_VIEW, get(get_create_asset_page))
        .route(endpoints::EDIT_ASSET_VIEW, get(get_edit_asset_page))
        .route(endpoints::IMPORT_VIEW, get(get_import_page))
        .route(endpoints::EXPORT_TRANSACTIONS, get(export_transactions))
        .route(
            endpoints::TRANSACTION_SUMMARY_API,
            get(get_transaction_summary),
        )
        .route(endpoints::DAILY_TREND_API, get(get_daily_expense_trend))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These POST/PUT/DELETE routes need to use the HX-Redirect header for auth
    // redirects to work properly for HTMX requests.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(
                endpoints::TRANSACTIONS_API,
                post(create_transaction_endpoint),
            )
            .route(
                endpoints::PUT_TRANSACTION,
                put(update_transaction_endpoint).delete(delete_transaction_endpoint),
            )
            .route(endpoints::POST_ACCOUNT, post(create_account_endpoint))
            .route(
                endpoints::PUT_ACCOUNT,
                put(edit_account_endpoint).delete(delete_account_endpoint),
            )
            .route(endpoints::POST_CATEGORY, post(create_category_endpoint))
            .route(endpoints::DELETE_CATEGORY, delete(delete_category_endpoint))
            .route(endpoints::POST_BUDGET, post(create_budget_endpoint))
            .route(
                endpoints::PUT_BUDGET,
                put(update_budget_endpoint).delete(delete_budget_endpoint),
            )
            .route(endpoints::POST_RECURRING, post(create_recurring_endpoint))
            .route(
                endpoints::PUT_RECURRING,
                put(update_recurring_endpoint).delete(delete_recurring_endpoint),
            )
            .route(endpoints::FIRE_RECURRING, post(fire_recurring_endpoint))
            .route(endpoints::POST_ASSET, post(create_asset_endpoint))
            .route(
                endpoints::PUT_ASSET,
                put(update_asset_endpoint).delete(delete_asset_endpoint),
            )
            .route(endpoints::POST_HOLDING, post(create_holding_endpoint))
            .route(endpoints::DELETE_HOLDING, delete(delete_holding_endpoint))
            .route(endpoints::IMPORT, post(import_transactions))
            .layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}

#[cfg(test)]
mod routing_tests {
    use axum::{http::StatusCode, response::IntoResponse};
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState, PasswordHash, ValidatedPassword, endpoints, log_in::LogInData,
        pagination::PaginationConfig, user::create_user,
    };

    use super::{build_router, get_index_page};

    fn get_test_state() -> AppState {
        AppState::new(
            Connection::open_in_memory().unwrap(),
            "42",
            "Pacific/Auckland",
            PaginationConfig::default(),
        )
        .expect("Could not create app state")
    }

    fn get_test_server() -> TestServer {
        TestServer::new(build_router(get_test_state()))
    }

    #[tokio::test]
    async fn root_redirects_to_dashboard() {
        let response = get_index_page().await.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let location = response.headers().get("location").unwrap();
        assert_eq!(location, endpoints::DASHBOARD_VIEW);
    }

    #[tokio::test]
    async fn protected_page_redirects_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::TRANSACTIONS_VIEW).await;

        response.assert_status_see_other();
        assert_eq!(
            endpoints::LOG_IN_VIEW,
            response.header("location").to_str().unwrap()
        );
    }

    #[tokio::test]
    async fn protected_api_redirects_via_hx_header() {
        let server = get_test_server();

        let response = server.post(endpoints::IMPORT).await;

        response.assert_status_see_other();
        assert_eq!(
            endpoints::LOG_IN_VIEW,
            response.header("hx-redirect").to_str().unwrap()
        );
    }

    #[tokio::test]
    async fn log_in_page_is_reachable_without_cookie() {
        let server = get_test_server();

        let response = server.get(endpoints::LOG_IN_VIEW).await;

        response.assert_status_ok();
    }

    #[tokio::test]
    async fn unknown_route_returns_not_found() {
        let server = get_test_server();

        let response = server.get("/no/such/page").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn log_in_form_grants_access_to_dashboard() {
        let state = get_test_state();
        {
            let connection = state.db_connection.lock().unwrap();
            let password_hash = PasswordHash::new(
                ValidatedPassword::new_unchecked("test"),
                // Use the minimum cost so the tests run quickly.
                4,
            )
            .expect("Could not hash test password");

            create_user("test@test.com", password_hash, &connection)
                .expect("Could not create test user");
        }

        let mut server =
            TestServer::new(build_router(state));
        server.save_cookies();

        let form_body = serde_html_form::to_string(LogInData {
            email: "test@test.com".to_string(),
            password: "test".to_string(),
            remember_me: None,
        })
        .expect("Could not encode log-in form");

        let response = server
            .post(endpoints::LOG_IN_API)
            .text(form_body)
            .content_type("application/x-www-form-urlencoded")
            .await;

        response.assert_status_see_other();
        assert_eq!(
            endpoints::DASHBOARD_VIEW,
            response.header("hx-redirect").to_str().unwrap()
        );

        let dashboard = server.get(endpoints::DASHBOARD_VIEW).await;
        dashboard.assert_status_ok();
    }

    #[tokio::test]
    async fn coffee_is_a_teapot() {
        let server = get_test_server();

        let response = server.get(endpoints::COFFEE).await;

        assert_eq!(response.status_code(), StatusCode::IM_A_TEAPOT);
    }
}
