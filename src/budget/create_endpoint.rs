//! Create a monthly budget for a category.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use rusqlite::Connection;
use serde::Deserialize;

use crate::{AppState, Error, category::CategoryId, endpoints};

use super::core::{create_budget, parse_month_input};

/// The state needed to create a budget.
#[derive(Debug, Clone)]
pub struct CreateBudgetState {
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for CreateBudgetState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The form data for creating a budget.
#[derive(Debug, Deserialize)]
pub struct BudgetForm {
    pub category_id: CategoryId,
    pub amount: f64,
    /// The month in the format "YYYY-MM", as produced by `input type="month"`.
    pub month: String,
}

/// Create a budget from form data and redirect to the budgets page.
pub async fn create_budget_endpoint(
    State(state): State<CreateBudgetState>,
    Form(form): Form<BudgetForm>,
) -> Response {
    let (year, month) = match parse_month_input(&form.month) {
        Ok(parsed) => parsed,
        Err(error) => return error.into_alert_response(),
    };

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Error::InvalidAmount(form.amount).into_alert_response();
    }

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_budget(form.category_id, form.amount, month, year, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::BUDGETS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("could not create budget: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod create_budget_endpoint_tests {
    use std::sync::{Arc, Mutex};

    use axum::{Form, extract::State, http::StatusCode};
    use axum_htmx::HX_REDIRECT;
    use rusqlite::Connection;

    use crate::{
        category::{CategoryName, create_category},
        db::initialize,
        endpoints,
        test_utils::get_header,
    };

    use super::{BudgetForm, CreateBudgetState, create_budget_endpoint};

    fn get_test_state() -> CreateBudgetState {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        create_category(CategoryName::new_unchecked("Groceries"), &connection).unwrap();

        CreateBudgetState {
            db_connection: Arc::new(Mutex::new(connection)),
        }
    }

    #[tokio::test]
    async fn can_create_budget() {
        let state = get_test_state();

        let response = create_budget_endpoint(
            State(state),
            Form(BudgetForm {
                category_id: 1,
                amount: 250.0,
                month: "2025-06".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(get_header(&response, HX_REDIRECT.as_str()), endpoints::BUDGETS_VIEW);
    }

    #[tokio::test]
    async fn invalid_month_is_rejected() {
        let state = get_test_state();

        let response = create_budget_endpoint(
            State(state),
            Form(BudgetForm {
                category_id: 1,
                amount: 250.0,
                month: "June 2025".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected() {
        let state = get_test_state();

        let response = create_budget_endpoint(
            State(state),
            Form(BudgetForm {
                category_id: 1,
                amount: 0.0,
                month: "2025-06".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_budget_is_rejected() {
        let state = get_test_state();

        let form = || BudgetForm {
            category_id: 1,
            amount: 250.0,
            month: "2025-06".to_owned(),
        };

        let first = create_budget_endpoint(State(state.clone()), Form(form())).await;
        assert_eq!(first.status(), StatusCode::SEE_OTHER);

        let second = create_budget_endpoint(State(state), Form(form())).await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    }
}
