//! Application router configuration with protected and unprotected route
//! definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get},
};
use serde_json::json;

use crate::{
    AppState,
    auth::{auth_guard, get_callback, get_log_in, get_log_out, get_session},
    endpoints,
    expense::{
        create_expense_endpoint, delete_expense_endpoint, export_expenses_endpoint,
        list_expenses_endpoint, update_expense_endpoint,
    },
    report::{get_dashboard, get_report},
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index))
        .route(endpoints::LOG_IN, get(get_log_in))
        .route(endpoints::CALLBACK, get(get_callback))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::SESSION, get(get_session));

    let protected_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(
            endpoints::EXPENSE,
            delete(delete_expense_endpoint).put(update_expense_endpoint),
        )
        .route(endpoints::EXPORT, get(export_expenses_endpoint))
        .route(endpoints::DASHBOARD, get(get_dashboard))
        .route(endpoints::REPORTS, get(get_report))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .merge(unprotected_routes)
        .fallback(get_404_not_found)
        .with_state(state)
}

/// The root path '/' redirects to the session endpoint.
async fn get_index() -> Redirect {
    Redirect::to(endpoints::SESSION)
}

async fn get_404_not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Not found" }))).into_response()
}
