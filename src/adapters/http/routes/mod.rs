pub mod plans;
pub mod subscriptions;

use axum::{Json, Router, middleware};
use serde_json::{Value, json};

use crate::adapters::http::{app_state::AppState, middleware::admin_auth_middleware};

/// Everything under `/subscriptions`. Admin routes sit behind
/// `admin_auth_middleware`; the public plan catalogue does not.
pub fn router(app_state: AppState) -> Router<AppState> {
    let admin = subscriptions::router()
        .merge(plans::admin_router())
        .route_layer(middleware::from_fn_with_state(
            app_state,
            admin_auth_middleware,
        ));

    Router::new().nest("/subscriptions", plans::public_router().merge(admin))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
