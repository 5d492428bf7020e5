use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header::ACCEPT_LANGUAGE},
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use crate::{
    adapters::http::{app_state::AppState, middleware::AdminPrincipal},
    app_error::AppResult,
    domain::entities::subscription_plan::Language,
    use_cases::subscription_plan::{CreatePlanInput, UpdatePlanInput},
};

pub fn public_router() -> Router<AppState> {
    Router::new().route("/plans", get(list_public_plans))
}

/// Admin catalogue routes. `admin_auth_middleware` is applied in mod.rs.
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/admin/plans", get(list_all_plans))
        .route("/admin/plans/{plan_id}", get(get_plan))
        .route("/plans", post(create_plan))
        .route("/plans/{plan_id}", post(update_plan))
}

#[derive(Deserialize)]
struct LangQuery {
    lang: Option<String>,
}

/// GET /subscriptions/plans?lang=ru
/// Active plans localized by `lang`, falling back to `Accept-Language`.
async fn list_public_plans(
    State(app_state): State<AppState>,
    Query(query): Query<LangQuery>,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    let raw = query.lang.or_else(|| {
        headers
            .get(ACCEPT_LANGUAGE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    });
    let lang = Language::from_raw(raw.as_deref());

    let plans = app_state.plan_use_cases.list_public_plans(lang).await?;
    Ok(Json(plans))
}

/// GET /subscriptions/admin/plans
async fn list_all_plans(
    State(app_state): State<AppState>,
    Extension(_admin): Extension<AdminPrincipal>,
) -> AppResult<impl IntoResponse> {
    let plans = app_state.plan_use_cases.list_plans(true).await?;
    Ok(Json(plans))
}

/// GET /subscriptions/admin/plans/{plan_id}
async fn get_plan(
    State(app_state): State<AppState>,
    Extension(_admin): Extension<AdminPrincipal>,
    Path(plan_id): Path<i64>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.get_plan(plan_id).await?;
    Ok(Json(plan))
}

/// POST /subscriptions/plans
async fn create_plan(
    State(app_state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Json(input): Json<CreatePlanInput>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.create_plan(input).await?;
    tracing::info!(plan_id = plan.id, auth = ?admin.method, "Admin created plan");
    Ok((StatusCode::CREATED, Json(plan)))
}

/// POST /subscriptions/plans/{plan_id}
async fn update_plan(
    State(app_state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path(plan_id): Path<i64>,
    Json(input): Json<UpdatePlanInput>,
) -> AppResult<impl IntoResponse> {
    let plan = app_state.plan_use_cases.update_plan(plan_id, input).await?;
    tracing::info!(plan_id = plan.id, auth = ?admin.method, "Admin updated plan");
    Ok(Json(plan))
}
