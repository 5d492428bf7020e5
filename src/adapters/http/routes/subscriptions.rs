use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use crate::{
    adapters::http::{app_state::AppState, middleware::AdminPrincipal},
    app_error::AppResult,
    domain::{
        entities::subscription::{Subscription, SubscriptionKind},
        lifecycle::StatusFilter,
    },
    use_cases::subscription_lifecycle::{Page, SentReminder, SubscriptionView},
};

/// Admin subscription routes. `admin_auth_middleware` is applied in mod.rs.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/all", get(list_user_subscriptions))
        .route("/admin/user-subscriptions", get(list_user_subscriptions))
        .route("/admin/market-subscriptions", get(list_market_subscriptions))
        .route("/admin/mark-expired", post(mark_expired))
        .route("/admin/{collection}/{subscription_id}", get(get_subscription))
        .route(
            "/admin/{collection}/{subscription_id}/cancel",
            post(cancel_subscription),
        )
        .route(
            "/admin/{collection}/{subscription_id}/extend",
            post(extend_subscription),
        )
        .route(
            "/admin/{collection}/{subscription_id}/notify-expiring",
            post(notify_expiring),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Path segment naming the subscription collection.
#[derive(Clone, Copy, Debug, Deserialize)]
enum Collection {
    #[serde(rename = "user-subscriptions")]
    User,
    #[serde(rename = "market-subscriptions")]
    Market,
}

impl From<Collection> for SubscriptionKind {
    fn from(c: Collection) -> Self {
        match c {
            Collection::User => SubscriptionKind::User,
            Collection::Market => SubscriptionKind::Market,
        }
    }
}

#[derive(Deserialize)]
struct ListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    #[serde(default)]
    status: StatusFilter,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListSubscriptionsResponse {
    subscriptions: Vec<SubscriptionView>,
    page: u32,
    limit: u32,
    total: u64,
    total_pages: u32,
    has_next_page: bool,
    has_prev_page: bool,
}

impl From<Page<SubscriptionView>> for ListSubscriptionsResponse {
    fn from(page: Page<SubscriptionView>) -> Self {
        Self {
            subscriptions: page.items,
            page: page.page,
            limit: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
            has_next_page: page.has_next_page,
            has_prev_page: page.has_prev_page,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExtendPayload {
    additional_days: i64,
}

#[derive(Serialize)]
struct SubscriptionActionResponse {
    message: String,
    subscription: Subscription,
}

#[derive(Serialize)]
struct NotifyResponse {
    message: String,
    notification: SentReminder,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkExpiredResponse {
    message: String,
    total: u64,
    user_subscriptions: u64,
    market_subscriptions: u64,
    skipped: u64,
}

// ============================================================================
// Handlers
// ============================================================================

async fn list_subscriptions(
    app_state: &AppState,
    kind: SubscriptionKind,
    query: ListQuery,
) -> AppResult<Json<ListSubscriptionsResponse>> {
    let page = app_state
        .lifecycle_use_cases
        .list(
            kind,
            query.status,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(app_state.config.default_page_size),
        )
        .await?;
    Ok(Json(page.into()))
}

/// GET /subscriptions/all?page=&limit=&status=
async fn list_user_subscriptions(
    State(app_state): State<AppState>,
    Extension(_admin): Extension<AdminPrincipal>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    list_subscriptions(&app_state, SubscriptionKind::User, query).await
}

/// GET /subscriptions/admin/market-subscriptions?page=&limit=&status=
async fn list_market_subscriptions(
    State(app_state): State<AppState>,
    Extension(_admin): Extension<AdminPrincipal>,
    Query(query): Query<ListQuery>,
) -> AppResult<impl IntoResponse> {
    list_subscriptions(&app_state, SubscriptionKind::Market, query).await
}

/// GET /subscriptions/admin/{collection}/{subscription_id}
async fn get_subscription(
    State(app_state): State<AppState>,
    Extension(_admin): Extension<AdminPrincipal>,
    Path((collection, subscription_id)): Path<(Collection, i64)>,
) -> AppResult<impl IntoResponse> {
    let view = app_state
        .lifecycle_use_cases
        .get(collection.into(), subscription_id)
        .await?;
    Ok(Json(view))
}

/// POST /subscriptions/admin/{collection}/{subscription_id}/cancel
async fn cancel_subscription(
    State(app_state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path((collection, subscription_id)): Path<(Collection, i64)>,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .lifecycle_use_cases
        .cancel(collection.into(), subscription_id)
        .await?;

    tracing::info!(subscription_id, auth = ?admin.method, "Admin cancelled subscription");
    Ok(Json(SubscriptionActionResponse {
        message: "Subscription cancelled successfully".to_string(),
        subscription,
    }))
}

/// POST /subscriptions/admin/{collection}/{subscription_id}/extend
async fn extend_subscription(
    State(app_state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
    Path((collection, subscription_id)): Path<(Collection, i64)>,
    Json(payload): Json<ExtendPayload>,
) -> AppResult<impl IntoResponse> {
    let subscription = app_state
        .lifecycle_use_cases
        .extend(collection.into(), subscription_id, payload.additional_days)
        .await?;

    tracing::info!(
        subscription_id,
        additional_days = payload.additional_days,
        auth = ?admin.method,
        "Admin extended subscription"
    );
    Ok(Json(SubscriptionActionResponse {
        message: format!(
            "Subscription extended by {} day{}",
            payload.additional_days,
            if payload.additional_days == 1 { "" } else { "s" }
        ),
        subscription,
    }))
}

/// POST /subscriptions/admin/{collection}/{subscription_id}/notify-expiring
async fn notify_expiring(
    State(app_state): State<AppState>,
    Extension(_admin): Extension<AdminPrincipal>,
    Path((collection, subscription_id)): Path<(Collection, i64)>,
) -> AppResult<impl IntoResponse> {
    let sent = app_state
        .lifecycle_use_cases
        .notify_expiring(collection.into(), subscription_id)
        .await?;

    Ok(Json(NotifyResponse {
        message: "Notification sent successfully".to_string(),
        notification: sent,
    }))
}

/// POST /subscriptions/admin/mark-expired
async fn mark_expired(
    State(app_state): State<AppState>,
    Extension(admin): Extension<AdminPrincipal>,
) -> AppResult<impl IntoResponse> {
    let report = app_state.lifecycle_use_cases.reconcile_expired().await?;
    let total = report.total_expired();

    tracing::info!(total, auth = ?admin.method, "Admin ran reconcile sweep");
    Ok(Json(MarkExpiredResponse {
        message: format!(
            "Marked {} subscription{} as expired",
            total,
            if total == 1 { "" } else { "s" }
        ),
        total,
        user_subscriptions: report.user_subscriptions.expired,
        market_subscriptions: report.market_subscriptions.expired,
        skipped: report.total_skipped(),
    }))
}
