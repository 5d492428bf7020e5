//! Postgres adapters over the marketplace database.
//!
//! Tables read and written here:
//! - `users (id, name, email)`
//! - `markets (id, user_id, name)`
//! - `subscription_plans` (see `subscription_plan.rs`)
//! - `user_subscriptions (id, user_id, plan_id, status, start_date, end_date, auto_renew, created_at)`
//! - `market_subscriptions (id, market_id, plan_id, status, start_date, end_date, auto_renew, created_at)`
//!
//! `status` uses the `subscription_status` enum type (`active`, `expired`, `cancelled`).

use sqlx::PgPool;

use crate::app_error::AppError;

pub mod subscription;
pub mod subscription_plan;

const MAX_JSON_LOG_LEN: usize = 200;

/// Parse a JSON column, logging a warning and using the default on failure.
///
/// SQL NULL is treated as the default without a warning.
pub fn parse_json_with_fallback<T: serde::de::DeserializeOwned + Default>(
    json: &serde_json::Value,
    field_name: &str,
    entity_type: &str,
    entity_id: i64,
) -> T {
    if json.is_null() {
        return T::default();
    }

    serde_json::from_value(json.clone()).unwrap_or_else(|err| {
        let raw_str = json.to_string();
        let truncated = if raw_str.len() > MAX_JSON_LOG_LEN {
            format!("{}...", raw_str.chars().take(MAX_JSON_LOG_LEN).collect::<String>())
        } else {
            raw_str
        };

        tracing::warn!(
            field = field_name,
            entity_type = entity_type,
            entity_id = entity_id,
            raw_json = %truncated,
            error = %err,
            "Failed to parse JSON field, using default value"
        );
        T::default()
    })
}

#[derive(Clone)]
pub struct PostgresPersistence {
    pool: PgPool,
}

impl PostgresPersistence {
    pub fn new(pool: PgPool) -> Self {
        PostgresPersistence { pool }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::NotFound,
            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    AppError::InvalidArgument("A record with this value already exists".into())
                } else if msg.contains("violates foreign key") {
                    AppError::InvalidArgument("Referenced record not found".into())
                } else if msg.contains("null value") && msg.contains("violates not-null") {
                    AppError::InvalidArgument("Required field is missing".into())
                } else {
                    // Logged here, never exposed to the caller
                    tracing::error!(error = ?err, "Database error");
                    AppError::Database("Database operation failed".into())
                }
            }
            _ => {
                tracing::error!(error = ?err, "Database error");
                AppError::Database("Database operation failed".into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription_plan::PlanFeatures;

    #[test]
    fn parse_features_object() {
        let json = serde_json::json!({"unlimitedApplications": true, "publishMarkets": true});
        let features: PlanFeatures = parse_json_with_fallback(&json, "features", "plan", 1);
        assert!(features.unlimited_applications);
        assert!(features.publish_markets);
        assert!(!features.publish_permanent_orders);
    }

    #[test]
    fn parse_features_missing_keys_default_to_false() {
        let json = serde_json::json!({});
        let features: PlanFeatures = parse_json_with_fallback(&json, "features", "plan", 1);
        assert_eq!(features, PlanFeatures::default());
    }

    #[test]
    fn parse_sql_null_returns_default() {
        let features: PlanFeatures =
            parse_json_with_fallback(&serde_json::Value::Null, "features", "plan", 1);
        assert_eq!(features, PlanFeatures::default());
    }

    #[test]
    fn parse_wrong_structure_returns_default() {
        let json = serde_json::json!(["unlimitedApplications"]);
        let features: PlanFeatures = parse_json_with_fallback(&json, "features", "plan", 1);
        assert_eq!(features, PlanFeatures::default());
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(
            AppError::from(sqlx::Error::RowNotFound),
            AppError::NotFound
        ));
    }

    #[test]
    fn other_errors_map_to_database() {
        let err = AppError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, AppError::Database(_)));
    }
}
