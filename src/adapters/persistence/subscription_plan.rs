//! `subscription_plans (id, name, name_en, name_ru, name_hy, description,
//! description_en, description_ru, description_hy, price_cents,
//! old_price_cents, currency, duration_days, is_recurring, is_active,
//! features jsonb, created_at)`

use async_trait::async_trait;
use sqlx::{Row, postgres::PgRow};

use crate::{
    adapters::persistence::{PostgresPersistence, parse_json_with_fallback},
    app_error::{AppError, AppResult},
    application::use_cases::subscription_plan::{
        CreatePlanInput, SubscriptionPlanRepo, UpdatePlanInput,
    },
    domain::entities::subscription_plan::{Currency, LocalizedText, PlanFeatures, SubscriptionPlan},
};

const SELECT_COLS: &str = r#"
    id, name, name_en, name_ru, name_hy,
    description, description_en, description_ru, description_hy,
    price_cents, old_price_cents, currency, duration_days,
    is_recurring, is_active, features, created_at
"#;

fn localized(row: &PgRow, column: &str) -> Option<LocalizedText> {
    let default: Option<String> = row.get(column);
    default.map(|default| LocalizedText {
        default,
        en: row.get(format!("{column}_en").as_str()),
        ru: row.get(format!("{column}_ru").as_str()),
        hy: row.get(format!("{column}_hy").as_str()),
    })
}

fn row_to_plan(row: PgRow) -> SubscriptionPlan {
    let id: i64 = row.get("id");
    let features_json: serde_json::Value = row.get("features");
    let features: PlanFeatures =
        parse_json_with_fallback(&features_json, "features", "subscription_plan", id);

    let raw_currency: String = row.get("currency");
    let currency = raw_currency.parse::<Currency>().unwrap_or_else(|_| {
        tracing::warn!(
            plan_id = id,
            currency = %raw_currency,
            "Unknown plan currency, assuming AMD"
        );
        Currency::Amd
    });

    SubscriptionPlan {
        id,
        name: localized(&row, "name").unwrap_or_default(),
        description: localized(&row, "description"),
        price_cents: row.get("price_cents"),
        old_price_cents: row.get("old_price_cents"),
        currency,
        duration_days: row.get("duration_days"),
        is_recurring: row.get("is_recurring"),
        is_active: row.get("is_active"),
        features,
        created_at: row.get("created_at"),
    }
}

fn features_to_json(features: &PlanFeatures) -> serde_json::Value {
    serde_json::to_value(features).unwrap_or(serde_json::json!({}))
}

#[async_trait]
impl SubscriptionPlanRepo for PostgresPersistence {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<SubscriptionPlan>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscription_plans WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<SubscriptionPlan>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscription_plans WHERE $1 OR is_active = true ORDER BY price_cents, id",
            SELECT_COLS
        ))
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_plan).collect())
    }

    async fn create(&self, input: &CreatePlanInput) -> AppResult<SubscriptionPlan> {
        let description = input.description.as_ref();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscription_plans
                (name, name_en, name_ru, name_hy,
                 description, description_en, description_ru, description_hy,
                 price_cents, old_price_cents, currency, duration_days,
                 is_recurring, is_active, features)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(&input.name.default)
        .bind(&input.name.en)
        .bind(&input.name.ru)
        .bind(&input.name.hy)
        .bind(description.map(|d| d.default.as_str()))
        .bind(description.and_then(|d| d.en.as_deref()))
        .bind(description.and_then(|d| d.ru.as_deref()))
        .bind(description.and_then(|d| d.hy.as_deref()))
        .bind(input.price_cents)
        .bind(input.old_price_cents)
        .bind(input.currency.to_string())
        .bind(input.duration_days)
        .bind(input.is_recurring)
        .bind(input.is_active)
        .bind(features_to_json(&input.features))
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_plan(row))
    }

    async fn update(&self, id: i64, input: &UpdatePlanInput) -> AppResult<SubscriptionPlan> {
        let name = input.name.as_ref();
        let description = input.description.as_ref();

        // Localized texts are replaced as a whole, scalar fields are COALESCEd.
        let row = sqlx::query(&format!(
            r#"
            UPDATE subscription_plans SET
                name = CASE WHEN $2 THEN $3 ELSE name END,
                name_en = CASE WHEN $2 THEN $4 ELSE name_en END,
                name_ru = CASE WHEN $2 THEN $5 ELSE name_ru END,
                name_hy = CASE WHEN $2 THEN $6 ELSE name_hy END,
                description = CASE WHEN $7 THEN $8 ELSE description END,
                description_en = CASE WHEN $7 THEN $9 ELSE description_en END,
                description_ru = CASE WHEN $7 THEN $10 ELSE description_ru END,
                description_hy = CASE WHEN $7 THEN $11 ELSE description_hy END,
                price_cents = COALESCE($12, price_cents),
                old_price_cents = CASE WHEN $13 THEN NULL
                                       ELSE COALESCE($14, old_price_cents) END,
                currency = COALESCE($15, currency),
                duration_days = COALESCE($16, duration_days),
                is_recurring = COALESCE($17, is_recurring),
                is_active = COALESCE($18, is_active),
                features = COALESCE($19, features)
            WHERE id = $1
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(name.is_some())
        .bind(name.map(|n| n.default.as_str()))
        .bind(name.and_then(|n| n.en.as_deref()))
        .bind(name.and_then(|n| n.ru.as_deref()))
        .bind(name.and_then(|n| n.hy.as_deref()))
        .bind(description.is_some())
        .bind(description.map(|d| d.default.as_str()))
        .bind(description.and_then(|d| d.en.as_deref()))
        .bind(description.and_then(|d| d.ru.as_deref()))
        .bind(description.and_then(|d| d.hy.as_deref()))
        .bind(input.price_cents)
        .bind(input.clear_old_price)
        .bind(input.old_price_cents)
        .bind(input.currency.map(|c| c.to_string()))
        .bind(input.duration_days)
        .bind(input.is_recurring)
        .bind(input.is_active)
        .bind(input.features.as_ref().map(features_to_json))
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        row.map(row_to_plan).ok_or(AppError::NotFound)
    }
}
