use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, postgres::PgRow};

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_lifecycle::{Page, SubscriptionQuery, SubscriptionRepo},
    domain::entities::subscription::{
        Subscription, SubscriptionDetails, SubscriptionKind, SubscriptionOwner,
        SubscriptionStatus,
    },
};

const SUBSCRIPTION_COLS: &str = r#"
    s.id, s.plan_id, s.status, s.start_date, s.end_date, s.auto_renew, s.created_at,
    u.name AS user_name, u.email AS user_email,
    p.name AS plan_name, p.price_cents AS plan_price_cents, p.currency AS plan_currency
"#;

fn table(kind: SubscriptionKind) -> &'static str {
    match kind {
        SubscriptionKind::User => "user_subscriptions",
        SubscriptionKind::Market => "market_subscriptions",
    }
}

/// SELECT with the display joins, reading subscription rows from `source`
/// (the table itself or a CTE over it) aliased as `s`.
fn select_from(kind: SubscriptionKind, source: &str) -> String {
    match kind {
        SubscriptionKind::User => format!(
            r#"
            SELECT {cols},
                   s.user_id AS owner_user_id,
                   NULL::bigint AS market_id,
                   NULL::text AS market_name
            FROM {source} s
            JOIN users u ON u.id = s.user_id
            JOIN subscription_plans p ON p.id = s.plan_id
            "#,
            cols = SUBSCRIPTION_COLS,
            source = source
        ),
        SubscriptionKind::Market => format!(
            r#"
            SELECT {cols},
                   m.user_id AS owner_user_id,
                   s.market_id AS market_id,
                   m.name AS market_name
            FROM {source} s
            JOIN markets m ON m.id = s.market_id
            JOIN users u ON u.id = m.user_id
            JOIN subscription_plans p ON p.id = s.plan_id
            "#,
            cols = SUBSCRIPTION_COLS,
            source = source
        ),
    }
}

const QUERY_FILTER: &str = r#"
    WHERE ($1::subscription_status IS NULL OR s.status = $1)
      AND ($2::timestamptz IS NULL OR s.end_date < $2)
"#;

fn row_to_details(kind: SubscriptionKind, row: PgRow) -> SubscriptionDetails {
    let owner = match kind {
        SubscriptionKind::User => SubscriptionOwner::User {
            user_id: row.get("owner_user_id"),
        },
        SubscriptionKind::Market => SubscriptionOwner::Market {
            market_id: row.get("market_id"),
            user_id: row.get("owner_user_id"),
        },
    };

    SubscriptionDetails {
        subscription: Subscription {
            id: row.get("id"),
            owner,
            plan_id: row.get("plan_id"),
            status: row.get("status"),
            start_date: row.get("start_date"),
            end_date: row.get("end_date"),
            auto_renew: row.get("auto_renew"),
            created_at: row.get("created_at"),
        },
        user_name: row.get("user_name"),
        user_email: row.get("user_email"),
        plan_name: row.get("plan_name"),
        plan_price_cents: row.get("plan_price_cents"),
        plan_currency: row.get("plan_currency"),
        market_name: row.get("market_name"),
    }
}

impl PostgresPersistence {
    /// Zero rows matched a compare-and-set update: tell a missing record
    /// apart from one that moved on.
    async fn missing_or_conflict(&self, kind: SubscriptionKind, id: i64) -> AppError {
        let exists = sqlx::query_scalar::<_, bool>(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)",
            table(kind)
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await;

        match exists {
            Ok(true) => AppError::Conflict(format!(
                "{} subscription {} was modified concurrently",
                kind, id
            )),
            Ok(false) => AppError::NotFound,
            Err(err) => AppError::from(err),
        }
    }
}

#[async_trait]
impl SubscriptionRepo for PostgresPersistence {
    async fn fetch_by_id(
        &self,
        kind: SubscriptionKind,
        id: i64,
    ) -> AppResult<Option<SubscriptionDetails>> {
        let row = sqlx::query(&format!(
            "{} WHERE s.id = $1",
            select_from(kind, table(kind))
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(|r| row_to_details(kind, r)))
    }

    async fn fetch_page(
        &self,
        kind: SubscriptionKind,
        query: &SubscriptionQuery,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<SubscriptionDetails>> {
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} s {}",
            table(kind),
            QUERY_FILTER
        ))
        .bind(query.status)
        .bind(query.ends_before)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;

        let rows = sqlx::query(&format!(
            "{} {} ORDER BY s.id LIMIT $3 OFFSET $4",
            select_from(kind, table(kind)),
            QUERY_FILTER
        ))
        .bind(query.status)
        .bind(query.ends_before)
        .bind(i64::from(page_size))
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;

        let items = rows.into_iter().map(|r| row_to_details(kind, r)).collect();
        Ok(Page::new(items, page, page_size, total.max(0) as u64))
    }

    async fn update_status(
        &self,
        kind: SubscriptionKind,
        id: i64,
        expected: SubscriptionStatus,
        new_status: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            WITH updated AS (
                UPDATE {table} SET
                    status = $3,
                    auto_renew = CASE WHEN $3 = 'cancelled'::subscription_status
                                      THEN false ELSE auto_renew END
                WHERE id = $1 AND status = $2
                RETURNING *
            )
            {select}
            "#,
            table = table(kind),
            select = select_from(kind, "updated")
        ))
        .bind(id)
        .bind(expected)
        .bind(new_status)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(row_to_details(kind, row).subscription),
            None => Err(self.missing_or_conflict(kind, id).await),
        }
    }

    async fn update_end_date(
        &self,
        kind: SubscriptionKind,
        id: i64,
        expected_end_date: DateTime<Utc>,
        new_end_date: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        let row = sqlx::query(&format!(
            r#"
            WITH updated AS (
                UPDATE {table} SET end_date = $3
                WHERE id = $1 AND status = 'active'::subscription_status AND end_date = $2
                RETURNING *
            )
            {select}
            "#,
            table = table(kind),
            select = select_from(kind, "updated")
        ))
        .bind(id)
        .bind(expected_end_date)
        .bind(new_end_date)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;

        match row {
            Some(row) => Ok(row_to_details(kind, row).subscription),
            None => Err(self.missing_or_conflict(kind, id).await),
        }
    }
}
