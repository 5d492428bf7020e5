//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::{
    application::use_cases::subscription_plan::CreatePlanInput,
    domain::entities::{
        subscription::{Subscription, SubscriptionDetails, SubscriptionOwner, SubscriptionStatus},
        subscription_plan::{Currency, LocalizedText, PlanFeatures, SubscriptionPlan},
    },
};

/// The instant every test clock is pinned to.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 10, 12, 0, 0).unwrap()
}

/// Create an active user subscription ending 30 days after `test_now()`.
/// The owning user id is `1000 + id`.
pub fn create_test_subscription(
    id: i64,
    overrides: impl FnOnce(&mut SubscriptionDetails),
) -> SubscriptionDetails {
    let mut details = SubscriptionDetails {
        subscription: Subscription {
            id,
            owner: SubscriptionOwner::User {
                user_id: 1000 + id,
            },
            plan_id: 1,
            status: SubscriptionStatus::Active,
            start_date: test_now() - Duration::days(30),
            end_date: test_now() + Duration::days(30),
            auto_renew: false,
            created_at: test_now() - Duration::days(30),
        },
        user_name: "Test User".to_string(),
        user_email: Some("user@example.com".to_string()),
        plan_name: "Premium".to_string(),
        plan_price_cents: 500_000,
        plan_currency: "AMD".to_string(),
        market_name: None,
    };
    overrides(&mut details);
    details
}

/// Create an active market subscription. The market id is `500 + id` and the
/// owning user id is `2000 + id`.
pub fn create_test_market_subscription(
    id: i64,
    overrides: impl FnOnce(&mut SubscriptionDetails),
) -> SubscriptionDetails {
    create_test_subscription(id, |d| {
        d.subscription.owner = SubscriptionOwner::Market {
            market_id: 500 + id,
            user_id: 2000 + id,
        };
        d.user_name = "Market Owner".to_string();
        d.market_name = Some("Test Market".to_string());
        overrides(d);
    })
}

/// Create an active 30 day plan.
pub fn create_test_plan(
    id: i64,
    overrides: impl FnOnce(&mut SubscriptionPlan),
) -> SubscriptionPlan {
    let mut plan = SubscriptionPlan {
        id,
        name: LocalizedText::new("Basic"),
        description: Some(LocalizedText::new("A basic subscription plan")),
        price_cents: 500_000,
        old_price_cents: None,
        currency: Currency::Amd,
        duration_days: 30,
        is_recurring: false,
        is_active: true,
        features: PlanFeatures::default(),
        created_at: test_now() - Duration::days(90),
    };
    overrides(&mut plan);
    plan
}

pub fn create_test_plan_input(overrides: impl FnOnce(&mut CreatePlanInput)) -> CreatePlanInput {
    let mut input = CreatePlanInput {
        name: LocalizedText::new("Premium"),
        description: None,
        price_cents: 1_000_000,
        old_price_cents: None,
        currency: Currency::Amd,
        duration_days: 30,
        is_recurring: false,
        is_active: true,
        features: PlanFeatures {
            unlimited_applications: true,
            ..Default::default()
        },
    };
    overrides(&mut input);
    input
}
