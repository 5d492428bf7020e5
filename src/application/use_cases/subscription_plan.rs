use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::subscription_plan::{
        Currency, FeatureDescription, Language, LocalizedText, PlanFeatures, SubscriptionPlan,
    },
};

// ============================================================================
// Input Types
// ============================================================================

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanInput {
    pub name: LocalizedText,
    #[serde(default)]
    pub description: Option<LocalizedText>,
    pub price_cents: i64,
    #[serde(default)]
    pub old_price_cents: Option<i64>,
    pub currency: Currency,
    pub duration_days: i32,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub features: PlanFeatures,
}

/// Partial update; absent fields are left as they are.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanInput {
    pub name: Option<LocalizedText>,
    pub description: Option<LocalizedText>,
    pub price_cents: Option<i64>,
    pub old_price_cents: Option<i64>,
    /// Remove the old price, ending a displayed discount.
    #[serde(default)]
    pub clear_old_price: bool,
    pub currency: Option<Currency>,
    pub duration_days: Option<i32>,
    pub is_recurring: Option<bool>,
    pub is_active: Option<bool>,
    pub features: Option<PlanFeatures>,
}

impl UpdatePlanInput {
    /// Apply the provided fields on top of `plan`.
    pub fn apply_to(&self, plan: &mut SubscriptionPlan) {
        if let Some(name) = &self.name {
            plan.name = name.clone();
        }
        if let Some(description) = &self.description {
            plan.description = Some(description.clone());
        }
        if let Some(price) = self.price_cents {
            plan.price_cents = price;
        }
        if self.clear_old_price {
            plan.old_price_cents = None;
        } else if let Some(old) = self.old_price_cents {
            plan.old_price_cents = Some(old);
        }
        if let Some(currency) = self.currency {
            plan.currency = currency;
        }
        if let Some(days) = self.duration_days {
            plan.duration_days = days;
        }
        if let Some(recurring) = self.is_recurring {
            plan.is_recurring = recurring;
        }
        if let Some(active) = self.is_active {
            plan.is_active = active;
        }
        if let Some(features) = self.features {
            plan.features = features;
        }
    }
}

// ============================================================================
// Output Types
// ============================================================================

/// A plan rendered for one language, as shown on the public pricing page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub old_price_cents: Option<i64>,
    pub discount_percent: Option<i64>,
    pub currency: Currency,
    pub duration_days: i32,
    pub is_recurring: bool,
    pub features: Vec<FeatureDescription>,
}

impl PlanView {
    pub fn localized(plan: &SubscriptionPlan, lang: Language) -> Self {
        Self {
            id: plan.id,
            name: plan.name.resolve(lang).to_string(),
            description: plan
                .description
                .as_ref()
                .map(|d| d.resolve(lang).to_string())
                .filter(|d| !d.is_empty()),
            price_cents: plan.price_cents,
            old_price_cents: plan.old_price_cents,
            discount_percent: plan.discount_percent(),
            currency: plan.currency,
            duration_days: plan.duration_days,
            is_recurring: plan.is_recurring,
            features: plan.features.describe(),
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait SubscriptionPlanRepo: Send + Sync {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<SubscriptionPlan>>;
    async fn list(&self, include_inactive: bool) -> AppResult<Vec<SubscriptionPlan>>;
    async fn create(&self, input: &CreatePlanInput) -> AppResult<SubscriptionPlan>;
    /// Fails with `NotFound` when the plan does not exist.
    async fn update(&self, id: i64, input: &UpdatePlanInput) -> AppResult<SubscriptionPlan>;
}

// ============================================================================
// Validation
// ============================================================================

fn validate_name(name: &LocalizedText) -> AppResult<()> {
    if name.default.is_empty() {
        return Err(AppError::InvalidArgument("Plan name is required".into()));
    }
    if name.default.chars().count() > 100 {
        return Err(AppError::InvalidArgument(
            "Plan name must be at most 100 characters".into(),
        ));
    }
    Ok(())
}

fn validate_price(price_cents: i64) -> AppResult<()> {
    if price_cents < 0 {
        return Err(AppError::InvalidArgument("Price cannot be negative".into()));
    }
    Ok(())
}

fn validate_old_price(old_price_cents: Option<i64>) -> AppResult<()> {
    if old_price_cents.is_some_and(|p| p < 0) {
        return Err(AppError::InvalidArgument(
            "Old price cannot be negative".into(),
        ));
    }
    Ok(())
}

fn validate_duration(duration_days: i32) -> AppResult<()> {
    if duration_days <= 0 {
        return Err(AppError::InvalidArgument(
            "Duration must be at least one day".into(),
        ));
    }
    Ok(())
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionPlanUseCases {
    repo: Arc<dyn SubscriptionPlanRepo>,
}

impl SubscriptionPlanUseCases {
    pub fn new(repo: Arc<dyn SubscriptionPlanRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_plans(&self, include_inactive: bool) -> AppResult<Vec<SubscriptionPlan>> {
        self.repo.list(include_inactive).await
    }

    /// Active plans localized for the public pricing page.
    pub async fn list_public_plans(&self, lang: Language) -> AppResult<Vec<PlanView>> {
        let plans = self.repo.list(false).await?;
        Ok(plans
            .iter()
            .map(|plan| PlanView::localized(plan, lang))
            .collect())
    }

    pub async fn get_plan(&self, id: i64) -> AppResult<SubscriptionPlan> {
        self.repo.get_by_id(id).await?.ok_or(AppError::NotFound)
    }

    #[instrument(skip(self, input))]
    pub async fn create_plan(&self, input: CreatePlanInput) -> AppResult<SubscriptionPlan> {
        let input = CreatePlanInput {
            name: input.name.normalized(),
            description: input
                .description
                .map(LocalizedText::normalized)
                .filter(|d| !d.default.is_empty()),
            ..input
        };

        validate_name(&input.name)?;
        validate_price(input.price_cents)?;
        validate_old_price(input.old_price_cents)?;
        validate_duration(input.duration_days)?;

        let plan = self.repo.create(&input).await?;
        info!(plan_id = plan.id, name = %plan.name.default, "Plan created");
        Ok(plan)
    }

    #[instrument(skip(self, input))]
    pub async fn update_plan(&self, id: i64, input: UpdatePlanInput) -> AppResult<SubscriptionPlan> {
        let input = UpdatePlanInput {
            name: input.name.map(LocalizedText::normalized),
            description: input.description.map(LocalizedText::normalized),
            ..input
        };

        if let Some(name) = &input.name {
            validate_name(name)?;
        }
        if let Some(price) = input.price_cents {
            validate_price(price)?;
        }
        validate_old_price(input.old_price_cents)?;
        if let Some(days) = input.duration_days {
            validate_duration(days)?;
        }

        let plan = self.repo.update(id, &input).await?;
        info!(plan_id = plan.id, is_active = plan.is_active, "Plan updated");
        Ok(plan)
    }
}
