//! In-memory mock implementations for the subscription and plan repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::{
        subscription_lifecycle::{Page, SubscriptionQuery, SubscriptionRepo},
        subscription_plan::{CreatePlanInput, SubscriptionPlanRepo, UpdatePlanInput},
    },
    domain::entities::{
        subscription::{Subscription, SubscriptionDetails, SubscriptionKind, SubscriptionStatus},
        subscription_plan::SubscriptionPlan,
    },
};

// ============================================================================
// InMemorySubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionRepo {
    pub subscriptions: Mutex<HashMap<(SubscriptionKind, i64), SubscriptionDetails>>,
    conflict_next_update: AtomicBool,
}

impl InMemorySubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<SubscriptionDetails>) -> Self {
        let map = subscriptions
            .into_iter()
            .map(|d| ((d.subscription.kind(), d.subscription.id), d))
            .collect();
        Self {
            subscriptions: Mutex::new(map),
            ..Default::default()
        }
    }

    pub fn get(&self, kind: SubscriptionKind, id: i64) -> Option<SubscriptionDetails> {
        self.subscriptions.lock().unwrap().get(&(kind, id)).cloned()
    }

    /// Make the next update call fail as if another writer got there first.
    pub fn fail_next_update_with_conflict(&self) {
        self.conflict_next_update.store(true, Ordering::SeqCst);
    }

    fn take_injected_conflict(&self) -> AppResult<()> {
        if self.conflict_next_update.swap(false, Ordering::SeqCst) {
            return Err(AppError::Conflict(
                "subscription was modified concurrently".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionRepo for InMemorySubscriptionRepo {
    async fn fetch_by_id(
        &self,
        kind: SubscriptionKind,
        id: i64,
    ) -> AppResult<Option<SubscriptionDetails>> {
        Ok(self.get(kind, id))
    }

    async fn fetch_page(
        &self,
        kind: SubscriptionKind,
        query: &SubscriptionQuery,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<SubscriptionDetails>> {
        let mut matching: Vec<SubscriptionDetails> = self
            .subscriptions
            .lock()
            .unwrap()
            .iter()
            .filter(|((k, _), d)| *k == kind && query.matches(&d.subscription))
            .map(|(_, d)| d.clone())
            .collect();
        matching.sort_by_key(|d| d.subscription.id);

        let total = matching.len() as u64;
        let offset = (page.saturating_sub(1) as usize) * page_size as usize;
        let items = matching
            .into_iter()
            .skip(offset)
            .take(page_size as usize)
            .collect();
        Ok(Page::new(items, page, page_size, total))
    }

    async fn update_status(
        &self,
        kind: SubscriptionKind,
        id: i64,
        expected: SubscriptionStatus,
        new_status: SubscriptionStatus,
    ) -> AppResult<Subscription> {
        self.take_injected_conflict()?;

        let mut subscriptions = self.subscriptions.lock().unwrap();
        let details = subscriptions.get_mut(&(kind, id)).ok_or(AppError::NotFound)?;
        let sub = &mut details.subscription;
        if sub.status != expected {
            return Err(AppError::Conflict(format!(
                "expected status {}, found {}",
                expected, sub.status
            )));
        }
        sub.status = new_status;
        if new_status == SubscriptionStatus::Cancelled {
            sub.auto_renew = false;
        }
        Ok(sub.clone())
    }

    async fn update_end_date(
        &self,
        kind: SubscriptionKind,
        id: i64,
        expected_end_date: DateTime<Utc>,
        new_end_date: DateTime<Utc>,
    ) -> AppResult<Subscription> {
        self.take_injected_conflict()?;

        let mut subscriptions = self.subscriptions.lock().unwrap();
        let details = subscriptions.get_mut(&(kind, id)).ok_or(AppError::NotFound)?;
        let sub = &mut details.subscription;
        if sub.status != SubscriptionStatus::Active || sub.end_date != expected_end_date {
            return Err(AppError::Conflict(
                "subscription changed since it was read".into(),
            ));
        }
        sub.end_date = new_end_date;
        Ok(sub.clone())
    }
}

// ============================================================================
// InMemorySubscriptionPlanRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionPlanRepo {
    pub plans: Mutex<HashMap<i64, SubscriptionPlan>>,
}

impl InMemorySubscriptionPlanRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<SubscriptionPlan>) -> Self {
        Self {
            plans: Mutex::new(plans.into_iter().map(|p| (p.id, p)).collect()),
        }
    }
}

#[async_trait]
impl SubscriptionPlanRepo for InMemorySubscriptionPlanRepo {
    async fn get_by_id(&self, id: i64) -> AppResult<Option<SubscriptionPlan>> {
        Ok(self.plans.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, include_inactive: bool) -> AppResult<Vec<SubscriptionPlan>> {
        let mut plans: Vec<_> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| include_inactive || p.is_active)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.id);
        Ok(plans)
    }

    async fn create(&self, input: &CreatePlanInput) -> AppResult<SubscriptionPlan> {
        let mut plans = self.plans.lock().unwrap();
        let id = plans.keys().max().copied().unwrap_or(0) + 1;
        let plan = SubscriptionPlan {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            price_cents: input.price_cents,
            old_price_cents: input.old_price_cents,
            currency: input.currency,
            duration_days: input.duration_days,
            is_recurring: input.is_recurring,
            is_active: input.is_active,
            features: input.features,
            created_at: Utc::now(),
        };
        plans.insert(id, plan.clone());
        Ok(plan)
    }

    async fn update(&self, id: i64, input: &UpdatePlanInput) -> AppResult<SubscriptionPlan> {
        let mut plans = self.plans.lock().unwrap();
        let plan = plans.get_mut(&id).ok_or(AppError::NotFound)?;
        input.apply_to(plan);
        Ok(plan.clone())
    }
}
