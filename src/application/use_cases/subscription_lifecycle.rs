use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::{
    app_error::{AppError, AppResult},
    domain::{
        entities::subscription::{
            Subscription, SubscriptionDetails, SubscriptionKind, SubscriptionStatus,
        },
        lifecycle::{
            self, DaysStatus, ExpirationReminder, StatusFilter, classify, days_remaining,
            effective_status, is_actually_expired, is_expiring_soon, needs_reconciliation,
            recorded_status,
        },
    },
};

pub const MAX_PAGE_SIZE: u32 = 100;

// ============================================================================
// Query / Result Types
// ============================================================================

/// Server-side filter understood by the persistence collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionQuery {
    pub status: Option<SubscriptionStatus>,
    pub ends_before: Option<DateTime<Utc>>,
}

impl SubscriptionQuery {
    /// Records still recorded active whose end date is before `now`.
    pub fn stale_as_of(now: DateTime<Utc>) -> Self {
        Self {
            status: Some(SubscriptionStatus::Active),
            ends_before: Some(now),
        }
    }

    pub fn matches(&self, subscription: &Subscription) -> bool {
        self.status.is_none_or(|s| subscription.status == s)
            && self.ends_before.is_none_or(|t| subscription.end_date < t)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u32,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, page: u32, page_size: u32, total: u64) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            total.div_ceil(u64::from(page_size)) as u32
        };
        Self {
            items,
            page,
            page_size,
            total,
            total_pages,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }

    /// Transform the items while keeping the server's pagination metadata.
    pub fn map_items<U>(self, f: impl FnOnce(Vec<T>) -> Vec<U>) -> Page<U> {
        Page {
            items: f(self.items),
            page: self.page,
            page_size: self.page_size,
            total: self.total,
            total_pages: self.total_pages,
            has_next_page: self.has_next_page,
            has_prev_page: self.has_prev_page,
        }
    }
}

/// A subscription as an operator sees it: stored fields plus everything
/// derived from the end date at `now`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    #[serde(flatten)]
    pub details: SubscriptionDetails,
    pub days_status: DaysStatus,
    pub effective_status: SubscriptionStatus,
    pub actually_expired: bool,
    pub expiring_soon: bool,
    pub needs_reconciliation: bool,
}

impl SubscriptionView {
    pub fn derive(details: SubscriptionDetails, now: DateTime<Utc>) -> Self {
        let sub = &details.subscription;
        Self {
            days_status: classify(sub.end_date, now),
            effective_status: effective_status(sub, now),
            actually_expired: is_actually_expired(sub.end_date, now),
            expiring_soon: is_expiring_soon(sub.end_date, now),
            needs_reconciliation: needs_reconciliation(sub, now),
            details,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KindReconcileReport {
    pub scanned: u64,
    pub expired: u64,
    /// Candidates another writer moved first; left untouched.
    pub skipped: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub user_subscriptions: KindReconcileReport,
    pub market_subscriptions: KindReconcileReport,
}

impl ReconcileReport {
    pub fn total_expired(&self) -> u64 {
        self.user_subscriptions.expired + self.market_subscriptions.expired
    }

    pub fn total_skipped(&self) -> u64 {
        self.user_subscriptions.skipped + self.market_subscriptions.skipped
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentReminder {
    pub subscription_id: i64,
    pub recipient_user_id: i64,
    pub days_remaining: i64,
    pub reminder: ExpirationReminder,
}

// ============================================================================
// Ports
// ============================================================================

/// Persistence collaborator. Each call is atomic on its own; the two update
/// calls are compare-and-set and fail with `AppError::Conflict` when the
/// record no longer matches the expected state.
#[async_trait]
pub trait SubscriptionRepo: Send + Sync {
    async fn fetch_by_id(
        &self,
        kind: SubscriptionKind,
        id: i64,
    ) -> AppResult<Option<SubscriptionDetails>>;

    async fn fetch_page(
        &self,
        kind: SubscriptionKind,
        query: &SubscriptionQuery,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<SubscriptionDetails>>;

    /// Move `id` from `expected` to `new_status`. Cancelling also clears
    /// auto-renew.
    async fn update_status(
        &self,
        kind: SubscriptionKind,
        id: i64,
        expected: SubscriptionStatus,
        new_status: SubscriptionStatus,
    ) -> AppResult<Subscription>;

    /// Replace the end date of an active subscription whose end date is
    /// still `expected_end_date`.
    async fn update_end_date(
        &self,
        kind: SubscriptionKind,
        id: i64,
        expected_end_date: DateTime<Utc>,
        new_end_date: DateTime<Utc>,
    ) -> AppResult<Subscription>;
}

/// Messaging collaborator. Implementations report failures as
/// `AppError::Delivery` and never retry.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_notification(
        &self,
        user_id: i64,
        title: &str,
        body: &str,
        category: &str,
    ) -> AppResult<()>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct SubscriptionLifecycleUseCases {
    repo: Arc<dyn SubscriptionRepo>,
    notifier: Arc<dyn NotificationSender>,
    clock: Arc<dyn Clock>,
    reconcile_page_size: u32,
}

impl SubscriptionLifecycleUseCases {
    pub fn new(
        repo: Arc<dyn SubscriptionRepo>,
        notifier: Arc<dyn NotificationSender>,
        clock: Arc<dyn Clock>,
        reconcile_page_size: u32,
    ) -> Self {
        Self {
            repo,
            notifier,
            clock,
            reconcile_page_size: reconcile_page_size.clamp(1, MAX_PAGE_SIZE),
        }
    }

    async fn fetch_existing(&self, kind: SubscriptionKind, id: i64) -> AppResult<SubscriptionDetails> {
        self.repo
            .fetch_by_id(kind, id)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn get(&self, kind: SubscriptionKind, id: i64) -> AppResult<SubscriptionView> {
        let details = self.fetch_existing(kind, id).await?;
        Ok(SubscriptionView::derive(details, self.clock.now()))
    }

    /// One server page, then the status filter applied to that page.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        kind: SubscriptionKind,
        filter: StatusFilter,
        page: u32,
        page_size: u32,
    ) -> AppResult<Page<SubscriptionView>> {
        if page == 0 {
            return Err(AppError::InvalidArgument("page starts at 1".into()));
        }
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(AppError::InvalidArgument(format!(
                "page size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }

        let fetched = self
            .repo
            .fetch_page(kind, &SubscriptionQuery::default(), page, page_size)
            .await?;
        let now = self.clock.now();

        Ok(fetched.map_items(|items| {
            let views = items
                .into_iter()
                .map(|details| SubscriptionView::derive(details, now))
                .collect();
            lifecycle::filter_by_status(views, filter, now, |v: &SubscriptionView| {
                &v.details.subscription
            })
        }))
    }

    #[instrument(skip(self))]
    pub async fn cancel(&self, kind: SubscriptionKind, id: i64) -> AppResult<Subscription> {
        let details = self.fetch_existing(kind, id).await?;
        let current = recorded_status(&details.subscription);
        if current.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Cannot cancel a {} subscription",
                current
            )));
        }

        let updated = self
            .repo
            .update_status(kind, id, current, SubscriptionStatus::Cancelled)
            .await?;

        info!(kind = %kind, subscription_id = id, "Subscription cancelled");
        Ok(updated)
    }

    /// Push the end date forward. The status is left alone even if the new
    /// end date is still in the past; reconciliation decides that.
    #[instrument(skip(self))]
    pub async fn extend(
        &self,
        kind: SubscriptionKind,
        id: i64,
        additional_days: i64,
    ) -> AppResult<Subscription> {
        if additional_days <= 0 {
            return Err(AppError::InvalidArgument(
                "additionalDays must be a positive number of days".into(),
            ));
        }
        let delta = TimeDelta::try_days(additional_days)
            .ok_or_else(|| AppError::InvalidArgument("additionalDays is too large".into()))?;

        let details = self.fetch_existing(kind, id).await?;
        let sub = details.subscription;
        let current = recorded_status(&sub);
        if current.is_terminal() {
            return Err(AppError::InvalidState(format!(
                "Cannot extend a {} subscription",
                current
            )));
        }

        let new_end_date = sub
            .end_date
            .checked_add_signed(delta)
            .ok_or_else(|| AppError::InvalidArgument("additionalDays is too large".into()))?;

        let updated = self
            .repo
            .update_end_date(kind, id, sub.end_date, new_end_date)
            .await?;

        info!(
            kind = %kind,
            subscription_id = id,
            additional_days,
            new_end_date = %updated.end_date,
            "Subscription extended"
        );
        Ok(updated)
    }

    /// Mark every active subscription past its end date as expired, user and
    /// market subscriptions alike.
    #[instrument(skip(self))]
    pub async fn reconcile_expired(&self) -> AppResult<ReconcileReport> {
        let now = self.clock.now();

        let user_subscriptions = self.reconcile_kind(SubscriptionKind::User, now).await?;
        let market_subscriptions = self.reconcile_kind(SubscriptionKind::Market, now).await?;

        let report = ReconcileReport {
            user_subscriptions,
            market_subscriptions,
        };
        info!(
            expired = report.total_expired(),
            skipped = report.total_skipped(),
            "Reconcile sweep finished"
        );
        Ok(report)
    }

    async fn reconcile_kind(
        &self,
        kind: SubscriptionKind,
        now: DateTime<Utc>,
    ) -> AppResult<KindReconcileReport> {
        let query = SubscriptionQuery::stale_as_of(now);

        // Snapshot first so transitions cannot shift the pages under us.
        let mut candidates = Vec::new();
        let mut page = 1;
        loop {
            let batch = self
                .repo
                .fetch_page(kind, &query, page, self.reconcile_page_size)
                .await?;
            let last_page = batch.items.is_empty() || !batch.has_next_page;
            candidates.extend(
                batch
                    .items
                    .into_iter()
                    .map(|d| d.subscription)
                    .filter(|s| needs_reconciliation(s, now)),
            );
            if last_page {
                break;
            }
            page += 1;
        }

        let mut report = KindReconcileReport {
            scanned: candidates.len() as u64,
            ..Default::default()
        };

        for sub in candidates {
            match self
                .repo
                .update_status(
                    kind,
                    sub.id,
                    SubscriptionStatus::Active,
                    SubscriptionStatus::Expired,
                )
                .await
            {
                Ok(_) => report.expired += 1,
                Err(AppError::Conflict(reason)) => {
                    warn!(
                        kind = %kind,
                        subscription_id = sub.id,
                        reason = %reason,
                        "Skipping subscription changed during reconcile"
                    );
                    report.skipped += 1;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(report)
    }

    /// Send the "expiring soon" reminder for an active subscription ending
    /// within the next week. Delivery failures are returned as-is.
    #[instrument(skip(self))]
    pub async fn notify_expiring(
        &self,
        kind: SubscriptionKind,
        id: i64,
    ) -> AppResult<SentReminder> {
        let details = self.fetch_existing(kind, id).await?;
        let sub = &details.subscription;
        let now = self.clock.now();

        let current = recorded_status(sub);
        if current != SubscriptionStatus::Active {
            return Err(AppError::InvalidState(format!(
                "Cannot send an expiration reminder for a {} subscription",
                current
            )));
        }
        if !is_expiring_soon(sub.end_date, now) {
            return Err(AppError::InvalidState(
                "Subscription is not expiring within the next 7 days".into(),
            ));
        }

        let days = days_remaining(sub.end_date, now);
        let reminder = ExpirationReminder::build(&details.user_name, &details.plan_name, days);
        let recipient_user_id = sub.owner.recipient_user_id();

        self.notifier
            .send_notification(
                recipient_user_id,
                &reminder.title,
                &reminder.body,
                &reminder.category,
            )
            .await?;

        info!(
            kind = %kind,
            subscription_id = id,
            recipient_user_id,
            days_remaining = days,
            "Expiration reminder sent"
        );

        Ok(SentReminder {
            subscription_id: sub.id,
            recipient_user_id,
            days_remaining: days,
            reminder,
        })
    }
}
