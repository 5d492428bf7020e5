//! Pure lifecycle rules for subscriptions.
//!
//! The recorded `status` of a subscription may lag behind its `end_date`: an
//! active record whose end date has passed stays active until a reconcile
//! sweep marks it expired. Everything here derives expiration from the end
//! date and the supplied `now`, never from the stored status alone.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entities::subscription::{Subscription, SubscriptionStatus};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Subscriptions ending within this many days are "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Normal,
    Warning,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaysStatus {
    pub label: String,
    pub severity: Severity,
    pub is_expired: bool,
    pub days_remaining: i64,
}

/// Whole days until `end_date`, rounded up. Negative once the end date is at
/// least a full day in the past.
pub fn days_remaining(end_date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let diff_ms = end_date
        .timestamp_millis()
        .saturating_sub(now.timestamp_millis());
    ceil_div(diff_ms, MILLIS_PER_DAY)
}

fn ceil_div(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

fn days_word(n: i64) -> &'static str {
    if n == 1 { "day" } else { "days" }
}

pub fn classify(end_date: DateTime<Utc>, now: DateTime<Utc>) -> DaysStatus {
    let days = days_remaining(end_date, now);
    match days {
        d if d < 0 => {
            let ago = d.unsigned_abs();
            DaysStatus {
                label: format!("Expired {} {} ago", ago, days_word(ago as i64)),
                severity: Severity::Critical,
                is_expired: true,
                days_remaining: d,
            }
        }
        0 => DaysStatus {
            label: "Expires today".to_string(),
            severity: Severity::Warning,
            is_expired: false,
            days_remaining: 0,
        },
        d if d <= EXPIRING_SOON_DAYS => DaysStatus {
            label: format!("Expires in {} {}", d, days_word(d)),
            severity: Severity::Warning,
            is_expired: false,
            days_remaining: d,
        },
        d => DaysStatus {
            label: format!("{} days remaining", d),
            severity: Severity::Normal,
            is_expired: false,
            days_remaining: d,
        },
    }
}

pub fn is_actually_expired(end_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    end_date < now
}

/// True when the subscription ends within the next week, today included.
///
/// An end date a few hours in the past still rounds to zero days remaining;
/// it is already expired and therefore not "expiring soon".
pub fn is_expiring_soon(end_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    let days = days_remaining(end_date, now);
    (0..=EXPIRING_SOON_DAYS).contains(&days) && !is_actually_expired(end_date, now)
}

pub fn recorded_status(subscription: &Subscription) -> SubscriptionStatus {
    subscription.status
}

/// The status an operator should see: an active record past its end date is
/// reported as expired even before reconciliation catches up.
pub fn effective_status(subscription: &Subscription, now: DateTime<Utc>) -> SubscriptionStatus {
    match subscription.status {
        SubscriptionStatus::Active if is_actually_expired(subscription.end_date, now) => {
            SubscriptionStatus::Expired
        }
        status => status,
    }
}

/// Recorded active while the end date has passed; the next reconcile sweep
/// will move it to expired.
pub fn needs_reconciliation(subscription: &Subscription, now: DateTime<Utc>) -> bool {
    subscription.status == SubscriptionStatus::Active
        && is_actually_expired(subscription.end_date, now)
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    /// Widened beyond the stored field: also matches records that are past
    /// their end date but not yet reconciled.
    Expired,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
}

impl StatusFilter {
    pub fn matches(&self, subscription: &Subscription, now: DateTime<Utc>) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => subscription.status == SubscriptionStatus::Active,
            StatusFilter::Expired => {
                subscription.status == SubscriptionStatus::Expired
                    || is_actually_expired(subscription.end_date, now)
            }
            StatusFilter::Cancelled => subscription.status == SubscriptionStatus::Cancelled,
        }
    }
}

pub fn filter_by_status<T, F>(
    items: Vec<T>,
    filter: StatusFilter,
    now: DateTime<Utc>,
    subscription_of: F,
) -> Vec<T>
where
    F: Fn(&T) -> &Subscription,
{
    if filter == StatusFilter::All {
        return items;
    }
    items
        .into_iter()
        .filter(|item| filter.matches(subscription_of(item), now))
        .collect()
}

pub const REMINDER_TITLE: &str = "Subscription Expiring Soon";
pub const REMINDER_CATEGORY: &str = "admin";

/// "today", "in 1 day" or "in N days".
pub fn reminder_days_phrase(days_remaining: i64) -> String {
    match days_remaining {
        0 => "today".to_string(),
        1 => "in 1 day".to_string(),
        n => format!("in {} days", n),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExpirationReminder {
    pub title: String,
    pub body: String,
    pub category: String,
}

impl ExpirationReminder {
    pub fn build(user_name: &str, plan_name: &str, days_remaining: i64) -> Self {
        let body = format!(
            "Hello {},\n\nYour subscription \"{}\" is expiring {}. Please renew your subscription to continue enjoying all the benefits.\n\nThank you for being with us!",
            user_name,
            plan_name,
            reminder_days_phrase(days_remaining)
        );
        Self {
            title: REMINDER_TITLE.to_string(),
            body,
            category: REMINDER_CATEGORY.to_string(),
        }
    }
}
