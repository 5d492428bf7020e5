use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app_error::{AppError, AppResult};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    Active,
    Expired,
    #[strum(to_string = "cancelled", serialize = "canceled")]
    Cancelled,
}

impl SubscriptionStatus {
    /// Expired and cancelled subscriptions never transition again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SubscriptionStatus::Active)
    }
}

/// Which collection a subscription lives in. Both kinds follow the same
/// lifecycle rules but are stored and reconciled independently.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display, strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SubscriptionKind {
    User,
    Market,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SubscriptionOwner {
    #[serde(rename_all = "camelCase")]
    User { user_id: i64 },
    /// Market listings are owned by a user; reminders go to that user.
    #[serde(rename_all = "camelCase")]
    Market { market_id: i64, user_id: i64 },
}

impl SubscriptionOwner {
    pub fn kind(&self) -> SubscriptionKind {
        match self {
            SubscriptionOwner::User { .. } => SubscriptionKind::User,
            SubscriptionOwner::Market { .. } => SubscriptionKind::Market,
        }
    }

    pub fn recipient_user_id(&self) -> i64 {
        match self {
            SubscriptionOwner::User { user_id } | SubscriptionOwner::Market { user_id, .. } => {
                *user_id
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: i64,
    pub owner: SubscriptionOwner,
    pub plan_id: i64,
    pub status: SubscriptionStatus,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    /// Build a freshly purchased or assigned subscription.
    pub fn new_validated(
        id: i64,
        owner: SubscriptionOwner,
        plan_id: i64,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        auto_renew: bool,
        created_at: DateTime<Utc>,
    ) -> AppResult<Self> {
        if end_date <= start_date {
            return Err(AppError::InvalidArgument(
                "Subscription end date must be after its start date".into(),
            ));
        }
        Ok(Self {
            id,
            owner,
            plan_id,
            status: SubscriptionStatus::Active,
            start_date,
            end_date,
            auto_renew,
            created_at,
        })
    }

    pub fn kind(&self) -> SubscriptionKind {
        self.owner.kind()
    }
}

/// A subscription joined with the display data the admin views need.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionDetails {
    pub subscription: Subscription,
    pub user_name: String,
    pub user_email: Option<String>,
    pub plan_name: String,
    pub plan_price_cents: i64,
    pub plan_currency: String,
    pub market_name: Option<String>,
}
