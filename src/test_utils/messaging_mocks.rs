//! Notification sender and clock doubles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::{
    app_error::{AppError, AppResult},
    application::use_cases::subscription_lifecycle::{Clock, NotificationSender},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentNotification {
    pub user_id: i64,
    pub title: String,
    pub body: String,
    pub category: String,
}

/// Records every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotificationSender {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotificationSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingNotificationSender {
    async fn send_notification(
        &self,
        user_id: i64,
        title: &str,
        body: &str,
        category: &str,
    ) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentNotification {
            user_id,
            title: title.to_string(),
            body: body.to_string(),
            category: category.to_string(),
        });
        Ok(())
    }
}

/// Always fails with `AppError::Delivery`, counting attempts.
#[derive(Default)]
pub struct FailingNotificationSender {
    attempts: AtomicUsize,
}

impl FailingNotificationSender {
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSender for FailingNotificationSender {
    async fn send_notification(
        &self,
        _user_id: i64,
        _title: &str,
        _body: &str,
        _category: &str,
    ) -> AppResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AppError::Delivery("messaging service unavailable".into()))
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
