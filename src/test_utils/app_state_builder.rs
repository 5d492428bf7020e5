//! Test app state builder for HTTP-level testing.
//!
//! `TestAppStateBuilder` creates an `AppState` wired to in-memory mocks and
//! a clock fixed at `test_now()`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use secrecy::SecretString;
use url::Url;

use crate::{
    adapters::http::app_state::AppState,
    application::use_cases::{
        subscription_lifecycle::{NotificationSender, SubscriptionLifecycleUseCases},
        subscription_plan::SubscriptionPlanUseCases,
    },
    domain::entities::{subscription::SubscriptionDetails, subscription_plan::SubscriptionPlan},
    infra::config::{AdminAuth, AppConfig},
    test_utils::{
        FailingNotificationSender, FixedClock, InMemorySubscriptionPlanRepo,
        InMemorySubscriptionRepo, RecordingNotificationSender, test_now,
    },
};

/// Bearer token accepted by states built with the default token auth.
pub const TEST_ADMIN_TOKEN: &str = "test-admin-token";

/// Builder for creating `AppState` with in-memory mocks for testing.
///
/// # Example
///
/// ```ignore
/// let builder = TestAppStateBuilder::new()
///     .with_subscription(create_test_subscription(1, |_| {}));
/// let notifier = builder.notifier();
/// let app_state = builder.build();
/// ```
pub struct TestAppStateBuilder {
    subscriptions: Vec<SubscriptionDetails>,
    plans: Vec<SubscriptionPlan>,
    notifier: Arc<RecordingNotificationSender>,
    failing_notifier: bool,
    admin_auth: AdminAuth,
}

impl TestAppStateBuilder {
    pub fn new() -> Self {
        Self {
            subscriptions: vec![],
            plans: vec![],
            notifier: Arc::new(RecordingNotificationSender::new()),
            failing_notifier: false,
            admin_auth: AdminAuth::Token(SecretString::from(TEST_ADMIN_TOKEN.to_string())),
        }
    }

    pub fn with_subscription(mut self, subscription: SubscriptionDetails) -> Self {
        self.subscriptions.push(subscription);
        self
    }

    pub fn with_plan(mut self, plan: SubscriptionPlan) -> Self {
        self.plans.push(plan);
        self
    }

    /// Every notification fails with a delivery error.
    pub fn with_failing_notifier(mut self) -> Self {
        self.failing_notifier = true;
        self
    }

    pub fn with_admin_auth_disabled(mut self) -> Self {
        self.admin_auth = AdminAuth::Disabled;
        self
    }

    /// The recording notifier the built state will use (for assertions).
    pub fn notifier(&self) -> Arc<RecordingNotificationSender> {
        self.notifier.clone()
    }

    pub fn build(self) -> AppState {
        let subscription_repo = Arc::new(InMemorySubscriptionRepo::with_subscriptions(
            self.subscriptions,
        ));
        let plan_repo = Arc::new(InMemorySubscriptionPlanRepo::with_plans(self.plans));
        let notifier: Arc<dyn NotificationSender> = if self.failing_notifier {
            Arc::new(FailingNotificationSender::default()) as Arc<dyn NotificationSender>
        } else {
            self.notifier as Arc<dyn NotificationSender>
        };

        let config = AppConfig {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
            database_url: "postgres://unused".to_string(),
            db_max_connections: 1,
            messaging_base_url: Url::parse("http://messaging.test/api").unwrap(),
            messaging_api_token: None,
            admin_auth: self.admin_auth,
            default_page_size: 20,
            reconcile_page_size: 50,
            reconcile_interval_secs: 0,
        };

        let lifecycle_use_cases = SubscriptionLifecycleUseCases::new(
            subscription_repo,
            notifier,
            Arc::new(FixedClock(test_now())),
            config.reconcile_page_size,
        );
        let plan_use_cases = SubscriptionPlanUseCases::new(plan_repo);

        AppState {
            config: Arc::new(config),
            lifecycle_use_cases: Arc::new(lifecycle_use_cases),
            plan_use_cases: Arc::new(plan_use_cases),
        }
    }
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}
