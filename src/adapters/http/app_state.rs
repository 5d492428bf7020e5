use std::sync::Arc;

use crate::{
    infra::config::AppConfig,
    use_cases::{
        subscription_lifecycle::SubscriptionLifecycleUseCases,
        subscription_plan::SubscriptionPlanUseCases,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub lifecycle_use_cases: Arc<SubscriptionLifecycleUseCases>,
    pub plan_use_cases: Arc<SubscriptionPlanUseCases>,
}
