use crate::{
    adapters::{http::app_state::AppState, messaging::http_notifier::HttpNotificationSender},
    infra::{clock::SystemClock, config::AppConfig, error::InfraError, postgres_persistence},
    use_cases::{
        subscription_lifecycle::{SubscriptionLifecycleUseCases, SubscriptionRepo},
        subscription_plan::{SubscriptionPlanRepo, SubscriptionPlanUseCases},
    },
};
use std::fs::File;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const MESSAGING_TIMEOUT_SECS: u64 = 10;

pub async fn init_app_state() -> anyhow::Result<AppState> {
    let config = AppConfig::from_env()?;

    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.db_max_connections).await?);

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(MESSAGING_TIMEOUT_SECS))
        .build()
        .map_err(InfraError::HttpClient)?;
    let notifier = Arc::new(HttpNotificationSender::new(
        http_client,
        config.messaging_base_url.clone(),
        config.messaging_api_token.clone(),
    ));

    let subscription_repo_arc = postgres_arc.clone() as Arc<dyn SubscriptionRepo>;
    let plan_repo_arc = postgres_arc as Arc<dyn SubscriptionPlanRepo>;

    let lifecycle_use_cases = SubscriptionLifecycleUseCases::new(
        subscription_repo_arc,
        notifier,
        Arc::new(SystemClock),
        config.reconcile_page_size,
    );
    let plan_use_cases = SubscriptionPlanUseCases::new(plan_repo_arc);

    Ok(AppState {
        config: Arc::new(config),
        lifecycle_use_cases: Arc::new(lifecycle_use_cases),
        plan_use_cases: Arc::new(plan_use_cases),
    })
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketdesk=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs); console only if the file cannot be created
    let json_layer = match File::create("app.log") {
        Ok(file) => Some(
            fmt::layer()
                .json()
                .with_writer(file)
                .with_current_span(true)
                .with_span_list(true),
        ),
        Err(e) => {
            eprintln!("cannot create app.log, logging to console only: {e}");
            None
        }
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
