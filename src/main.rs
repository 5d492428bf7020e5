use dotenvy::dotenv;
use tracing::info;

use marketdesk::infra::{app::create_app, reconcile::run_reconcile_loop, setup::init_app_state};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;
    let reconcile_interval_secs = app_state.config.reconcile_interval_secs;

    let app = create_app(app_state.clone());

    // create_app installs the tracing subscriber
    if reconcile_interval_secs > 0 {
        let lifecycle_use_cases = app_state.lifecycle_use_cases.clone();
        tokio::spawn(async move {
            run_reconcile_loop(lifecycle_use_cases, reconcile_interval_secs).await;
        });
    } else {
        info!("Scheduled reconcile disabled (RECONCILE_INTERVAL_SECS=0)");
    }

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
