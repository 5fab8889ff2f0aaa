use dotenvy::dotenv;
use tracing::info;

use marketplace_api::infra::{
    app::create_app,
    expiry_sweeper::run_expiry_sweep_loop,
    setup::{init_app_state, init_tracing},
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing();

    let app_state = init_app_state().await?;

    let bind_addr = app_state.config.bind_addr;

    let app = create_app(app_state.clone());

    // Catch-up sweep for placements and subscriptions whose timers were lost
    let promotions = app_state.promotion_use_cases.clone();
    let subscriptions = app_state.subscription_use_cases.clone();
    let every_secs = app_state.config.expiry_sweep_interval_secs;
    tokio::spawn(async move {
        run_expiry_sweep_loop(promotions, subscriptions, every_secs).await;
    });

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Backend listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
