use anyhow::Result;
use powerflow_bridge::{api, config, state, telemetry};
use config::Config;
use state::AppState;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::load()?;
    telemetry::init_tracing(&cfg.logging);

    if cfg.server.host == "0.0.0.0" {
        warn!("binding to 0.0.0.0: the power flow API is reachable from the network without authentication");
    }

    let app_state = AppState::new(&cfg)?;
    let app = api::router(app_state, &cfg);

    let addr = cfg.server.socket_addr()?;
    info!(
        %addr,
        runner = %cfg.runner.base_url,
        poll_timeout_secs = cfg.polling.timeout_secs,
        "starting power flow bridge"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(telemetry::shutdown_signal())
        .await?;

    warn!("shutdown complete");
    Ok(())
}
