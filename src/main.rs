use anyhow::Result;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use ventas_eda::{config::Settings, server, LoadCache};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) settings + logging ──────────────────────────────────────
    let settings = Settings::from_env();
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("")
                    .add_directive(settings.log_level.parse().unwrap_or(Level::INFO.into()))
            }),
        )
        .init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    info!(source = %settings.source.display(), "starting sales dashboard");

    // ─── 2) session cache: the CSV is read on the first request only ─
    let cache = Arc::new(LoadCache::new(settings.source.clone()));

    // ─── 3) serve ───────────────────────────────────────────────────
    info!("Server starting on port {}", settings.port);
    info!("Dashboard: http://localhost:{}/", settings.port);
    info!("JSON model: http://localhost:{}/api/dashboard", settings.port);

    warp::serve(server::routes(cache))
        .run(([0, 0, 0, 0], settings.port))
        .await;

    Ok(())
}
