use anyhow::Result;
use chargesync::capabilities::MemoryCapabilityStore;
use chargesync::driver::ChargerDriver;
use chargesync::events::EventBus;
use chargesync::{Config, logging};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[cfg(feature = "http")]
fn build_api(config: &Config) -> Result<Arc<dyn chargesync::api::ChargerApi>> {
    let api = chargesync::api::HttpChargerApi::new(&config.api)
        .map_err(|e| anyhow::anyhow!("Failed to create API client: {}", e))?;
    Ok(Arc::new(api))
}

#[cfg(not(feature = "http"))]
fn build_api(_config: &Config) -> Result<Arc<dyn chargesync::api::ChargerApi>> {
    anyhow::bail!("built without the `http` feature; no charger API available")
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::load().map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "ChargeSync {} starting for device {}",
        env!("APP_VERSION"),
        config.device_id
    );

    let api = build_api(&config)?;
    let store = Arc::new(MemoryCapabilityStore::new());
    let bus = EventBus::new();

    let driver = Arc::new(ChargerDriver::new(
        &config.device_id,
        api,
        store,
        Arc::new(bus.clone()),
        Duration::from_secs(config.poll_interval_seconds),
    ));
    driver
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start monitoring: {}", e))?;

    #[cfg(feature = "web")]
    let web_task = if config.web.enabled {
        let state = chargesync::web::AppState {
            driver: driver.clone(),
            events: bus.clone(),
        };
        let host = config.web.host.clone();
        let port = config.web.port;
        Some(tokio::spawn(async move {
            if let Err(e) = chargesync::web::serve(state, &host, port).await {
                error!("Web server error: {}", e);
            }
        }))
    } else {
        None
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");

    #[cfg(feature = "web")]
    {
        if let Some(task) = web_task {
            task.abort();
        }
    }

    driver.teardown().await;
    info!("Shutdown complete");
    Ok(())
}
