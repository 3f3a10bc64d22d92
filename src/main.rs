//! Sensor Producer - simulated IoT sensor feeding a shared Redis queue
//!
//! This service generates one random sensor reading per interval and
//! appends it to the `sensors` list in Redis, tolerating store
//! unavailability at startup (bounded retry) and during steady state
//! (publish-or-reconnect).
//!
//! ## Configuration
//!
//! Configuration is loaded from environment variables:
//!
//! - `REDIS_HOST`: store host (default: localhost)
//! - `REDIS_PORT`: store port (default: 6379)
//! - `REDIS_PASSWORD`: store credential (default: none)
//! - `SENSOR_ID`: sensor identifier (default: rbt-01)
//! - `PUSH_INTERVAL`: seconds between pushes (default: 3)
//! - `RUST_LOG`: Logging level filter (default: info)

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use sensor_producer::config::Config;
use sensor_producer::producer::Producer;
use sensor_producer::store::RedisStoreFactory;

#[tokio::main]
async fn main() {
    // Initialize tracing subscriber with environment filter
    init_tracing();

    info!("Starting sensor producer...");

    // Load configuration from environment; malformed values are fatal
    // before any network activity.
    let config = match Config::from_env() {
        Ok(config) => {
            info!(
                store_host = %config.store_host,
                store_port = config.store_port,
                sensor_id = %config.sensor_id,
                push_interval_secs = config.push_interval.as_secs(),
                authenticated = config.store_credential.is_some(),
                "Configuration loaded"
            );
            config
        }
        Err(e) => {
            error!(error = %e, "Failed to load configuration");
            std::process::exit(1);
        }
    };

    // Build the store factory; handles are constructed from it lazily.
    let factory = match RedisStoreFactory::new(&config) {
        Ok(factory) => factory,
        Err(e) => {
            error!(error = %e, "Failed to build store factory");
            std::process::exit(1);
        }
    };

    let producer = Producer::new(config, factory);

    // Run until Ctrl+C; cancellation is observed at loop boundaries.
    info!("Sensor producer running. Press Ctrl+C to stop.");
    let shutdown = async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, stopping..."),
            Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
        }
    };

    match producer.run(shutdown).await {
        Ok(()) => {
            info!("Sensor producer stopped");
        }
        Err(e) => {
            error!(error = %e, "Fatal: store never became reachable");
            std::process::exit(1);
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}
