//! Sensor Producer Library
//!
//! This library provides the components of a simulated IoT sensor producer
//! that pushes readings into a shared Redis queue:
//!
//! - **config**: Environment-based configuration for the producer
//! - **reading**: Sensor reading model, wire format, and random generation
//! - **store**: Store capability interface and its Redis implementation
//! - **producer**: Bounded-retry connect, publish-or-reconnect, main loop
//!
//! # Example
//!
//! ```no_run
//! use sensor_producer::config::Config;
//! use sensor_producer::producer::Producer;
//! use sensor_producer::store::RedisStoreFactory;
//!
//! #[tokio::main]
//! async fn main() {
//!     // Load configuration from environment
//!     let config = Config::from_env().expect("Failed to load config");
//!
//!     // Build the store factory and run until Ctrl+C
//!     let factory = RedisStoreFactory::new(&config).expect("Failed to build store factory");
//!     let producer = Producer::new(config, factory);
//!     let shutdown = async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     };
//!     producer.run(shutdown).await.expect("Producer failed");
//! }
//! ```

// Module declarations
pub mod config;
pub mod producer;
pub mod reading;
pub mod store;

// Re-export commonly used types at crate root for convenience
pub use config::{Config, ConfigError};
pub use producer::{Producer, PublishOutcome, RetriesExhausted, State};
pub use reading::{Reading, ReadingGenerator};
pub use store::{RedisStore, RedisStoreFactory, Store, StoreError, StoreFactory};
