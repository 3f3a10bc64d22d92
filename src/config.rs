//! Configuration module for the sensor producer.
//!
//! This module provides environment-based configuration for the producer,
//! including the Redis store address, optional credential, sensor identity,
//! and push cadence.

use std::env;
use std::time::Duration;

/// Default host for the Redis store
const DEFAULT_STORE_HOST: &str = "localhost";

/// Default port for the Redis store
const DEFAULT_STORE_PORT: u16 = 6379;

/// Default sensor identifier stamped into every reading
const DEFAULT_SENSOR_ID: &str = "rbt-01";

/// Default push interval in seconds
const DEFAULT_PUSH_INTERVAL_SECS: u64 = 3;

/// Configuration for the sensor producer.
///
/// All settings can be configured via environment variables:
/// - `REDIS_HOST`: store host (default: localhost)
/// - `REDIS_PORT`: store port (default: 6379)
/// - `REDIS_PASSWORD`: store credential (default: none)
/// - `SENSOR_ID`: sensor identifier (default: rbt-01)
/// - `PUSH_INTERVAL`: seconds between pushes (default: 3)
///
/// Resolved once at startup and passed explicitly to every component that
/// needs it; never re-read from the environment afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Network address of the Redis store
    pub store_host: String,

    /// Connection target port of the Redis store
    pub store_port: u16,

    /// Credential for store authentication; `None` means no authentication
    pub store_credential: Option<String>,

    /// Identifier stamped into every generated reading
    pub sensor_id: String,

    /// Duration to sleep between consecutive pushes
    pub push_interval: Duration,
}

/// Error type for configuration loading failures
#[derive(Debug)]
pub struct ConfigError {
    pub message: String,
    pub env_var: Option<String>,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.env_var {
            Some(var) => write!(f, "Configuration error for {}: {}", var, self.message),
            None => write!(f, "Configuration error: {}", self.message),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Returns a new `Config` instance with values from environment variables,
    /// falling back to the documented defaults where absent.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - `REDIS_PORT` is present but not a valid port number (1-65535)
    /// - `PUSH_INTERVAL` is present but not a positive integer
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use sensor_producer::config::Config;
    ///
    /// let config = Config::from_env().expect("Failed to load config");
    /// println!("Store: {}:{}", config.store_host, config.store_port);
    /// ```
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_host =
            env::var("REDIS_HOST").unwrap_or_else(|_| DEFAULT_STORE_HOST.to_string());

        let store_port = Self::parse_store_port()?;

        // Absent means the connection attempt carries no credential at all.
        let store_credential = env::var("REDIS_PASSWORD").ok();

        let sensor_id = env::var("SENSOR_ID").unwrap_or_else(|_| DEFAULT_SENSOR_ID.to_string());

        let push_interval_secs = Self::parse_push_interval()?;
        let push_interval = Duration::from_secs(push_interval_secs);

        Ok(Self {
            store_host,
            store_port,
            store_credential,
            sensor_id,
            push_interval,
        })
    }

    /// Parse the store port from the environment with validation.
    fn parse_store_port() -> Result<u16, ConfigError> {
        let env_var = "REDIS_PORT";

        match env::var(env_var) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|_| ConfigError {
                    message: format!("'{}' is not a valid port number", value),
                    env_var: Some(env_var.to_string()),
                })?;

                if port == 0 {
                    return Err(ConfigError {
                        message: "port must be in the range 1-65535".to_string(),
                        env_var: Some(env_var.to_string()),
                    });
                }

                Ok(port)
            }
            Err(_) => Ok(DEFAULT_STORE_PORT),
        }
    }

    /// Parse the push interval from the environment with validation.
    fn parse_push_interval() -> Result<u64, ConfigError> {
        let env_var = "PUSH_INTERVAL";

        match env::var(env_var) {
            Ok(value) => {
                let interval: u64 = value.parse().map_err(|_| ConfigError {
                    message: format!("'{}' is not a valid number", value),
                    env_var: Some(env_var.to_string()),
                })?;

                if interval == 0 {
                    return Err(ConfigError {
                        message: "push interval must be greater than 0".to_string(),
                        env_var: Some(env_var.to_string()),
                    });
                }

                Ok(interval)
            }
            Err(_) => Ok(DEFAULT_PUSH_INTERVAL_SECS),
        }
    }
}

impl Default for Config {
    /// Create a default configuration using default values.
    ///
    /// This is useful for testing or when environment variables are not set.
    fn default() -> Self {
        Self {
            store_host: DEFAULT_STORE_HOST.to_string(),
            store_port: DEFAULT_STORE_PORT,
            store_credential: None,
            sensor_id: DEFAULT_SENSOR_ID.to_string(),
            push_interval: Duration::from_secs(DEFAULT_PUSH_INTERVAL_SECS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, MutexGuard};

    // Tests mutate process-wide environment variables; serialize them.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Helper to temporarily set environment variables for testing
    struct EnvGuard {
        key: String,
        original: Option<String>,
    }

    impl EnvGuard {
        fn set(key: &str, value: &str) -> Self {
            let original = env::var(key).ok();
            env::set_var(key, value);
            Self {
                key: key.to_string(),
                original,
            }
        }

        fn remove(key: &str) -> Self {
            let original = env::var(key).ok();
            env::remove_var(key);
            Self {
                key: key.to_string(),
                original,
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(val) => env::set_var(&self.key, val),
                None => env::remove_var(&self.key),
            }
        }
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.store_host, "localhost");
        assert_eq!(config.store_port, 6379);
        assert!(config.store_credential.is_none());
        assert_eq!(config.sensor_id, "rbt-01");
        assert_eq!(config.push_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_config_from_env_with_defaults() {
        let _env = env_lock();
        let _guard1 = EnvGuard::remove("REDIS_HOST");
        let _guard2 = EnvGuard::remove("REDIS_PORT");
        let _guard3 = EnvGuard::remove("REDIS_PASSWORD");
        let _guard4 = EnvGuard::remove("SENSOR_ID");
        let _guard5 = EnvGuard::remove("PUSH_INTERVAL");

        let config = Config::from_env().expect("Should load with defaults");
        assert_eq!(config.store_host, "localhost");
        assert_eq!(config.store_port, 6379);
        assert!(config.store_credential.is_none());
        assert_eq!(config.sensor_id, "rbt-01");
        assert_eq!(config.push_interval, Duration::from_secs(3));
    }

    #[test]
    fn test_config_from_env_custom_values() {
        let _env = env_lock();
        let _guard1 = EnvGuard::set("REDIS_HOST", "redis.internal");
        let _guard2 = EnvGuard::set("REDIS_PORT", "6380");
        let _guard3 = EnvGuard::set("REDIS_PASSWORD", "hunter2");
        let _guard4 = EnvGuard::set("SENSOR_ID", "rbt-42");
        let _guard5 = EnvGuard::set("PUSH_INTERVAL", "10");

        let config = Config::from_env().expect("Should load custom values");
        assert_eq!(config.store_host, "redis.internal");
        assert_eq!(config.store_port, 6380);
        assert_eq!(config.store_credential.as_deref(), Some("hunter2"));
        assert_eq!(config.sensor_id, "rbt-42");
        assert_eq!(config.push_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_invalid_port() {
        let _env = env_lock();
        let _guard = EnvGuard::set("REDIS_PORT", "not_a_number");

        let result = Config::from_env();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message.contains("not a valid port"));
    }

    #[test]
    fn test_port_out_of_range() {
        let _env = env_lock();
        let _guard = EnvGuard::set("REDIS_PORT", "70000");

        let result = Config::from_env();
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_port() {
        let _env = env_lock();
        let _guard = EnvGuard::set("REDIS_PORT", "0");

        let result = Config::from_env();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message.contains("1-65535"));
    }

    #[test]
    fn test_invalid_push_interval() {
        let _env = env_lock();
        let _guard = EnvGuard::set("PUSH_INTERVAL", "three");

        let result = Config::from_env();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message.contains("not a valid number"));
    }

    #[test]
    fn test_zero_push_interval() {
        let _env = env_lock();
        let _guard = EnvGuard::set("PUSH_INTERVAL", "0");

        let result = Config::from_env();
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.message.contains("greater than 0"));
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError {
            message: "test error".to_string(),
            env_var: Some("TEST_VAR".to_string()),
        };
        assert_eq!(
            format!("{}", error),
            "Configuration error for TEST_VAR: test error"
        );

        let error_no_var = ConfigError {
            message: "general error".to_string(),
            env_var: None,
        };
        assert_eq!(
            format!("{}", error_no_var),
            "Configuration error: general error"
        );
    }
}
