//! Store capability interface and its Redis implementation.
//!
//! The producer only needs three things from the store: constructing a
//! fresh handle (cheap, never fails, never touches the network), a liveness
//! probe, and an append onto the shared queue list. Failures are classified
//! as connectivity-class vs store-side so callers can decide whether to
//! replace the handle.

use std::time::Duration;

use redis::AsyncCommands;

use crate::config::Config;

/// Connect timeout applied when a handle first dials the store.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Per-command response timeout on an established connection.
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors surfaced by store operations.
#[derive(Debug, Clone)]
pub enum StoreError {
    /// The store is unreachable or the connection was lost or refused
    Connectivity(String),

    /// The store responded but rejected the operation
    Store(String),
}

impl StoreError {
    /// Whether this failure is attributable to the store being unreachable,
    /// as opposed to a rejected command.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, StoreError::Connectivity(_))
    }
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Connectivity(e) => write!(f, "Store unreachable: {}", e),
            StoreError::Store(e) => write!(f, "Store error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<redis::RedisError> for StoreError {
    fn from(err: redis::RedisError) -> Self {
        if err.is_io_error()
            || err.is_timeout()
            || err.is_connection_dropped()
            || err.is_connection_refusal()
        {
            StoreError::Connectivity(err.to_string())
        } else {
            StoreError::Store(err.to_string())
        }
    }
}

/// A handle to the store.
///
/// A handle is never guaranteed valid after acquisition; every use must be
/// prepared for invalidation. On detected failure the owner replaces the
/// whole handle rather than repairing it.
#[allow(async_fn_in_trait)]
pub trait Store {
    /// Liveness check: the store must explicitly confirm responsiveness,
    /// not merely accept a socket.
    async fn probe(&mut self) -> Result<(), StoreError>;

    /// Append a serialized record to the named list, newest first.
    async fn append(&mut self, list: &str, record: &str) -> Result<(), StoreError>;
}

/// Constructor for store handles.
///
/// `construct` is non-blocking and never fails: the handle dials lazily on
/// first use, so a fresh handle can always be obtained even while the store
/// is down.
pub trait StoreFactory {
    type Handle: Store;

    fn construct(&self) -> Self::Handle;
}

/// Factory producing Redis-backed store handles.
///
/// Built once at startup from the resolved configuration; the underlying
/// `redis::Client` is a cheap connection-parameter holder and is cloned
/// into every handle.
pub struct RedisStoreFactory {
    client: redis::Client,
}

impl RedisStoreFactory {
    /// Build a factory from the resolved configuration.
    ///
    /// The credential is omitted from the connection info entirely when the
    /// configuration carries none.
    pub fn new(config: &Config) -> Result<Self, StoreError> {
        let info = redis::ConnectionInfo {
            addr: redis::ConnectionAddr::Tcp(config.store_host.clone(), config.store_port),
            redis: redis::RedisConnectionInfo {
                password: config.store_credential.clone(),
                ..Default::default()
            },
        };

        let client = redis::Client::open(info)?;
        Ok(Self { client })
    }
}

impl StoreFactory for RedisStoreFactory {
    type Handle = RedisStore;

    fn construct(&self) -> RedisStore {
        RedisStore {
            client: self.client.clone(),
            conn: None,
        }
    }
}

/// Redis-backed store handle.
///
/// The multiplexed connection is established lazily on first use, with
/// fixed connect and response timeouts. A handle that has seen a command
/// failure drops its connection so it is never reused.
pub struct RedisStore {
    client: redis::Client,
    conn: Option<redis::aio::MultiplexedConnection>,
}

impl RedisStore {
    /// Get the live connection, dialing if this handle has none yet.
    ///
    /// `MultiplexedConnection` is a cheap clonable handle to the connection
    /// driver, so callers receive an owned clone.
    async fn connection(&mut self) -> Result<redis::aio::MultiplexedConnection, StoreError> {
        if let Some(conn) = &self.conn {
            return Ok(conn.clone());
        }

        let conn = self
            .client
            .get_multiplexed_async_connection_with_timeouts(RESPONSE_TIMEOUT, CONNECT_TIMEOUT)
            .await?;
        self.conn = Some(conn.clone());
        Ok(conn)
    }
}

impl Store for RedisStore {
    async fn probe(&mut self) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let result: Result<String, redis::RedisError> =
            redis::cmd("PING").query_async(&mut conn).await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.conn = None;
                Err(e.into())
            }
        }
    }

    async fn append(&mut self, list: &str, record: &str) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        let result: Result<i64, redis::RedisError> = conn.lpush(list, record).await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => {
                self.conn = None;
                Err(e.into())
            }
        }
    }
}
