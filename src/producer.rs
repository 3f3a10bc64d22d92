//! Producer loop: connection acquisition with bounded retry, the
//! publish-or-reconnect step, and the main-loop state machine.
//!
//! The loop is a single logical task. Its only suspension points are the
//! fixed delay between connect attempts and the per-iteration sleep, both
//! raced against the shutdown future so cancellation is observed promptly.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::reading::{Reading, ReadingGenerator};
use crate::store::{Store, StoreFactory};

/// Maximum number of initial connection attempts before giving up.
const MAX_CONNECT_ATTEMPTS: u32 = 30;

/// Fixed delay between connection attempts.
///
/// Deliberately not exponential: in a sidecar-style deployment the store
/// and the producer start together under an orchestrator that also retries.
const CONNECT_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Name of the store-side list readings are appended to.
const QUEUE_NAME: &str = "sensors";

/// Lifecycle states of the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Starting,
    Connecting,
    Running,
    Stopping,
}

impl std::fmt::Display for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Starting => write!(f, "starting"),
            State::Connecting => write!(f, "connecting"),
            State::Running => write!(f, "running"),
            State::Stopping => write!(f, "stopping"),
        }
    }
}

/// Fatal error: every initial connection attempt failed.
///
/// This is the one unrecoverable error in the system; the process must
/// terminate with a clear diagnostic rather than loop forever, since
/// unbounded startup retry could mask a permanent misconfiguration.
#[derive(Debug)]
pub struct RetriesExhausted {
    pub attempts: u32,
    pub last_error: String,
}

impl std::fmt::Display for RetriesExhausted {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Could not reach the store after {} attempts. Last error: {}",
            self.attempts, self.last_error
        )
    }
}

impl std::error::Error for RetriesExhausted {}

/// Outcome of a single publish-or-reconnect step.
///
/// The reconnection side effect is an explicit, named outcome rather than a
/// hidden retry, so tests can assert on connection replacement
/// independently of publish success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The reading was appended to the queue
    Published,

    /// The store failed; the reading was dropped and the handle replaced
    Reconnected,

    /// The reading could not be serialized and was skipped
    Skipped,
}

/// The producer loop.
///
/// Owns the single store handle exclusively; replacement on failure is a
/// plain reassignment, never shared, so no locking discipline is needed.
pub struct Producer<F: StoreFactory> {
    config: Config,
    factory: F,
    generator: ReadingGenerator,
    state: State,
}

impl<F: StoreFactory> Producer<F> {
    /// Create a producer from resolved configuration and a store factory.
    pub fn new(config: Config, factory: F) -> Self {
        let generator = ReadingGenerator::new(config.sensor_id.clone());
        Self {
            config,
            factory,
            generator,
            state: State::Starting,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> State {
        self.state
    }

    fn transition(&mut self, next: State) {
        debug!(from = %self.state, to = %next, "Producer state transition");
        self.state = next;
    }

    /// Acquire a live store handle, verified by a liveness probe.
    ///
    /// Constructs a fresh handle before every probe (a failed probe leaves
    /// no reusable handle) and waits a fixed delay between attempts. Gives
    /// up fatally after `MAX_CONNECT_ATTEMPTS` consecutive failures.
    async fn connect_with_retry(&self) -> Result<F::Handle, RetriesExhausted> {
        let mut last_error = String::new();

        for attempt in 1..=MAX_CONNECT_ATTEMPTS {
            let mut store = self.factory.construct();

            match store.probe().await {
                Ok(()) => {
                    info!(attempt, "Store connection established");
                    return Ok(store);
                }
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = MAX_CONNECT_ATTEMPTS,
                        retry_delay_secs = CONNECT_RETRY_DELAY.as_secs(),
                        error = %e,
                        "Store unavailable, will retry"
                    );
                    last_error = e.to_string();

                    if attempt < MAX_CONNECT_ATTEMPTS {
                        sleep(CONNECT_RETRY_DELAY).await;
                    }
                }
            }
        }

        Err(RetriesExhausted {
            attempts: MAX_CONNECT_ATTEMPTS,
            last_error,
        })
    }

    /// Attempt to append one reading to the queue.
    ///
    /// On a store failure the publish is NOT retried: the handle is
    /// discarded, a single fresh replacement is constructed (validated
    /// lazily on the next iteration), and the reading is dropped —
    /// at-most-once, best-effort delivery.
    async fn publish_or_reconnect(
        &self,
        store: &mut F::Handle,
        reading: &Reading,
    ) -> PublishOutcome {
        let payload = match serde_json::to_string(reading) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize reading, skipping");
                return PublishOutcome::Skipped;
            }
        };

        match store.append(QUEUE_NAME, &payload).await {
            Ok(()) => PublishOutcome::Published,
            Err(e) => {
                warn!(
                    error = %e,
                    connectivity = e.is_connectivity(),
                    "Publish failed, reading dropped, replacing store connection"
                );
                *store = self.factory.construct();
                PublishOutcome::Reconnected
            }
        }
    }

    /// Run the producer until the shutdown future completes.
    ///
    /// Drives the state machine: connect with bounded retry, then generate
    /// and publish one reading per interval indefinitely. Returns `Ok(())`
    /// on clean cancellation; the only error is connect-retry exhaustion.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<(), RetriesExhausted> {
        tokio::pin!(shutdown);

        self.transition(State::Connecting);
        let store = tokio::select! {
            res = self.connect_with_retry() => Some(res?),
            _ = &mut shutdown => None,
        };

        let mut store = match store {
            Some(store) => store,
            None => {
                self.transition(State::Stopping);
                info!("Shutdown requested while connecting, stopping producer");
                return Ok(());
            }
        };

        self.transition(State::Running);
        info!(
            interval_secs = self.config.push_interval.as_secs(),
            sensor_id = %self.generator.sensor_id(),
            "Producer running"
        );

        let mut iteration: u64 = 0;
        loop {
            iteration += 1;
            let reading = self.generator.generate();

            if let PublishOutcome::Published =
                self.publish_or_reconnect(&mut store, &reading).await
            {
                info!(
                    iteration,
                    sensor_id = %reading.sensor_id,
                    value = reading.value,
                    "Reading published"
                );
            }

            tokio::select! {
                _ = &mut shutdown => break,
                _ = sleep(self.config.push_interval) => {}
            }
        }

        self.transition(State::Stopping);
        info!(iterations = iteration, "Shutdown requested, stopping producer");
        Ok(())
    }
}
