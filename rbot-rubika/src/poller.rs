//! Long-polling update source: `getUpdates` → dispatch → sleep, until stopped.
//!
//! One sequential loop per poller; the cursor returned by each page is sent back unchanged with the
//! next request. Fetch failures go to the dispatcher's error hook and the loop carries on. A restart
//! waits for the previous run to finish and resumes from its cursor.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rbot_core::{FailureContext, Result};
use rbot_dispatch::Dispatcher;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::client::{validate_limit, BotClient};
use crate::config::{RubikaConfig, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_LIMIT};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingOptions {
    /// Pause between two cycles, whatever the outcome of the first.
    pub interval: Duration,
    /// Page size, 1..=100.
    pub limit: u32,
}

impl Default for PollingOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            limit: DEFAULT_POLL_LIMIT,
        }
    }
}

impl PollingOptions {
    pub fn from_config(config: &RubikaConfig) -> Self {
        Self {
            interval: config.poll_interval(),
            limit: config.poll_limit,
        }
    }
}

/// Which run currently owns the loop. A restart bumps `generation`, so a loop stopped mid-fetch
/// sees it has been superseded and exits instead of carrying on next to its successor.
#[derive(Default)]
struct RunState {
    running: bool,
    generation: u64,
}

struct PollerInner {
    client: Arc<BotClient>,
    dispatcher: Dispatcher,
    state: Mutex<RunState>,
    /// Held by the active loop for its whole run. A restarted loop waits here for the previous one
    /// to drain its in-flight fetch, then resumes from the cursor it left.
    cursor: tokio::sync::Mutex<Option<String>>,
    wake: Notify,
}

impl PollerInner {
    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to one polling loop. Clones control the same loop.
#[derive(Clone)]
pub struct Poller {
    inner: Arc<PollerInner>,
}

impl Poller {
    pub fn new(client: Arc<BotClient>, dispatcher: Dispatcher) -> Self {
        Self {
            inner: Arc::new(PollerInner {
                client,
                dispatcher,
                state: Mutex::new(RunState::default()),
                cursor: tokio::sync::Mutex::new(None),
                wake: Notify::new(),
            }),
        }
    }

    pub fn is_running(&self) -> bool {
        self.inner.state().running
    }

    /// Runs the loop on the caller's task until [`Poller::stop`] is called.
    ///
    /// Returns immediately if the loop is already running. An invalid `limit` or a failed initial
    /// bot-info fetch is returned to the caller; failures inside the loop are not.
    pub async fn run(&self, options: PollingOptions) -> Result<()> {
        validate_limit(options.limit)?;
        let Some(generation) = self.claim() else {
            warn!("Polling already running; run() ignored");
            return Ok(());
        };
        self.run_claimed(generation, options).await
    }

    /// Spawns the loop on a tokio task. `Ok(None)` when the loop is already running.
    pub fn start(&self, options: PollingOptions) -> Result<Option<JoinHandle<Result<()>>>> {
        validate_limit(options.limit)?;
        let Some(generation) = self.claim() else {
            warn!("Polling already running; start() ignored");
            return Ok(None);
        };
        let poller = self.clone();
        Ok(Some(tokio::spawn(async move {
            poller.run_claimed(generation, options).await
        })))
    }

    /// Asks the loop to stop. Takes effect at the next cycle boundary; the inter-cycle sleep is
    /// cut short, an in-flight request is not.
    pub fn stop(&self) {
        let was_running = {
            let mut state = self.inner.state();
            std::mem::replace(&mut state.running, false)
        };
        if was_running {
            info!("Polling stop requested");
            self.inner.wake.notify_waiters();
        }
    }

    fn claim(&self) -> Option<u64> {
        let mut state = self.inner.state();
        if state.running {
            return None;
        }
        state.running = true;
        state.generation += 1;
        Some(state.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.inner.state();
        state.running && state.generation == generation
    }

    async fn run_claimed(&self, generation: u64, options: PollingOptions) -> Result<()> {
        let result = self.poll_loop(generation, options).await;
        let mut state = self.inner.state();
        if state.generation == generation {
            state.running = false;
        }
        result
    }

    #[instrument(skip(self, options), fields(interval_ms = options.interval.as_millis() as u64, limit = options.limit))]
    async fn poll_loop(&self, generation: u64, options: PollingOptions) -> Result<()> {
        let inner = &self.inner;
        let mut cursor = inner.cursor.lock().await;
        if !self.is_current(generation) {
            debug!("Polling run superseded before it started");
            return Ok(());
        }
        let bot = inner.client.bot_info().await?;
        info!(username = %bot.username, bot_id = %bot.bot_id, "Polling started");

        while self.is_current(generation) {
            match inner
                .client
                .get_updates(options.limit, cursor.as_deref())
                .await
            {
                Ok(batch) => {
                    debug!(
                        received = batch.updates.len(),
                        next_offset_id = ?batch.next_offset_id,
                        "step: updates fetched"
                    );
                    if batch.next_offset_id.is_some() {
                        *cursor = batch.next_offset_id;
                    }
                    inner.dispatcher.process_updates(&batch.updates).await;
                }
                Err(err) => inner
                    .dispatcher
                    .error_hook()
                    .on_error(&err, FailureContext::Polling),
            }

            // Registered before the check so a stop() landing in between still wakes the sleep.
            let wake = inner.wake.notified();
            tokio::pin!(wake);
            wake.as_mut().enable();
            if !self.is_current(generation) {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(options.interval) => {}
                _ = &mut wake => {}
            }
        }

        info!("Polling stopped");
        Ok(())
    }
}
