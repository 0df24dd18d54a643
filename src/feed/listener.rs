use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::models::LiveReading;

use super::loop_worker::{listen_loop, ListenerContext, ReconnectPolicy};
use super::source::FeedSource;
use super::state::{ListenerEvent, ListenerState, ListenerStatus};

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info};

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub data_path: String,
    pub inactivity_timeout: Duration,
    /// Resubscription attempts after a failed or closed subscription. Zero disables retries.
    pub reconnect_attempts: u32,
    pub reconnect_initial_backoff: Duration,
    pub reconnect_max_backoff: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            data_path: "waste/live".to_string(),
            inactivity_timeout: Duration::from_secs(5),
            reconnect_attempts: 0,
            reconnect_initial_backoff: Duration::from_secs(1),
            reconnect_max_backoff: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerSnapshot {
    pub status: ListenerStatus,
    pub reading: LiveReading,
    pub subscribed: bool,
    pub message_count: u64,
}

/// Watches a sensor feed and decides when a stream of updates is one measurement.
///
/// Finalized readings are delivered on the receiver returned by
/// [`FeedListener::new`]. The subscription and the inactivity timer live in a
/// background task owned by this value: `stop()` or dropping the listener
/// releases both.
pub struct FeedListener {
    source: Arc<dyn FeedSource>,
    config: ListenerConfig,
    state: Arc<Mutex<ListenerState>>,
    finalized_tx: mpsc::UnboundedSender<LiveReading>,
    wake: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl FeedListener {
    pub fn new(
        source: Arc<dyn FeedSource>,
        config: ListenerConfig,
    ) -> (Self, mpsc::UnboundedReceiver<LiveReading>) {
        let (finalized_tx, finalized_rx) = mpsc::unbounded_channel();
        let state = ListenerState::new(config.inactivity_timeout);

        let listener = Self {
            source,
            config,
            state: Arc::new(Mutex::new(state)),
            finalized_tx,
            wake: Arc::new(Notify::new()),
            handle: None,
            cancel_token: None,
        };

        (listener, finalized_rx)
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Subscribe to the feed and start watching it.
    ///
    /// A failed subscription is logged and the listener stays idle. With
    /// retries configured the background task keeps trying; otherwise the
    /// error is returned.
    pub async fn start(&mut self) -> Result<()> {
        if self.is_running() {
            bail!("feed listener already active");
        }
        self.reap().await;

        let receiver = match self.source.subscribe(&self.config.data_path) {
            Ok(rx) => Some(rx),
            Err(err) => {
                log_error!(
                    "Feed subscription at {} failed: {err:?}",
                    self.config.data_path
                );
                if self.config.reconnect_attempts == 0 {
                    return Err(err).with_context(|| {
                        format!("failed to subscribe to {}", self.config.data_path)
                    });
                }
                None
            }
        };

        let cancel_token = CancellationToken::new();
        let ctx = ListenerContext {
            source: self.source.clone(),
            data_path: self.config.data_path.clone(),
            state: self.state.clone(),
            finalized_tx: self.finalized_tx.clone(),
            wake: self.wake.clone(),
            cancel_token: cancel_token.clone(),
            reconnect: ReconnectPolicy {
                max_attempts: self.config.reconnect_attempts,
                initial_backoff: self.config.reconnect_initial_backoff,
                max_backoff: self.config.reconnect_max_backoff,
            },
        };

        self.handle = Some(tokio::spawn(listen_loop(ctx, receiver)));
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Release the subscription and cancel any pending finalization.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let joined = match self.handle.take() {
            Some(handle) => handle
                .await
                .context("feed listener task failed to join"),
            None => Ok(()),
        };

        self.state
            .lock()
            .await
            .apply(ListenerEvent::TornDown, Instant::now());
        joined
    }

    /// Start a new measurement cycle: clear the reading, cancel the timer and
    /// resubscribe if the subscription was torn down.
    pub async fn reset(&mut self) -> Result<()> {
        self.state
            .lock()
            .await
            .apply(ListenerEvent::Reset, Instant::now());
        self.wake.notify_one();
        log_info!("Feed listener reset");

        if !self.is_running() {
            self.start().await?;
        }
        Ok(())
    }

    pub async fn snapshot(&self) -> ListenerSnapshot {
        let state = self.state.lock().await;
        ListenerSnapshot {
            status: state.status,
            reading: state.reading.clone(),
            subscribed: state.subscribed,
            message_count: state.message_count,
        }
    }

    pub fn config(&self) -> &ListenerConfig {
        &self.config
    }

    /// Clear out a task that already exited on its own.
    async fn reap(&mut self) {
        self.cancel_token.take();
        if let Some(handle) = self.handle.take() {
            if let Err(err) = handle.await {
                log_error!("Feed listener task ended abnormally: {err}");
            }
        }
    }
}

impl Drop for FeedListener {
    fn drop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
