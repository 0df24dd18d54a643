use std::sync::Arc;

use chrono::Utc;
use serde_json::Value;
use tokio::sync::{mpsc, Mutex, Notify};
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::models::LiveReading;

use super::payload::FeedPayload;
use super::source::FeedSource;
use super::state::{ListenerEvent, ListenerState, Transition};

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info, log_warn};

#[derive(Debug, Clone, Copy)]
pub(crate) struct ReconnectPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl ReconnectPolicy {
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

pub(crate) struct ListenerContext {
    pub source: Arc<dyn FeedSource>,
    pub data_path: String,
    pub state: Arc<Mutex<ListenerState>>,
    pub finalized_tx: mpsc::UnboundedSender<LiveReading>,
    pub wake: Arc<Notify>,
    pub cancel_token: CancellationToken,
    pub reconnect: ReconnectPolicy,
}

enum DrainExit {
    Cancelled,
    FeedClosed,
}

/// Drive the listener fold until cancelled or the feed is gone for good.
///
/// `receiver` is the subscription opened by the caller, if that succeeded.
pub(crate) async fn listen_loop(ctx: ListenerContext, mut receiver: Option<mpsc::Receiver<Value>>) {
    loop {
        let rx = match receiver.take() {
            Some(rx) => rx,
            None => match resubscribe(&ctx).await {
                Some(rx) => rx,
                None => break,
            },
        };

        ctx.state.lock().await.mark_subscribed();
        log_info!("Feed listener subscribed at {}", ctx.data_path);

        match drain(&ctx, rx).await {
            DrainExit::Cancelled => break,
            DrainExit::FeedClosed => {
                log_warn!("Feed subscription at {} closed", ctx.data_path);
                ctx.state
                    .lock()
                    .await
                    .apply(ListenerEvent::TornDown, Instant::now());
                if ctx.reconnect.max_attempts == 0 {
                    break;
                }
            }
        }
    }

    ctx.state
        .lock()
        .await
        .apply(ListenerEvent::TornDown, Instant::now());
    log_info!("Feed listener shutting down");
}

async fn drain(ctx: &ListenerContext, mut rx: mpsc::Receiver<Value>) -> DrainExit {
    loop {
        let deadline = ctx.state.lock().await.deadline();

        tokio::select! {
            _ = ctx.cancel_token.cancelled() => return DrainExit::Cancelled,
            // Reset changed the state under us; recompute the deadline.
            _ = ctx.wake.notified() => continue,
            message = rx.recv() => {
                let Some(value) = message else {
                    return DrainExit::FeedClosed;
                };
                let payload = FeedPayload::parse(&value);
                log_debug!("Feed message: weight={} label={}", payload.weight, payload.label);
                let transition = ctx.state.lock().await.apply(
                    ListenerEvent::Message { payload, observed_at: Utc::now() },
                    Instant::now(),
                );
                if transition == Transition::Ignored {
                    log_debug!("Ignoring feed message while a finalized reading awaits reset");
                }
            }
            _ = wait_until(deadline) => {
                let transition = ctx
                    .state
                    .lock()
                    .await
                    .apply(ListenerEvent::TimerFired, Instant::now());
                if let Transition::Finalized(reading) = transition {
                    log_info!(
                        "Finalized reading after quiet period: {}g ({})",
                        reading.weight,
                        reading.waste_type_label
                    );
                    if ctx.finalized_tx.send(reading).is_err() {
                        log_warn!("Finalized reading dropped: no consumer attached");
                    }
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn resubscribe(ctx: &ListenerContext) -> Option<mpsc::Receiver<Value>> {
    for attempt in 1..=ctx.reconnect.max_attempts {
        let backoff = ctx.reconnect.backoff_for(attempt);
        log_info!(
            "Resubscribing to {} in {}ms (attempt {}/{})",
            ctx.data_path,
            backoff.as_millis(),
            attempt,
            ctx.reconnect.max_attempts
        );

        tokio::select! {
            _ = ctx.cancel_token.cancelled() => return None,
            _ = time::sleep(backoff) => {}
        }

        match ctx.source.subscribe(&ctx.data_path) {
            Ok(rx) => return Some(rx),
            Err(err) => log_warn!("Feed subscription attempt {} failed: {err:?}", attempt),
        }
    }

    log_error!(
        "Giving up on feed at {} after {} attempts",
        ctx.data_path,
        ctx.reconnect.max_attempts
    );
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_up_to_cap() {
        let policy = ReconnectPolicy {
            max_attempts: 6,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(3),
        };
        let delays: Vec<u128> = (1..=5).map(|n| policy.backoff_for(n).as_millis()).collect();
        assert_eq!(delays, vec![500, 1000, 2000, 3000, 3000]);
    }
}
