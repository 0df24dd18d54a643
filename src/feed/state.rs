use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::{Duration, Instant};

use crate::models::LiveReading;

use super::payload::FeedPayload;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum ListenerStatus {
    #[default]
    Idle,
    Streaming,
    Finalized,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ListenerEvent {
    Message {
        payload: FeedPayload,
        observed_at: DateTime<Utc>,
    },
    TimerFired,
    Reset,
    TornDown,
}

/// Outcome of applying one event.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    Ignored,
    Streaming,
    Finalized(LiveReading),
    Reset,
    Stopped,
}

/// The listener's fold state.
///
/// The inactivity timer is represented by `deadline`: arming replaces it,
/// cancelling clears it. The async driver sleeps until the deadline and then
/// feeds `TimerFired` back through [`ListenerState::apply`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListenerState {
    pub status: ListenerStatus,
    pub reading: LiveReading,
    pub subscribed: bool,
    /// Messages seen since the last reset.
    pub message_count: u64,
    #[serde(skip)]
    deadline: Option<Instant>,
    #[serde(skip)]
    timeout: Duration,
}

impl ListenerState {
    pub fn new(timeout: Duration) -> Self {
        Self {
            status: ListenerStatus::Idle,
            reading: LiveReading::default(),
            subscribed: false,
            message_count: 0,
            deadline: None,
            timeout,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn mark_subscribed(&mut self) {
        self.subscribed = true;
    }

    pub fn apply(&mut self, event: ListenerEvent, now: Instant) -> Transition {
        match event {
            ListenerEvent::Message {
                payload,
                observed_at,
            } => {
                if self.status == ListenerStatus::Finalized {
                    return Transition::Ignored;
                }
                self.reading = LiveReading {
                    weight: payload.weight,
                    waste_type_label: payload.label,
                    observed_at: Some(observed_at),
                };
                self.message_count = self.message_count.saturating_add(1);
                self.deadline = Some(now + self.timeout);
                self.status = ListenerStatus::Streaming;
                Transition::Streaming
            }
            ListenerEvent::TimerFired => match (self.status, self.deadline) {
                (ListenerStatus::Streaming, Some(deadline)) if now >= deadline => {
                    self.deadline = None;
                    self.status = ListenerStatus::Finalized;
                    Transition::Finalized(self.reading.clone())
                }
                _ => Transition::Ignored,
            },
            ListenerEvent::Reset => {
                self.reading.clear();
                self.message_count = 0;
                self.deadline = None;
                self.status = ListenerStatus::Idle;
                Transition::Reset
            }
            ListenerEvent::TornDown => {
                self.subscribed = false;
                self.deadline = None;
                if self.status == ListenerStatus::Streaming {
                    self.status = ListenerStatus::Idle;
                }
                Transition::Stopped
            }
        }
    }
}
