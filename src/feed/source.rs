use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;
use tokio::sync::mpsc;

/// A push-style data source keyed by path.
///
/// Every change at `data_path` is delivered as an opaque JSON payload on the
/// returned receiver. Dropping the receiver unsubscribes.
pub trait FeedSource: Send + Sync {
    fn subscribe(&self, data_path: &str) -> Result<mpsc::Receiver<Value>>;
}

/// Feed driven by the caller through [`ChannelFeed::publisher`].
///
/// Used to bridge an external realtime subscription into the listener. Each
/// `subscribe` replaces the previous channel.
pub struct ChannelFeed {
    buffer: usize,
    sender: Mutex<Option<mpsc::Sender<Value>>>,
}

impl ChannelFeed {
    pub fn new(buffer: usize) -> Self {
        Self {
            buffer: buffer.max(1),
            sender: Mutex::new(None),
        }
    }

    /// Sender for the current subscription, if one is open.
    pub fn publisher(&self) -> Option<mpsc::Sender<Value>> {
        let guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.as_ref().filter(|tx| !tx.is_closed()).cloned()
    }

    /// Drop the current subscription's sender so the subscriber sees the feed close.
    pub fn close(&self) {
        let mut guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.take();
    }
}

impl FeedSource for ChannelFeed {
    fn subscribe(&self, _data_path: &str) -> Result<mpsc::Receiver<Value>> {
        let (tx, rx) = mpsc::channel(self.buffer);
        let mut guard = match self.sender.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Some(tx);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_channel_feed_delivers_to_latest_subscriber() {
        let feed = ChannelFeed::new(4);
        assert!(feed.publisher().is_none());

        let mut rx = feed.subscribe("waste/live").unwrap();
        let tx = feed.publisher().unwrap();
        tx.send(json!({"weight": 1})).await.unwrap();
        assert_eq!(rx.recv().await, Some(json!({"weight": 1})));

        drop(tx);
        feed.close();
        assert_eq!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn test_publisher_is_none_after_subscriber_drops() {
        let feed = ChannelFeed::new(4);
        let rx = feed.subscribe("waste/live").unwrap();
        drop(rx);
        assert!(feed.publisher().is_none());
    }
}
