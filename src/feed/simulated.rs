use std::time::Duration;

use anyhow::{Context, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::{json, Value};
use tokio::{runtime::Handle, sync::mpsc, time};

use super::source::FeedSource;

const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

const MIN_WEIGHT_DECAGRAMS: u32 = 10;
const MAX_WEIGHT_DECAGRAMS: u32 = 500;

/// Cadence of the simulated weighing scale.
#[derive(Debug, Clone)]
pub struct SimulatedFeedConfig {
    /// Gap between readings while an item settles on the scale.
    pub sample_interval: Duration,
    /// Readings emitted per measurement; the last one carries the final weight.
    pub samples_per_measurement: u32,
    /// Silence after each measurement. Must exceed the listener timeout for
    /// measurements to be finalized one by one.
    pub quiet_period: Duration,
}

impl Default for SimulatedFeedConfig {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_secs(1),
            samples_per_measurement: 4,
            quiet_period: Duration::from_secs(8),
        }
    }
}

/// Stand-in for the realtime sensor database.
///
/// Each subscription gets its own task that emits bursts of `{weight, type}`
/// readings (100 g to 5000 g, wet or dry) and stops once the receiver is dropped.
pub struct SimulatedFeed {
    config: SimulatedFeedConfig,
}

impl SimulatedFeed {
    pub fn new(config: SimulatedFeedConfig) -> Self {
        Self { config }
    }
}

impl FeedSource for SimulatedFeed {
    fn subscribe(&self, data_path: &str) -> Result<mpsc::Receiver<Value>> {
        let handle = Handle::try_current().context("simulated feed requires a tokio runtime")?;
        let (tx, rx) = mpsc::channel(16);
        log_info!("Simulated feed subscribed at {}", data_path);
        handle.spawn(simulate(self.config.clone(), tx));
        Ok(rx)
    }
}

async fn simulate(config: SimulatedFeedConfig, tx: mpsc::Sender<Value>) {
    let mut rng = StdRng::from_entropy();
    let samples = config.samples_per_measurement.max(1);

    loop {
        let target_grams = f64::from(rng.gen_range(MIN_WEIGHT_DECAGRAMS..=MAX_WEIGHT_DECAGRAMS) * 10);
        let label = if rng.gen_bool(0.5) { "wet" } else { "dry" };

        for step in 1..=samples {
            let settling = (target_grams * f64::from(step) / f64::from(samples)).round();
            let reading = json!({ "weight": settling, "type": label });
            log_debug!("Simulated reading {}", reading);

            if tx.send(reading).await.is_err() {
                log_info!("Simulated feed subscriber went away; stopping");
                return;
            }

            if step < samples {
                time::sleep(config.sample_interval).await;
            }
        }

        tokio::select! {
            _ = time::sleep(config.quiet_period) => {}
            _ = tx.closed() => {
                log_info!("Simulated feed subscriber went away; stopping");
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::FeedPayload;

    #[tokio::test(start_paused = true)]
    async fn test_simulated_feed_emits_settling_burst() {
        let feed = SimulatedFeed::new(SimulatedFeedConfig {
            sample_interval: Duration::from_millis(100),
            samples_per_measurement: 3,
            quiet_period: Duration::from_secs(10),
        });
        let mut rx = feed.subscribe("waste/live").unwrap();

        let mut burst = Vec::new();
        for _ in 0..3 {
            burst.push(FeedPayload::parse(&rx.recv().await.unwrap()));
        }

        let last = burst.last().unwrap();
        assert!(last.weight >= 100.0 && last.weight <= 5000.0);
        assert!(last.label == "wet" || last.label == "dry");
        assert!(burst.iter().all(|p| p.label == last.label));
        assert!(burst.windows(2).all(|w| w[0].weight <= w[1].weight));
    }

    #[test]
    fn test_subscribe_outside_runtime_fails() {
        let feed = SimulatedFeed::new(SimulatedFeedConfig::default());
        assert!(feed.subscribe("waste/live").is_err());
    }
}
