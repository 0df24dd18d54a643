use std::sync::Arc;

use anyhow::{anyhow, Result};
use chrono::Utc;
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tokio_util::sync::CancellationToken;

use crate::{
    capture::EntryForm,
    feed::{FeedListener, FeedSource, ListenerSnapshot},
    ledger::{HistoryLedger, HistorySummary},
    models::{LiveReading, Redemption, WasteEntry},
    rewards::EcoWallet,
    settings::AppSettings,
};

use super::events::DashboardEvent;

const ENABLE_LOGS: bool = true;

use crate::{log_error, log_info, log_warn};

const EVENT_CAPACITY: usize = 64;

type FinalizedRx = mpsc::UnboundedReceiver<LiveReading>;

/// Shared pieces the intake task needs to turn a finalized reading into an entry.
#[derive(Clone)]
struct Pipeline {
    listener: Arc<Mutex<FeedListener>>,
    form: Arc<Mutex<EntryForm>>,
    ledger: Arc<Mutex<HistoryLedger>>,
    wallet: Arc<Mutex<EcoWallet>>,
    events: broadcast::Sender<DashboardEvent>,
    auto_submit: bool,
}

/// One citizen's contribution session: live feed, entry form and history.
#[derive(Clone)]
pub struct ContributionController {
    pipeline: Pipeline,
    finalized_rx: Arc<Mutex<Option<FinalizedRx>>>,
    intake: Arc<Mutex<Option<(CancellationToken, JoinHandle<FinalizedRx>)>>>,
}

impl ContributionController {
    /// Build a session around `ledger`. The eco-point wallet shares the ledger's store.
    pub async fn new(
        source: Arc<dyn FeedSource>,
        ledger: HistoryLedger,
        settings: &AppSettings,
    ) -> Result<Self> {
        let earned = ledger.summary().total_points;
        let wallet = match ledger.store() {
            Some(db) => EcoWallet::open(db.clone(), ledger.user_id(), earned).await?,
            None => EcoWallet::new(ledger.user_id(), earned, Vec::new()),
        };

        let (listener, finalized_rx) = FeedListener::new(source, settings.listener_config());
        let form = EntryForm::new(ledger.user_id().to_string(), settings.scoring);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            pipeline: Pipeline {
                listener: Arc::new(Mutex::new(listener)),
                form: Arc::new(Mutex::new(form)),
                ledger: Arc::new(Mutex::new(ledger)),
                wallet: Arc::new(Mutex::new(wallet)),
                events,
                auto_submit: settings.auto_submit,
            },
            finalized_rx: Arc::new(Mutex::new(Some(finalized_rx))),
            intake: Arc::new(Mutex::new(None)),
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<DashboardEvent> {
        self.pipeline.events.subscribe()
    }

    /// Start listening to the feed and routing finalized readings into the form.
    pub async fn start(&self) -> Result<()> {
        let mut intake = self.intake.lock().await;
        if intake.is_some() {
            return Err(anyhow!("contribution session already active"));
        }

        self.pipeline.listener.lock().await.start().await?;

        let rx = self
            .finalized_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| anyhow!("finalized reading channel missing"))?;

        let token = CancellationToken::new();
        let handle = tokio::spawn(intake_loop(self.pipeline.clone(), rx, token.clone()));
        *intake = Some((token, handle));

        log_info!("Contribution session started");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        if let Some((token, handle)) = self.intake.lock().await.take() {
            token.cancel();
            match handle.await {
                Ok(rx) => *self.finalized_rx.lock().await = Some(rx),
                Err(err) => log_error!("Intake task failed to join: {err}"),
            }
        }

        self.pipeline.listener.lock().await.stop().await?;
        log_info!("Contribution session stopped");
        Ok(())
    }

    /// Discard the current reading and form input and wait for a fresh measurement.
    pub async fn reset_measurement(&self) -> Result<()> {
        self.pipeline.form.lock().await.clear();
        self.pipeline.reset_listener().await
    }

    /// Confirm whatever is in the form.
    pub async fn submit(&self) -> Result<WasteEntry> {
        self.pipeline.submit().await
    }

    /// Run `edit` against the entry form, e.g. to type quantities or pick a category.
    pub async fn with_form<R>(&self, edit: impl FnOnce(&mut EntryForm) -> R) -> R {
        let mut form = self.pipeline.form.lock().await;
        edit(&mut *form)
    }

    /// Spend eco-points on a catalog reward.
    pub async fn redeem(&self, reward_id: u32) -> Result<Redemption> {
        let (redemption, balance) = {
            let mut wallet = self.pipeline.wallet.lock().await;
            let redemption = wallet.redeem(reward_id, Utc::now()).await?;
            (redemption, wallet.balance())
        };

        log_info!(
            "Redeemed {} for {} eco-points; {} left",
            redemption.reward_name,
            redemption.points_spent,
            balance
        );
        let _ = self.pipeline.events.send(DashboardEvent::RewardRedeemed {
            redemption: redemption.clone(),
            balance,
        });
        Ok(redemption)
    }

    pub async fn wallet(&self) -> EcoWallet {
        self.pipeline.wallet.lock().await.clone()
    }

    pub async fn listener_snapshot(&self) -> ListenerSnapshot {
        self.pipeline.listener.lock().await.snapshot().await
    }

    pub async fn summary(&self) -> HistorySummary {
        self.pipeline.ledger.lock().await.summary()
    }

    pub async fn recent_entries(&self, limit: usize) -> Vec<WasteEntry> {
        self.pipeline
            .ledger
            .lock()
            .await
            .recent_first()
            .into_iter()
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Pipeline {
    async fn submit(&self) -> Result<WasteEntry> {
        let (entry, summary) = {
            let mut form = self.form.lock().await;
            let entry = form.prepare(Utc::now())?;

            let mut ledger = self.ledger.lock().await;
            ledger.append(entry.clone()).await?;
            form.clear();
            self.wallet.lock().await.credit(entry.eco_points_earned());
            (entry, ledger.summary())
        };

        log_info!(
            "Logged {} entry {}: wet={}g dry={}g points={}",
            entry.category().as_str(),
            entry.id(),
            entry.wet_waste_grams(),
            entry.dry_waste_grams(),
            entry.eco_points_earned()
        );

        // A feed-sourced entry completes the measurement cycle.
        if entry.is_auto_filled() {
            self.reset_listener().await?;
        }

        let _ = self.events.send(DashboardEvent::EntrySubmitted {
            entry: entry.clone(),
            summary,
        });
        Ok(entry)
    }

    async fn reset_listener(&self) -> Result<()> {
        self.listener.lock().await.reset().await?;
        let _ = self.events.send(DashboardEvent::ListenerReset);
        Ok(())
    }

    async fn handle_finalized(&self, reading: LiveReading) {
        let ready = {
            let mut form = self.form.lock().await;
            form.prefill_from(reading.clone());
            form.can_confirm()
        };
        let awaiting_confirmation = !(self.auto_submit && ready);

        let _ = self.events.send(DashboardEvent::ReadingFinalized {
            reading,
            awaiting_confirmation,
        });

        if awaiting_confirmation {
            log_info!("Finalized reading loaded into the form; awaiting confirmation");
            return;
        }

        if let Err(err) = self.submit().await {
            log_warn!("Automatic submission failed: {err:?}");
        }
    }
}

async fn intake_loop(pipeline: Pipeline, mut rx: FinalizedRx, token: CancellationToken) -> FinalizedRx {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            reading = rx.recv() => match reading {
                Some(reading) => pipeline.handle_finalized(reading).await,
                None => break,
            },
        }
    }
    rx
}
