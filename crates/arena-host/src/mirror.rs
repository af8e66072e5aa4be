//! Ledger mirror: an external record of narratives, bets and game ends
//!
//! Mirroring is fire-and-forget. [`MirrorDispatcher`] queues notifications
//! for a single worker task that delivers them in order and only logs
//! failures.

use std::{future::Future, sync::Arc, time::Duration};

use arena_logic::{BettingStats, ContestantId};
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info, warn};
use url::Url;

use crate::MirrorTarget;

/// Timeout for relayer requests
const TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("reqwest error: {0}")]
    Reqwest(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed: {0}")]
    Failed(reqwest::StatusCode),
    #[error("relayer did not return a record id")]
    MissingId,
    #[error("mirror unavailable")]
    Unavailable,
}

pub trait LedgerMirror: Send + Sync + 'static {
    /// Returns the record id when the sink assigns one
    fn notify_narrative(
        &self,
        round_number: u32,
        lines: Vec<String>,
    ) -> impl Future<Output = Result<Option<String>, MirrorError>> + Send;

    fn notify_bet_placed(
        &self,
        contestant_id: ContestantId,
        amount: f64,
        odds: f64,
    ) -> impl Future<Output = Result<String, MirrorError>> + Send;

    fn notify_game_end(
        &self,
        winner_id: Option<ContestantId>,
        stats: BettingStats,
    ) -> impl Future<Output = Result<(), MirrorError>> + Send;
}

/// Drops everything
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopMirror;

impl LedgerMirror for NoopMirror {
    async fn notify_narrative(&self, _round_number: u32, _lines: Vec<String>) -> Result<Option<String>, MirrorError> {
        Ok(None)
    }

    async fn notify_bet_placed(&self, _contestant_id: ContestantId, _amount: f64, _odds: f64) -> Result<String, MirrorError> {
        Ok(String::new())
    }

    async fn notify_game_end(&self, _winner_id: Option<ContestantId>, _stats: BettingStats) -> Result<(), MirrorError> {
        Ok(())
    }
}

/// Writes every notification to the log
#[derive(Clone, Copy, Debug, Default)]
pub struct LogMirror;

impl LedgerMirror for LogMirror {
    async fn notify_narrative(&self, round_number: u32, lines: Vec<String>) -> Result<Option<String>, MirrorError> {
        info!(round_number, lines = lines.len(), "mirror: narrative");
        Ok(None)
    }

    async fn notify_bet_placed(&self, contestant_id: ContestantId, amount: f64, odds: f64) -> Result<String, MirrorError> {
        info!(contestant_id, amount, odds, "mirror: bet placed");
        Ok(format!("log-bet-{}", contestant_id))
    }

    async fn notify_game_end(&self, winner_id: Option<ContestantId>, stats: BettingStats) -> Result<(), MirrorError> {
        info!(?winner_id, net_profit = stats.net_profit, "mirror: game end");
        Ok(())
    }
}

#[derive(Serialize)]
struct NarrativeNotice<'a> {
    round_number: u32,
    lines: &'a [String],
}

/// Odds travel as tenths, the on-chain unit
#[derive(Serialize)]
struct BetNotice {
    contestant_id: ContestantId,
    amount: f64,
    odds: f64,
    odds_tenths: u16,
}

#[derive(Serialize)]
struct GameEndNotice<'a> {
    winner_id: Option<ContestantId>,
    stats: &'a BettingStats,
}

#[derive(Deserialize)]
struct RecordReceipt {
    #[serde(default)]
    id: Option<String>,
}

/// JSON POSTs to a relayer that submits to the ledger program
#[derive(Clone)]
pub struct HttpMirror {
    base_url: Url,
    http_client: HttpClient,
}

impl HttpMirror {
    pub fn new(base_url: Url) -> Result<Self, MirrorError> {
        let http_client = HttpClient::builder().timeout(TIMEOUT).build()?;
        Ok(Self {
            base_url,
            http_client,
        })
    }

    async fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<RecordReceipt, MirrorError> {
        let url = self.base_url.join(path)?;
        let response = self.http_client.post(url).json(body).send().await?;
        if !response.status().is_success() {
            return Err(MirrorError::Failed(response.status()));
        }
        Ok(response.json().await?)
    }
}

impl LedgerMirror for HttpMirror {
    async fn notify_narrative(&self, round_number: u32, lines: Vec<String>) -> Result<Option<String>, MirrorError> {
        let receipt = self
            .post("narrative", &NarrativeNotice { round_number, lines: &lines })
            .await?;
        Ok(receipt.id)
    }

    async fn notify_bet_placed(&self, contestant_id: ContestantId, amount: f64, odds: f64) -> Result<String, MirrorError> {
        let notice = BetNotice {
            contestant_id,
            amount,
            odds,
            odds_tenths: (odds * 10.0).round().clamp(0.0, u16::MAX as f64) as u16,
        };
        self.post("bets", &notice).await?.id.ok_or(MirrorError::MissingId)
    }

    async fn notify_game_end(&self, winner_id: Option<ContestantId>, stats: BettingStats) -> Result<(), MirrorError> {
        self.post("game-end", &GameEndNotice { winner_id, stats: &stats }).await?;
        Ok(())
    }
}

/// Mirror chosen by configuration
#[derive(Clone)]
pub enum ConfiguredMirror {
    Noop(NoopMirror),
    Log(LogMirror),
    Http(HttpMirror),
}

impl ConfiguredMirror {
    pub fn from_target(target: &MirrorTarget) -> Result<Self, MirrorError> {
        Ok(match target {
            MirrorTarget::None => ConfiguredMirror::Noop(NoopMirror),
            MirrorTarget::Log => ConfiguredMirror::Log(LogMirror),
            MirrorTarget::Http(url) => ConfiguredMirror::Http(HttpMirror::new(url.clone())?),
        })
    }
}

impl LedgerMirror for ConfiguredMirror {
    async fn notify_narrative(&self, round_number: u32, lines: Vec<String>) -> Result<Option<String>, MirrorError> {
        match self {
            ConfiguredMirror::Noop(m) => m.notify_narrative(round_number, lines).await,
            ConfiguredMirror::Log(m) => m.notify_narrative(round_number, lines).await,
            ConfiguredMirror::Http(m) => m.notify_narrative(round_number, lines).await,
        }
    }

    async fn notify_bet_placed(&self, contestant_id: ContestantId, amount: f64, odds: f64) -> Result<String, MirrorError> {
        match self {
            ConfiguredMirror::Noop(m) => m.notify_bet_placed(contestant_id, amount, odds).await,
            ConfiguredMirror::Log(m) => m.notify_bet_placed(contestant_id, amount, odds).await,
            ConfiguredMirror::Http(m) => m.notify_bet_placed(contestant_id, amount, odds).await,
        }
    }

    async fn notify_game_end(&self, winner_id: Option<ContestantId>, stats: BettingStats) -> Result<(), MirrorError> {
        match self {
            ConfiguredMirror::Noop(m) => m.notify_game_end(winner_id, stats).await,
            ConfiguredMirror::Log(m) => m.notify_game_end(winner_id, stats).await,
            ConfiguredMirror::Http(m) => m.notify_game_end(winner_id, stats).await,
        }
    }
}

enum Notice {
    Narrative { round_number: u32, lines: Vec<String> },
    BetPlaced { contestant_id: ContestantId, amount: f64, odds: f64 },
    GameEnd { winner_id: Option<ContestantId>, stats: BettingStats },
}

struct Worker {
    notices: mpsc::UnboundedSender<Notice>,
    handle: JoinHandle<()>,
}

impl Worker {
    fn spawn<M: LedgerMirror>(mirror: Arc<M>) -> Self {
        let (notices, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(deliver(mirror, rx));
        Self { notices, handle }
    }
}

/// Each notice is awaited before the next one starts, so the sink sees
/// rounds in order and the game end last.
async fn deliver<M: LedgerMirror>(mirror: Arc<M>, mut notices: mpsc::UnboundedReceiver<Notice>) {
    while let Some(notice) = notices.recv().await {
        match notice {
            Notice::Narrative { round_number, lines } => {
                match mirror.notify_narrative(round_number, lines).await {
                    Ok(id) => debug!(round_number, ?id, "narrative mirrored"),
                    Err(e) => warn!(round_number, error = %e, "narrative mirror failed"),
                }
            }
            Notice::BetPlaced { contestant_id, amount, odds } => {
                match mirror.notify_bet_placed(contestant_id, amount, odds).await {
                    Ok(id) => debug!(contestant_id, %id, "bet mirrored"),
                    Err(e) => warn!(contestant_id, error = %e, "bet mirror failed"),
                }
            }
            Notice::GameEnd { winner_id, stats } => {
                match mirror.notify_game_end(winner_id, stats).await {
                    Ok(()) => debug!(?winner_id, "game end mirrored"),
                    Err(e) => warn!(?winner_id, error = %e, "game end mirror failed"),
                }
            }
        }
    }
}

/// Queues notifications for one background worker. Failures are logged and dropped.
///
/// The worker is spawned on the first notification, so a dispatcher must be
/// used inside a tokio runtime. Dropping the dispatcher closes the queue and
/// leaves the worker to drain it; call [`MirrorDispatcher::flush`] to wait
/// for delivery.
pub struct MirrorDispatcher<M> {
    mirror: Arc<M>,
    worker: Option<Worker>,
}

impl<M: LedgerMirror> MirrorDispatcher<M> {
    pub fn new(mirror: M) -> Self {
        Self {
            mirror: Arc::new(mirror),
            worker: None,
        }
    }

    pub fn mirror(&self) -> &M {
        &self.mirror
    }

    fn send(&mut self, notice: Notice) {
        let mirror = &self.mirror;
        let worker = self
            .worker
            .get_or_insert_with(|| Worker::spawn(mirror.clone()));
        if worker.notices.send(notice).is_err() {
            warn!("mirror worker stopped, notification dropped");
            self.worker = None;
        }
    }

    pub fn narrative(&mut self, round_number: u32, lines: Vec<String>) {
        self.send(Notice::Narrative { round_number, lines });
    }

    pub fn bet_placed(&mut self, contestant_id: ContestantId, amount: f64, odds: f64) {
        self.send(Notice::BetPlaced { contestant_id, amount, odds });
    }

    pub fn game_end(&mut self, winner_id: Option<ContestantId>, stats: BettingStats) {
        self.send(Notice::GameEnd { winner_id, stats });
    }

    /// Close the queue and wait until everything sent so far is delivered.
    /// Later notifications start a fresh worker.
    pub async fn flush(&mut self) {
        if let Some(Worker { notices, handle }) = self.worker.take() {
            drop(notices);
            if let Err(e) = handle.await {
                warn!(error = %e, "mirror worker panicked");
            }
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
pub mod mocks {
    //! In-memory mirror for tests

    use std::sync::{Arc, Mutex};

    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    pub enum MirrorEvent {
        Narrative { round_number: u32, lines: Vec<String> },
        BetPlaced { contestant_id: ContestantId, amount: f64, odds: f64 },
        GameEnd { winner_id: Option<ContestantId>, stats: BettingStats },
    }

    /// Records every notification. With `failing` set it records and then errors.
    #[derive(Clone, Default)]
    pub struct RecordingMirror {
        events: Arc<Mutex<Vec<MirrorEvent>>>,
        failing: bool,
    }

    impl RecordingMirror {
        pub fn failing() -> Self {
            Self {
                failing: true,
                ..Default::default()
            }
        }

        pub fn events(&self) -> Vec<MirrorEvent> {
            self.events.lock().map(|e| e.clone()).unwrap_or_default()
        }

        fn record(&self, event: MirrorEvent) -> Result<(), MirrorError> {
            if let Ok(mut events) = self.events.lock() {
                events.push(event);
            }
            if self.failing {
                return Err(MirrorError::Unavailable);
            }
            Ok(())
        }
    }

    impl LedgerMirror for RecordingMirror {
        async fn notify_narrative(&self, round_number: u32, lines: Vec<String>) -> Result<Option<String>, MirrorError> {
            self.record(MirrorEvent::Narrative { round_number, lines })?;
            Ok(Some(format!("narrative-{}", round_number)))
        }

        async fn notify_bet_placed(&self, contestant_id: ContestantId, amount: f64, odds: f64) -> Result<String, MirrorError> {
            self.record(MirrorEvent::BetPlaced { contestant_id, amount, odds })?;
            Ok(format!("bet-{}", contestant_id))
        }

        async fn notify_game_end(&self, winner_id: Option<ContestantId>, stats: BettingStats) -> Result<(), MirrorError> {
            self.record(MirrorEvent::GameEnd { winner_id, stats })
        }
    }
}
