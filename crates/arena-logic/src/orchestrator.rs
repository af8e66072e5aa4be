//! Game orchestrator: phase state machine and command surface
//!
//! `Intro -> Betting -> Simulation -> Results -> GameOver`, with the
//! simulation phase split into "awaiting a round" and "round computed".
//! Commands issued out of sequence change nothing and return
//! [`CommandError::OutOfSequence`].

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::betting::{recompute_odds, Bet, BetError, BetId, BettingLedger, BettingStats, STARTING_BALANCE};
use crate::catalog::{RoundCatalog, RoundType};
use crate::contestant::{
    generate_roster, validate_roster, Contestant, ContestantId, RosterError, DEFAULT_CONTESTANT_COUNT,
};
use crate::narration::{Narration, NarrationRequest};
use crate::random::{SeededRng, ROSTER_STREAM};
use crate::rules::RuleTable;
use crate::simulator::{simulate_round, EliminationEvent, RoundOutcome, SimulatedRound};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub starting_balance: f64,
    pub contestant_count: usize,
    pub catalog: RoundCatalog,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            starting_balance: STARTING_BALANCE,
            contestant_count: DEFAULT_CONTESTANT_COUNT,
            catalog: RoundCatalog::standard(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RoundStage {
    AwaitingRound,
    Computed(Box<SimulatedRound>),
}

#[derive(Clone, Debug, PartialEq)]
pub enum Phase {
    Intro,
    Betting,
    Simulation(RoundStage),
    Results,
    GameOver,
}

/// Flat phase tag for logs, errors and snapshots
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhaseKind {
    Intro,
    Betting,
    Simulation,
    RoundComputed,
    Results,
    GameOver,
}

impl Phase {
    pub fn kind(&self) -> PhaseKind {
        match self {
            Phase::Intro => PhaseKind::Intro,
            Phase::Betting => PhaseKind::Betting,
            Phase::Simulation(RoundStage::AwaitingRound) => PhaseKind::Simulation,
            Phase::Simulation(RoundStage::Computed(_)) => PhaseKind::RoundComputed,
            Phase::Results => PhaseKind::Results,
            Phase::GameOver => PhaseKind::GameOver,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CommandError {
    #[error("{command} is not allowed during the {phase:?} phase")]
    OutOfSequence {
        command: &'static str,
        phase: PhaseKind,
    },
    #[error("game has not been initialized")]
    NotInitialized,
    #[error(transparent)]
    Bet(#[from] BetError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Success flag plus a message a UI can show as-is. Commands that produce
/// something (a bet, a report, a summary) carry it in `data` on success.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandReceipt<T = ()> {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> CommandReceipt<T> {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }

    pub fn failed(error: &CommandError) -> Self {
        Self::rejected(error.to_string())
    }

    /// Fold a command result into a receipt. Errors never escape.
    pub fn from_result(result: Result<T, CommandError>, message: impl FnOnce(&T) -> String) -> Self {
        match result {
            Ok(value) => Self {
                success: true,
                message: message(&value),
                data: Some(value),
            },
            Err(e) => Self::failed(&e),
        }
    }
}

/// A round after reveal, kept for result screens
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealedRound {
    pub round_index: usize,
    pub round_type: RoundType,
    pub survivors: Vec<ContestantId>,
    pub eliminated: Vec<ContestantId>,
    pub winner: Option<ContestantId>,
    pub events: Vec<EliminationEvent>,
    pub narrative: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSummary {
    /// Only when exactly one contestant is left
    pub winner: Option<ContestantId>,
    pub survivors: Vec<ContestantId>,
    pub rounds_played: usize,
    pub eliminated_count: usize,
    pub final_balance: f64,
    pub betting: BettingStats,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RevealReport {
    pub round_number: u32,
    pub outcome: RoundOutcome,
    pub game_over: Option<GameSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Rounds revealed so far
    pub current_round_index: usize,
    pub total_rounds: usize,
    /// Alive and winner contestants
    pub contestants: Vec<Contestant>,
    /// Moved here at reveal, never duplicated
    pub eliminated_contestants: Vec<Contestant>,
    pub winner: Option<ContestantId>,
    pub survivors: Vec<ContestantId>,
    pub history: Vec<RevealedRound>,
}

impl GameState {
    pub fn alive_count(&self) -> usize {
        self.contestants.iter().filter(|c| c.is_alive()).count()
    }

    pub fn contestant(&self, id: ContestantId) -> Option<&Contestant> {
        self.contestants
            .iter()
            .chain(&self.eliminated_contestants)
            .find(|c| c.id == id)
    }
}

/// Everything a UI needs to render the current screen
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub phase: PhaseKind,
    pub state: GameState,
    pub balance: f64,
    pub active_bets: Vec<Bet>,
    pub bet_history: Vec<Bet>,
    pub betting: BettingStats,
    pub staged: Option<RoundOutcome>,
}

pub struct Orchestrator {
    config: GameConfig,
    rules: RuleTable,
    seed: [u8; 32],
    /// Bumped on reset so every game gets fresh streams
    game_number: u32,
    custom_roster: Option<Vec<Contestant>>,
    phase: Phase,
    state: GameState,
    ledger: BettingLedger,
}

impl Orchestrator {
    pub fn new(config: GameConfig, seed: [u8; 32]) -> Self {
        let ledger = BettingLedger::new(config.starting_balance);
        let total_rounds = config.catalog.len();
        Self {
            config,
            rules: RuleTable::standard(),
            seed,
            game_number: 0,
            custom_roster: None,
            phase: Phase::Intro,
            state: GameState {
                total_rounds,
                ..Default::default()
            },
            ledger,
        }
    }

    /// Play with a caller-supplied roster instead of a generated one
    pub fn with_roster(
        config: GameConfig,
        seed: [u8; 32],
        roster: Vec<Contestant>,
    ) -> Result<Self, RosterError> {
        validate_roster(&roster)?;
        let mut orchestrator = Self::new(config, seed);
        orchestrator.custom_roster = Some(roster);
        Ok(orchestrator)
    }

    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn ledger(&self) -> &BettingLedger {
        &self.ledger
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn staged_round(&self) -> Option<&SimulatedRound> {
        match &self.phase {
            Phase::Simulation(RoundStage::Computed(staged)) => Some(&**staged),
            _ => None,
        }
    }

    pub fn staged_narration_request(&self) -> Option<&NarrationRequest> {
        self.staged_round().map(|s| &s.narration_request)
    }

    fn out_of_sequence(&self, command: &'static str) -> CommandError {
        let phase = self.phase.kind();
        warn!(command, ?phase, "command rejected");
        CommandError::OutOfSequence { command, phase }
    }

    fn game_rng(&self) -> SeededRng {
        SeededRng::new(&self.seed, self.game_number)
    }

    /// Build the roster and opening odds. Intro only.
    pub fn initialize(&mut self) -> Result<&GameState, CommandError> {
        if self.phase != Phase::Intro {
            return Err(self.out_of_sequence("initialize"));
        }

        let mut contestants = match &self.custom_roster {
            Some(roster) => roster.clone(),
            None => {
                let mut rng = self.game_rng().for_round(ROSTER_STREAM);
                generate_roster(self.config.contestant_count, &mut rng)
            }
        };
        validate_roster(&contestants)?;
        recompute_odds(&mut contestants, 0, self.config.catalog.len());

        self.state = GameState {
            total_rounds: self.config.catalog.len(),
            contestants,
            ..Default::default()
        };
        self.ledger = BettingLedger::new(self.config.starting_balance);

        info!(
            game = self.game_number,
            contestants = self.state.contestants.len(),
            rounds = self.state.total_rounds,
            "game initialized"
        );
        Ok(&self.state)
    }

    /// Intro to betting
    pub fn start_game(&mut self) -> Result<(), CommandError> {
        if self.phase != Phase::Intro {
            return Err(self.out_of_sequence("start_game"));
        }
        if self.state.contestants.is_empty() {
            warn!("start_game before initialize");
            return Err(CommandError::NotInitialized);
        }
        self.phase = Phase::Betting;
        info!("betting open");
        Ok(())
    }

    /// Back an alive contestant at their current odds
    pub fn place_bet(&mut self, contestant_id: ContestantId, amount: f64) -> Result<Bet, CommandError> {
        if self.phase != Phase::Betting {
            return Err(self.out_of_sequence("place_bet"));
        }
        let contestant = self
            .state
            .contestants
            .iter_mut()
            .find(|c| c.id == contestant_id)
            .ok_or(BetError::UnknownContestant(contestant_id))?;
        if !contestant.is_alive() {
            return Err(BetError::ContestantNotAlive(contestant_id).into());
        }

        let bet = self
            .ledger
            .place_bet(contestant_id, amount, contestant.current_odds)
            .map_err(|e| {
                warn!(contestant_id, amount, error = %e, "bet rejected");
                e
            })?;
        contestant.total_bets_placed += 1;
        Ok(bet)
    }

    pub fn cancel_bet(&mut self, bet_id: BetId) -> Result<Bet, CommandError> {
        if self.phase != Phase::Betting {
            return Err(self.out_of_sequence("cancel_bet"));
        }
        let bet = self.ledger.cancel_bet(bet_id)?;
        if let Some(contestant) = self
            .state
            .contestants
            .iter_mut()
            .find(|c| c.id == bet.contestant_id)
        {
            contestant.total_bets_placed = contestant.total_bets_placed.saturating_sub(1);
        }
        Ok(bet)
    }

    /// Betting to simulation. Bets are frozen from here on.
    pub fn start_simulation(&mut self) -> Result<(), CommandError> {
        if self.phase != Phase::Betting {
            return Err(self.out_of_sequence("start_simulation"));
        }
        self.phase = Phase::Simulation(RoundStage::AwaitingRound);
        info!(bets = self.ledger.active_bets().len(), "simulation started");
        Ok(())
    }

    /// Compute the next round into the staging area without touching
    /// contestants, odds or the ledger.
    pub fn compute_next_round(&mut self, now_ms: i64) -> Result<&SimulatedRound, CommandError> {
        if self.phase != Phase::Simulation(RoundStage::AwaitingRound) {
            return Err(self.out_of_sequence("compute_next_round"));
        }
        let round_index = self.state.current_round_index;
        let Some(round) = self.config.catalog.get(round_index) else {
            return Err(self.out_of_sequence("compute_next_round"));
        };

        let mut rng = self.game_rng().for_round(round_index as u32);
        let simulated = simulate_round(
            round,
            round_index,
            &self.state.contestants,
            &self.rules,
            &mut rng,
            now_ms,
        );
        info!(
            round = round_index + 1,
            kind = ?round.round_type,
            eliminated = simulated.outcome.eliminated.len(),
            "round computed"
        );

        self.phase = Phase::Simulation(RoundStage::Computed(Box::new(simulated)));
        match &self.phase {
            Phase::Simulation(RoundStage::Computed(staged)) => Ok(&**staged),
            _ => unreachable!("phase was just set to computed"),
        }
    }

    /// Replace the staged fallback narration. Empty narration keeps the fallback.
    pub fn attach_narration(&mut self, narration: Narration) -> Result<(), CommandError> {
        let Phase::Simulation(RoundStage::Computed(staged)) = &mut self.phase else {
            return Err(self.out_of_sequence("attach_narration"));
        };
        if !narration.is_empty() {
            staged.outcome.narration = narration;
        }
        Ok(())
    }

    /// Apply the staged round, recompute odds and detect game over
    pub fn reveal_round(&mut self) -> Result<RevealReport, CommandError> {
        if !matches!(self.phase, Phase::Simulation(RoundStage::Computed(_))) {
            return Err(self.out_of_sequence("reveal_round"));
        }
        let Phase::Simulation(RoundStage::Computed(staged)) =
            std::mem::replace(&mut self.phase, Phase::Simulation(RoundStage::AwaitingRound))
        else {
            unreachable!("phase checked above");
        };
        let outcome = staged.outcome;
        let round_type = outcome.round_type;

        for contestant in self.state.contestants.iter_mut() {
            if outcome.participants.contains(&contestant.id) {
                contestant.rounds_participated.push(round_type);
            }
            if outcome.eliminated.contains(&contestant.id) {
                contestant.eliminate(round_type);
            } else if outcome.winner == Some(contestant.id) {
                contestant.crown();
            }
        }
        let (standing, eliminated): (Vec<_>, Vec<_>) = std::mem::take(&mut self.state.contestants)
            .into_iter()
            .partition(|c| c.is_standing());
        self.state.contestants = standing;
        self.state.eliminated_contestants.extend(eliminated);

        self.state.current_round_index += 1;
        recompute_odds(
            &mut self.state.contestants,
            self.state.current_round_index,
            self.state.total_rounds,
        );

        self.state.history.push(RevealedRound {
            round_index: outcome.round_index,
            round_type,
            survivors: outcome.survivors.clone(),
            eliminated: outcome.eliminated.clone(),
            winner: outcome.winner,
            events: outcome.events.clone(),
            narrative: outcome.narrative_lines(),
        });

        info!(
            round = outcome.round_number(),
            eliminated = outcome.eliminated.len(),
            remaining = self.state.contestants.len(),
            "round revealed"
        );

        let game_over = (self.state.contestants.len() <= 1
            || self.state.current_round_index >= self.state.total_rounds)
            .then(|| self.finish());

        Ok(RevealReport {
            round_number: outcome.round_number(),
            outcome,
            game_over,
        })
    }

    /// Crown everyone left and settle the ledger
    fn finish(&mut self) -> GameSummary {
        for contestant in self.state.contestants.iter_mut() {
            contestant.crown();
        }
        let survivors: Vec<ContestantId> = self.state.contestants.iter().map(|c| c.id).collect();
        self.state.winner = match survivors.as_slice() {
            [only] => Some(*only),
            _ => None,
        };
        self.state.survivors = survivors.clone();

        if let Err(e) = self.ledger.resolve_against_survivors(&survivors) {
            debug_assert!(false, "ledger settled twice: {e}");
            warn!(error = %e, "ledger already settled");
        }
        self.phase = Phase::Results;

        let summary = self.summary();
        info!(
            winner = ?summary.winner,
            survivors = summary.survivors.len(),
            balance = summary.final_balance,
            "game over"
        );
        summary
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            winner: self.state.winner,
            survivors: self.state.survivors.clone(),
            rounds_played: self.state.current_round_index,
            eliminated_count: self.state.eliminated_contestants.len(),
            final_balance: self.ledger.balance(),
            betting: self.ledger.stats(),
        }
    }

    /// Results to game over
    pub fn show_results(&mut self) -> Result<GameSummary, CommandError> {
        if self.phase != Phase::Results {
            return Err(self.out_of_sequence("show_results"));
        }
        self.phase = Phase::GameOver;
        Ok(self.summary())
    }

    /// Back to intro with a fresh ledger and an empty roster
    pub fn reset(&mut self) {
        self.game_number = self.game_number.wrapping_add(1);
        self.phase = Phase::Intro;
        self.state = GameState {
            total_rounds: self.config.catalog.len(),
            ..Default::default()
        };
        self.ledger = BettingLedger::new(self.config.starting_balance);
        info!(game = self.game_number, "game reset");
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            phase: self.phase.kind(),
            state: self.state.clone(),
            balance: self.ledger.balance(),
            active_bets: self.ledger.active_bets().to_vec(),
            bet_history: self.ledger.history().to_vec(),
            betting: self.ledger.stats(),
            staged: self.staged_round().map(|s| s.outcome.clone()),
        }
    }
}
