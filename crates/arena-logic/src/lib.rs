//! Core simulation for Elimination Arena
//!
//! Contestants, the round catalog, effectiveness scoring, elimination
//! rules, the betting ledger and the game orchestrator. Everything here
//! is synchronous and deterministic for a given seed.
//! This crate is compiled to:
//! - Native (for the host runner and tests)
//! - WASM (for the browser UI)

mod betting;
mod catalog;
mod contestant;
mod decision;
mod narration;
mod orchestrator;
mod random;
mod rules;
mod scoring;
mod simulator;

#[cfg(feature = "wasm")]
mod wasm;

pub use betting::{
    recompute_odds, Bet, BetError, BetId, BetStatus, BettingLedger, BettingStats, Settlement,
    MAX_ODDS, MIN_ODDS, STARTING_BALANCE,
};
pub use catalog::{CatalogError, GameRound, RoundCatalog, RoundType};
pub use contestant::{
    describe, generate_roster, validate_roster, Contestant, ContestantId, ContestantStatus,
    Personality, RosterError, StatKey, Stats, Talent, DEFAULT_CONTESTANT_COUNT, STAT_MAX, STAT_MIN,
};
pub use decision::{decide, Decision, RiskLevel};
pub use narration::{fallback_narration, ContestantSummary, Narration, NarrationRequest};
pub use orchestrator::{
    CommandError, CommandReceipt, GameConfig, GameSnapshot, GameState, GameSummary, Orchestrator,
    Phase, PhaseKind, RevealReport, RevealedRound, RoundStage,
};
pub use random::{SeededRng, ROSTER_STREAM};
pub use rules::{
    final_composite, final_duel_rule, pairwise_duel_rule, ranking_rule, sequential_risk_rule,
    team_strength_rule, Elimination, EliminationRule, Knockout, RuleTable, Scored, TEAM_SIZE,
};
pub use scoring::{effectiveness, personality_modifier, talent_modifier};
pub use simulator::{simulate_round, ContestantDecision, EliminationEvent, RoundOutcome, SimulatedRound};
