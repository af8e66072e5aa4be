//! Round execution
//!
//! Scores the alive field, applies the round's elimination rule and
//! packages everything a caller needs to reveal the round later. Nothing
//! here mutates contestants.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::catalog::{GameRound, RoundType};
use crate::contestant::{Contestant, ContestantId};
use crate::decision::{decide, Decision};
use crate::narration::{fallback_narration, ContestantSummary, Narration, NarrationRequest};
use crate::random::SeededRng;
use crate::rules::{RuleTable, Scored};
use crate::scoring::effectiveness;

/// One structured entry per eliminated contestant
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EliminationEvent {
    pub round_index: usize,
    pub round_type: RoundType,
    pub description: String,
    /// The eliminated contestant first, then anyone who beat them
    pub involved: Vec<ContestantId>,
    pub timestamp_ms: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContestantDecision {
    pub contestant_id: ContestantId,
    pub effectiveness: u32,
    pub decision: Decision,
}

/// Computed but not yet revealed round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub round_index: usize,
    pub round_type: RoundType,
    pub participants: Vec<ContestantId>,
    pub survivors: Vec<ContestantId>,
    pub eliminated: Vec<ContestantId>,
    /// Set only by the final duel
    pub winner: Option<ContestantId>,
    pub events: Vec<EliminationEvent>,
    pub decisions: Vec<ContestantDecision>,
    pub narration: Narration,
}

impl RoundOutcome {
    pub fn round_number(&self) -> u32 {
        self.round_index as u32 + 1
    }

    pub fn narrative_lines(&self) -> Vec<String> {
        self.narration.lines()
    }
}

/// A simulated round plus the request a narrator would need
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulatedRound {
    pub outcome: RoundOutcome,
    pub narration_request: NarrationRequest,
}

/// Run one round over the alive members of `contestants`.
///
/// Deterministic for a given `rng` state; `now_ms` only stamps events.
pub fn simulate_round(
    round: &GameRound,
    round_index: usize,
    contestants: &[Contestant],
    rules: &RuleTable,
    rng: &mut SeededRng,
    now_ms: i64,
) -> SimulatedRound {
    let alive: Vec<&Contestant> = contestants.iter().filter(|c| c.is_alive()).collect();

    let field: Vec<Scored<'_>> = alive
        .iter()
        .map(|c| Scored {
            contestant: c,
            effectiveness: effectiveness(c, round),
            random_factor: if round.has_random_element {
                rng.next_f64() * 10.0
            } else {
                0.0
            },
        })
        .collect();

    let decisions: Vec<ContestantDecision> = field
        .iter()
        .map(|s| ContestantDecision {
            contestant_id: s.id(),
            effectiveness: s.effectiveness,
            decision: decide(s.contestant, round, &alive),
        })
        .collect();

    let rule = rules.rule_for(round.round_type);
    let elimination = rule(round, &field, rng);
    debug_assert_eq!(
        elimination.survivors.len() + elimination.knockouts.len(),
        field.len(),
        "rule must partition the field"
    );
    debug_assert!(field.is_empty() || !elimination.survivors.is_empty());

    let events = elimination
        .knockouts
        .iter()
        .map(|knockout| {
            let name = name_of(&alive, knockout.id);
            let action = decisions
                .iter()
                .find(|d| d.contestant_id == knockout.id)
                .map(|d| d.decision.action.as_str())
                .unwrap_or("nothing");
            let mut involved = vec![knockout.id];
            involved.extend(knockout.by);
            EliminationEvent {
                round_index,
                round_type: round.round_type,
                description: format!(
                    "{} was eliminated in {}: {}. Last move: {}.",
                    name,
                    round.round_type.display_name(),
                    knockout.detail,
                    action
                ),
                involved,
                timestamp_ms: now_ms,
            }
        })
        .collect();

    let eliminated = elimination.eliminated();
    let narration_request = NarrationRequest {
        round_type: round.round_type,
        round_number: round_index as u32 + 1,
        contestants: alive.iter().map(|c| ContestantSummary::from(*c)).collect(),
        survivors: summaries(&alive, &elimination.survivors),
        eliminated: summaries(&alive, &eliminated),
    };

    debug!(
        round = round_index + 1,
        kind = ?round.round_type,
        field = field.len(),
        eliminated = eliminated.len(),
        "round simulated"
    );

    SimulatedRound {
        outcome: RoundOutcome {
            round_index,
            round_type: round.round_type,
            participants: alive.iter().map(|c| c.id).collect(),
            survivors: elimination.survivors.clone(),
            eliminated,
            winner: elimination.winner,
            events,
            decisions,
            narration: fallback_narration(&narration_request),
        },
        narration_request,
    }
}

fn name_of(alive: &[&Contestant], id: ContestantId) -> String {
    alive
        .iter()
        .find(|c| c.id == id)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("Player {}", id))
}

fn summaries(alive: &[&Contestant], ids: &[ContestantId]) -> Vec<ContestantSummary> {
    ids.iter()
        .filter_map(|id| alive.iter().find(|c| c.id == *id))
        .map(|c| ContestantSummary::from(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoundCatalog;
    use crate::contestant::generate_roster;

    #[test]
    fn test_first_round_eliminates_two() {
        let mut rng = SeededRng::from_u64(11);
        let roster = generate_roster(10, &mut rng);
        let catalog = RoundCatalog::standard();

        let simulated = simulate_round(
            &catalog.rounds()[0],
            0,
            &roster,
            &RuleTable::standard(),
            &mut rng,
            1_000,
        );
        let outcome = &simulated.outcome;

        assert_eq!(outcome.eliminated.len(), 2);
        assert_eq!(outcome.survivors.len(), 8);
        assert_eq!(outcome.events.len(), 2);
        assert_eq!(outcome.decisions.len(), 10);
        for event in &outcome.events {
            assert_eq!(event.round_type, RoundType::RedLight);
            assert_eq!(event.timestamp_ms, 1_000);
            assert!(outcome.eliminated.contains(&event.involved[0]));
        }
        assert_eq!(simulated.narration_request.eliminated.len(), 2);
        assert!(!outcome.narrative_lines().is_empty());
    }

    #[test]
    fn test_skips_eliminated_contestants() {
        let mut rng = SeededRng::from_u64(3);
        let mut roster = generate_roster(6, &mut rng);
        roster[0].eliminate(RoundType::RedLight);
        let catalog = RoundCatalog::standard();

        let simulated = simulate_round(&catalog.rounds()[2], 2, &roster, &RuleTable::standard(), &mut rng, 0);
        assert_eq!(simulated.outcome.participants.len(), 5);
        assert!(!simulated.outcome.participants.contains(&roster[0].id));
        assert_eq!(simulated.outcome.eliminated.len(), 2);
        assert_eq!(simulated.outcome.round_number(), 3);
    }

    #[test]
    fn test_same_seed_same_round() {
        let catalog = RoundCatalog::standard();
        let run = || {
            let mut rng = SeededRng::from_u64(42);
            let roster = generate_roster(10, &mut rng);
            simulate_round(&catalog.rounds()[0], 0, &roster, &RuleTable::standard(), &mut rng, 0)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_duel_events_name_both_sides() {
        let mut rng = SeededRng::from_u64(8);
        let roster = generate_roster(4, &mut rng);
        let catalog = RoundCatalog::standard();
        let simulated = simulate_round(&catalog.rounds()[2], 0, &roster, &RuleTable::standard(), &mut rng, 0);
        for event in &simulated.outcome.events {
            assert_eq!(event.involved.len(), 2);
        }
    }
}
