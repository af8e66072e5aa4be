//! Elimination rules, one per round type
//!
//! Each rule is a plain function over scored contestants. The rule table
//! maps a [`RoundType`] to its rule and is built once per game.

use std::cmp::Ordering;

use crate::catalog::{GameRound, RoundType};
use crate::contestant::{Contestant, ContestantId};
use crate::random::SeededRng;

/// Team size for the team-strength rule
pub const TEAM_SIZE: usize = 3;

/// A contestant with this round's score inputs
#[derive(Clone, Debug)]
pub struct Scored<'a> {
    pub contestant: &'a Contestant,
    pub effectiveness: u32,
    /// Uniform in [0, 10) when the round has a random element, else 0
    pub random_factor: f64,
}

impl Scored<'_> {
    pub fn id(&self) -> ContestantId {
        self.contestant.id
    }

    pub fn score(&self) -> f64 {
        self.effectiveness as f64 + self.random_factor
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Knockout {
    pub id: ContestantId,
    /// Whoever beat them directly, when there is one
    pub by: Option<ContestantId>,
    pub detail: String,
}

/// What a rule decided. Survivors keep input order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Elimination {
    pub survivors: Vec<ContestantId>,
    pub knockouts: Vec<Knockout>,
    pub winner: Option<ContestantId>,
}

impl Elimination {
    fn from_knockouts(field: &[Scored<'_>], knockouts: Vec<Knockout>) -> Self {
        let survivors = field
            .iter()
            .map(Scored::id)
            .filter(|id| !knockouts.iter().any(|k| k.id == *id))
            .collect();
        Self {
            survivors,
            knockouts,
            winner: None,
        }
    }

    pub fn eliminated(&self) -> Vec<ContestantId> {
        self.knockouts.iter().map(|k| k.id).collect()
    }
}

pub type EliminationRule = fn(&GameRound, &[Scored<'_>], &mut SeededRng) -> Elimination;

/// Round type to rule dispatch
#[derive(Clone, Copy)]
pub struct RuleTable {
    rules: [EliminationRule; 5],
}

impl RuleTable {
    pub fn standard() -> Self {
        Self {
            rules: [
                ranking_rule,
                team_strength_rule,
                pairwise_duel_rule,
                sequential_risk_rule,
                final_duel_rule,
            ],
        }
    }

    /// Swap one rule, e.g. to run a custom catalog
    pub fn with_rule(mut self, round: RoundType, rule: EliminationRule) -> Self {
        self.rules[round.index()] = rule;
        self
    }

    pub fn rule_for(&self, round: RoundType) -> EliminationRule {
        self.rules[round.index()]
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::standard()
    }
}

/// Strongest first; ties go to higher effectiveness, then lower id
fn by_strength_desc(a: &Scored<'_>, b: &Scored<'_>) -> Ordering {
    b.score()
        .total_cmp(&a.score())
        .then(b.effectiveness.cmp(&a.effectiveness))
        .then(a.id().cmp(&b.id()))
}

/// Rank by effectiveness + random, cut the bottom of the table
pub fn ranking_rule(round: &GameRound, field: &[Scored<'_>], _rng: &mut SeededRng) -> Elimination {
    let quota = round.quota(field.len());
    let mut ranked: Vec<&Scored<'_>> = field.iter().collect();
    ranked.sort_by(|a, b| by_strength_desc(a, b));

    let knockouts = ranked[ranked.len() - quota..]
        .iter()
        .map(|s| Knockout {
            id: s.id(),
            by: None,
            detail: format!("finished in the bottom {} (score {:.1})", quota, s.score()),
        })
        .collect();

    Elimination::from_knockouts(field, knockouts)
}

/// Teams of up to three in input order; weakest members of the weakest
/// teams fall until the quota is met
pub fn team_strength_rule(round: &GameRound, field: &[Scored<'_>], _rng: &mut SeededRng) -> Elimination {
    let quota = round.quota(field.len());

    let mut teams: Vec<(usize, &[Scored<'_>])> = field.chunks(TEAM_SIZE).enumerate().collect();
    teams.sort_by(|(ia, a), (ib, b)| {
        let total_a: f64 = a.iter().map(Scored::score).sum();
        let total_b: f64 = b.iter().map(Scored::score).sum();
        total_a.total_cmp(&total_b).then(ia.cmp(ib))
    });

    let mut knockouts = Vec::with_capacity(quota);
    'teams: for (team_index, members) in teams {
        let mut members: Vec<&Scored<'_>> = members.iter().collect();
        members.sort_by(|a, b| by_strength_desc(b, a));
        for member in members {
            if knockouts.len() >= quota {
                break 'teams;
            }
            knockouts.push(Knockout {
                id: member.id(),
                by: None,
                detail: format!("team {} lost the pull", team_index + 1),
            });
        }
    }

    Elimination::from_knockouts(field, knockouts)
}

/// Random pairs; the loser of each pair is out. Ignores the nominal quota:
/// exactly `floor(n / 2)` eliminations.
pub fn pairwise_duel_rule(_round: &GameRound, field: &[Scored<'_>], rng: &mut SeededRng) -> Elimination {
    let mut order: Vec<usize> = (0..field.len()).collect();
    rng.shuffle(&mut order);

    let knockouts = order
        .chunks_exact(2)
        .map(|pair| {
            let (a, b) = (&field[pair[0]], &field[pair[1]]);
            let (winner, loser) = match b.score().total_cmp(&a.score()) {
                Ordering::Greater => (b, a),
                Ordering::Less => (a, b),
                Ordering::Equal if b.effectiveness > a.effectiveness => (b, a),
                Ordering::Equal => (a, b),
            };
            Knockout {
                id: loser.id(),
                by: Some(winner.id()),
                detail: format!(
                    "lost the duel to {} ({:.1} vs {:.1})",
                    winner.contestant.name,
                    loser.score(),
                    winner.score()
                ),
            }
        })
        .collect();

    Elimination::from_knockouts(field, knockouts)
}

/// Weakest go first. Each turn survives with
/// `0.3 + effectiveness / 100 + turn * 0.1`; once the quota is reached
/// everyone after is safe.
pub fn sequential_risk_rule(round: &GameRound, field: &[Scored<'_>], rng: &mut SeededRng) -> Elimination {
    let quota = round.quota(field.len());
    let mut order: Vec<&Scored<'_>> = field.iter().collect();
    order.sort_by(|a, b| a.effectiveness.cmp(&b.effectiveness).then(a.id().cmp(&b.id())));

    let mut knockouts = Vec::with_capacity(quota);
    for (turn, scored) in order.into_iter().enumerate() {
        if knockouts.len() >= quota {
            break;
        }
        let chance = 0.3 + scored.effectiveness as f64 / 100.0 + turn as f64 * 0.1;
        let roll = rng.next_f64();
        if roll >= chance {
            knockouts.push(Knockout {
                id: scored.id(),
                by: None,
                detail: format!("fell on turn {} (chance {:.0}%)", turn + 1, chance.min(1.0) * 100.0),
            });
        }
    }

    Elimination::from_knockouts(field, knockouts)
}

/// Weighted composite used by the final duel
pub fn final_composite(scored: &Scored<'_>) -> f64 {
    let s = &scored.contestant.stats;
    0.3 * s.strength as f64
        + 0.3 * s.agility as f64
        + 0.2 * s.intelligence as f64
        + 0.1 * s.deception as f64
        + 0.1 * s.luck as f64
        + scored.random_factor
}

/// Exactly two left: composite decides and the victor is crowned.
/// Any other field size falls back to the ranking rule.
pub fn final_duel_rule(round: &GameRound, field: &[Scored<'_>], rng: &mut SeededRng) -> Elimination {
    let [a, b] = field else {
        return ranking_rule(round, field, rng);
    };

    let (score_a, score_b) = (final_composite(a), final_composite(b));
    let (winner, loser, winning, losing) = match score_b.total_cmp(&score_a) {
        Ordering::Greater => (b, a, score_b, score_a),
        Ordering::Less => (a, b, score_a, score_b),
        Ordering::Equal if b.effectiveness > a.effectiveness => (b, a, score_b, score_a),
        Ordering::Equal => (a, b, score_a, score_b),
    };

    let mut elimination = Elimination::from_knockouts(
        field,
        vec![Knockout {
            id: loser.id(),
            by: Some(winner.id()),
            detail: format!(
                "beaten by {} in the final ({:.1} vs {:.1})",
                winner.contestant.name, losing, winning
            ),
        }],
    );
    elimination.winner = Some(winner.id());
    elimination
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoundCatalog;
    use crate::contestant::tests::flat_stats;
    use crate::contestant::{Personality, Talent};

    fn round(kind: RoundType) -> GameRound {
        RoundCatalog::standard().rounds()[kind.index()].clone()
    }

    fn roster(n: u32) -> Vec<Contestant> {
        (1..=n)
            .map(|id| Contestant::new(id, format!("P{}", id), Personality::Loyal, Talent::Veteran, flat_stats(5)))
            .collect()
    }

    /// Effectiveness = id * 10, no randomness
    fn field(roster: &[Contestant]) -> Vec<Scored<'_>> {
        roster
            .iter()
            .map(|c| Scored {
                contestant: c,
                effectiveness: c.id * 10,
                random_factor: 0.0,
            })
            .collect()
    }

    fn check_partition(field: &[Scored<'_>], result: &Elimination) {
        assert_eq!(result.survivors.len() + result.knockouts.len(), field.len());
        assert!(!result.survivors.is_empty() || field.is_empty());
        for k in &result.knockouts {
            assert!(!result.survivors.contains(&k.id));
        }
    }

    #[test]
    fn test_ranking_cuts_bottom() {
        let roster = roster(10);
        let field = field(&roster);
        let result = ranking_rule(&round(RoundType::RedLight), &field, &mut SeededRng::from_u64(1));

        check_partition(&field, &result);
        let mut out = result.eliminated();
        out.sort();
        assert_eq!(out, vec![1, 2]);
    }

    #[test]
    fn test_ranking_keeps_one_when_quota_equals_field() {
        let roster = roster(2);
        let field = field(&roster);
        let result = ranking_rule(&round(RoundType::RedLight), &field, &mut SeededRng::from_u64(1));
        assert_eq!(result.survivors, vec![2]);
        assert_eq!(result.eliminated(), vec![1]);
    }

    #[test]
    fn test_team_rule_hits_weakest_team_first() {
        // teams: [1,2,3]=60, [4,5,6]=150, [7,8,9]=240, [10]=100
        let roster = roster(10);
        let field = field(&roster);
        let result = team_strength_rule(&round(RoundType::TugOfWar), &field, &mut SeededRng::from_u64(1));

        check_partition(&field, &result);
        assert_eq!(result.eliminated(), vec![1, 2, 3]);
    }

    #[test]
    fn test_team_rule_spills_into_next_team() {
        let roster = roster(10);
        let field = field(&roster);
        let mut tug = round(RoundType::TugOfWar);
        tug.elimination_count = 5;
        let result = team_strength_rule(&tug, &field, &mut SeededRng::from_u64(1));

        // after team [1,2,3], the lone [10] team (100) is next weakest, then [4,5,6]
        assert_eq!(result.eliminated(), vec![1, 2, 3, 10, 4]);
    }

    #[test]
    fn test_duels_eliminate_half() {
        for n in 1..=11u32 {
            let roster = roster(n);
            let field = field(&roster);
            let result = pairwise_duel_rule(&round(RoundType::Marbles), &field, &mut SeededRng::from_u64(n as u64));
            check_partition(&field, &result);
            assert_eq!(result.knockouts.len(), (n / 2) as usize);
            for k in &result.knockouts {
                let winner = k.by.unwrap();
                assert!(winner > k.id, "stronger contestant must win each duel");
            }
        }
    }

    #[test]
    fn test_sequential_respects_quota() {
        let roster = roster(6);
        let field = field(&roster);
        let mut bridge = round(RoundType::GlassBridge);
        bridge.elimination_count = 10;
        for seed in 0..50 {
            let result = sequential_risk_rule(&bridge, &field, &mut SeededRng::from_u64(seed));
            check_partition(&field, &result);
            assert!(result.knockouts.len() <= 5);
        }
    }

    #[test]
    fn test_sequential_late_turns_are_safe() {
        // effectiveness 0 everywhere: turn 7+ has chance >= 1.0
        let roster = roster(10);
        let field: Vec<Scored<'_>> = roster
            .iter()
            .map(|c| Scored { contestant: c, effectiveness: 0, random_factor: 0.0 })
            .collect();
        let mut bridge = round(RoundType::GlassBridge);
        bridge.elimination_count = 9;
        for seed in 0..50 {
            let result = sequential_risk_rule(&bridge, &field, &mut SeededRng::from_u64(seed));
            for k in &result.knockouts {
                assert!(k.id <= 7, "turn for id {} cannot fail", k.id);
            }
        }
    }

    #[test]
    fn test_final_duel_crowns_winner() {
        let mut roster = roster(2);
        roster[1].stats = flat_stats(9);
        let field = field(&roster);
        let result = final_duel_rule(&round(RoundType::FinalDuel), &field, &mut SeededRng::from_u64(1));

        assert_eq!(result.winner, Some(2));
        assert_eq!(result.survivors, vec![2]);
        assert_eq!(result.eliminated(), vec![1]);
    }

    #[test]
    fn test_final_duel_falls_back_to_ranking() {
        let roster = roster(3);
        let field = field(&roster);
        let result = final_duel_rule(&round(RoundType::FinalDuel), &field, &mut SeededRng::from_u64(1));

        assert_eq!(result.winner, None);
        assert_eq!(result.eliminated(), vec![1]);

        let solo = roster[..1].to_vec();
        let field = super::tests::field(&solo);
        let result = final_duel_rule(&round(RoundType::FinalDuel), &field, &mut SeededRng::from_u64(1));
        assert!(result.knockouts.is_empty());
        assert_eq!(result.survivors, vec![1]);
    }

    #[test]
    fn test_rule_table_dispatch() {
        let table = RuleTable::standard().with_rule(RoundType::Marbles, ranking_rule);
        let roster = roster(4);
        let field = field(&roster);
        let result = (table.rule_for(RoundType::Marbles))(&round(RoundType::Marbles), &field, &mut SeededRng::from_u64(1));
        // ranking with quota 2 instead of duels
        let mut out = result.eliminated();
        out.sort();
        assert_eq!(out, vec![1, 2]);
    }
}
