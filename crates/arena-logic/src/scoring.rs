//! Effectiveness scoring
//!
//! `effectiveness = 2 * sum(primary) + sum(secondary) + personality + talent`,
//! floored at zero with no upper cap.

use crate::catalog::{GameRound, RoundType};
use crate::contestant::{Contestant, Personality, Talent};

/// Personality fit per round.
/// Columns: RedLight, TugOfWar, Marbles, GlassBridge, FinalDuel.
const PERSONALITY_MODIFIERS: [[i32; 5]; 10] = [
    [-1, 2, 1, -1, 3],  // Aggressive
    [3, 0, -1, -2, -1], // Cautious
    [1, 1, 2, 2, 1],    // Strategic
    [0, -1, 3, 1, 1],   // Manipulative
    [0, 3, -2, 0, -1],  // Loyal
    [-1, 0, 1, 2, 2],   // Desperate
    [-3, 1, -1, -2, 1], // Impulsive
    [2, 0, 1, 3, 0],    // Analytical
    [0, 2, 2, -1, -1],  // Charismatic
    [-1, 1, 2, 1, 3],   // Ruthless
];

/// Talent fit per round, same column order.
const TALENT_MODIFIERS: [[i32; 5]; 10] = [
    [2, 3, 0, 1, 3],    // Athletic
    [1, 0, 2, 3, 1],    // Genius
    [1, 0, 2, 3, 0],    // Lucky
    [0, 1, 3, -1, 0],   // Charming
    [3, 0, 0, 2, 2],    // Agile
    [0, -1, 3, 1, 2],   // Devious
    [3, 1, 0, 2, 1],    // SteadyNerves
    [2, 0, 1, 3, 0],    // Observant
    [-1, 3, -1, -1, 3], // Brute
    [1, 2, 1, 1, 1],    // Veteran
];

pub fn personality_modifier(personality: Personality, round: RoundType) -> i32 {
    PERSONALITY_MODIFIERS[personality.index()][round.index()]
}

pub fn talent_modifier(talent: Talent, round: RoundType) -> i32 {
    TALENT_MODIFIERS[talent.index()][round.index()]
}

/// Fitness of a contestant for one round
pub fn effectiveness(contestant: &Contestant, round: &GameRound) -> u32 {
    let primary: i32 = round
        .primary_stats
        .iter()
        .map(|key| contestant.stats.get(*key) as i32)
        .sum();
    let secondary: i32 = round
        .secondary_stats
        .iter()
        .map(|key| contestant.stats.get(*key) as i32)
        .sum();

    let raw = 2 * primary
        + secondary
        + personality_modifier(contestant.personality, round.round_type)
        + talent_modifier(contestant.talent, round.round_type);

    raw.max(0) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoundCatalog;
    use crate::contestant::tests::flat_stats;
    use crate::contestant::{StatKey, Stats};

    fn round(kind: RoundType) -> GameRound {
        RoundCatalog::standard()
            .rounds()
            .iter()
            .find(|r| r.round_type == kind)
            .cloned()
            .unwrap()
    }

    #[test]
    fn test_cautious_fits_freeze_not_bridge() {
        assert_eq!(personality_modifier(Personality::Cautious, RoundType::RedLight), 3);
        assert_eq!(personality_modifier(Personality::Cautious, RoundType::GlassBridge), -2);
    }

    #[test]
    fn test_weighting() {
        // RedLight: primary agility + intelligence, secondary luck
        let stats = Stats {
            strength: 1,
            intelligence: 4,
            luck: 3,
            charisma: 1,
            agility: 5,
            deception: 1,
        };
        // Loyal (0) + Veteran (+1)
        let c = Contestant::new(1, "A", Personality::Loyal, Talent::Veteran, stats);
        let expected = 2 * (5 + 4) + 3 + 0 + 1;
        assert_eq!(effectiveness(&c, &round(RoundType::RedLight)), expected);
    }

    #[test]
    fn test_floor_at_zero() {
        let custom = GameRound {
            round_type: RoundType::RedLight,
            primary_stats: vec![StatKey::Strength],
            secondary_stats: vec![],
            elimination_count: 1,
            allows_alliances: false,
            requires_teamwork: false,
            has_random_element: false,
        };
        // 2*1 - 3 (Impulsive) - 1 (Brute) = -2 -> 0
        let c = Contestant::new(1, "A", Personality::Impulsive, Talent::Brute, flat_stats(1));
        assert_eq!(effectiveness(&c, &custom), 0);
    }

    #[test]
    fn test_no_upper_cap() {
        let c = Contestant::new(1, "A", Personality::Ruthless, Talent::Athletic, flat_stats(10));
        // FinalDuel: 2*(10+10) + (10+10) + 3 + 3
        assert_eq!(effectiveness(&c, &round(RoundType::FinalDuel)), 66);
    }

    #[test]
    fn test_tables_cover_every_pair() {
        for p in Personality::ALL {
            for r in RoundType::ALL {
                assert!(personality_modifier(p, r).abs() <= 3);
            }
        }
        for t in Talent::ALL {
            for r in RoundType::ALL {
                assert!(talent_modifier(t, r).abs() <= 3);
            }
        }
    }
}
