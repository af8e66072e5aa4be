//! Round catalog: the fixed, ordered list of elimination stages

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::contestant::StatKey;

/// The five round identifiers, each with its own elimination rule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RoundType {
    /// Freeze on signal. Ranking rule.
    RedLight,
    /// Teams of three pull against each other.
    TugOfWar,
    /// Pairwise duels; the loser of each pair is out.
    Marbles,
    /// One at a time across the bridge, weakest first.
    GlassBridge,
    /// Last two standing.
    FinalDuel,
}

impl RoundType {
    pub const ALL: [RoundType; 5] = [
        RoundType::RedLight,
        RoundType::TugOfWar,
        RoundType::Marbles,
        RoundType::GlassBridge,
        RoundType::FinalDuel,
    ];

    /// Column index into the modifier and decision tables
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn display_name(self) -> &'static str {
        match self {
            RoundType::RedLight => "Red Light, Green Light",
            RoundType::TugOfWar => "Tug of War",
            RoundType::Marbles => "Marbles",
            RoundType::GlassBridge => "Glass Bridge",
            RoundType::FinalDuel => "The Final Duel",
        }
    }
}

/// Immutable catalog entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRound {
    #[serde(rename = "type")]
    pub round_type: RoundType,
    pub primary_stats: Vec<StatKey>,
    #[serde(default)]
    pub secondary_stats: Vec<StatKey>,
    /// Nominal count; clamped at runtime so someone always survives
    pub elimination_count: u32,
    #[serde(default)]
    pub allows_alliances: bool,
    #[serde(default)]
    pub requires_teamwork: bool,
    #[serde(default)]
    pub has_random_element: bool,
}

impl GameRound {
    /// Eliminations this round may perform with `alive` contestants
    pub fn quota(&self, alive: usize) -> usize {
        (self.elimination_count as usize).min(alive.saturating_sub(1))
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no rounds")]
    Empty,
    #[error("round {0:?} has no primary stats")]
    NoPrimaryStats(RoundType),
    #[error("round {0:?} eliminates nobody")]
    ZeroEliminations(RoundType),
    #[error("round {0:?} appears more than once")]
    DuplicateRound(RoundType),
}

/// Ordered, validated list of rounds
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<GameRound>", into = "Vec<GameRound>")]
pub struct RoundCatalog {
    rounds: Vec<GameRound>,
}

impl RoundCatalog {
    pub fn new(rounds: Vec<GameRound>) -> Result<Self, CatalogError> {
        if rounds.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = HashSet::new();
        for round in &rounds {
            if round.primary_stats.is_empty() {
                return Err(CatalogError::NoPrimaryStats(round.round_type));
            }
            if round.elimination_count == 0 {
                return Err(CatalogError::ZeroEliminations(round.round_type));
            }
            if !seen.insert(round.round_type) {
                return Err(CatalogError::DuplicateRound(round.round_type));
            }
        }
        Ok(Self { rounds })
    }

    /// The built-in five-round sequence
    pub fn standard() -> Self {
        use StatKey::*;
        Self {
            rounds: vec![
                GameRound {
                    round_type: RoundType::RedLight,
                    primary_stats: vec![Agility, Intelligence],
                    secondary_stats: vec![Luck],
                    elimination_count: 2,
                    allows_alliances: false,
                    requires_teamwork: false,
                    has_random_element: true,
                },
                GameRound {
                    round_type: RoundType::TugOfWar,
                    primary_stats: vec![Strength],
                    secondary_stats: vec![Intelligence, Charisma],
                    elimination_count: 3,
                    allows_alliances: true,
                    requires_teamwork: true,
                    has_random_element: false,
                },
                GameRound {
                    round_type: RoundType::Marbles,
                    primary_stats: vec![Intelligence, Deception],
                    secondary_stats: vec![Luck, Charisma],
                    elimination_count: 2,
                    allows_alliances: true,
                    requires_teamwork: false,
                    has_random_element: true,
                },
                GameRound {
                    round_type: RoundType::GlassBridge,
                    primary_stats: vec![Luck, Intelligence],
                    secondary_stats: vec![Agility],
                    elimination_count: 1,
                    allows_alliances: false,
                    requires_teamwork: false,
                    has_random_element: true,
                },
                GameRound {
                    round_type: RoundType::FinalDuel,
                    primary_stats: vec![Strength, Agility],
                    secondary_stats: vec![Deception, Intelligence],
                    elimination_count: 1,
                    allows_alliances: false,
                    requires_teamwork: false,
                    has_random_element: true,
                },
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&GameRound> {
        self.rounds.get(index)
    }

    pub fn rounds(&self) -> &[GameRound] {
        &self.rounds
    }
}

impl Default for RoundCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

impl TryFrom<Vec<GameRound>> for RoundCatalog {
    type Error = CatalogError;

    fn try_from(rounds: Vec<GameRound>) -> Result<Self, Self::Error> {
        Self::new(rounds)
    }
}

impl From<RoundCatalog> for Vec<GameRound> {
    fn from(catalog: RoundCatalog) -> Self {
        catalog.rounds
    }
}
