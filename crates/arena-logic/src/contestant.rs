//! Contestant model and roster generation

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::catalog::RoundType;
use crate::random::SeededRng;

pub type ContestantId = u32;

/// Lowest and highest value a stat may hold
pub const STAT_MIN: u8 = 1;
pub const STAT_MAX: u8 = 10;

/// Default roster size
pub const DEFAULT_CONTESTANT_COUNT: usize = 10;

/// Personality category
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Personality {
    Aggressive,
    Cautious,
    Strategic,
    Manipulative,
    Loyal,
    Desperate,
    Impulsive,
    Analytical,
    Charismatic,
    Ruthless,
}

impl Personality {
    pub const ALL: [Personality; 10] = [
        Personality::Aggressive,
        Personality::Cautious,
        Personality::Strategic,
        Personality::Manipulative,
        Personality::Loyal,
        Personality::Desperate,
        Personality::Impulsive,
        Personality::Analytical,
        Personality::Charismatic,
        Personality::Ruthless,
    ];

    /// Row index into the modifier and decision tables
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Personality::Aggressive => "aggressive",
            Personality::Cautious => "cautious",
            Personality::Strategic => "strategic",
            Personality::Manipulative => "manipulative",
            Personality::Loyal => "loyal",
            Personality::Desperate => "desperate",
            Personality::Impulsive => "impulsive",
            Personality::Analytical => "analytical",
            Personality::Charismatic => "charismatic",
            Personality::Ruthless => "ruthless",
        }
    }
}

/// Trait category. Named `Talent` because `trait` is reserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Talent {
    Athletic,
    Genius,
    Lucky,
    Charming,
    Agile,
    Devious,
    SteadyNerves,
    Observant,
    Brute,
    Veteran,
}

impl Talent {
    pub const ALL: [Talent; 10] = [
        Talent::Athletic,
        Talent::Genius,
        Talent::Lucky,
        Talent::Charming,
        Talent::Agile,
        Talent::Devious,
        Talent::SteadyNerves,
        Talent::Observant,
        Talent::Brute,
        Talent::Veteran,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            Talent::Athletic => "athletic",
            Talent::Genius => "genius",
            Talent::Lucky => "lucky",
            Talent::Charming => "charming",
            Talent::Agile => "agile",
            Talent::Devious => "devious",
            Talent::SteadyNerves => "steady nerves",
            Talent::Observant => "observant",
            Talent::Brute => "brute",
            Talent::Veteran => "veteran",
        }
    }
}

/// The six stat keys
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatKey {
    Strength,
    Intelligence,
    Luck,
    Charisma,
    /// `speed` is accepted as an alias
    #[serde(alias = "speed")]
    Agility,
    Deception,
}

/// Six integer stats, each in [1, 10]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub strength: u8,
    pub intelligence: u8,
    pub luck: u8,
    pub charisma: u8,
    #[serde(alias = "speed")]
    pub agility: u8,
    pub deception: u8,
}

impl Stats {
    pub fn get(&self, key: StatKey) -> u8 {
        match key {
            StatKey::Strength => self.strength,
            StatKey::Intelligence => self.intelligence,
            StatKey::Luck => self.luck,
            StatKey::Charisma => self.charisma,
            StatKey::Agility => self.agility,
            StatKey::Deception => self.deception,
        }
    }

    /// Alias of agility
    pub fn speed(&self) -> u8 {
        self.agility
    }

    pub fn as_array(&self) -> [u8; 6] {
        [
            self.strength,
            self.intelligence,
            self.luck,
            self.charisma,
            self.agility,
            self.deception,
        ]
    }

    pub fn average(&self) -> f64 {
        self.as_array().iter().map(|s| *s as f64).sum::<f64>() / 6.0
    }

    pub fn in_range(&self) -> bool {
        self.as_array()
            .iter()
            .all(|s| (STAT_MIN..=STAT_MAX).contains(s))
    }

    fn roll(rng: &mut SeededRng) -> Self {
        Self {
            strength: rng.next_between(STAT_MIN, STAT_MAX),
            intelligence: rng.next_between(STAT_MIN, STAT_MAX),
            luck: rng.next_between(STAT_MIN, STAT_MAX),
            charisma: rng.next_between(STAT_MIN, STAT_MAX),
            agility: rng.next_between(STAT_MIN, STAT_MAX),
            deception: rng.next_between(STAT_MIN, STAT_MAX),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContestantStatus {
    #[default]
    Alive,
    Eliminated,
    Winner,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Contestant {
    pub id: ContestantId,
    pub name: String,
    /// Display number shown on the tracksuit, e.g. "007"
    pub number: String,
    pub description: String,
    pub personality: Personality,
    #[serde(rename = "trait")]
    pub talent: Talent,
    pub stats: Stats,
    pub status: ContestantStatus,
    /// Set once, at the round that eliminated the contestant
    pub elimination_round: Option<RoundType>,
    /// Append-only, one entry per round played
    pub rounds_participated: Vec<RoundType>,
    /// Decimal odds; 0 once the contestant is no longer alive
    pub current_odds: f64,
    pub total_bets_placed: u32,
}

impl Contestant {
    pub fn new(
        id: ContestantId,
        name: impl Into<String>,
        personality: Personality,
        talent: Talent,
        stats: Stats,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            number: format!("{:03}", id),
            description: describe(personality, talent),
            personality,
            talent,
            stats,
            status: ContestantStatus::Alive,
            elimination_round: None,
            rounds_participated: Vec::new(),
            current_odds: 0.0,
            total_bets_placed: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.status == ContestantStatus::Alive
    }

    /// Still in the game: alive or already declared winner
    pub fn is_standing(&self) -> bool {
        self.status != ContestantStatus::Eliminated
    }

    /// Mark eliminated. A second call is a programming error.
    pub(crate) fn eliminate(&mut self, round: RoundType) {
        debug_assert!(
            self.elimination_round.is_none(),
            "contestant {} eliminated twice",
            self.id
        );
        if self.elimination_round.is_none() {
            self.elimination_round = Some(round);
        }
        self.status = ContestantStatus::Eliminated;
        self.current_odds = 0.0;
    }

    pub(crate) fn crown(&mut self) {
        debug_assert!(self.status != ContestantStatus::Eliminated);
        self.status = ContestantStatus::Winner;
        self.current_odds = 0.0;
    }
}

/// One-line flavor description from personality and talent
pub fn describe(personality: Personality, talent: Talent) -> String {
    let opener = match personality {
        Personality::Aggressive => "Charges at every problem head-on",
        Personality::Cautious => "Never takes a step without checking twice",
        Personality::Strategic => "Plans three games ahead",
        Personality::Manipulative => "Smiles while pulling the strings",
        Personality::Loyal => "Would carry a teammate across the line",
        Personality::Desperate => "Has nothing left to lose",
        Personality::Impulsive => "Acts first, thinks later",
        Personality::Analytical => "Reads the rules like a contract",
        Personality::Charismatic => "Wins rooms before winning games",
        Personality::Ruthless => "Sees every player as an obstacle",
    };
    let edge = match talent {
        Talent::Athletic => "built like an athlete",
        Talent::Genius => "with a mind for puzzles",
        Talent::Lucky => "and somehow always lands on their feet",
        Talent::Charming => "with a disarming smile",
        Talent::Agile => "and quick on their feet",
        Talent::Devious => "with a knack for dirty tricks",
        Talent::SteadyNerves => "with hands that never shake",
        Talent::Observant => "and misses nothing",
        Talent::Brute => "with raw strength to spare",
        Talent::Veteran => "and has survived worse than this",
    };
    format!("{}, {}.", opener, edge)
}

const NAME_POOL: [&str; 24] = [
    "Gi-hun", "Sang-woo", "Sae-byeok", "Ali", "Il-nam", "Deok-su",
    "Mi-nyeo", "Ji-yeong", "Byeong-gi", "Jun-ho", "Min-su", "Hyun-ju",
    "Dae-ho", "Jun-hee", "Yong-sik", "Geum-ja", "Thanos", "Se-mi",
    "Nam-gyu", "Kyung-seok", "Young-mi", "Jae-won", "Soo-bin", "Tae-ri",
];

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RosterError {
    #[error("roster needs at least 2 contestants (got {0})")]
    TooFew(usize),
    #[error("duplicate contestant id {0}")]
    DuplicateId(ContestantId),
    #[error("contestant {0} has a stat outside [1, 10]")]
    StatOutOfRange(ContestantId),
    #[error("contestant {0} must start alive")]
    NotAlive(ContestantId),
}

/// Build a random roster with ids 1..=count
pub fn generate_roster(count: usize, rng: &mut SeededRng) -> Vec<Contestant> {
    let mut names: Vec<&str> = NAME_POOL.to_vec();
    rng.shuffle(&mut names);

    (0..count)
        .map(|i| {
            let id = i as ContestantId + 1;
            let personality = Personality::ALL[rng.next_range(10) as usize];
            let talent = Talent::ALL[rng.next_range(10) as usize];
            let stats = Stats::roll(rng);
            let name = match names.get(i) {
                Some(name) => name.to_string(),
                None => format!("Player {}", id),
            };
            Contestant::new(id, name, personality, talent, stats)
        })
        .collect()
}

/// Check a caller-supplied roster before a game starts
pub fn validate_roster(roster: &[Contestant]) -> Result<(), RosterError> {
    if roster.len() < 2 {
        return Err(RosterError::TooFew(roster.len()));
    }
    let mut seen = HashSet::new();
    for contestant in roster {
        if !seen.insert(contestant.id) {
            return Err(RosterError::DuplicateId(contestant.id));
        }
        if !contestant.stats.in_range() {
            return Err(RosterError::StatOutOfRange(contestant.id));
        }
        if !contestant.is_alive() || contestant.elimination_round.is_some() {
            return Err(RosterError::NotAlive(contestant.id));
        }
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn flat_stats(value: u8) -> Stats {
        Stats {
            strength: value,
            intelligence: value,
            luck: value,
            charisma: value,
            agility: value,
            deception: value,
        }
    }

    #[test]
    fn test_generated_roster_shape() {
        let mut rng = SeededRng::from_u64(1);
        let roster = generate_roster(10, &mut rng);

        assert_eq!(roster.len(), 10);
        for (i, c) in roster.iter().enumerate() {
            assert_eq!(c.id, i as u32 + 1);
            assert!(c.stats.in_range());
            assert!(c.is_alive());
            assert!(c.rounds_participated.is_empty());
        }
        assert!(validate_roster(&roster).is_ok());
    }

    #[test]
    fn test_roster_is_deterministic() {
        let a = generate_roster(10, &mut SeededRng::from_u64(5));
        let b = generate_roster(10, &mut SeededRng::from_u64(5));
        assert_eq!(a, b);
    }

    #[test]
    fn test_large_roster_falls_back_to_numbered_names() {
        let roster = generate_roster(30, &mut SeededRng::from_u64(5));
        assert_eq!(roster[29].name, "Player 30");
    }

    #[test]
    fn test_number_is_zero_padded() {
        let c = Contestant::new(7, "Ali", Personality::Loyal, Talent::Brute, flat_stats(5));
        assert_eq!(c.number, "007");
    }

    #[test]
    fn test_speed_alias() {
        let json = r#"{"strength":1,"intelligence":2,"luck":3,"charisma":4,"speed":9,"deception":6}"#;
        let stats: Stats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.agility, 9);
        assert_eq!(stats.speed(), 9);
    }

    #[test]
    fn test_validate_rejects_duplicates_and_bad_stats() {
        let a = Contestant::new(1, "A", Personality::Loyal, Talent::Brute, flat_stats(5));
        let b = Contestant::new(1, "B", Personality::Loyal, Talent::Brute, flat_stats(5));
        assert_eq!(validate_roster(&[a.clone(), b]), Err(RosterError::DuplicateId(1)));

        let c = Contestant::new(2, "C", Personality::Loyal, Talent::Brute, flat_stats(11));
        assert_eq!(validate_roster(&[a.clone(), c]), Err(RosterError::StatOutOfRange(2)));

        assert_eq!(validate_roster(&[a]), Err(RosterError::TooFew(1)));
    }

    #[test]
    fn test_eliminate_zeroes_odds() {
        let mut c = Contestant::new(3, "C", Personality::Cautious, Talent::Lucky, flat_stats(4));
        c.current_odds = 4.2;
        c.eliminate(RoundType::RedLight);
        assert_eq!(c.status, ContestantStatus::Eliminated);
        assert_eq!(c.elimination_round, Some(RoundType::RedLight));
        assert_eq!(c.current_odds, 0.0);
    }
}
