//! Narration contract and the deterministic fallback narrator
//!
//! A narrator receives a [`NarrationRequest`] and returns a [`Narration`].
//! The network-backed narrators live outside this crate; this module only
//! defines the shapes and the templated text used whenever they fail.

use serde::{Deserialize, Serialize};

use crate::catalog::RoundType;
use crate::contestant::{Contestant, ContestantId, Personality, Stats, Talent};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContestantSummary {
    pub id: ContestantId,
    pub name: String,
    pub personality: Personality,
    #[serde(rename = "trait")]
    pub talent: Talent,
    pub description: String,
    pub stats: Stats,
}

impl From<&Contestant> for ContestantSummary {
    fn from(c: &Contestant) -> Self {
        Self {
            id: c.id,
            name: c.name.clone(),
            personality: c.personality,
            talent: c.talent,
            description: c.description.clone(),
            stats: c.stats,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NarrationRequest {
    pub round_type: RoundType,
    /// 1-based
    pub round_number: u32,
    pub contestants: Vec<ContestantSummary>,
    pub survivors: Vec<ContestantSummary>,
    pub eliminated: Vec<ContestantSummary>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narration {
    #[serde(default)]
    pub setup_lines: Vec<String>,
    #[serde(default)]
    pub action_lines: Vec<String>,
    #[serde(default)]
    pub elimination_lines: Vec<String>,
    #[serde(default)]
    pub dramatic_lines: Vec<String>,
}

impl Narration {
    /// Display order: setup, action, elimination, dramatic
    pub fn lines(&self) -> Vec<String> {
        self.setup_lines
            .iter()
            .chain(&self.action_lines)
            .chain(&self.elimination_lines)
            .chain(&self.dramatic_lines)
            .cloned()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.setup_lines.is_empty()
            && self.action_lines.is_empty()
            && self.elimination_lines.is_empty()
            && self.dramatic_lines.is_empty()
    }
}

fn setup_line(round: RoundType, round_number: u32, count: usize) -> String {
    match round {
        RoundType::RedLight => format!(
            "Round {}: {} players line up before the giant doll. Red light, green light.",
            round_number, count
        ),
        RoundType::TugOfWar => format!(
            "Round {}: {} players split into teams and take hold of the rope above the drop.",
            round_number, count
        ),
        RoundType::Marbles => format!(
            "Round {}: {} players are handed a bag of marbles and told to find a partner.",
            round_number, count
        ),
        RoundType::GlassBridge => format!(
            "Round {}: {} players face a bridge of glass panels, some tempered, some not.",
            round_number, count
        ),
        RoundType::FinalDuel => format!(
            "Round {}: {} players step onto the final court. Only one will leave.",
            round_number, count
        ),
    }
}

/// Elimination lines per round before the rest are summarised. Keeps a
/// fallback narration within the ledger's 16 lines.
pub const MAX_ELIMINATION_LINES: usize = 8;

fn elimination_line(round: RoundType, name: &str) -> String {
    match round {
        RoundType::RedLight => format!("{} moved when the doll turned.", name),
        RoundType::TugOfWar => format!("{} was dragged over the edge with their team.", name),
        RoundType::Marbles => format!("{} lost the last marble.", name),
        RoundType::GlassBridge => format!("{} stepped onto the wrong panel.", name),
        RoundType::FinalDuel => format!("{} fell in the final duel.", name),
    }
}

/// Deterministic, templated narration. Never fails.
pub fn fallback_narration(request: &NarrationRequest) -> Narration {
    let setup_lines = vec![setup_line(
        request.round_type,
        request.round_number,
        request.contestants.len(),
    )];

    let action_lines = request
        .contestants
        .iter()
        .take(3)
        .map(|c| {
            format!(
                "{} ({}, {}) makes a move.",
                c.name,
                c.personality.label(),
                c.talent.label()
            )
        })
        .collect();

    let named = if request.eliminated.len() > MAX_ELIMINATION_LINES {
        MAX_ELIMINATION_LINES - 1
    } else {
        request.eliminated.len()
    };
    let mut elimination_lines: Vec<String> = request.eliminated[..named]
        .iter()
        .map(|c| elimination_line(request.round_type, &c.name))
        .collect();
    if named < request.eliminated.len() {
        elimination_lines.push(format!(
            "...and {} more were eliminated.",
            request.eliminated.len() - named
        ));
    }

    let dramatic_lines = vec![match request.survivors.len() {
        0 => "Nobody is left standing.".to_string(),
        1 => format!("{} stands alone.", request.survivors[0].name),
        n => format!("{} players survive {}.", n, request.round_type.display_name()),
    }];

    Narration {
        setup_lines,
        action_lines,
        elimination_lines,
        dramatic_lines,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contestant::tests::flat_stats;

    fn summary(id: u32, name: &str) -> ContestantSummary {
        let c = Contestant::new(id, name, Personality::Cautious, Talent::Lucky, flat_stats(5));
        ContestantSummary::from(&c)
    }

    fn request() -> NarrationRequest {
        NarrationRequest {
            round_type: RoundType::GlassBridge,
            round_number: 4,
            contestants: vec![summary(1, "Ali"), summary(2, "Sae-byeok"), summary(3, "Deok-su")],
            survivors: vec![summary(1, "Ali"), summary(2, "Sae-byeok")],
            eliminated: vec![summary(3, "Deok-su")],
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        assert_eq!(fallback_narration(&request()), fallback_narration(&request()));
    }

    #[test]
    fn test_fallback_mentions_every_elimination() {
        let narration = fallback_narration(&request());
        assert_eq!(narration.elimination_lines.len(), 1);
        assert!(narration.elimination_lines[0].contains("Deok-su"));
        assert!(narration.setup_lines[0].starts_with("Round 4"));
        assert!(narration.dramatic_lines[0].contains("2 players survive"));
    }

    #[test]
    fn test_crowded_round_stays_within_line_limit() {
        let field: Vec<_> = (0..60).map(|i| summary(i, &format!("Player {:03}", i))).collect();
        let request = NarrationRequest {
            round_type: RoundType::Marbles,
            round_number: 3,
            contestants: field.clone(),
            survivors: field[..30].to_vec(),
            eliminated: field[30..].to_vec(),
        };

        let narration = fallback_narration(&request);
        assert!(narration.lines().len() <= 16);
        assert_eq!(narration.elimination_lines.len(), MAX_ELIMINATION_LINES);
        assert!(narration.elimination_lines[0].contains("Player 030"));
        assert_eq!(
            narration.elimination_lines.last().map(String::as_str),
            Some("...and 23 more were eliminated.")
        );

        let exact = NarrationRequest {
            eliminated: field[..MAX_ELIMINATION_LINES].to_vec(),
            ..request
        };
        let narration = fallback_narration(&exact);
        assert_eq!(narration.elimination_lines.len(), MAX_ELIMINATION_LINES);
        assert!(narration.elimination_lines.iter().all(|l| !l.contains("more were eliminated")));
    }

    #[test]
    fn test_lines_concatenate_in_order() {
        let narration = Narration {
            setup_lines: vec!["a".into()],
            action_lines: vec!["b".into()],
            elimination_lines: vec!["c".into()],
            dramatic_lines: vec!["d".into()],
        };
        assert_eq!(narration.lines(), vec!["a", "b", "c", "d"]);
        assert!(Narration::default().is_empty());
    }

    #[test]
    fn test_partial_json_narration() {
        let narration: Narration = serde_json::from_str(r#"{"setup_lines":["x"]}"#).unwrap();
        assert_eq!(narration.lines(), vec!["x"]);
    }
}
