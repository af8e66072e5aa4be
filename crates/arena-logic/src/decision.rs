//! Flavor decisions for contestants
//!
//! Purely cosmetic: the output feeds event and narrative text and never
//! influences who is eliminated.

use serde::{Deserialize, Serialize};

use crate::catalog::{GameRound, RoundType};
use crate::contestant::{Contestant, Personality, Talent};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Move up or down the low/medium/high scale, clamped at the ends
    pub fn shift(self, steps: i8) -> Self {
        let level = (self as i8 + steps).clamp(0, 2);
        match level {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub action: String,
    pub reasoning: String,
    /// In [0, 1]
    pub confidence: f64,
    pub risk_level: RiskLevel,
}

struct Template {
    action: &'static str,
    reasoning: &'static str,
    confidence: f64,
    risk: RiskLevel,
}

const fn t(action: &'static str, reasoning: &'static str, confidence: f64, risk: RiskLevel) -> Template {
    Template {
        action,
        reasoning,
        confidence,
        risk,
    }
}

use RiskLevel::{High, Low, Medium};

// Rows follow Personality::ALL, columns follow RoundType::ALL.
const TEMPLATES: [[Template; 5]; 10] = [
    // Aggressive
    [
        t("Sprints for the line between signals", "Speed beats hesitation", 0.6, High),
        t("Anchors the rope and pulls on every count", "Raw force wins the tug", 0.75, Medium),
        t("Bets everything on one throw", "Ends the game before the opponent can think", 0.55, High),
        t("Volunteers to jump first", "Waiting only lets fear grow", 0.4, High),
        t("Goes straight for the takedown", "The last fight rewards whoever strikes first", 0.8, High),
    ],
    // Cautious
    [
        t("Moves in tiny steps, frozen long before the doll turns", "Small steps are hard to spot", 0.8, Low),
        t("Takes the back of the rope", "Stay covered, let the strong lead", 0.55, Low),
        t("Plays small, safe wagers", "Losing slowly leaves room to recover", 0.5, Low),
        t("Hangs back and studies every panel", "Let others reveal the safe glass", 0.45, Low),
        t("Waits for an opening", "A mistake by the other side is the safest win", 0.45, Medium),
    ],
    // Strategic
    [
        t("Hides behind a taller player", "Use the crowd as cover", 0.75, Medium),
        t("Coordinates the team's stance and timing", "Technique beats weight", 0.8, Medium),
        t("Tracks the opponent's tells before committing", "Patterns win marbles", 0.75, Medium),
        t("Watches the glass glare for tempered panels", "Information is survival", 0.7, Medium),
        t("Forces the fight onto familiar ground", "Control the terrain, control the outcome", 0.7, Medium),
    ],
    // Manipulative
    [
        t("Nudges a rival forward at the wrong moment", "One less competitor is one less threat", 0.6, Medium),
        t("Promises loyalty to a team it will abandon", "Alliances are tools", 0.5, Medium),
        t("Feigns a weak hand to lure a big bet", "Trust is the easiest thing to steal", 0.85, Medium),
        t("Talks someone else into going first", "Let them test the glass", 0.7, Low),
        t("Offers a truce, then strikes", "Words are weapons too", 0.65, High),
    ],
    // Loyal
    [
        t("Stays beside a friend the whole way", "Nobody gets left behind", 0.6, Medium),
        t("Pulls for the whole team without rest", "Together or not at all", 0.85, Medium),
        t("Struggles to play against a partner", "Winning here means losing someone", 0.35, Medium),
        t("Helps the person in front find footing", "Every survivor matters", 0.5, Medium),
        t("Fights for everyone who fell", "It has to mean something", 0.6, Medium),
    ],
    // Desperate
    [
        t("Lunges forward whenever possible", "There is no going back now", 0.45, High),
        t("Throws every ounce of weight into the pull", "This is the only chance", 0.6, High),
        t("Begs, bargains and gambles", "Anything is better than losing", 0.5, High),
        t("Jumps without looking", "Standing still feels worse than falling", 0.5, High),
        t("Fights like a cornered animal", "Nothing left to lose", 0.7, High),
    ],
    // Impulsive
    [
        t("Bolts at the first green light", "Why wait?", 0.4, High),
        t("Yanks the rope before the signal", "Momentum now", 0.55, High),
        t("Picks a game on a whim", "Gut feeling", 0.45, High),
        t("Hops onto the nearest panel", "Just go!", 0.35, High),
        t("Charges recklessly", "Hesitation is death", 0.6, High),
    ],
    // Analytical
    [
        t("Times the doll's song and moves to the count", "The rhythm is predictable", 0.85, Low),
        t("Calculates leverage and tells the team to lean back", "Physics favors the prepared", 0.7, Medium),
        t("Computes odds of every guess", "Probability is a friend", 0.75, Medium),
        t("Reads reflections to separate glass types", "Tempered glass distorts differently", 0.8, Low),
        t("Studies the opponent's footwork", "Every fighter has a pattern", 0.6, Medium),
    ],
    // Charismatic
    [
        t("Keeps the group calm and moving together", "Panic gets people shot", 0.6, Medium),
        t("Rallies the team with a chant", "Morale pulls harder than muscles", 0.75, Medium),
        t("Charms the opponent into a friendly game", "People play worse against friends", 0.8, Medium),
        t("Persuades the line to move in an order that suits it", "A good word finds safe glass", 0.55, Medium),
        t("Tries to talk the opponent down", "Not every fight needs fists", 0.5, Medium),
    ],
    // Ruthless
    [
        t("Uses a stumbling player as a shield", "Someone else can take the bullet", 0.65, Medium),
        t("Targets the weakest team member on the other side", "Break the chain at its weakest link", 0.7, Medium),
        t("Cheats without hesitation", "Rules are for losers", 0.8, High),
        t("Pushes the player ahead off the panel", "Someone has to test it", 0.75, High),
        t("Attacks without mercy", "Only one walks out", 0.85, High),
    ],
];

/// Confidence bonus when a talent suits the round
fn talent_confidence_bonus(talent: Talent, round: RoundType) -> f64 {
    use RoundType::*;
    use Talent::*;
    match (talent, round) {
        (Agile | SteadyNerves, RedLight) => 0.15,
        (Athletic | Brute, TugOfWar) => 0.15,
        (Charming | Devious | Genius, Marbles) => 0.15,
        (Observant | Lucky | Genius, GlassBridge) => 0.15,
        (Athletic | Brute, FinalDuel) => 0.15,
        (Veteran, _) => 0.05,
        _ => 0.0,
    }
}

/// Personality pulls the risk level one step either way
fn risk_shift(personality: Personality) -> i8 {
    match personality {
        Personality::Aggressive | Personality::Impulsive | Personality::Desperate => 1,
        Personality::Cautious | Personality::Analytical => -1,
        _ => 0,
    }
}

/// Decide what a contestant does this round.
///
/// `remaining` is everyone still in the round, including `contestant`.
pub fn decide(contestant: &Contestant, round: &GameRound, remaining: &[&Contestant]) -> Decision {
    let template = &TEMPLATES[contestant.personality.index()][round.round_type.index()];

    // The field thinning out rattles everyone a little
    let pressure = if remaining.len() <= 3 { -0.1 } else { 0.0 };
    let rivals = remaining.iter().filter(|c| c.id != contestant.id).count();
    let reasoning = if rivals == 0 {
        template.reasoning.to_string()
    } else {
        format!("{} ({} rivals left)", template.reasoning, rivals)
    };

    Decision {
        action: template.action.to_string(),
        reasoning,
        confidence: (template.confidence
            + talent_confidence_bonus(contestant.talent, round.round_type)
            + pressure)
            .clamp(0.0, 1.0),
        risk_level: template.risk.shift(risk_shift(contestant.personality)),
    }
}
