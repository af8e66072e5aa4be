//! One game driven end to end
//!
//! Each round runs compute, narrate (bounded, with fallback), attach,
//! reveal, then a mirror notification. Round computation never awaits.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use arena_logic::{Bet, BetId, ContestantId, GameState, GameSummary, Orchestrator, PhaseKind, RevealReport};
use tracing::info;

use crate::{
    mirror::{LedgerMirror, MirrorDispatcher},
    narrator::{narrate_or_fallback, Narrator},
    Result,
};

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

pub struct GameSession<N, M> {
    game: Orchestrator,
    narrator: N,
    mirror: MirrorDispatcher<M>,
    narrator_timeout: Duration,
}

impl<N: Narrator, M: LedgerMirror> GameSession<N, M> {
    pub fn new(game: Orchestrator, narrator: N, mirror: M, narrator_timeout: Duration) -> Self {
        Self {
            game,
            narrator,
            mirror: MirrorDispatcher::new(mirror),
            narrator_timeout,
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.game
    }

    pub fn mirror(&self) -> &M {
        self.mirror.mirror()
    }

    /// Initialize the roster and open betting
    pub fn open(&mut self) -> Result<&GameState> {
        self.game.initialize()?;
        self.game.start_game()?;
        Ok(self.game.state())
    }

    /// Place a bet and mirror it
    pub fn place_bet(&mut self, contestant_id: ContestantId, amount: f64) -> Result<Bet> {
        let bet = self.game.place_bet(contestant_id, amount)?;
        self.mirror.bet_placed(bet.contestant_id, bet.amount, bet.odds);
        Ok(bet)
    }

    pub fn cancel_bet(&mut self, bet_id: BetId) -> Result<Bet> {
        Ok(self.game.cancel_bet(bet_id)?)
    }

    /// Play the next round. Closes betting first if it is still open.
    pub async fn play_round(&mut self) -> Result<RevealReport> {
        if self.game.phase().kind() == PhaseKind::Betting {
            self.game.start_simulation()?;
        }

        let request = self
            .game
            .compute_next_round(now_ms())?
            .narration_request
            .clone();
        let narration = narrate_or_fallback(&self.narrator, &request, self.narrator_timeout).await;
        self.game.attach_narration(narration)?;
        let report = self.game.reveal_round()?;

        self.mirror
            .narrative(report.round_number, report.outcome.narrative_lines());
        if let Some(summary) = &report.game_over {
            self.mirror.game_end(summary.winner, summary.betting.clone());
        }
        Ok(report)
    }

    /// Play every remaining round and move to game over
    pub async fn play_to_completion(&mut self) -> Result<GameSummary> {
        while matches!(
            self.game.phase().kind(),
            PhaseKind::Betting | PhaseKind::Simulation
        ) {
            let report = self.play_round().await?;
            info!(
                round = report.round_number,
                eliminated = report.outcome.eliminated.len(),
                "round played"
            );
        }
        self.show_results()
    }

    /// Results to game over
    pub fn show_results(&mut self) -> Result<GameSummary> {
        Ok(self.game.show_results()?)
    }

    /// Wait for outstanding mirror notifications
    pub async fn flush(&mut self) {
        self.mirror.flush().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mirror::mocks::{MirrorEvent, RecordingMirror};
    use crate::narrator::tests::{FailingNarrator, SlowNarrator};
    use crate::narrator::TemplateNarrator;
    use crate::Error;
    use arena_logic::{CommandError, GameConfig};

    fn session<N: Narrator>(narrator: N, mirror: RecordingMirror) -> GameSession<N, RecordingMirror> {
        let game = Orchestrator::new(GameConfig::default(), [12; 32]);
        let mut session = GameSession::new(game, narrator, mirror, Duration::from_millis(50));
        session.open().unwrap();
        session
    }

    #[tokio::test]
    async fn test_full_game_is_mirrored() {
        let mirror = RecordingMirror::default();
        let mut session = session(TemplateNarrator, mirror.clone());
        session.place_bet(1, 100.0).unwrap();

        let summary = session.play_to_completion().await.unwrap();
        session.flush().await;

        assert_eq!(session.orchestrator().phase().kind(), PhaseKind::GameOver);
        let events = mirror.events();
        assert!(matches!(events.first(), Some(MirrorEvent::BetPlaced { contestant_id: 1, .. })));
        let rounds: Vec<u32> = events
            .iter()
            .filter_map(|e| match e {
                MirrorEvent::Narrative { round_number, .. } => Some(*round_number),
                _ => None,
            })
            .collect();
        let expected: Vec<u32> = (1..=summary.rounds_played as u32).collect();
        assert_eq!(rounds, expected);
        assert!(matches!(
            events.last(),
            Some(MirrorEvent::GameEnd { winner_id, .. }) if *winner_id == summary.winner
        ));
    }

    #[tokio::test]
    async fn test_broken_collaborators_do_not_stop_the_game() {
        let mirror = RecordingMirror::failing();
        let mut session = session(FailingNarrator, mirror);
        session.place_bet(2, 50.0).unwrap();

        let summary = session.play_to_completion().await.unwrap();
        assert!(!summary.survivors.is_empty());
    }

    #[tokio::test]
    async fn test_slow_narrator_uses_fallback_text() {
        let mut session = session(SlowNarrator, RecordingMirror::default());
        let report = session.play_round().await.unwrap();
        let lines = report.outcome.narrative_lines();
        assert!(lines[0].starts_with("Round 1"));
        assert!(!lines.iter().any(|l| l == "too late"));
    }

    #[tokio::test]
    async fn test_bet_rejection_surfaces() {
        let mut session = session(TemplateNarrator, RecordingMirror::default());
        session.place_bet(1, 10.0).unwrap();
        let err = session.place_bet(1, 10.0).unwrap_err();
        assert!(matches!(err, Error::Command(CommandError::Bet(_))));
        session.flush().await;
        assert_eq!(session.mirror().events().len(), 1);
    }
}
