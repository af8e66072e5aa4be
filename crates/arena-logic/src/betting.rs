//! Betting ledger and dynamic odds

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::contestant::{Contestant, ContestantId};

/// Fixed stake every ledger starts with
pub const STARTING_BALANCE: f64 = 1000.0;

pub const MIN_ODDS: f64 = 1.1;
pub const MAX_ODDS: f64 = 50.0;

pub type BetId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Active,
    Won,
    Lost,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bet {
    pub id: BetId,
    pub contestant_id: ContestantId,
    pub amount: f64,
    /// Snapshotted at placement
    pub odds: f64,
    pub potential_payout: f64,
    pub status: BetStatus,
    pub actual_payout: Option<f64>,
    /// Set when the payout was divided among simultaneous survivors
    pub split_reason: Option<String>,
}

/// Validation failures. Returned, never panicked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BetError {
    #[error("bet amount must be positive")]
    InvalidAmount,
    #[error("insufficient balance: {balance:.2} available, {amount:.2} requested")]
    InsufficientBalance { balance: f64, amount: f64 },
    #[error("odds must be greater than 1.0 (got {0})")]
    InvalidOdds(f64),
    #[error("an active bet on contestant {0} already exists")]
    DuplicateBet(ContestantId),
    #[error("unknown contestant {0}")]
    UnknownContestant(ContestantId),
    #[error("contestant {0} is no longer alive")]
    ContestantNotAlive(ContestantId),
    #[error("no active bet with id {0}")]
    BetNotFound(BetId),
    #[error("bets are already settled")]
    LedgerSettled,
}

/// Result of settling every active bet
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    pub survivor_count: usize,
    pub total_payout: f64,
    pub won: Vec<BetId>,
    pub lost: Vec<BetId>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BettingStats {
    pub total_bets: usize,
    pub active_bets: usize,
    pub won_bets: usize,
    pub lost_bets: usize,
    pub total_wagered: f64,
    pub total_winnings: f64,
    pub total_losses: f64,
    pub net_profit: f64,
    /// Won over resolved, 0 when nothing resolved
    pub win_rate: f64,
    pub biggest_payout: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BettingLedger {
    balance: f64,
    /// At most one per contestant
    active: Vec<Bet>,
    /// Append-only; every bet ever placed and not cancelled
    history: Vec<Bet>,
    total_winnings: f64,
    total_losses: f64,
    next_id: BetId,
    settled: bool,
}

impl Default for BettingLedger {
    fn default() -> Self {
        Self::new(STARTING_BALANCE)
    }
}

impl BettingLedger {
    pub fn new(starting_balance: f64) -> Self {
        Self {
            balance: starting_balance,
            active: Vec::new(),
            history: Vec::new(),
            total_winnings: 0.0,
            total_losses: 0.0,
            next_id: 1,
            settled: false,
        }
    }

    pub fn balance(&self) -> f64 {
        self.balance
    }

    pub fn active_bets(&self) -> &[Bet] {
        &self.active
    }

    pub fn history(&self) -> &[Bet] {
        &self.history
    }

    pub fn is_settled(&self) -> bool {
        self.settled
    }

    pub fn total_winnings(&self) -> f64 {
        self.total_winnings
    }

    pub fn total_losses(&self) -> f64 {
        self.total_losses
    }

    pub fn active_bet_on(&self, contestant_id: ContestantId) -> Option<&Bet> {
        self.active.iter().find(|b| b.contestant_id == contestant_id)
    }

    /// Place a bet. On any error the ledger is unchanged.
    pub fn place_bet(
        &mut self,
        contestant_id: ContestantId,
        amount: f64,
        odds: f64,
    ) -> Result<Bet, BetError> {
        if self.settled {
            return Err(BetError::LedgerSettled);
        }
        if !(amount > 0.0) || !amount.is_finite() {
            return Err(BetError::InvalidAmount);
        }
        if amount > self.balance {
            return Err(BetError::InsufficientBalance {
                balance: self.balance,
                amount,
            });
        }
        if !(odds > 1.0) || !odds.is_finite() {
            return Err(BetError::InvalidOdds(odds));
        }
        if self.active_bet_on(contestant_id).is_some() {
            return Err(BetError::DuplicateBet(contestant_id));
        }

        let bet = Bet {
            id: self.next_id,
            contestant_id,
            amount,
            odds,
            potential_payout: amount * odds,
            status: BetStatus::Active,
            actual_payout: None,
            split_reason: None,
        };
        self.next_id += 1;
        self.balance -= amount;
        self.active.push(bet.clone());
        self.history.push(bet.clone());

        debug!(bet = bet.id, contestant_id, amount, odds, "bet placed");
        Ok(bet)
    }

    /// Remove an active bet and refund it. Phase checks are the caller's job.
    pub fn cancel_bet(&mut self, bet_id: BetId) -> Result<Bet, BetError> {
        if self.settled {
            return Err(BetError::LedgerSettled);
        }
        let position = self
            .active
            .iter()
            .position(|b| b.id == bet_id)
            .ok_or(BetError::BetNotFound(bet_id))?;

        let bet = self.active.remove(position);
        self.history.retain(|b| b.id != bet_id);
        self.balance += bet.amount;

        debug!(bet = bet.id, refund = bet.amount, "bet cancelled");
        Ok(bet)
    }

    /// Settle every active bet against the final survivors.
    ///
    /// Winning bets pay `potential_payout / survivors.len()`. Callable once.
    pub fn resolve_against_survivors(
        &mut self,
        survivors: &[ContestantId],
    ) -> Result<Settlement, BetError> {
        if self.settled {
            return Err(BetError::LedgerSettled);
        }

        let survivor_count = survivors.len();
        let mut settlement = Settlement {
            survivor_count,
            ..Default::default()
        };

        for bet in self.active.drain(..) {
            let won = survivors.contains(&bet.contestant_id);
            let payout = if won {
                bet.potential_payout / survivor_count as f64
            } else {
                0.0
            };
            let split_reason = (won && survivor_count > 1).then(|| {
                format!(
                    "payout split evenly among {} simultaneous survivors",
                    survivor_count
                )
            });

            if let Some(entry) = self.history.iter_mut().find(|b| b.id == bet.id) {
                entry.status = if won { BetStatus::Won } else { BetStatus::Lost };
                entry.actual_payout = Some(payout);
                entry.split_reason = split_reason;
            }

            if won {
                self.total_winnings += payout;
                settlement.total_payout += payout;
                settlement.won.push(bet.id);
            } else {
                self.total_losses += bet.amount;
                settlement.lost.push(bet.id);
            }
        }

        self.balance += settlement.total_payout;
        self.settled = true;

        debug!(
            survivors = survivor_count,
            payout = settlement.total_payout,
            won = settlement.won.len(),
            lost = settlement.lost.len(),
            "bets settled"
        );
        Ok(settlement)
    }

    pub fn stats(&self) -> BettingStats {
        let won_bets = self
            .history
            .iter()
            .filter(|b| b.status == BetStatus::Won)
            .count();
        let lost_bets = self
            .history
            .iter()
            .filter(|b| b.status == BetStatus::Lost)
            .count();
        let resolved = won_bets + lost_bets;
        let total_wagered = self.history.iter().map(|b| b.amount).sum();
        let biggest_payout = self
            .history
            .iter()
            .filter_map(|b| b.actual_payout)
            .fold(0.0, f64::max);
        let net_profit = self.total_winnings
            - self
                .history
                .iter()
                .filter(|b| b.status == BetStatus::Won)
                .map(|b| b.amount)
                .sum::<f64>()
            - self.total_losses;

        BettingStats {
            total_bets: self.history.len(),
            active_bets: self.active.len(),
            won_bets,
            lost_bets,
            total_wagered,
            total_winnings: self.total_winnings,
            total_losses: self.total_losses,
            net_profit,
            win_rate: if resolved == 0 {
                0.0
            } else {
                won_bets as f64 / resolved as f64
            },
            biggest_payout,
        }
    }
}

/// Recompute odds for every contestant after a round.
///
/// Alive contestants get
/// `clamp(1.1, 50, 12 - avg_stat - survival_bonus - progression_bonus + late_game)`
/// rounded to one decimal; everyone else is forced to 0.
pub fn recompute_odds(contestants: &mut [Contestant], round_index: usize, total_rounds: usize) {
    let alive = contestants.iter().filter(|c| c.is_alive()).count();
    let survival_bonus = 0.5 * (10.0 - alive as f64);
    let progression_bonus = if total_rounds == 0 {
        0.0
    } else {
        2.0 * (round_index as f64 / total_rounds as f64)
    };
    let past_midpoint = total_rounds > 0 && round_index * 2 > total_rounds;

    for contestant in contestants.iter_mut() {
        if !contestant.is_alive() {
            contestant.current_odds = 0.0;
            continue;
        }
        let late_game = if past_midpoint {
            late_game_modifier(contestant)
        } else {
            0.0
        };
        let raw = 12.0 - contestant.stats.average() - survival_bonus - progression_bonus + late_game;
        contestant.current_odds = round_tenth(raw.clamp(MIN_ODDS, MAX_ODDS));
    }
}

/// Planners get shorter odds late in the game, hotheads get longer ones
fn late_game_modifier(contestant: &Contestant) -> f64 {
    use crate::contestant::Personality::*;
    match contestant.personality {
        Strategic | Analytical | Cautious => -1.0,
        Impulsive | Desperate | Aggressive => 1.0,
        _ => 0.0,
    }
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
