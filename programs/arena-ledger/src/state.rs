//! Account state definitions

use anchor_lang::prelude::*;

use crate::error::LedgerError;

/// Most narrative lines accepted per round
pub const MAX_NARRATIVE_LINES: usize = 16;

/// Longest narrative line, in bytes
pub const MAX_LINE_BYTES: usize = 280;

/// Odds are stored in tenths; anything at or below 1.0x pays nothing back
pub const MIN_ODDS_TENTHS_EXCLUSIVE: u16 = 10;

/// Global registry of mirrored games
#[account]
#[derive(Default)]
pub struct Registry {
    /// Admin who can rotate the operator
    pub admin: Pubkey,
    /// Relayer key that writes game records
    pub operator: Pubkey,
    /// Games opened so far; the next game's id
    pub game_count: u64,
    /// PDA bump seed
    pub bump: u8,
}

impl Registry {
    pub const LEN: usize = 8 + // discriminator
        32 +  // admin
        32 +  // operator
        8 +   // game_count
        1 +   // bump
        16;   // padding
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum GameStatus {
    #[default]
    Open,
    Finished,
}

/// Betting totals reported at game end
#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct GameEndStats {
    pub total_bets: u32,
    pub won_bets: u32,
    pub lost_bets: u32,
    pub total_wagered: u64,
    pub total_payout: u64,
    pub net_profit: i64,
}

impl GameEndStats {
    pub const LEN: usize = 4 + 4 + 4 + 8 + 8 + 8;
}

/// One mirrored game
#[account]
#[derive(Default)]
pub struct GameRecord {
    pub id: u64,
    pub status: GameStatus,
    /// Narrative entries recorded
    pub rounds_recorded: u32,
    /// Highest round number recorded, 0 before the first
    pub last_round: u32,
    /// sha256 chain over every recorded round
    pub narrative_digest: [u8; 32],
    /// Bet records created; the next bet's index
    pub bet_count: u32,
    pub total_wagered: u64,
    /// Set at game end; none when the game ended in a tie
    pub winner_id: Option<u32>,
    pub stats: GameEndStats,
    pub opened_at: i64,
    pub ended_at: i64,
    /// PDA bump seed
    pub bump: u8,
}

impl GameRecord {
    pub const LEN: usize = 8 + // discriminator
        8 +   // id
        1 +   // status
        4 +   // rounds_recorded
        4 +   // last_round
        32 +  // narrative_digest
        4 +   // bet_count
        8 +   // total_wagered
        5 +   // winner_id
        GameEndStats::LEN +
        8 +   // opened_at
        8 +   // ended_at
        1 +   // bump
        16;   // padding

    pub fn is_open(&self) -> bool {
        self.status == GameStatus::Open
    }
}

/// A bet placed against a game
#[account]
#[derive(Default)]
pub struct BetRecord {
    /// Parent game
    pub game: Pubkey,
    /// Position in the game's bet sequence
    pub index: u32,
    pub contestant_id: u32,
    /// Smallest currency unit
    pub amount: u64,
    /// Decimal odds times ten
    pub odds_tenths: u16,
    pub placed_at: i64,
    /// PDA bump seed
    pub bump: u8,
}

impl BetRecord {
    pub const LEN: usize = 8 + // discriminator
        32 +  // game
        4 +   // index
        4 +   // contestant_id
        8 +   // amount
        2 +   // odds_tenths
        8 +   // placed_at
        1 +   // bump
        8;    // padding
}

/// Reject oversized narrative payloads
pub fn validate_lines(lines: &[String]) -> std::result::Result<(), LedgerError> {
    if lines.len() > MAX_NARRATIVE_LINES {
        return Err(LedgerError::TooManyLines);
    }
    if lines.iter().any(|line| line.len() > MAX_LINE_BYTES) {
        return Err(LedgerError::LineTooLong);
    }
    Ok(())
}

/// Fold one round into the narrative chain:
/// `sha256(prev || round_le || (len_le || line)*)`
pub fn chain_digest(prev: &[u8; 32], round_number: u32, lines: &[String]) -> [u8; 32] {
    let body: usize = lines.iter().map(|l| 2 + l.len()).sum();
    let mut preimage = Vec::with_capacity(36 + body);
    preimage.extend_from_slice(prev);
    preimage.extend_from_slice(&round_number.to_le_bytes());
    for line in lines {
        preimage.extend_from_slice(&(line.len() as u16).to_le_bytes());
        preimage.extend_from_slice(line.as_bytes());
    }
    solana_sha256_hasher::hash(&preimage).to_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_validate_lines_limits() {
        assert!(validate_lines(&[]).is_ok());
        assert!(validate_lines(&lines(&["a"; MAX_NARRATIVE_LINES])).is_ok());
        assert!(matches!(
            validate_lines(&lines(&["a"; MAX_NARRATIVE_LINES + 1])),
            Err(LedgerError::TooManyLines)
        ));
        assert!(validate_lines(&["x".repeat(MAX_LINE_BYTES)]).is_ok());
        assert!(matches!(
            validate_lines(&["x".repeat(MAX_LINE_BYTES + 1)]),
            Err(LedgerError::LineTooLong)
        ));
    }

    #[test]
    fn test_chain_digest_depends_on_everything() {
        let zero = [0u8; 32];
        let base = chain_digest(&zero, 1, &lines(&["a", "b"]));

        assert_eq!(base, chain_digest(&zero, 1, &lines(&["a", "b"])));
        assert_ne!(base, chain_digest(&zero, 2, &lines(&["a", "b"])));
        assert_ne!(base, chain_digest(&[1u8; 32], 1, &lines(&["a", "b"])));
        assert_ne!(base, chain_digest(&zero, 1, &lines(&["b", "a"])));
        // Length prefixes keep line boundaries unambiguous
        assert_ne!(base, chain_digest(&zero, 1, &lines(&["ab"])));
    }

    #[test]
    fn test_chain_links_rounds() {
        let first = chain_digest(&[0u8; 32], 1, &lines(&["one"]));
        let second = chain_digest(&first, 2, &lines(&["two"]));
        let skipped = chain_digest(&[0u8; 32], 2, &lines(&["two"]));
        assert_ne!(second, skipped);
    }
}
