//! Arena Ledger - on-chain record of Elimination Arena games
//!
//! The off-chain simulation is authoritative. This program only keeps a
//! tamper-evident trail of what it reported: a sha256 chain over every
//! round's narrative, one account per placed bet, and the final outcome.

use anchor_lang::prelude::*;

mod state;
mod instructions;
mod error;
mod events;

use instructions::*;
pub use state::GameEndStats;

#[cfg(not(feature = "no-entrypoint"))]
solana_security_txt::security_txt! {
    name: "Arena Ledger",
    project_url: "https://github.com/elimination-arena/arena",
    contacts: "email:security@elimination-arena.dev",
    policy: "https://github.com/elimination-arena/arena/blob/main/SECURITY.md"
}

declare_id!("4rEnAdgR1e7kZ5PqL2mVbXw9sNfYhCj3TuG8oQa6DxKp");

#[program]
pub mod arena_ledger {
    use super::*;

    /// Create the registry (one-time setup)
    pub fn initialize_registry(ctx: Context<InitializeRegistry>, operator: Pubkey) -> Result<()> {
        instructions::registry::initialize_registry(ctx, operator)
    }

    /// Rotate the operator key (admin only)
    pub fn set_operator(ctx: Context<SetOperator>, operator: Pubkey) -> Result<()> {
        instructions::registry::set_operator(ctx, operator)
    }

    /// Open the next game record (operator only)
    pub fn open_game(ctx: Context<OpenGame>) -> Result<()> {
        instructions::game::open_game(ctx)
    }

    /// Record one round's narrative lines
    pub fn record_narrative(
        ctx: Context<RecordNarrative>,
        round_number: u32,
        lines: Vec<String>,
    ) -> Result<()> {
        instructions::records::record_narrative(ctx, round_number, lines)
    }

    /// Record a placed bet
    pub fn record_bet(
        ctx: Context<RecordBet>,
        contestant_id: u32,
        amount: u64,
        odds_tenths: u16,
    ) -> Result<()> {
        instructions::records::record_bet(ctx, contestant_id, amount, odds_tenths)
    }

    /// Record the outcome and close the game
    pub fn record_game_end(
        ctx: Context<RecordGameEnd>,
        winner_id: Option<u32>,
        stats: GameEndStats,
    ) -> Result<()> {
        instructions::game::record_game_end(ctx, winner_id, stats)
    }
}
