//! Game lifecycle instructions

use anchor_lang::prelude::*;
use crate::state::{GameEndStats, GameRecord, GameStatus, Registry};
use crate::error::LedgerError;
use crate::events::{GameEnded, GameOpened};

/// Open the next game record
#[derive(Accounts)]
pub struct OpenGame<'info> {
    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump,
        has_one = operator @ LedgerError::Unauthorized
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        init,
        payer = operator,
        space = GameRecord::LEN,
        seeds = [b"game", registry.game_count.to_le_bytes().as_ref()],
        bump
    )]
    pub game: Account<'info, GameRecord>,

    #[account(mut)]
    pub operator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn open_game(ctx: Context<OpenGame>) -> Result<()> {
    let registry = &mut ctx.accounts.registry;
    let game = &mut ctx.accounts.game;
    let clock = Clock::get()?;

    game.id = registry.game_count;
    game.status = GameStatus::Open;
    game.rounds_recorded = 0;
    game.last_round = 0;
    game.narrative_digest = [0u8; 32];
    game.bet_count = 0;
    game.total_wagered = 0;
    game.winner_id = None;
    game.stats = GameEndStats::default();
    game.opened_at = clock.unix_timestamp;
    game.ended_at = 0;
    game.bump = ctx.bumps.game;

    registry.game_count = registry.game_count
        .checked_add(1)
        .ok_or(LedgerError::Overflow)?;

    emit!(GameOpened {
        game_id: game.id,
        opened_at: game.opened_at,
    });
    msg!("Game {} opened", game.id);
    Ok(())
}

/// Close a game with its outcome. Once only.
#[derive(Accounts)]
pub struct RecordGameEnd<'info> {
    #[account(
        seeds = [b"registry"],
        bump = registry.bump,
        has_one = operator @ LedgerError::Unauthorized
    )]
    pub registry: Account<'info, Registry>,

    #[account(
        mut,
        seeds = [b"game", game.id.to_le_bytes().as_ref()],
        bump = game.bump
    )]
    pub game: Account<'info, GameRecord>,

    pub operator: Signer<'info>,
}

pub fn record_game_end(
    ctx: Context<RecordGameEnd>,
    winner_id: Option<u32>,
    stats: GameEndStats,
) -> Result<()> {
    let game = &mut ctx.accounts.game;
    let clock = Clock::get()?;

    require!(game.is_open(), LedgerError::GameFinished);

    game.status = GameStatus::Finished;
    game.winner_id = winner_id;
    game.stats = stats;
    game.ended_at = clock.unix_timestamp;

    emit!(GameEnded {
        game_id: game.id,
        winner_id,
        stats,
        narrative_digest: game.narrative_digest,
    });
    msg!(
        "Game {} ended after {} rounds, winner = {:?}",
        game.id,
        game.rounds_recorded,
        winner_id
    );
    Ok(())
}
