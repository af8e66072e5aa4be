//! Per-round and per-bet records

use anchor_lang::prelude::*;
use crate::state::{
    chain_digest, validate_lines, BetRecord, GameRecord, Registry, MIN_ODDS_TENTHS_EXCLUSIVE,
};
use crate::error::LedgerError;
use crate::events::{BetRecorded, NarrativeRecorded};

/// Fold a round's narrative into the game's digest
#[derive(Accounts)]
pub struct RecordNarrative<'info> {
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

pub fn record_narrative(
    ctx: Context<RecordNarrative>,
    round_number: u32,
    lines: Vec<String>,
) -> Result<()> {
    let game = &mut ctx.accounts.game;

    require!(game.is_open(), LedgerError::GameFinished);
    require!(round_number > game.last_round, LedgerError::RoundOutOfOrder);
    validate_lines(&lines)?;

    game.narrative_digest = chain_digest(&game.narrative_digest, round_number, &lines);
    game.last_round = round_number;
    game.rounds_recorded = game.rounds_recorded
        .checked_add(1)
        .ok_or(LedgerError::Overflow)?;

    emit!(NarrativeRecorded {
        game_id: game.id,
        round_number,
        line_count: lines.len() as u8,
        digest: game.narrative_digest,
    });
    msg!("Game {} round {} recorded ({} lines)", game.id, round_number, lines.len());
    Ok(())
}

/// Record a placed bet as its own account
#[derive(Accounts)]
pub struct RecordBet<'info> {
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

    #[account(
        init,
        payer = operator,
        space = BetRecord::LEN,
        seeds = [b"bet", game.key().as_ref(), game.bet_count.to_le_bytes().as_ref()],
        bump
    )]
    pub bet: Account<'info, BetRecord>,

    #[account(mut)]
    pub operator: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn record_bet(
    ctx: Context<RecordBet>,
    contestant_id: u32,
    amount: u64,
    odds_tenths: u16,
) -> Result<()> {
    let game_key = ctx.accounts.game.key();
    let game = &mut ctx.accounts.game;
    let bet = &mut ctx.accounts.bet;
    let clock = Clock::get()?;

    require!(game.is_open(), LedgerError::GameFinished);
    require!(amount > 0, LedgerError::InvalidAmount);
    require!(odds_tenths > MIN_ODDS_TENTHS_EXCLUSIVE, LedgerError::InvalidOdds);

    bet.game = game_key;
    bet.index = game.bet_count;
    bet.contestant_id = contestant_id;
    bet.amount = amount;
    bet.odds_tenths = odds_tenths;
    bet.placed_at = clock.unix_timestamp;
    bet.bump = ctx.bumps.bet;

    game.bet_count = game.bet_count
        .checked_add(1)
        .ok_or(LedgerError::Overflow)?;
    game.total_wagered = game.total_wagered
        .checked_add(amount)
        .ok_or(LedgerError::Overflow)?;

    emit!(BetRecorded {
        game_id: game.id,
        index: bet.index,
        contestant_id,
        amount,
        odds_tenths,
    });
    msg!(
        "Game {} bet #{}: {} on contestant {} at {}.{}x",
        game.id,
        bet.index,
        amount,
        contestant_id,
        odds_tenths / 10,
        odds_tenths % 10
    );
    Ok(())
}
