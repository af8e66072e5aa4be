//! Registry instructions

use anchor_lang::prelude::*;
use crate::state::Registry;
use crate::error::LedgerError;

/// Create the registry (one-time setup)
#[derive(Accounts)]
pub struct InitializeRegistry<'info> {
    #[account(
        init,
        payer = admin,
        space = Registry::LEN,
        seeds = [b"registry"],
        bump
    )]
    pub registry: Account<'info, Registry>,

    #[account(mut)]
    pub admin: Signer<'info>,

    pub system_program: Program<'info, System>,
}

pub fn initialize_registry(ctx: Context<InitializeRegistry>, operator: Pubkey) -> Result<()> {
    let registry = &mut ctx.accounts.registry;

    registry.admin = ctx.accounts.admin.key();
    registry.operator = operator;
    registry.game_count = 0;
    registry.bump = ctx.bumps.registry;

    msg!("Registry initialized by {}, operator = {}", registry.admin, registry.operator);
    Ok(())
}

/// Rotate the relayer key
#[derive(Accounts)]
pub struct SetOperator<'info> {
    #[account(
        mut,
        seeds = [b"registry"],
        bump = registry.bump,
        has_one = admin @ LedgerError::Unauthorized
    )]
    pub registry: Account<'info, Registry>,

    pub admin: Signer<'info>,
}

pub fn set_operator(ctx: Context<SetOperator>, operator: Pubkey) -> Result<()> {
    ctx.accounts.registry.operator = operator;
    msg!("Operator set to {}", operator);
    Ok(())
}
