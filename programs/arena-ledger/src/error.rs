//! Custom error codes

use anchor_lang::prelude::*;

#[error_code]
pub enum LedgerError {
    #[msg("Not authorized to perform this action")]
    Unauthorized = 6000,

    #[msg("Game has already finished")]
    GameFinished = 6001,

    #[msg("Round numbers must strictly increase")]
    RoundOutOfOrder = 6002,

    #[msg("Too many narrative lines for one round")]
    TooManyLines = 6003,

    #[msg("Narrative line exceeds the byte limit")]
    LineTooLong = 6004,

    #[msg("Bet amount must be positive")]
    InvalidAmount = 6005,

    #[msg("Odds must be greater than 1.0")]
    InvalidOdds = 6006,

    #[msg("Arithmetic overflow")]
    Overflow = 6007,
}
