//! Events emitted for indexers

use anchor_lang::prelude::*;

use crate::state::GameEndStats;

#[event]
pub struct GameOpened {
    pub game_id: u64,
    pub opened_at: i64,
}

#[event]
pub struct NarrativeRecorded {
    pub game_id: u64,
    pub round_number: u32,
    pub line_count: u8,
    pub digest: [u8; 32],
}

#[event]
pub struct BetRecorded {
    pub game_id: u64,
    pub index: u32,
    pub contestant_id: u32,
    pub amount: u64,
    pub odds_tenths: u16,
}

#[event]
pub struct GameEnded {
    pub game_id: u64,
    pub winner_id: Option<u32>,
    pub stats: GameEndStats,
    pub narrative_digest: [u8; 32],
}
