//! WASM bindings for the browser UI

#![cfg(feature = "wasm")]

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::{
    CommandError, CommandReceipt, GameConfig, Narration, Orchestrator, RoundCatalog,
    STARTING_BALANCE,
};

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsError> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsError::new(&format!("Serialization error: {}", e)))
}

fn receipt<T: Serialize>(result: Result<T, CommandError>, message: impl FnOnce(&T) -> String) -> JsValue {
    send(&CommandReceipt::from_result(result, message))
}

fn send<T: Serialize>(receipt: &CommandReceipt<T>) -> JsValue {
    serde_wasm_bindgen::to_value(receipt).unwrap_or(JsValue::NULL)
}

/// One game session driven from the browser
#[wasm_bindgen]
pub struct WasmGame {
    inner: Orchestrator,
}

#[wasm_bindgen]
impl WasmGame {
    /// # Arguments
    /// * `seed` - 32-byte game seed
    /// * `contestant_count` - Roster size, at least 2
    /// * `starting_balance` - Optional; defaults to 1000
    #[wasm_bindgen(constructor)]
    pub fn new(
        seed: &[u8],
        contestant_count: u32,
        starting_balance: Option<f64>,
    ) -> Result<WasmGame, JsError> {
        let seed: [u8; 32] = seed
            .try_into()
            .map_err(|_| JsError::new("Seed must be exactly 32 bytes"))?;
        let config = GameConfig {
            starting_balance: starting_balance.unwrap_or(STARTING_BALANCE),
            contestant_count: contestant_count as usize,
            catalog: RoundCatalog::standard(),
        };
        Ok(WasmGame {
            inner: Orchestrator::new(config, seed),
        })
    }

    pub fn initialize(&mut self) -> JsValue {
        receipt(self.inner.initialize().map(|s| s.contestants.len()), |n| {
            format!("{} contestants enter the arena", n)
        })
    }

    #[wasm_bindgen(js_name = startGame)]
    pub fn start_game(&mut self) -> JsValue {
        receipt(self.inner.start_game(), |_| "Betting is open".to_string())
    }

    #[wasm_bindgen(js_name = placeBet)]
    pub fn place_bet(&mut self, contestant_id: u32, amount: f64) -> JsValue {
        receipt(self.inner.place_bet(contestant_id, amount), |bet| {
            format!("Bet {} placed at {:.1}x", bet.id, bet.odds)
        })
    }

    #[wasm_bindgen(js_name = cancelBet)]
    pub fn cancel_bet(&mut self, bet_id: u32) -> JsValue {
        receipt(self.inner.cancel_bet(bet_id), |bet| {
            format!("Bet {} cancelled, {:.2} refunded", bet.id, bet.amount)
        })
    }

    #[wasm_bindgen(js_name = startSimulation)]
    pub fn start_simulation(&mut self) -> JsValue {
        receipt(self.inner.start_simulation(), |_| "The games begin".to_string())
    }

    /// Stage the next round; `data` is its narration request
    #[wasm_bindgen(js_name = computeNextRound)]
    pub fn compute_next_round(&mut self) -> JsValue {
        let now_ms = js_sys::Date::now() as i64;
        let staged = self
            .inner
            .compute_next_round(now_ms)
            .map(|round| round.narration_request.clone());
        receipt(staged, |request| format!("Round {} is ready", request.round_number))
    }

    /// Attach narrator output (a `Narration` object) to the staged round
    #[wasm_bindgen(js_name = attachNarration)]
    pub fn attach_narration(&mut self, narration: JsValue) -> JsValue {
        let narration: Narration = match serde_wasm_bindgen::from_value(narration) {
            Ok(narration) => narration,
            Err(e) => return send(&CommandReceipt::<()>::rejected(format!("Invalid narration: {}", e))),
        };
        receipt(self.inner.attach_narration(narration), |_| "Narration attached".to_string())
    }

    /// `data` is the round report, including the game summary on the last round
    #[wasm_bindgen(js_name = revealRound)]
    pub fn reveal_round(&mut self) -> JsValue {
        receipt(self.inner.reveal_round(), |report| {
            format!(
                "Round {}: {} eliminated",
                report.round_number,
                report.outcome.eliminated.len()
            )
        })
    }

    #[wasm_bindgen(js_name = showResults)]
    pub fn show_results(&mut self) -> JsValue {
        receipt(self.inner.show_results(), |summary| match summary.winner {
            Some(id) => format!("Contestant {} wins", id),
            None => format!("{} survivors share the win", summary.survivors.len()),
        })
    }

    pub fn reset(&mut self) {
        self.inner.reset();
    }

    pub fn snapshot(&self) -> Result<JsValue, JsError> {
        to_js(&self.inner.snapshot())
    }
}
