//! Seeded pseudo-random number generator
//!
//! Every random draw in a game (roster, shuffles, random factors, risk
//! rolls) goes through this generator, so a seed replays a whole game.
//! Uses the xorshift64* algorithm.

/// Round stream reserved for roster generation.
pub const ROSTER_STREAM: u32 = u32::MAX;

/// Seeded random number generator
///
/// Deterministic: same seed + stream = same sequence
#[derive(Clone, Debug)]
pub struct SeededRng {
    state: u64,
}

impl SeededRng {
    /// Create a new RNG from a 32-byte seed and a stream index
    pub fn new(seed: &[u8; 32], stream: u32) -> Self {
        let mut state = 0u64;
        for (i, chunk) in seed.chunks(8).enumerate() {
            let mut bytes = [0u8; 8];
            bytes[..chunk.len()].copy_from_slice(chunk);
            state ^= u64::from_le_bytes(bytes).wrapping_add(i as u64);
        }

        state ^= (stream as u64).wrapping_mul(0x517cc1b727220a95);

        // xorshift never leaves the all-zero state
        if state == 0 {
            state = 0x9e3779b97f4a7c15;
        }

        let mut rng = Self { state };
        for _ in 0..8 {
            rng.next_u64();
        }

        rng
    }

    /// Convenience constructor from a single integer (tests, CLI seeds)
    pub fn from_u64(seed: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&seed.to_le_bytes());
        Self::new(&bytes, 0)
    }

    /// Derive an independent stream for one round of a game
    pub fn for_round(&self, round: u32) -> Self {
        let mut new_state = self.state;
        new_state ^= (round as u64 + 1).wrapping_mul(0x9e3779b97f4a7c15);
        if new_state == 0 {
            new_state = 0x2545f4914f6cdd1d;
        }

        let mut rng = Self { state: new_state };
        rng.next_u64();
        rng
    }

    /// Generate next u64
    pub fn next_u64(&mut self) -> u64 {
        self.state ^= self.state >> 12;
        self.state ^= self.state << 25;
        self.state ^= self.state >> 27;
        self.state.wrapping_mul(0x2545f4914f6cdd1d)
    }

    /// Generate next u32
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform float in [0, 1)
    pub fn next_f64(&mut self) -> f64 {
        // 53 high bits fill the mantissa exactly
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a value in range [0, max)
    pub fn next_range(&mut self, max: u32) -> u32 {
        if max == 0 {
            return 0;
        }
        self.next_u32() % max
    }

    /// Inclusive integer range, used for stat rolls
    pub fn next_between(&mut self, low: u8, high: u8) -> u8 {
        debug_assert!(low <= high);
        low + self.next_range((high - low) as u32 + 1) as u8
    }

    /// Fisher-Yates shuffle in place
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_range(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}
