/// Deterministic PRNG with 256-bit state (32 bytes), carried inside every
/// snapshot so replays and concurrent validators draw identical cards.
///
/// This is `xoshiro256**` seeded via SplitMix64.
#[derive(Clone, Copy, Debug)]
pub struct GameRng {
    state: [u64; 4],
}

impl GameRng {
    pub fn seed_from_u64(seed: u64) -> Self {
        let mut sm = SplitMix64 { state: seed };
        Self {
            state: [sm.next(), sm.next(), sm.next(), sm.next()],
        }
    }

    pub fn state_bytes(&self) -> [u8; 32] {
        let mut out = [0_u8; 32];
        for (i, word) in self.state.iter().enumerate() {
            out[i * 8..(i + 1) * 8].copy_from_slice(&word.to_le_bytes());
        }
        out
    }

    pub fn from_state_bytes(bytes: [u8; 32]) -> Self {
        let mut state = [0_u64; 4];
        for (i, word) in state.iter_mut().enumerate() {
            let mut w = [0_u8; 8];
            w.copy_from_slice(&bytes[i * 8..(i + 1) * 8]);
            *word = u64::from_le_bytes(w);
        }
        Self { state }
    }

    pub fn next_u64(&mut self) -> u64 {
        // xoshiro256**
        let result = self.state[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        let t = self.state[1] << 17;

        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];

        self.state[2] ^= t;

        self.state[3] = self.state[3].rotate_left(45);

        result
    }

    /// Uniform draw in `0..bound` without modulo bias. `bound` must be > 0.
    pub fn next_below(&mut self, bound: usize) -> usize {
        let span = bound as u64;
        debug_assert!(span > 0, "empty range");
        let threshold = u64::MAX - (u64::MAX % span);
        loop {
            let x = self.next_u64();
            if x < threshold {
                return (x % span) as usize;
            }
        }
    }

    /// Fisher-Yates shuffle, used for the deck and corporation deal.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next_below(i + 1);
            items.swap(i, j);
        }
    }
}

struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    fn next(&mut self) -> u64 {
        let mut z = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        self.state = z;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_bytes_roundtrip() {
        let mut rng = GameRng::seed_from_u64(42);
        rng.next_u64();
        let bytes = rng.state_bytes();
        let mut restored = GameRng::from_state_bytes(bytes);
        assert_eq!(restored.next_u64(), rng.next_u64());
    }

    #[test]
    fn shuffle_is_deterministic_per_seed() {
        let mut a: Vec<u32> = (0..20).collect();
        let mut b: Vec<u32> = (0..20).collect();
        GameRng::seed_from_u64(7).shuffle(&mut a);
        GameRng::seed_from_u64(7).shuffle(&mut b);
        assert_eq!(a, b);

        let mut c: Vec<u32> = (0..20).collect();
        GameRng::seed_from_u64(8).shuffle(&mut c);
        assert_ne!(a, c);
    }

    #[test]
    fn next_below_stays_in_bounds() {
        let mut rng = GameRng::seed_from_u64(1);
        for _ in 0..1000 {
            assert!(rng.next_below(7) < 7);
        }
    }
}
