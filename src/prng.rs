/// Deterministic generator for payload placement
///
/// A self-contained 32-bit Mersenne Twister (MT19937) plus a fixed Fisher-Yates
/// variant. Encoder and decoder must produce bit-identical permutations from the
/// same seed, so nothing here touches `rand` or any platform generator.
///
/// **Sampling contract** (`uniform_inclusive(upper)`):
/// `range = upper + 1`, `scaling = 0xFFFF_FFFF / range`, `past = range * scaling`;
/// draw `r` until `r < past`, return `r / scaling`. All arithmetic is `u32`.
///
/// **Shuffle contract**: for `i` from `n - 1` down to `1`, swap `i` with
/// `uniform_inclusive(i)`.

const N: usize = 624;
const M: usize = 397;
const MATRIX_A: u32 = 0x9908_b0df;
const UPPER_MASK: u32 = 0x8000_0000;
const LOWER_MASK: u32 = 0x7fff_ffff;

/// MT19937 seeded with the reference `init_genrand` routine
pub struct Mt19937 {
    state: [u32; N],
    index: usize,
}

impl Mt19937 {
    pub fn new(seed: u32) -> Self {
        let mut state = [0u32; N];
        state[0] = seed;
        for i in 1..N {
            let prev = state[i - 1];
            state[i] = 1_812_433_253u32
                .wrapping_mul(prev ^ (prev >> 30))
                .wrapping_add(i as u32);
        }
        Self { state, index: N }
    }

    fn twist(&mut self) {
        for i in 0..N {
            let y = (self.state[i] & UPPER_MASK) | (self.state[(i + 1) % N] & LOWER_MASK);
            let mut next = self.state[(i + M) % N] ^ (y >> 1);
            if y & 1 != 0 {
                next ^= MATRIX_A;
            }
            self.state[i] = next;
        }
        self.index = 0;
    }

    /// Next tempered 32-bit output
    pub fn next_u32(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }
        let mut y = self.state[self.index];
        self.index += 1;

        y ^= y >> 11;
        y ^= (y << 7) & 0x9d2c_5680;
        y ^= (y << 15) & 0xefc6_0000;
        y ^= y >> 18;
        y
    }

    /// Uniform value in `[0, upper]` by rejection downscaling
    pub fn uniform_inclusive(&mut self, upper: u32) -> u32 {
        if upper == u32::MAX {
            return self.next_u32();
        }
        let range = upper + 1;
        let scaling = u32::MAX / range;
        let past = range * scaling;
        loop {
            let r = self.next_u32();
            if r < past {
                return r / scaling;
            }
        }
    }
}

/// Fisher-Yates shuffle driven by [`Mt19937`] seeded with `seed`.
///
/// Slices longer than `u32::MAX + 1` are not supported; the carrier config
/// rejects layouts that large.
pub fn shuffle<T>(items: &mut [T], seed: u32) {
    let mut rng = Mt19937::new(seed);
    for i in (1..items.len()).rev() {
        let j = rng.uniform_inclusive(i as u32) as usize;
        items.swap(i, j);
    }
}
