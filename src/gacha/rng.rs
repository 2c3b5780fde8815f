//! Seedable uniform random source for draws. SplitMix64: fast, good statistical quality,
//! deterministic for a given seed. Not cryptographically secure.
//!
//! Every draw and simulation takes `&mut impl UniformSource`, so each caller owns its
//! generator and concurrent simulations never share RNG state.

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// 2^-53: scales the top 53 bits of a u64 into [0, 1).
const F64_UNIT: f64 = 1.0 / (1u64 << 53) as f64;

/// Source of uniform samples in [0, 1).
pub trait UniformSource {
    fn next_f64(&mut self) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seed from OS entropy. Returns the seed alongside the generator so the run can be replayed.
    pub fn from_entropy() -> (Self, u64) {
        let seed = entropy_seed();
        (Self::new(seed), seed)
    }

    /// Use `seed` when given, otherwise draw one from OS entropy.
    pub fn seeded_or_entropy(seed: Option<u64>) -> (Self, u64) {
        match seed {
            Some(seed) => (Self::new(seed), seed),
            None => Self::from_entropy(),
        }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }
}

impl UniformSource for Rng {
    #[inline]
    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * F64_UNIT
    }
}

fn entropy_seed() -> u64 {
    let mut buf = [0_u8; 8];
    match getrandom::getrandom(&mut buf) {
        Ok(()) => u64::from_le_bytes(buf),
        Err(err) => {
            log::warn!("OS entropy unavailable ({err}); seeding from the system clock");
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|elapsed| elapsed.as_nanos() as u64)
                .unwrap_or(SPLITMIX64_GOLDEN)
        }
    }
}

/// Replays a fixed sequence of samples, cycling when exhausted. Lets tests pin the exact
/// roll a draw sees.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ScriptedSource {
    samples: Vec<f64>,
    cursor: usize,
}

#[cfg(test)]
impl ScriptedSource {
    pub(crate) fn new(samples: Vec<f64>) -> Self {
        Self { samples, cursor: 0 }
    }
}

#[cfg(test)]
impl UniformSource for ScriptedSource {
    fn next_f64(&mut self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sample = self.samples[self.cursor % self.samples.len()];
        self.cursor += 1;
        sample
    }
}
