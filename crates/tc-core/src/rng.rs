//! Seeded RNG for best-effort helpers (random routes, random colours).
//!
//! Every random decision in the control layer goes through one `SimRng`
//! seeded from `ControlConfig::seed`, so two runs against the same engine
//! state make the same choices.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub struct SimRng(SmallRng);

impl SimRng {
    pub fn new(seed: u64) -> Self {
        SimRng(SmallRng::seed_from_u64(seed))
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.0.gen_range(range)
    }

    /// Choose a random element from a slice.  `None` if the slice is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.0)
    }

    /// A random `u64`, used for generated vehicle id suffixes.
    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.0.r#gen()
    }
}
