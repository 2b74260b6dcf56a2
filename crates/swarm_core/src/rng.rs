//! Seeded random source for procedural generation and ship AI.
//!
//! Every random decision in the simulation (planet layout, target
//! acquisition rolls, spawn jitter) draws from one [`SimRng`] owned by the
//! simulation, so a seed fully determines a run on a given platform.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::math::Vec2;

/// Deterministic random number generator.
#[derive(Debug, Clone)]
pub struct SimRng {
    inner: ChaCha8Rng,
}

impl SimRng {
    /// Create a generator from a seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Uniform float in `[0, 1)`.
    pub fn unit(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Returns `true` with probability `p`.
    pub fn chance(&mut self, p: f32) -> bool {
        self.unit() < p
    }

    /// Uniform float in `[lo, hi)`. Returns `lo` for an empty range.
    pub fn range(&mut self, lo: f32, hi: f32) -> f32 {
        if hi <= lo {
            return lo;
        }
        self.inner.gen_range(lo..hi)
    }

    /// Uniform angle in `[0, 2π)`.
    pub fn angle(&mut self) -> f32 {
        self.range(0.0, std::f32::consts::TAU)
    }

    /// Uniform point inside the axis-aligned box spanned by two corners.
    ///
    /// Corners may be given in any order.
    pub fn point_in_box(&mut self, a: Vec2, b: Vec2) -> Vec2 {
        let tx = self.unit();
        let ty = self.unit();
        Vec2::new(a.x + (b.x - a.x) * tx, a.y + (b.y - a.y) * ty)
    }

    /// Raw 64-bit value, used to seed sub-streams.
    pub fn next_u64(&mut self) -> u64 {
        self.inner.gen::<u64>()
    }

    /// Derive an independent generator from this one.
    pub fn fork(&mut self) -> Self {
        Self::new(self.next_u64())
    }
}
