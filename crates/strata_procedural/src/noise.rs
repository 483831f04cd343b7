//! # Perlin Noise Implementation
//!
//! Classic 2D gradient noise over a seeded permutation table.
//!
//! ## Why the quintic fade?
//!
//! `6t^5 - 15t^4 + 10t^3` has zero first and second derivatives at both
//! lattice edges, so neighbouring cells join without visible creases.
//! A linear blend shows the grid.
//!
//! ## Determinism Guarantee
//!
//! Given the same `WorldSeed`, the permutation table is byte-identical on
//! every platform, and so is every sample derived from it.

use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Number of distinct lattice hashes.
const PERIOD: usize = 256;

/// Full table length (256 entries, doubled for overflow handling).
pub const TABLE_LEN: usize = PERIOD * 2;

/// World seed for deterministic generation.
///
/// All procedural generation derives from this seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorldSeed(u64);

impl WorldSeed {
    /// Creates a new world seed.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl From<u64> for WorldSeed {
    fn from(seed: u64) -> Self {
        Self(seed)
    }
}

/// Pre-computed permutation table for noise.
///
/// Built once from the seed and never mutated afterwards, so a single
/// table can be shared behind an `Arc` by any number of sampling threads.
#[derive(Clone, PartialEq, Eq)]
pub struct PermutationTable {
    /// 512-entry permutation table (256 entries, doubled for overflow handling).
    perm: [u8; TABLE_LEN],
}

impl PermutationTable {
    /// Builds the table for `seed`.
    ///
    /// Identity permutation, Fisher-Yates shuffle driven by a ChaCha8
    /// stream seeded from `seed`, then the shuffled half is copied into
    /// the upper half.
    #[must_use]
    pub fn build(seed: WorldSeed) -> Self {
        let mut perm = [0u8; TABLE_LEN];

        // Initialize with identity permutation
        for (i, slot) in perm[..PERIOD].iter_mut().enumerate() {
            *slot = i as u8;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed.value());
        for i in (1..PERIOD).rev() {
            let j = rng.gen_range(0..=i);
            perm.swap(i, j);
        }

        // Double the table to avoid index wrapping
        let (low, high) = perm.split_at_mut(PERIOD);
        high.copy_from_slice(low);

        tracing::debug!(seed = seed.value(), "built permutation table");

        Self { perm }
    }

    /// Gets a permutation value (with automatic wrapping).
    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> u8 {
        self.perm[index & (TABLE_LEN - 1)]
    }

    /// The full 512-entry table.
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.perm
    }
}

impl std::fmt::Debug for PermutationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PermutationTable")
            .field("head", &&self.perm[..8])
            .finish_non_exhaustive()
    }
}

/// Builds a permutation table from a raw integer seed.
#[must_use]
pub fn build_permutation_table(seed: u64) -> PermutationTable {
    PermutationTable::build(WorldSeed::new(seed))
}

/// How a continuous coordinate is split into lattice cell and offset.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LatticeMode {
    /// `floor(v)` cell, offset in `[0, 1)` for every coordinate.
    #[default]
    Floor,
    /// Truncation toward zero, the legacy lattice split. Negative
    /// coordinates get offsets in `(-1, 0]` and a mirrored cell index, so
    /// noise there is discontinuous and not bounded to `[0, 1]`.
    /// Non-negative coordinates split exactly as under `Floor`.
    Truncate,
}

impl LatticeMode {
    /// Returns `(cell & 255, offset)` for one axis.
    #[inline]
    fn split(self, v: f64) -> (usize, f64) {
        let cell = match self {
            Self::Floor => v.floor(),
            Self::Truncate => v.trunc(),
        };
        ((cell as i64 & 255) as usize, v - cell)
    }
}

/// 2D Perlin noise generator.
///
/// Produces smooth, continuous noise values in the range [0, 1] under
/// [`LatticeMode::Floor`]. [`LatticeMode::Truncate`] keeps that bound only
/// for non-negative coordinates.
///
/// # Example
///
/// ```rust
/// use strata_procedural::{PerlinNoise, WorldSeed};
///
/// let noise = PerlinNoise::from_seed(WorldSeed::new(42));
/// let value = noise.sample(100.5, 200.3);
/// assert!((0.0..=1.0).contains(&value));
/// ```
#[derive(Clone, Debug)]
pub struct PerlinNoise {
    /// Shared, read-only permutation table.
    table: Arc<PermutationTable>,
    /// Lattice indexing rule.
    lattice: LatticeMode,
}

impl PerlinNoise {
    /// Creates a noise generator over an existing table.
    #[must_use]
    pub fn new(table: Arc<PermutationTable>) -> Self {
        Self {
            table,
            lattice: LatticeMode::Floor,
        }
    }

    /// Builds a fresh table for `seed` and wraps it.
    #[must_use]
    pub fn from_seed(seed: WorldSeed) -> Self {
        Self::new(Arc::new(PermutationTable::build(seed)))
    }

    /// Sets the lattice indexing rule.
    #[must_use]
    pub fn with_lattice(mut self, lattice: LatticeMode) -> Self {
        self.lattice = lattice;
        self
    }

    /// The shared permutation table.
    #[inline]
    #[must_use]
    pub fn table(&self) -> &Arc<PermutationTable> {
        &self.table
    }

    /// The lattice indexing rule in use.
    #[inline]
    #[must_use]
    pub fn lattice(&self) -> LatticeMode {
        self.lattice
    }

    /// Samples 2D Perlin noise at the given coordinates.
    ///
    /// # Returns
    ///
    /// A value in the range [0, 1] for every coordinate under
    /// [`LatticeMode::Floor`], and for non-negative coordinates under
    /// [`LatticeMode::Truncate`].
    #[must_use]
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let (xi, xf) = self.lattice.split(x);
        let (yi, yf) = self.lattice.split(y);

        let u = fade(xf);
        let v = fade(yf);

        // Double indirection hashes the four cell corners
        let p = &self.table;
        let a = usize::from(p.get(xi));
        let b = usize::from(p.get(xi + 1));
        let aa = p.get(a + yi);
        let ab = p.get(a + yi + 1);
        let ba = p.get(b + yi);
        let bb = p.get(b + yi + 1);

        let x1 = lerp(grad(aa, xf, yf), grad(ba, xf - 1.0, yf), u);
        let x2 = lerp(grad(ab, xf, yf - 1.0), grad(bb, xf - 1.0, yf - 1.0), u);

        // Raw result lies in [-1, 1]
        (lerp(x1, x2, v) + 1.0) / 2.0
    }
}

/// Quintic fade curve `6t^5 - 15t^4 + 10t^3`.
#[inline]
#[must_use]
pub fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

/// Linear interpolation.
#[inline]
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + t * (b - a)
}

/// Dot product of the offset with one of four diagonal gradients.
///
/// The two low bits of `hash` pick the axis order and the signs.
#[inline]
#[must_use]
pub fn grad(hash: u8, x: f64, y: f64) -> f64 {
    let h = hash & 3;
    let (a, b) = if h < 2 { (x, y) } else { (y, x) };
    let a = if h & 1 == 0 { a } else { -a };
    let b = if h & 2 == 0 { b } else { -b };
    a + b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let table1 = build_permutation_table(12345);
        let table2 = build_permutation_table(12345);
        assert_eq!(table1, table2, "Same seed must give the same table");

        let noise1 = PerlinNoise::from_seed(WorldSeed::new(12345));
        let noise2 = PerlinNoise::from_seed(WorldSeed::new(12345));
        for i in 0..100 {
            let x = i as f64 * 0.1;
            let y = i as f64 * 0.17;
            assert_eq!(
                noise1.sample(x, y).to_bits(),
                noise2.sample(x, y).to_bits(),
                "Noise should be deterministic"
            );
        }
    }

    #[test]
    fn test_table_invariant() {
        for seed in [0, 1, 10, 42, 9_999, u64::MAX] {
            let table = build_permutation_table(seed);
            let perm = table.as_slice();
            assert_eq!(perm.len(), TABLE_LEN);

            for i in 0..PERIOD {
                assert_eq!(perm[i], perm[i + PERIOD], "seed {seed}: duplicate mismatch at {i}");
            }

            let mut seen = [false; PERIOD];
            for &value in &perm[..PERIOD] {
                assert!(!seen[value as usize], "seed {seed}: {value} appears twice");
                seen[value as usize] = true;
            }
            assert!(seen.iter().all(|&s| s), "seed {seed}: not a permutation");
        }
    }

    #[test]
    fn test_reference_table_head() {
        // Pinned so a change in the RNG stream shows up as a failure
        let table = build_permutation_table(42);
        assert_eq!(&table.as_slice()[..8], &[130, 188, 15, 168, 57, 182, 50, 232]);
        assert_eq!(&table.as_slice()[PERIOD..PERIOD + 8], &[130, 188, 15, 168, 57, 182, 50, 232]);

        let noise = PerlinNoise::from_seed(WorldSeed::new(42));
        assert_eq!(noise.sample(0.5, 0.5).to_bits(), 0.625_f64.to_bits());
    }

    #[test]
    fn test_table_is_shuffled() {
        let table = build_permutation_table(42);
        let identity = (0..PERIOD).filter(|&i| table.get(i) as usize == i).count();
        assert!(identity < 32, "Table barely shuffled: {identity} fixed points");
    }

    #[test]
    fn test_different_seeds_different_results() {
        assert_ne!(build_permutation_table(1), build_permutation_table(2));

        let noise1 = PerlinNoise::from_seed(WorldSeed::new(1));
        let noise2 = PerlinNoise::from_seed(WorldSeed::new(2));
        let differs = (0..50).any(|i| {
            let x = i as f64 * 0.37 + 0.21;
            noise1.sample(x, x * 0.5) != noise2.sample(x, x * 0.5)
        });
        assert!(differs, "Different seeds should produce different results");
    }

    #[test]
    fn test_range() {
        let noise = PerlinNoise::from_seed(WorldSeed::new(42));

        for i in 0..10_000 {
            let x = (i as f64 * 0.1) - 500.0;
            let y = (i as f64 * 0.13) - 650.0;
            let value = noise.sample(x, y);

            assert!(
                (0.0..=1.0).contains(&value),
                "Value {value} out of range at ({x}, {y})"
            );
        }
    }

    #[test]
    fn test_lattice_points_are_neutral() {
        let noise = PerlinNoise::from_seed(WorldSeed::new(7));
        for x in -5..5 {
            for y in -5..5 {
                assert_eq!(noise.sample(f64::from(x), f64::from(y)), 0.5);
            }
        }
    }

    #[test]
    fn test_continuity() {
        let noise = PerlinNoise::from_seed(WorldSeed::new(42));
        let delta = 1e-4;

        for i in 0..200 {
            // Stay inside one cell: offsets in [0.1, 0.9)
            let x = f64::from(i % 20) + 0.1 + f64::from(i % 8) * 0.1;
            let y = f64::from(i / 20) + 0.1 + f64::from(i % 7) * 0.1;

            let v = noise.sample(x, y);
            let dx = (v - noise.sample(x + delta, y)).abs();
            let dy = (v - noise.sample(x, y + delta)).abs();

            assert!(dx < 1e-3, "Noise should be continuous: dx = {dx}");
            assert!(dy < 1e-3, "Noise should be continuous: dy = {dy}");
        }
    }

    #[test]
    fn test_fade_endpoints() {
        assert_eq!(fade(0.0), 0.0);
        assert_eq!(fade(1.0), 1.0);
        assert_eq!(fade(0.5), 0.5);
    }

    #[test]
    fn test_gradient_directions() {
        assert_eq!(grad(0, 0.25, 0.5), 0.75);
        assert_eq!(grad(1, 0.25, 0.5), 0.25);
        assert_eq!(grad(2, 0.25, 0.5), 0.25);
        assert_eq!(grad(3, 0.25, 0.5), -0.75);
        // Only the two low bits matter
        assert_eq!(grad(0b1111_1100, 0.25, 0.5), grad(0, 0.25, 0.5));
    }

    #[test]
    fn test_lattice_modes() {
        let table = Arc::new(build_permutation_table(42));
        let floor = PerlinNoise::new(Arc::clone(&table));
        let trunc = PerlinNoise::new(table).with_lattice(LatticeMode::Truncate);

        // Identical for non-negative coordinates
        for i in 0..100 {
            let x = i as f64 * 0.731;
            let y = i as f64 * 0.419;
            assert_eq!(floor.sample(x, y).to_bits(), trunc.sample(x, y).to_bits());
        }

        // Diverge in the negative quadrant
        let differs = (1..100).any(|i| {
            let x = -(i as f64) * 0.731;
            floor.sample(x, 0.3) != trunc.sample(x, 0.3)
        });
        assert!(differs, "Truncation should differ from floor for negative x");
    }

    #[test]
    fn test_truncate_unbounded_for_negative_coordinates() {
        let table = Arc::new(build_permutation_table(42));
        let floor = PerlinNoise::new(Arc::clone(&table));
        let trunc = PerlinNoise::new(table).with_lattice(LatticeMode::Truncate);

        let mut escaped = 0;
        for i in 1..100 {
            let (x, y) = (-(i as f64) * 0.731, -(i as f64) * 0.419);
            assert!((0.0..=1.0).contains(&floor.sample(x, y)));
            if !(0.0..=1.0).contains(&trunc.sample(x, y)) {
                escaped += 1;
            }
        }
        assert!(escaped > 0, "Negative offsets should push truncated noise out of [0, 1]");
    }

    #[test]
    fn test_lattice_split() {
        assert_eq!(LatticeMode::Floor.split(-0.25), (255, 0.75));
        assert_eq!(LatticeMode::Truncate.split(-0.25), (0, -0.25));
        assert_eq!(LatticeMode::Floor.split(257.5), (1, 0.5));
    }
}
