//! Seeded RNG streams for reproducible warehouse generation.

use rand::{rngs::StdRng, SeedableRng};

/// Derives independent, named RNG streams from one master seed.
///
/// Each relation draws from its own stream, so adding a column to the
/// customer generator does not shift the products or sales that follow.
/// Stream seeds are mixed with FNV-1a and SplitMix64 rather than
/// `DefaultHasher`, which keeps generated warehouses identical across
/// toolchain upgrades.
///
/// ```
/// use gold_testdata::rng::SeededRngFactory;
/// use rand::Rng;
///
/// let factory = SeededRngFactory::new(42);
/// let a: u64 = factory.stream("products").gen();
/// let b: u64 = factory.stream("products").gen();
/// assert_eq!(a, b);
/// ```
pub struct SeededRngFactory {
    master_seed: u64,
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xCBF2_9CE4_8422_2325, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(0x0000_0100_0000_01B3)
    })
}

impl SeededRngFactory {
    pub fn new(seed: u64) -> Self {
        Self { master_seed: seed }
    }

    /// RNG for a named stream; the same name always yields the same sequence.
    pub fn stream(&self, name: &str) -> StdRng {
        StdRng::seed_from_u64(splitmix64(self.master_seed ^ fnv1a(name.as_bytes())))
    }

    /// RNG for the `index`-th member of a named stream.
    pub fn indexed_stream(&self, name: &str, index: u64) -> StdRng {
        let base = splitmix64(self.master_seed ^ fnv1a(name.as_bytes()));
        StdRng::seed_from_u64(splitmix64(base ^ index))
    }

    pub fn seed(&self) -> u64 {
        self.master_seed
    }
}

impl Default for SeededRngFactory {
    fn default() -> Self {
        Self::new(42)
    }
}
