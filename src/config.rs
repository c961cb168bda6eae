use crate::common::{DEFAULT_CAPACITY, DEFAULT_DELTA};
use crate::{FunnelHashTable, Layout, Result};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxBuildHasher;
use std::hash::{BuildHasher, Hash};

/// Funnel hash table configuration builder
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Total number of slots
    pub capacity: usize,

    /// Fraction of slots kept free (slack)
    ///
    /// Smaller values pack the table tighter at the cost of more,
    /// wider levels.
    pub delta: f64,

    /// Seed for the salt generator
    ///
    /// If unset, salts come from the thread-local generator.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            delta: DEFAULT_DELTA,
            seed: None,
        }
    }
}

impl Config {
    /// Initializes a new config with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    /// Sets the total number of slots.
    ///
    /// Defaults to 1024.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Sets the slack fraction, which must lie strictly between 0 and 1.
    ///
    /// The table refuses inserts once `capacity - floor(delta * capacity)`
    /// keys are stored.
    ///
    /// Defaults to 0.1.
    #[must_use]
    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Seeds the salt generator, making the table reproducible.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Checks the configuration without allocating a table.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` is zero or `delta` is not strictly between 0 and 1.
    pub fn validate(&self) -> Result<()> {
        crate::layout::validate(self.capacity, self.delta)
    }

    /// Derives the table layout this config produces.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, see [`Config::validate`].
    pub fn layout(&self) -> Result<Layout> {
        Layout::compute(self.capacity, self.delta)
    }

    /// Builds a table hashing keys with [`FxBuildHasher`].
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, see [`Config::validate`].
    pub fn build<K: Eq + Hash, V>(&self) -> Result<FunnelHashTable<K, V>> {
        self.build_with_hasher(FxBuildHasher)
    }

    /// Builds a table hashing keys with `hash_builder`.
    ///
    /// # Errors
    ///
    /// Fails if the config is invalid, see [`Config::validate`].
    pub fn build_with_hasher<K: Eq + Hash, V, S: BuildHasher>(
        &self,
        hash_builder: S,
    ) -> Result<FunnelHashTable<K, V, S>> {
        match self.seed {
            Some(seed) => FunnelHashTable::with_rng_and_hasher(
                self.capacity,
                self.delta,
                &mut ChaCha8Rng::seed_from_u64(seed),
                hash_builder,
            ),
            None => FunnelHashTable::with_rng_and_hasher(
                self.capacity,
                self.delta,
                &mut rand::rng(),
                hash_builder,
            ),
        }
    }
}
