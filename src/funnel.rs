use std::borrow::Borrow;
use std::hash::{BuildHasher, Hash};
use std::ops::Range;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rustc_hash::FxBuildHasher;

use crate::common::{Entry, draw_salt, empty_slots, is_claimable, salted_seed};
use crate::{Error, Layout, Result};

#[derive(Debug)]
struct BucketLevel<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    bucket_count: usize,
    bucket_size: usize,
    salt: u32,
}

impl<K, V> BucketLevel<K, V> {
    fn with_bucket_count(bucket_count: usize, bucket_size: usize, salt: u32) -> Self {
        Self {
            slots: empty_slots(bucket_count * bucket_size),
            bucket_count,
            bucket_size,
            salt,
        }
    }

    fn bucket_range(&self, key_hash: u64) -> Range<usize> {
        let bucket_idx = salted_seed(key_hash, self.salt) % self.bucket_count;
        let bucket_start = bucket_idx * self.bucket_size;
        bucket_start..bucket_start + self.bucket_size
    }
}

#[derive(Debug)]
struct SpecialArray<K, V> {
    slots: Vec<Option<Entry<K, V>>>,
    len: usize,
    probe_limit: usize,
    salt: u32,
}

impl<K, V> SpecialArray<K, V> {
    fn with_capacity(capacity: usize, probe_limit: usize, salt: u32) -> Self {
        Self {
            slots: empty_slots(capacity),
            len: 0,
            probe_limit,
            salt,
        }
    }

    /// Linear probe sequence of at most `probe_limit` slots.
    fn probe_sequence(&self, key_hash: u64) -> impl Iterator<Item = usize> {
        let size = self.slots.len();
        let origin = salted_seed(key_hash, self.salt) % size;
        (0..self.probe_limit).map(move |probe| (origin + probe) % size)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlotLocation {
    Level { level_idx: usize, slot_idx: usize },
    Special { slot_idx: usize },
}

/// A fixed-capacity hash table using funnel hashing.
///
/// Keys are first offered to a sequence of geometrically shrinking levels. Each
/// level hashes the key (mixed with a per-level salt) to one bucket and takes
/// the first free slot in it. Keys that no level accepts spill into a small
/// linear-probing special array with a `log log n` probe limit.
///
/// The table never grows. Once [`FunnelHashTable::max_inserts`] distinct keys
/// are stored, further inserts are refused.
///
/// Salts are drawn from an explicit random generator at construction; use
/// [`FunnelHashTable::with_seed`] for a fully reproducible table.
#[derive(Debug)]
pub struct FunnelHashTable<K, V, S = FxBuildHasher> {
    levels: Vec<BucketLevel<K, V>>,
    special: SpecialArray<K, V>,
    len: usize,
    layout: Layout,
    hash_builder: S,
}

impl<K, V> FunnelHashTable<K, V>
where
    K: Eq + Hash,
{
    /// Creates a table with salts drawn from the thread-local generator.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` is zero or `delta` is not strictly between 0 and 1.
    pub fn new(capacity: usize, delta: f64) -> Result<Self> {
        Self::with_rng(capacity, delta, &mut rand::rng())
    }

    /// Creates a table whose salts are derived from `seed`.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` is zero or `delta` is not strictly between 0 and 1.
    pub fn with_seed(capacity: usize, delta: f64, seed: u64) -> Result<Self> {
        Self::with_rng(capacity, delta, &mut ChaCha8Rng::seed_from_u64(seed))
    }

    /// Creates a table with salts drawn from `rng`.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` is zero or `delta` is not strictly between 0 and 1.
    pub fn with_rng<R: Rng + ?Sized>(capacity: usize, delta: f64, rng: &mut R) -> Result<Self> {
        Self::with_rng_and_hasher(capacity, delta, rng, FxBuildHasher)
    }
}

impl<K, V, S> FunnelHashTable<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Creates a table with salts drawn from `rng`, hashing keys with `hash_builder`.
    ///
    /// # Errors
    ///
    /// Fails if `capacity` is zero or `delta` is not strictly between 0 and 1.
    pub fn with_rng_and_hasher<R: Rng + ?Sized>(
        capacity: usize,
        delta: f64,
        rng: &mut R,
        hash_builder: S,
    ) -> Result<Self> {
        let layout = Layout::compute(capacity, delta)?;

        let levels = layout
            .bucket_counts()
            .iter()
            .map(|&bucket_count| {
                BucketLevel::with_bucket_count(bucket_count, layout.bucket_size(), draw_salt(rng))
            })
            .collect::<Vec<_>>();

        let special =
            SpecialArray::with_capacity(layout.special_size(), layout.probe_limit(), draw_salt(rng));

        log::debug!(
            "Created funnel hash table: capacity={capacity}, delta={delta}, levels={}, bucket_size={}, special_size={}, probe_limit={}",
            levels.len(),
            layout.bucket_size(),
            layout.special_size(),
            layout.probe_limit(),
        );

        Ok(Self {
            levels,
            special,
            len: 0,
            layout,
            hash_builder,
        })
    }

    /// Number of distinct keys stored.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.layout.capacity()
    }

    /// Number of distinct keys the table admits before refusing inserts.
    pub fn max_inserts(&self) -> usize {
        self.layout.max_inserts()
    }

    /// Number of keys that overflowed into the special array.
    pub fn special_len(&self) -> usize {
        self.special.len
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Inserts a key-value pair, returning the previous value if the key was present.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapacityExhausted`] without modifying the table once
    /// [`FunnelHashTable::max_inserts`] keys are stored. Returns
    /// [`Error::SpecialArrayExhausted`] if neither a level nor the special array
    /// has room for the key within their probe bounds.
    pub fn insert(&mut self, key: K, value: V) -> Result<Option<V>> {
        if self.len >= self.layout.max_inserts() {
            return Err(Error::CapacityExhausted {
                max_inserts: self.layout.max_inserts(),
            });
        }

        let key_hash = self.hash_key(&key);
        let Some(location) = self.choose_slot(key_hash, &key) else {
            log::warn!(
                "Special array exhausted after {} probes with {} keys stored",
                self.special.probe_limit,
                self.len,
            );
            return Err(Error::SpecialArrayExhausted);
        };

        Ok(self.place_entry(location, key, value))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = match self.find_slot_location(key)? {
            SlotLocation::Level {
                level_idx,
                slot_idx,
            } => self.levels[level_idx].slots[slot_idx].as_ref(),
            SlotLocation::Special { slot_idx } => self.special.slots[slot_idx].as_ref(),
        };
        entry.map(|entry| &entry.value)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let entry = match self.find_slot_location(key)? {
            SlotLocation::Level {
                level_idx,
                slot_idx,
            } => self.levels[level_idx].slots[slot_idx].as_mut(),
            SlotLocation::Special { slot_idx } => self.special.slots[slot_idx].as_mut(),
        };
        entry.map(|entry| &mut entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_slot_location(key).is_some()
    }

    fn place_entry(&mut self, location: SlotLocation, key: K, value: V) -> Option<V> {
        let slot = match location {
            SlotLocation::Level {
                level_idx,
                slot_idx,
            } => &mut self.levels[level_idx].slots[slot_idx],
            SlotLocation::Special { slot_idx } => &mut self.special.slots[slot_idx],
        };

        if let Some(entry) = slot.as_mut() {
            return Some(std::mem::replace(&mut entry.value, value));
        }

        *slot = Some(Entry { key, value });
        if let SlotLocation::Special { .. } = location {
            self.special.len += 1;
        }
        self.len += 1;
        None
    }

    /// Finds the first slot, in level order then special-array order, that is
    /// empty or already holds `key`.
    fn choose_slot(&self, key_hash: u64, key: &K) -> Option<SlotLocation> {
        for (level_idx, level) in self.levels.iter().enumerate() {
            if let Some(slot_idx) = level
                .bucket_range(key_hash)
                .find(|&slot_idx| is_claimable(level.slots[slot_idx].as_ref(), key))
            {
                return Some(SlotLocation::Level {
                    level_idx,
                    slot_idx,
                });
            }
        }

        log::trace!("All levels rejected key, probing special array");

        self.special
            .probe_sequence(key_hash)
            .find(|&slot_idx| is_claimable(self.special.slots[slot_idx].as_ref(), key))
            .map(|slot_idx| SlotLocation::Special { slot_idx })
    }

    fn hash_key<Q>(&self, key: &Q) -> u64
    where
        Q: Hash + ?Sized,
    {
        self.hash_builder.hash_one(key)
    }

    fn find_slot_location<Q>(&self, key: &Q) -> Option<SlotLocation>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let key_hash = self.hash_key(key);
        let holds_key = |slot: &Option<Entry<K, V>>| {
            slot.as_ref()
                .is_some_and(|entry| entry.key.borrow() == key)
        };

        for (level_idx, level) in self.levels.iter().enumerate() {
            if let Some(slot_idx) = level
                .bucket_range(key_hash)
                .find(|&slot_idx| holds_key(&level.slots[slot_idx]))
            {
                return Some(SlotLocation::Level {
                    level_idx,
                    slot_idx,
                });
            }
        }

        self.special
            .probe_sequence(key_hash)
            .find(|&slot_idx| holds_key(&self.special.slots[slot_idx]))
            .map(|slot_idx| SlotLocation::Special { slot_idx })
    }
}
