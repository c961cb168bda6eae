use rand::Rng;

pub(crate) const DEFAULT_CAPACITY: usize = 1024;
pub(crate) const DEFAULT_DELTA: f64 = 0.10;

/// Seeds are reduced to 31 bits, and so are salts.
pub(crate) const SALT_MAX: u32 = 0x7FFF_FFFF;

#[derive(Debug)]
pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
}

pub(crate) fn empty_slots<T>(capacity: usize) -> Vec<Option<T>> {
    let mut slots = Vec::with_capacity(capacity);
    slots.resize_with(capacity, || None);
    slots
}

/// Mixes a salt into a key hash, yielding a non-negative probe seed.
#[inline]
pub(crate) fn salted_seed(key_hash: u64, salt: u32) -> usize {
    ((key_hash ^ u64::from(salt)) & u64::from(SALT_MAX)) as usize
}

pub(crate) fn draw_salt<R: Rng + ?Sized>(rng: &mut R) -> u32 {
    rng.random_range(0..=SALT_MAX)
}

/// Whether `slot` may receive `key`: it is either empty or already holds `key`.
#[inline]
pub(crate) fn is_claimable<K: Eq, V>(slot: Option<&Entry<K, V>>, key: &K) -> bool {
    slot.is_none_or(|entry| entry.key == *key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn salted_seed_clears_high_bits() {
        assert_eq!(salted_seed(u64::MAX, 0), 0x7FFF_FFFF);
        assert_eq!(salted_seed(0xFFFF_FFFF_0000_0000, 0), 0);
        assert_eq!(salted_seed(0b1010, 0b0110), 0b1100);
    }

    #[test]
    fn salted_seed_differs_per_salt() {
        let key_hash = 0x1234_5678_9ABC_DEF0;
        assert_ne!(salted_seed(key_hash, 1), salted_seed(key_hash, 2));
    }

    #[test]
    fn draw_salt_stays_in_range() {
        use rand::SeedableRng;

        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(0);
        assert!((0..1_000).all(|_| draw_salt(&mut rng) <= SALT_MAX));
    }

    #[test]
    fn claimable_slots() {
        let occupied = Entry { key: 7, value: "seven" };
        assert!(is_claimable::<i32, &str>(None, &7));
        assert!(is_claimable(Some(&occupied), &7));
        assert!(!is_claimable(Some(&occupied), &8));
    }
}
