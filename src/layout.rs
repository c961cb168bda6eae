use crate::{Error, Result};

/// Each level has three quarters of the buckets of the level above it.
const LEVEL_DECAY: f64 = 0.75;

/// Structural parameters of a funnel hash table.
///
/// A layout is derived from capacity and slack fraction alone, so two tables
/// built with the same parameters always have identical shapes, regardless of
/// their salts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    capacity: usize,
    max_inserts: usize,
    level_count: usize,
    bucket_size: usize,
    special_size: usize,
    primary_size: usize,
    bucket_counts: Vec<usize>,
    probe_limit: usize,
}

impl Layout {
    /// Derives the layout for `capacity` slots with slack fraction `delta`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if `capacity` is zero, and
    /// [`Error::InvalidDelta`] if `delta` is not strictly between 0 and 1.
    pub fn compute(capacity: usize, delta: f64) -> Result<Self> {
        validate(capacity, delta)?;

        let max_inserts = capacity - (delta * capacity as f64).floor() as usize;
        let level_count = compute_level_count(delta);
        let bucket_size = compute_bucket_size(delta);

        let special_size = compute_special_size(capacity, delta);
        let primary_size = capacity - special_size;

        let total_buckets = primary_size / bucket_size;
        let bucket_counts = partition_funnel_buckets(total_buckets, level_count);

        Ok(Self {
            capacity,
            max_inserts,
            level_count,
            bucket_size,
            special_size,
            primary_size,
            bucket_counts,
            probe_limit: log_log_probe_limit(capacity),
        })
    }

    /// Total number of slots the table was sized for.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of distinct keys the table admits before refusing inserts.
    #[must_use]
    pub fn max_inserts(&self) -> usize {
        self.max_inserts
    }

    /// Planned number of levels (alpha).
    ///
    /// Fewer levels may actually exist, see [`Layout::bucket_counts`].
    #[must_use]
    pub fn level_count(&self) -> usize {
        self.level_count
    }

    /// Slots per bucket (beta), shared by all levels.
    #[must_use]
    pub fn bucket_size(&self) -> usize {
        self.bucket_size
    }

    /// Slots in the special array.
    #[must_use]
    pub fn special_size(&self) -> usize {
        self.special_size
    }

    /// Slots reserved for the levels.
    #[must_use]
    pub fn primary_size(&self) -> usize {
        self.primary_size
    }

    /// Bucket count of every level that was actually created.
    #[must_use]
    pub fn bucket_counts(&self) -> &[usize] {
        &self.bucket_counts
    }

    /// Slots allocated to levels, which may fall slightly short of
    /// [`Layout::primary_size`] due to rounding.
    #[must_use]
    pub fn level_slots(&self) -> usize {
        self.bucket_counts.iter().sum::<usize>() * self.bucket_size
    }

    /// Maximum number of special-array slots probed per operation.
    #[must_use]
    pub fn probe_limit(&self) -> usize {
        self.probe_limit
    }
}

pub(crate) fn validate(capacity: usize, delta: f64) -> Result<()> {
    if capacity == 0 {
        return Err(Error::InvalidCapacity);
    }

    // NOTE: Negated so that NaN is rejected too
    if !(delta > 0.0 && delta < 1.0) {
        return Err(Error::InvalidDelta(delta));
    }

    Ok(())
}

fn compute_level_count(delta: f64) -> usize {
    (4.0 * (1.0 / delta).log2() + 10.0).ceil() as usize
}

fn compute_bucket_size(delta: f64) -> usize {
    (2.0 * (1.0 / delta).log2()).ceil().max(1.0) as usize
}

fn compute_special_size(capacity: usize, delta: f64) -> usize {
    ((3.0 * delta * capacity as f64 / 4.0).floor() as usize).max(1)
}

fn log_log_probe_limit(capacity: usize) -> usize {
    ((capacity as f64 + 1.0).ln() + 1.0).ln().ceil().max(1.0) as usize
}

/// Splits `total_buckets` over at most `level_count` levels, decaying by
/// [`LEVEL_DECAY`] per level.
///
/// Level generation stops once the budget is used up, so the result may have
/// fewer than `level_count` entries.
fn partition_funnel_buckets(total_buckets: usize, level_count: usize) -> Vec<usize> {
    let first_level_guess = if level_count == 0 {
        total_buckets as f64
    } else {
        total_buckets as f64 / (4.0 * (1.0 - LEVEL_DECAY.powi(level_count as i32)))
    };

    let mut bucket_counts = Vec::with_capacity(level_count);
    let mut remaining = total_buckets;

    for level_idx in 0..level_count {
        if remaining == 0 {
            break;
        }

        let ideal = (first_level_guess * LEVEL_DECAY.powi(level_idx as i32)).round();
        let bucket_count = (ideal as usize).max(1).min(remaining);

        bucket_counts.push(bucket_count);
        remaining -= bucket_count;
    }

    bucket_counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn layout_small_table() -> crate::Result<()> {
        let layout = Layout::compute(100, 0.1)?;

        assert_eq!(90, layout.max_inserts());
        assert_eq!(24, layout.level_count());
        assert_eq!(7, layout.bucket_size());
        assert_eq!(7, layout.special_size());
        assert_eq!(93, layout.primary_size());
        assert_eq!(&[3, 2, 2, 1, 1, 1, 1, 1, 1], layout.bucket_counts());
        assert_eq!(91, layout.level_slots());
        assert_eq!(2, layout.probe_limit());

        Ok(())
    }

    #[test]
    fn layout_slots_never_exceed_capacity() -> crate::Result<()> {
        for capacity in [1, 2, 3, 10, 97, 100, 257, 1_000, 4_096, 65_537] {
            for delta in [0.01, 0.05, 0.1, 0.25, 0.5, 0.9] {
                let layout = Layout::compute(capacity, delta)?;

                assert_eq!(capacity, layout.primary_size() + layout.special_size());
                assert!(layout.level_slots() <= layout.primary_size());
                assert!(layout.max_inserts() <= capacity);
                assert!(layout.special_size() >= 1);
                assert!(layout.probe_limit() >= 1);
                assert!(layout.bucket_counts().len() <= layout.level_count());
            }
        }

        Ok(())
    }

    #[test]
    fn layout_bucket_counts_decay() -> crate::Result<()> {
        let layout = Layout::compute(100_000, 0.05)?;
        let counts = layout.bucket_counts();
        assert!(counts.len() > 1);

        for pair in counts.windows(2) {
            assert!(pair[1] <= pair[0]);
            assert!(pair[1] as f64 <= LEVEL_DECAY * pair[0] as f64 + 1.0);
        }

        Ok(())
    }

    #[test]
    fn layout_uses_whole_bucket_budget() -> crate::Result<()> {
        // the trailing single-bucket levels absorb what the geometric head leaves over
        let layout = Layout::compute(1_000, 0.1)?;
        let total_buckets = layout.primary_size() / layout.bucket_size();

        assert_eq!(total_buckets, layout.bucket_counts().iter().sum::<usize>());

        Ok(())
    }

    #[test]
    fn layout_tiny_capacity_has_no_levels() -> crate::Result<()> {
        let layout = Layout::compute(1, 0.5)?;

        assert_eq!(1, layout.max_inserts());
        assert_eq!(1, layout.special_size());
        assert_eq!(0, layout.primary_size());
        assert!(layout.bucket_counts().is_empty());

        Ok(())
    }

    #[test]
    fn layout_tighter_slack_means_more_and_wider_levels() -> crate::Result<()> {
        let loose = Layout::compute(10_000, 0.5)?;
        let tight = Layout::compute(10_000, 0.01)?;

        assert!(tight.level_count() > loose.level_count());
        assert!(tight.bucket_size() > loose.bucket_size());
        assert!(tight.max_inserts() > loose.max_inserts());

        Ok(())
    }

    #[test]
    fn layout_invalid_params() {
        assert_eq!(Err(Error::InvalidCapacity), Layout::compute(0, 0.1));
        assert_eq!(Err(Error::InvalidDelta(1.0)), Layout::compute(100, 1.0));
        assert_eq!(Err(Error::InvalidDelta(0.0)), Layout::compute(100, 0.0));
        assert_eq!(Err(Error::InvalidDelta(-0.5)), Layout::compute(100, -0.5));
        assert!(matches!(
            Layout::compute(100, f64::NAN),
            Err(Error::InvalidDelta(_))
        ));
    }
}
