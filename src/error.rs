/// Represents errors that can occur in a funnel hash table
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Error {
    /// Capacity must be at least one slot
    InvalidCapacity,

    /// Slack fraction must lie strictly between 0 and 1
    InvalidDelta(f64),

    /// The insert budget (capacity minus slack) has been used up
    CapacityExhausted {
        /// Number of inserts the table admits
        max_inserts: usize,
    },

    /// No level bucket and no special-array probe could place the key
    SpecialArrayExhausted,
}

impl Error {
    /// Returns `true` if the table could not place a key within its probe bounds.
    ///
    /// This never happens for a well-sized table with a reasonable hash function,
    /// and there is no way to recover from it other than building a new table.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::SpecialArrayExhausted)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidCapacity => write!(f, "capacity must be positive"),
            Self::InvalidDelta(delta) => write!(f, "delta must be between 0 and 1, got {delta}"),
            Self::CapacityExhausted { max_inserts } => {
                write!(f, "hash table is full ({max_inserts} inserts)")
            }
            Self::SpecialArrayExhausted => {
                write!(f, "special array insertion failed; table is full")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Funnel hash table result
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn error_fatality() {
        assert!(Error::SpecialArrayExhausted.is_fatal());
        assert!(!Error::CapacityExhausted { max_inserts: 1 }.is_fatal());
        assert!(!Error::InvalidCapacity.is_fatal());
        assert!(!Error::InvalidDelta(2.0).is_fatal());
    }

    #[test]
    fn error_display() {
        assert_eq!("capacity must be positive", Error::InvalidCapacity.to_string());
        assert_eq!(
            "hash table is full (90 inserts)",
            Error::CapacityExhausted { max_inserts: 90 }.to_string(),
        );
    }
}
