//! A fixed-capacity hash table built on funnel hashing.
//!
//! Funnel hashing is an open-addressing scheme without reordering that bounds
//! the worst-case expected probe count. The table is split into a sequence of
//! levels, each a fixed number of `beta`-slot buckets, shrinking by a factor of
//! 3/4 from one level to the next. A key is offered to one bucket per level
//! (chosen by a per-level salted hash) and lands in the first free slot; keys
//! rejected everywhere go to a small linear-probing "special" array whose probe
//! count is capped at `O(log log n)`.
//!
//! A slack fraction `delta` of the capacity is always kept free. Once
//! `capacity - floor(delta * capacity)` keys are stored, inserts fail with
//! [`Error::CapacityExhausted`].
//!
//! ```
//! use funnelhash::{Config, Error};
//!
//! # fn main() -> funnelhash::Result<()> {
//! let mut table = Config::new(100).delta(0.1).seed(7).build()?;
//!
//! for key in 0..90 {
//!     table.insert(key, key * 2)?;
//! }
//!
//! assert_eq!(Some(&20), table.get(&10));
//! assert!(!table.contains_key(&1_000));
//! assert_eq!(
//!     Err(Error::CapacityExhausted { max_inserts: 90 }),
//!     table.insert(90, 180),
//! );
//! # Ok(())
//! # }
//! ```
//!
//! The table is not thread-safe and never resizes.

#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(clippy::expect_used)]
#![allow(clippy::missing_const_for_fn)]
#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]

mod common;
mod config;
mod error;
mod funnel;
mod layout;

pub use config::Config;
pub use error::{Error, Result};
pub use funnel::FunnelHashTable;
pub use layout::Layout;
