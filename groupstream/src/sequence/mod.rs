//! Pull-based sequence operators over `Iterator<Item = Result<T, E>>`.
//!
//! Each operator owns exactly one upstream iterator plus its own small state,
//! and pulls from upstream only when its consumer calls `next`. Composing
//! them by nesting gives a pipeline whose memory use is bounded by one open
//! group and one in-flight element.
//!
//! ```
//! use groupstream::sequence::SequenceExt;
//!
//! let rows = vec![(1, "a"), (1, "b"), (2, "c")];
//! let lines: Vec<String> = rows
//!     .into_iter()
//!     .map(Ok::<_, String>)
//!     .group_by_key(|row| row.0)
//!     .try_map(|group| Ok(group.records().iter().map(|r| r.1).collect::<String>()))
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//!
//! assert_eq!(lines, vec!["ab", "c"]);
//! ```

pub mod group_by;
pub mod map;

pub use group_by::{Group, GroupBy};
pub use map::TryMap;

/// Sequence operators for iterators of `Result`s.
pub trait SequenceExt<T, E>: Iterator<Item = Result<T, E>> + Sized {
    /// Group runs of consecutive records with equal keys.
    ///
    /// The input must be sorted (or at least clustered) by key.
    fn group_by_key<K, F>(self, key_fn: F) -> GroupBy<Self, F, K, T>
    where
        F: FnMut(&T) -> K,
        K: PartialEq,
    {
        GroupBy::new(self, key_fn)
    }

    /// Map every element with a fallible function, stopping at the first error.
    fn try_map<B, F>(self, f: F) -> TryMap<Self, F>
    where
        F: FnMut(T) -> Result<B, E>,
    {
        TryMap::new(self, f)
    }
}

impl<I, T, E> SequenceExt<T, E> for I where I: Iterator<Item = Result<T, E>> {}
