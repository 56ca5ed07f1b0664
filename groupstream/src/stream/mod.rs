//! Async counterparts of the [`sequence`](crate::sequence) operators.
//!
//! Same semantics, over `Stream<Item = Result<T, E>>`: each operator polls
//! its single upstream only when polled itself, so a slow sink throttles the
//! whole chain. Upstreams must be `Unpin`; box-pin them otherwise.

pub mod group_by;
pub mod map;

pub use group_by::GroupByStream;
pub use map::TryMapStream;

use futures::Stream;

/// Sequence operators for streams of `Result`s.
pub trait StreamSequenceExt<T, E>: Stream<Item = Result<T, E>> + Sized {
    /// Group runs of consecutive records with equal keys.
    fn group_by_key<K, F>(self, key_fn: F) -> GroupByStream<Self, F, K, T>
    where
        F: FnMut(&T) -> K,
        K: PartialEq,
    {
        GroupByStream::new(self, key_fn)
    }

    /// Map every element with a fallible function, stopping at the first error.
    fn try_map<B, F>(self, f: F) -> TryMapStream<Self, F>
    where
        F: FnMut(T) -> Result<B, E>,
    {
        TryMapStream::new(self, f)
    }
}

impl<S, T, E> StreamSequenceExt<T, E> for S where S: Stream<Item = Result<T, E>> {}
