use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::{Stream, StreamExt};

use crate::sequence::group_by::{advance, Group};

/// Stream adapter emitting one [`Group`] per run of equal consecutive keys.
///
/// Created by [`StreamSequenceExt::group_by_key`](super::StreamSequenceExt::group_by_key).
#[must_use = "streams do nothing unless polled"]
pub struct GroupByStream<S, F, K, T> {
    upstream: S,
    key_fn: F,
    open: Option<Group<K, T>>,
    finished: bool,
}

impl<S, F, K, T> GroupByStream<S, F, K, T> {
    pub fn new(upstream: S, key_fn: F) -> Self {
        Self {
            upstream,
            key_fn,
            open: None,
            finished: false,
        }
    }
}

// Only `upstream` is ever polled, and it is required to be `Unpin`.
impl<S: Unpin, F, K, T> Unpin for GroupByStream<S, F, K, T> {}

impl<S, F, K, T, E> Stream for GroupByStream<S, F, K, T>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    F: FnMut(&T) -> K,
    K: PartialEq,
{
    type Item = Result<Group<K, T>, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        loop {
            match ready!(this.upstream.poll_next_unpin(cx)) {
                Some(Ok(record)) => {
                    let key = (this.key_fn)(&record);
                    if let Some(done) = advance(&mut this.open, key, record) {
                        return Poll::Ready(Some(Ok(done)));
                    }
                }
                Some(Err(e)) => {
                    this.open = None;
                    this.finished = true;
                    return Poll::Ready(Some(Err(e)));
                }
                None => {
                    this.finished = true;
                    return Poll::Ready(this.open.take().map(Ok));
                }
            }
        }
    }
}
