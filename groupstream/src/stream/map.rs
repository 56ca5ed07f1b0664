use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::{Stream, StreamExt};

/// Stream adapter applying `f` to every `Ok` element, ending at the first error.
///
/// Created by [`StreamSequenceExt::try_map`](super::StreamSequenceExt::try_map).
#[must_use = "streams do nothing unless polled"]
pub struct TryMapStream<S, F> {
    upstream: S,
    f: F,
    finished: bool,
}

impl<S, F> TryMapStream<S, F> {
    pub fn new(upstream: S, f: F) -> Self {
        Self {
            upstream,
            f,
            finished: false,
        }
    }
}

impl<S: Unpin, F> Unpin for TryMapStream<S, F> {}

impl<S, F, T, B, E> Stream for TryMapStream<S, F>
where
    S: Stream<Item = Result<T, E>> + Unpin,
    F: FnMut(T) -> Result<B, E>,
{
    type Item = Result<B, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        let item = match ready!(this.upstream.poll_next_unpin(cx)) {
            Some(Ok(value)) => (this.f)(value),
            Some(Err(e)) => Err(e),
            None => {
                this.finished = true;
                return Poll::Ready(None);
            }
        };
        if item.is_err() {
            this.finished = true;
        }
        Poll::Ready(Some(item))
    }
}
