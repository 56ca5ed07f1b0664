//! Run a blocking source on its own thread and consume it as a `Stream`.
//!
//! The producer sends rows through a bounded channel, so it can never run
//! more than `capacity` rows ahead of the pipeline. Dropping the stream
//! makes the producer's next send fail; it then stops and drops its source.

use std::future::Future;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::{PipelineResult, SourceError};

/// Stream of rows produced by a blocking source on a worker thread.
///
/// Created by [`spawn_source`].
pub struct ChannelSource<T> {
    rows: ReceiverStream<PipelineResult<T>>,
    producer: Option<JoinHandle<()>>,
}

/// Spawn `source` on the blocking thread pool.
///
/// Must be called from within a tokio runtime. `capacity` is clamped to 1.
pub fn spawn_source<I, T>(source: I, capacity: usize) -> ChannelSource<T>
where
    I: IntoIterator<Item = PipelineResult<T>> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));

    let producer = tokio::task::spawn_blocking(move || {
        for row in source {
            let failed = row.is_err();
            if tx.blocking_send(row).is_err() || failed {
                break;
            }
        }
    });

    ChannelSource {
        rows: ReceiverStream::new(rx),
        producer: Some(producer),
    }
}

// Neither field is ever pinned.
impl<T> Unpin for ChannelSource<T> {}

impl<T> Stream for ChannelSource<T> {
    type Item = PipelineResult<T>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        if let Some(row) = ready!(this.rows.poll_next_unpin(cx)) {
            return Poll::Ready(Some(row));
        }

        // Channel closed: find out whether the producer finished or died.
        let Some(producer) = this.producer.as_mut() else {
            return Poll::Ready(None);
        };
        let outcome = ready!(Pin::new(producer).poll(cx));
        this.producer = None;

        match outcome {
            Ok(()) => Poll::Ready(None),
            Err(e) => Poll::Ready(Some(Err(SourceError::Disconnected(e.to_string()).into()))),
        }
    }
}
