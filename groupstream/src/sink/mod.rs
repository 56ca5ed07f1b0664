//! Sink adapters: serialized lines out, one at a time.
//!
//! [`drain`] pulls the final sequence of the pipeline and hands each line to
//! a [`LineSink`]. It is the only place that drives the pipeline, so the
//! sink's pace is the pipeline's pace. [`drain_async`] does the same for an
//! async stream and any `AsyncWrite`.
//!
//! On failure the sink is still flushed, so lines already handed to it
//! stay written; durability beyond that is the sink's business.

use std::io::{BufWriter, Write};

use futures::{Stream, StreamExt};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{PipelineResult, SinkError, SinkResult};

/// Destination for serialized lines.
pub trait LineSink {
    /// Persist one line. The line already carries its delimiter.
    fn write_line(&mut self, line: &str) -> SinkResult<()>;

    /// Flush whatever is buffered. Called once after the last line.
    fn finish(&mut self) -> SinkResult<()> {
        Ok(())
    }
}

/// Counters reported by [`drain`] and [`drain_async`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainStats {
    pub lines: usize,
    pub bytes: usize,
}

impl DrainStats {
    fn record(&mut self, line: &str) {
        self.lines += 1;
        self.bytes += line.len();
    }
}

/// Buffered sink over any `std::io::Write`.
pub struct WriterSink<W: Write> {
    writer: BufWriter<W>,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(self) -> SinkResult<W> {
        self.writer.into_inner().map_err(|e| SinkError::Io(e.into_error()))
    }
}

impl<W: Write> LineSink for WriterSink<W> {
    fn write_line(&mut self, line: &str) -> SinkResult<()> {
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn finish(&mut self) -> SinkResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// In-memory sink, mostly for tests and previews.
impl LineSink for Vec<String> {
    fn write_line(&mut self, line: &str) -> SinkResult<()> {
        self.push(line.to_string());
        Ok(())
    }
}

/// Write every line of `lines` to `sink`, stopping at the first error.
pub fn drain<I, S>(lines: I, sink: &mut S) -> PipelineResult<DrainStats>
where
    I: IntoIterator<Item = PipelineResult<String>>,
    S: LineSink + ?Sized,
{
    let mut stats = DrainStats::default();

    for line in lines {
        let written = line.and_then(|line| {
            sink.write_line(&line)?;
            Ok(line)
        });
        match written {
            Ok(line) => stats.record(&line),
            Err(e) => {
                // Lines already accepted must reach the destination.
                let _ = sink.finish();
                return Err(e);
            }
        }
    }

    sink.finish()?;
    Ok(stats)
}

/// Async counterpart of [`drain`], writing to any `AsyncWrite`.
pub async fn drain_async<St, W>(mut lines: St, writer: &mut W) -> PipelineResult<DrainStats>
where
    St: Stream<Item = PipelineResult<String>> + Unpin,
    W: AsyncWrite + Unpin + ?Sized,
{
    let mut stats = DrainStats::default();

    while let Some(line) = lines.next().await {
        let written = match line {
            Ok(line) => match writer.write_all(line.as_bytes()).await {
                Ok(()) => Ok(line),
                Err(e) => Err(SinkError::from(e).into()),
            },
            Err(e) => Err(e),
        };
        match written {
            Ok(line) => stats.record(&line),
            Err(e) => {
                // Async writers don't flush on drop.
                let _ = writer.flush().await;
                return Err(e);
            }
        }
    }

    writer.flush().await.map_err(SinkError::from)?;
    Ok(stats)
}
