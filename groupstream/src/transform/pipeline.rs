//! Pipeline driver: source → group → build → serialize → sink.
//!
//! [`run`] and [`run_async`] compose the stages for any row type, key,
//! domain record and serializer. The `export_*` and `nest_*` functions are
//! ready-made assemblies reading CSV and writing NDJSON.
//!
//! # Example
//!
//! ```
//! use groupstream::{run, to_json_line, Reservation, ReservationRow, PipelineResult};
//!
//! let rows: Vec<PipelineResult<ReservationRow>> = vec![
//!     Ok(ReservationRow::with_line(1, 10, "a", "ROOM", 1)),
//!     Ok(ReservationRow::with_line(1, 10, "b", "BREAKFAST", 2)),
//!     Ok(ReservationRow::without_line(2, 11)),
//! ];
//!
//! let mut lines: Vec<String> = Vec::new();
//! let stats = run(
//!     rows,
//!     |row: &ReservationRow| row.reservation_id,
//!     groupstream::build_reservation,
//!     |r: Reservation| to_json_line(&r),
//!     &mut lines,
//! )
//! .unwrap();
//!
//! assert_eq!(stats.lines, 2);
//! assert!(lines[1].starts_with("{\"id\":2"));
//! ```

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Instant;

use futures::Stream;
use serde::Serialize;
use tokio::io::AsyncWrite;

use super::grouper::{nest_group, NestSpec};
use super::reservation::{build_reservation, reservation_key, RESERVATION_COLUMNS};
use super::serialize::to_json_line;
use crate::config::ExportOptions;
use crate::error::{PipelineError, PipelineResult, SinkError, SourceResult, TransformResult};
use crate::logs::RunLog;
use crate::models::{Record, ReservationRow};
use crate::sequence::{Group, SequenceExt};
use crate::sink::{drain, drain_async, DrainStats, LineSink, WriterSink};
use crate::source::{format_delimiter, spawn_source, CsvSource};
use crate::stream::StreamSequenceExt;

/// Totals of a completed run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStats {
    /// Source rows consumed
    pub rows: usize,
    /// Lines written, one per group
    pub lines: usize,
    /// Bytes written
    pub bytes: usize,
    pub elapsed_ms: u64,
}

impl ExportStats {
    fn finish(rows: usize, drained: DrainStats, started: Instant, log: RunLog) -> Self {
        let stats = Self {
            rows,
            lines: drained.lines,
            bytes: drained.bytes,
            elapsed_ms: started.elapsed().as_millis() as u64,
        };
        log.success(format!("Wrote {} records from {} rows", stats.lines, stats.rows));
        log.info_indent(format!("{} bytes in {} ms", stats.bytes, stats.elapsed_ms), 1);
        stats
    }
}

fn report(log: RunLog, err: PipelineError) -> PipelineError {
    log.error(format!("Pipeline stopped at {} stage: {}", err.stage(), err));
    err
}

// =============================================================================
// Generic drivers
// =============================================================================

/// Run the blocking pipeline to completion or to the first error.
///
/// `source` must yield rows sorted by `key_fn`. `build` turns each group into
/// a domain record and `serialize` turns that into one line. Failures from
/// `build` are reported as [`Stage::Transform`](crate::Stage::Transform),
/// failures from `serialize` as [`Stage::Serialize`](crate::Stage::Serialize).
pub fn run<S, T, K, D, KF, BF, SF, W>(
    source: S,
    key_fn: KF,
    build: BF,
    serialize: SF,
    sink: &mut W,
) -> PipelineResult<ExportStats>
where
    S: IntoIterator<Item = PipelineResult<T>>,
    KF: FnMut(&T) -> K,
    K: PartialEq,
    BF: FnMut(Group<K, T>) -> TransformResult<D>,
    SF: FnMut(D) -> TransformResult<String>,
    W: LineSink + ?Sized,
{
    run_logged(source, key_fn, build, serialize, sink, RunLog::default())
}

fn run_logged<S, T, K, D, KF, BF, SF, W>(
    source: S,
    mut key_fn: KF,
    mut build: BF,
    mut serialize: SF,
    sink: &mut W,
    log: RunLog,
) -> PipelineResult<ExportStats>
where
    S: IntoIterator<Item = PipelineResult<T>>,
    KF: FnMut(&T) -> K,
    K: PartialEq,
    BF: FnMut(Group<K, T>) -> TransformResult<D>,
    SF: FnMut(D) -> TransformResult<String>,
    W: LineSink + ?Sized,
{
    let started = Instant::now();
    let mut rows = 0;

    let lines = source
        .into_iter()
        .group_by_key(|row: &T| {
            rows += 1;
            key_fn(row)
        })
        .try_map(|group| build(group).map_err(PipelineError::Transform))
        .try_map(|record| serialize(record).map_err(PipelineError::Serialize));

    let drained = drain(lines, sink).map_err(|e| report(log, e))?;
    Ok(ExportStats::finish(rows, drained, started, log))
}

/// Async counterpart of [`run`], writing to any `AsyncWrite`.
pub async fn run_async<S, T, K, D, KF, BF, SF, W>(
    source: S,
    key_fn: KF,
    build: BF,
    serialize: SF,
    writer: &mut W,
) -> PipelineResult<ExportStats>
where
    S: Stream<Item = PipelineResult<T>> + Unpin,
    KF: FnMut(&T) -> K,
    K: PartialEq,
    BF: FnMut(Group<K, T>) -> TransformResult<D>,
    SF: FnMut(D) -> TransformResult<String>,
    W: AsyncWrite + Unpin + ?Sized,
{
    run_async_logged(source, key_fn, build, serialize, writer, RunLog::default()).await
}

async fn run_async_logged<S, T, K, D, KF, BF, SF, W>(
    source: S,
    mut key_fn: KF,
    mut build: BF,
    mut serialize: SF,
    writer: &mut W,
    log: RunLog,
) -> PipelineResult<ExportStats>
where
    S: Stream<Item = PipelineResult<T>> + Unpin,
    KF: FnMut(&T) -> K,
    K: PartialEq,
    BF: FnMut(Group<K, T>) -> TransformResult<D>,
    SF: FnMut(D) -> TransformResult<String>,
    W: AsyncWrite + Unpin + ?Sized,
{
    let started = Instant::now();
    let mut rows = 0;

    let lines = source
        .group_by_key(|row: &T| {
            rows += 1;
            key_fn(row)
        })
        .try_map(|group| build(group).map_err(PipelineError::Transform))
        .try_map(|record| serialize(record).map_err(PipelineError::Serialize));

    let drained = drain_async(lines, writer).await.map_err(|e| report(log, e))?;
    Ok(ExportStats::finish(rows, drained, started, log))
}

// =============================================================================
// Reservation export
// =============================================================================

/// Export reservations from CSV rows (sorted by `reservation_id`) as NDJSON.
///
/// The delimiter defaults to `,` when the options leave it unset.
pub fn export_reservations<R: Read, W: Write>(
    input: R,
    output: W,
    options: &ExportOptions,
) -> PipelineResult<ExportStats> {
    let log = RunLog::new(options.quiet);
    let delimiter = options.delimiter.unwrap_or(',');
    let source = CsvSource::<ReservationRow, R>::from_reader(input, delimiter);
    let source = checked(source, &RESERVATION_COLUMNS, log)?;

    let mut sink = WriterSink::new(output);
    run_logged(
        source,
        reservation_key,
        build_reservation,
        |r| to_json_line(&r),
        &mut sink,
        log,
    )
}

/// Export reservations from a CSV file, writing NDJSON to `output` or stdout.
///
/// The file is read on a blocking thread and fed through a bounded channel
/// of `options.channel_capacity` rows. Must run inside a tokio runtime.
pub async fn export_reservations_file(
    input: &Path,
    output: Option<&Path>,
    options: &ExportOptions,
) -> PipelineResult<ExportStats> {
    let log = RunLog::new(options.quiet);
    log.info(format!("Reading {}", input.display()));

    let source = CsvSource::<ReservationRow>::open(input, options.delimiter);
    let source = checked(source, &RESERVATION_COLUMNS, log)?;
    log.info_indent(format!("Delimiter: '{}'", format_delimiter(source.delimiter())), 1);
    let rows = spawn_source(source, options.channel_capacity);

    let writer: Box<dyn AsyncWrite + Unpin + Send> = match output {
        Some(path) => Box::new(
            tokio::fs::File::create(path)
                .await
                .map_err(|e| report(log, SinkError::from(e).into()))?,
        ),
        None => Box::new(tokio::io::stdout()),
    };
    let mut writer = tokio::io::BufWriter::new(writer);

    run_async_logged(
        rows,
        reservation_key,
        build_reservation,
        |r| to_json_line(&r),
        &mut writer,
        log,
    )
    .await
}

// =============================================================================
// Generic nesting
// =============================================================================

/// Nest schema-less CSV rows (sorted by `spec.key`) into NDJSON objects.
pub fn nest_records<R: Read, W: Write>(
    input: R,
    output: W,
    spec: &NestSpec,
    options: &ExportOptions,
) -> PipelineResult<ExportStats> {
    let log = RunLog::new(options.quiet);
    let source = CsvSource::records(input, options.delimiter.unwrap_or(','));
    let source = checked(source, &spec.required_columns(), log)?;

    nest_source(source, output, spec, log)
}

/// Nest a CSV file, writing NDJSON to `output` or stdout.
pub fn nest_file(
    input: &Path,
    output: Option<&Path>,
    spec: &NestSpec,
    options: &ExportOptions,
) -> PipelineResult<ExportStats> {
    let log = RunLog::new(options.quiet);
    log.info(format!("Reading {}", input.display()));

    let source = CsvSource::open_records(input, options.delimiter);
    let source = checked(source, &spec.required_columns(), log)?;
    log.info_indent(format!("Delimiter: '{}'", format_delimiter(source.delimiter())), 1);
    log.info_indent(format!("Grouping by '{}'", spec.key), 1);

    let output: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path).map_err(|e| report(log, SinkError::from(e).into()))?;
            Box::new(file)
        }
        None => Box::new(io::stdout().lock()),
    };
    nest_source(source, output, spec, log)
}

fn nest_source<R: Read, W: Write>(
    source: CsvSource<Record, R>,
    output: W,
    spec: &NestSpec,
    log: RunLog,
) -> PipelineResult<ExportStats> {
    let mut sink = WriterSink::new(output);
    run_logged(
        source,
        |record: &Record| spec.key_of(record),
        |group| nest_group(spec, group),
        |value| to_json_line(&value),
        &mut sink,
        log,
    )
}

/// Check required columns and report open failures.
fn checked<T, R: Read>(
    source: SourceResult<CsvSource<T, R>>,
    columns: &[&str],
    log: RunLog,
) -> PipelineResult<CsvSource<T, R>> {
    source
        .and_then(|s| {
            s.require_columns(columns)?;
            Ok(s)
        })
        .map_err(|e| report(log, e.into()))
}
