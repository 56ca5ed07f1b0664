//! # Groupstream - streaming group-by exports
//!
//! Groupstream turns a sorted stream of flat join rows into one nested record
//! per key, serialized as NDJSON, without ever holding more than one group
//! in memory.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────┐    ┌───────────┐    ┌──────────┐
//! │  Source  │───▶│ GroupBy  │───▶│  build   │───▶│ serialize │───▶│   Sink   │
//! │  (rows)  │    │  (key)   │    │ (record) │    │  (line)   │    │ (writer) │
//! └──────────┘    └──────────┘    └──────────┘    └───────────┘    └──────────┘
//! ```
//!
//! Stages are lazy: the sink pulls one line, which pulls exactly as many rows
//! as it takes to close one group.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use groupstream::{export_reservations_file, ExportOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let stats = export_reservations_file(
//!         "reservations.csv".as_ref(),
//!         Some("reservations.ndjson".as_ref()),
//!         &ExportOptions::from_env(),
//!     )
//!     .await
//!     .unwrap();
//!     println!("Exported {} reservations", stats.lines);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Per-stage error types
//! - [`models`] - Reservation rows and records
//! - [`sequence`] - Blocking group-by and map adapters
//! - [`stream`] - Async group-by and map adapters
//! - [`source`] - CSV sources and the channel-backed async source
//! - [`sink`] - Line sinks and the drain loops
//! - [`transform`] - Builders, serialization and the pipeline driver
//! - [`config`] - Run options
//! - [`logs`] - Log broadcasting

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Sequence adapters
pub mod sequence;
pub mod stream;

// Endpoints
pub mod sink;
pub mod source;

// Transformation
pub mod transform;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    PipelineError,
    PipelineResult,
    SinkError,
    SourceError,
    Stage,
    TransformError,
    TransformResult,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Record, Reservation, ReservationLine, ReservationRow};

// =============================================================================
// Re-exports - Adapters
// =============================================================================

pub use sequence::{Group, GroupBy, SequenceExt, TryMap};
pub use stream::{GroupByStream, StreamSequenceExt, TryMapStream};

// =============================================================================
// Re-exports - Sources and sinks
// =============================================================================

pub use source::{detect_delimiter, spawn_source, ChannelSource, CsvSource};
pub use sink::{drain, drain_async, DrainStats, LineSink, WriterSink};

// =============================================================================
// Re-exports - Transform
// =============================================================================

pub use transform::{
    build_reservation,
    nest_group,
    reservation_key,
    to_json_line,
    NestSpec,
    RESERVATION_COLUMNS,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    export_reservations,
    export_reservations_file,
    nest_file,
    nest_records,
    run,
    run_async,
    ExportStats,
};

pub use config::ExportOptions;
