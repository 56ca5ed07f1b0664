//! Error types for the groupstream pipeline.
//!
//! One error type per pipeline layer:
//!
//! - [`SourceError`] - reading rows from the upstream source
//! - [`TransformError`] - building domain records and serializing them
//! - [`SinkError`] - persisting serialized lines
//! - [`PipelineError`] - top-level error carrying the failing [`Stage`]
//!
//! Conversion into [`PipelineError`] is automatic via `From` for the source,
//! transform and sink layers, so `?` works inside stage closures.

use std::fmt;

use thiserror::Error;

// =============================================================================
// Source Errors
// =============================================================================

/// Errors while producing the next row from a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Failed to open or read the underlying input.
    #[error("Failed to read input: {0}")]
    Io(#[from] std::io::Error),

    /// A row could not be read or decoded.
    #[error("Line {line}: {message}")]
    Csv { line: u64, message: String },

    /// The delimiter is not a single-byte character.
    #[error("Invalid delimiter '{0}': must be a single ASCII character")]
    InvalidDelimiter(char),

    /// A column required by the pipeline is absent from the header.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// The producer feeding an async source went away before finishing.
    #[error("Source producer disconnected: {0}")]
    Disconnected(String),
}

impl From<csv::Error> for SourceError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(e) => SourceError::Io(e),
            _ => SourceError::Csv { line, message },
        }
    }
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Errors while turning a group into a domain record or a record into a line.
#[derive(Debug, Error)]
pub enum TransformError {
    /// A child row has some child fields set and others null.
    #[error("Partial child row in group '{key}': field '{field}' is null while '{other}' is set")]
    PartialChildRow {
        key: String,
        field: String,
        other: String,
    },

    /// A row inside a group disagrees with the first row on a parent field.
    #[error("Inconsistent parent field '{field}' in group '{key}'")]
    InconsistentParent { key: String, field: String },

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Sink Errors
// =============================================================================

/// Errors while persisting serialized lines.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Write or flush failed.
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Pipeline stage that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Source,
    Transform,
    Serialize,
    Sink,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Source => "source",
            Stage::Transform => "transform",
            Stage::Serialize => "serialize",
            Stage::Sink => "sink",
        };
        f.write_str(name)
    }
}

/// Top-level pipeline error.
///
/// Every run either completes or stops at the first of these. The variant
/// names the stage that failed and wraps the underlying cause.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The source failed while producing a row.
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Building a domain record from a group failed.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Encoding a domain record as a line failed.
    #[error("Serialize error: {0}")]
    Serialize(#[source] TransformError),

    /// The sink failed while persisting a line.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

impl PipelineError {
    /// Stage at which the pipeline stopped.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::Source(_) => Stage::Source,
            PipelineError::Transform(_) => Stage::Transform,
            PipelineError::Serialize(_) => Stage::Serialize,
            PipelineError::Sink(_) => Stage::Sink,
        }
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source operations.
pub type SourceResult<T> = Result<T, SourceError>;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let source_err = SourceError::MissingColumn("reservation_id".into());
        let pipeline_err: PipelineError = source_err.into();
        assert_eq!(pipeline_err.stage(), Stage::Source);
        assert!(pipeline_err.to_string().contains("reservation_id"));

        let transform_err = TransformError::InconsistentParent {
            key: "3".into(),
            field: "customer_id".into(),
        };
        let pipeline_err: PipelineError = transform_err.into();
        assert_eq!(pipeline_err.stage(), Stage::Transform);
        assert!(pipeline_err.to_string().contains("customer_id"));

        let sink_err = SinkError::Io(std::io::Error::other("disk full"));
        let pipeline_err: PipelineError = sink_err.into();
        assert_eq!(pipeline_err.stage(), Stage::Sink);
        assert!(pipeline_err.to_string().contains("disk full"));
    }

    #[test]
    fn test_partial_child_row_format() {
        let err = TransformError::PartialChildRow {
            key: "7".into(),
            field: "line_id".into(),
            other: "sku".into(),
        };
        let msg = err.to_string();
        assert!(msg.contains("'7'"));
        assert!(msg.contains("line_id"));
        assert!(msg.contains("sku"));
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(Stage::Serialize.to_string(), "serialize");
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = PipelineError::Serialize(json_err.into());
        assert_eq!(err.stage(), Stage::Serialize);
    }
}
