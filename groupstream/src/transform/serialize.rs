//! Encode domain records as self-contained NDJSON lines.

use serde::Serialize;

use crate::error::TransformResult;

/// Compact JSON text of `value` followed by a single `\n`.
///
/// Each line stands alone, so a consumer can process output one line at a
/// time without reading the rest.
pub fn to_json_line<T: Serialize + ?Sized>(value: &T) -> TransformResult<String> {
    let mut line = serde_json::to_string(value)?;
    line.push('\n');
    Ok(line)
}
