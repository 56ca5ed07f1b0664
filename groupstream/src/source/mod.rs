//! Source adapters: ordered rows in, lazily.
//!
//! A source is anything iterable as `PipelineResult<T>` in key order. This
//! module ships a CSV reader ([`CsvSource`]) and a bridge that runs any
//! blocking source on its own thread behind a bounded channel
//! ([`spawn_source`]) for the async pipeline.
//!
//! Dropping a source releases what it holds (file handle, producer thread).

pub mod channel;
pub mod delimited;

pub use self::channel::{spawn_source, ChannelSource};
pub use self::delimited::CsvSource;

/// Candidate delimiters, in tie-break order.
const DELIMITERS: [char; 4] = [',', ';', '\t', '|'];

/// Detect the delimiter by counting occurrences in the header line.
///
/// Falls back to `,` when no candidate occurs.
pub fn detect_delimiter(header_line: &str) -> char {
    let mut best = ',';
    let mut best_count = 0;

    for &sep in &DELIMITERS {
        let count = header_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best = sep;
        }
    }

    best
}

/// Printable form of a delimiter (`\t` for tab).
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c"), ',');
        assert_eq!(detect_delimiter("a;b;c"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("a;b,c;d"), ';');
    }

    #[test]
    fn test_detect_delimiter_defaults_to_comma() {
        assert_eq!(detect_delimiter("single_column"), ',');
        assert_eq!(detect_delimiter(""), ',');
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "\\t");
        assert_eq!(format_delimiter(';'), ";");
    }
}
