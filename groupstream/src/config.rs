//! Run options, from defaults, the environment and CLI flags.
//!
//! Environment variables (a `.env` file is loaded by the binary):
//!
//! | Variable                        | Meaning                               |
//! |---------------------------------|---------------------------------------|
//! | `GROUPSTREAM_DELIMITER`         | input delimiter, detected when unset  |
//! | `GROUPSTREAM_CHANNEL_CAPACITY`  | rows buffered between reader and pipeline |
//! | `GROUPSTREAM_QUIET`             | `1`/`true` silences stderr logging     |

use serde::{Deserialize, Serialize};

use crate::logs::log_warning;

pub const ENV_DELIMITER: &str = "GROUPSTREAM_DELIMITER";
pub const ENV_CHANNEL_CAPACITY: &str = "GROUPSTREAM_CHANNEL_CAPACITY";
pub const ENV_QUIET: &str = "GROUPSTREAM_QUIET";

/// Options for an export run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportOptions {
    /// Input delimiter; detected from the header line when `None`
    pub delimiter: Option<char>,

    /// Rows the async reader may run ahead of the pipeline
    pub channel_capacity: usize,

    /// Don't echo logs to stderr
    pub quiet: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            channel_capacity: 1,
            quiet: false,
        }
    }
}

impl ExportOptions {
    /// Defaults overridden by `GROUPSTREAM_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable lookup.
    ///
    /// Unparsable values are ignored with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();

        if let Some(raw) = lookup(ENV_DELIMITER) {
            match parse_delimiter(&raw) {
                Some(d) => options.delimiter = Some(d),
                None => log_warning(format!(
                    "Ignoring {}={:?}: expected one character",
                    ENV_DELIMITER, raw
                )),
            }
        }

        if let Some(raw) = lookup(ENV_CHANNEL_CAPACITY) {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => options.channel_capacity = n,
                _ => log_warning(format!(
                    "Ignoring {}={:?}: expected a positive integer",
                    ENV_CHANNEL_CAPACITY, raw
                )),
            }
        }

        if let Some(raw) = lookup(ENV_QUIET) {
            options.quiet = matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes");
        }

        options
    }
}

/// Parse a delimiter written as one character or as `\t` / `tab`.
pub fn parse_delimiter(raw: &str) -> Option<char> {
    if matches!(raw, "\\t" | "tab") {
        return Some('\t');
    }
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}
