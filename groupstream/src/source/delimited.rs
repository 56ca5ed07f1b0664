//! Delimited-text (CSV) source.
//!
//! Reads one row per `next`, decoding it either into a serde type or into a
//! schema-less [`Record`]. Nothing beyond the current row is held in memory.

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek};
use std::marker::PhantomData;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::detect_delimiter;
use crate::error::{PipelineResult, SourceError, SourceResult};
use crate::models::Record;

type Decoder<T> = fn(&StringRecord, &StringRecord) -> SourceResult<T>;

/// Lazy CSV row source.
///
/// Each item is one decoded row or the error that stopped reading. After an
/// error the source is finished.
pub struct CsvSource<T, R = File> {
    reader: csv::Reader<R>,
    headers: StringRecord,
    row: StringRecord,
    decode: Decoder<T>,
    delimiter: char,
    finished: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> CsvSource<T, File> {
    /// Open a file of rows decoded into `T`.
    ///
    /// The delimiter is detected from the header line when `None`.
    pub fn open(path: impl AsRef<Path>, delimiter: Option<char>) -> SourceResult<Self> {
        let (file, delimiter) = open_detecting(path.as_ref(), delimiter)?;
        CsvSource::from_reader(file, delimiter)
    }
}

impl CsvSource<Record, File> {
    /// Open a file of schema-less rows.
    pub fn open_records(path: impl AsRef<Path>, delimiter: Option<char>) -> SourceResult<Self> {
        let (file, delimiter) = open_detecting(path.as_ref(), delimiter)?;
        CsvSource::records(file, delimiter)
    }
}

impl<T: DeserializeOwned, R: Read> CsvSource<T, R> {
    /// Rows decoded into `T` with serde, matching columns by header name.
    pub fn from_reader(reader: R, delimiter: char) -> SourceResult<Self> {
        Self::with_decoder(reader, delimiter, decode_typed::<T>)
    }
}

impl<R: Read> CsvSource<Record, R> {
    /// Rows as column-name maps. Empty cells become `null`.
    pub fn records(reader: R, delimiter: char) -> SourceResult<Self> {
        Self::with_decoder(reader, delimiter, decode_record)
    }
}

impl<T, R: Read> CsvSource<T, R> {
    fn with_decoder(reader: R, delimiter: char, decode: Decoder<T>) -> SourceResult<Self> {
        if !delimiter.is_ascii() {
            return Err(SourceError::InvalidDelimiter(delimiter));
        }

        let mut reader = ReaderBuilder::new()
            .delimiter(delimiter as u8)
            .has_headers(true)
            .trim(Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            row: StringRecord::new(),
            decode,
            delimiter,
            finished: false,
            _marker: PhantomData,
        })
    }

    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.headers.iter()
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    /// Check that every named column is present in the header.
    pub fn require_columns<S: AsRef<str>>(&self, columns: &[S]) -> SourceResult<()> {
        for column in columns {
            let column = column.as_ref();
            if !self.headers.iter().any(|h| h == column) {
                return Err(SourceError::MissingColumn(column.to_string()));
            }
        }
        Ok(())
    }
}

impl<T, R: Read> Iterator for CsvSource<T, R> {
    type Item = PipelineResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let decoded = match self.reader.read_record(&mut self.row) {
            Ok(true) => (self.decode)(&self.headers, &self.row),
            Ok(false) => {
                self.finished = true;
                return None;
            }
            Err(e) => Err(e.into()),
        };

        if decoded.is_err() {
            self.finished = true;
        }
        Some(decoded.map_err(Into::into))
    }
}

fn decode_typed<T: DeserializeOwned>(
    headers: &StringRecord,
    row: &StringRecord,
) -> SourceResult<T> {
    Ok(row.deserialize(Some(headers))?)
}

fn decode_record(headers: &StringRecord, row: &StringRecord) -> SourceResult<Record> {
    if row.len() != headers.len() {
        return Err(SourceError::Csv {
            line: row.position().map(|p| p.line()).unwrap_or(0),
            message: format!("expected {} fields, found {}", headers.len(), row.len()),
        });
    }

    Ok(headers
        .iter()
        .zip(row.iter())
        .map(|(name, cell)| {
            let value = if cell.is_empty() {
                Value::Null
            } else {
                Value::String(cell.to_string())
            };
            (name.to_string(), value)
        })
        .collect())
}

/// Open `path`, detecting the delimiter from its first line if needed.
fn open_detecting(path: &Path, delimiter: Option<char>) -> SourceResult<(File, char)> {
    let mut file = File::open(path)?;
    let delimiter = match delimiter {
        Some(d) => d,
        None => {
            let mut header_line = String::new();
            BufReader::new(&mut file).read_line(&mut header_line)?;
            file.rewind()?;
            detect_delimiter(&header_line)
        }
    };
    Ok((file, delimiter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PipelineError, Stage};
    use crate::models::ReservationRow;
    use std::cell::Cell;
    use std::io::Write;
    use std::rc::Rc;

    const ROWS: &str = "\
reservation_id;customer_id;line_id;sku;quantity
1;10;a;ROOM;2
1;10;b;BREAKFAST;2
2;11;;;
";

    #[test]
    fn test_typed_rows() {
        let source = CsvSource::<ReservationRow, _>::from_reader(ROWS.as_bytes(), ';').unwrap();
        let rows: Vec<ReservationRow> = source.collect::<Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], ReservationRow::with_line(1, 10, "a", "ROOM", 2));
        assert_eq!(rows[2], ReservationRow::without_line(2, 11));
    }

    #[test]
    fn test_schema_less_records() {
        let mut source = CsvSource::records(ROWS.as_bytes(), ';').unwrap();
        assert_eq!(
            source.headers().collect::<Vec<_>>(),
            vec!["reservation_id", "customer_id", "line_id", "sku", "quantity"]
        );

        let first = source.next().unwrap().unwrap();
        assert_eq!(first["sku"], "ROOM");
        let third = source.nth(1).unwrap().unwrap();
        assert_eq!(third["line_id"], Value::Null);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_header_only_input_is_empty() {
        let source = CsvSource::records("a,b\n".as_bytes(), ',').unwrap();
        assert_eq!(source.count(), 0);
    }

    #[test]
    fn test_records_keep_header_order() {
        let mut source = CsvSource::records("zeta,alpha,mid\n1,2,3\n".as_bytes(), ',').unwrap();
        let record = source.next().unwrap().unwrap();

        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"zeta":"1","alpha":"2","mid":"3"}"#);
    }

    #[test]
    fn test_require_columns() {
        let source = CsvSource::records(ROWS.as_bytes(), ';').unwrap();
        assert!(source.require_columns(&["reservation_id", "sku"]).is_ok());

        let err = source.require_columns(&["reservation_id", "price"]).unwrap_err();
        assert!(matches!(err, SourceError::MissingColumn(ref c) if c == "price"));
    }

    #[test]
    fn test_decode_error_carries_line_and_stops() {
        let data = "reservation_id,customer_id,line_id,sku,quantity\n\
                    1,10,a,X,1\n\
                    nope,10,b,Y,1\n\
                    3,10,c,Z,1\n";
        let mut source = CsvSource::<ReservationRow, _>::from_reader(data.as_bytes(), ',').unwrap();

        assert!(source.next().unwrap().is_ok());
        let err = source.next().unwrap().unwrap_err();
        assert_eq!(err.stage(), Stage::Source);
        assert!(matches!(
            err,
            PipelineError::Source(SourceError::Csv { line: 3, .. })
        ));
        assert!(source.next().is_none());
    }

    #[test]
    fn test_ragged_record_row_is_an_error() {
        let mut source = CsvSource::records("a,b\n1\n".as_bytes(), ',').unwrap();
        assert!(source.next().unwrap().is_err());
    }

    #[test]
    fn test_rejects_non_ascii_delimiter() {
        let err = CsvSource::records("a§b\n".as_bytes(), '§').err().unwrap();
        assert!(matches!(err, SourceError::InvalidDelimiter('§')));
    }

    #[test]
    fn test_open_detects_delimiter() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", ROWS).unwrap();

        let source = CsvSource::<ReservationRow>::open(file.path(), None).unwrap();
        assert_eq!(source.delimiter(), ';');
        assert_eq!(source.count(), 3);
    }

    #[test]
    fn test_open_missing_file() {
        let err = CsvSource::open_records("/definitely/not/here.csv", Some(',')).err().unwrap();
        assert!(matches!(err, SourceError::Io(_)));
    }

    /// Reader that records when it is dropped.
    struct TrackedReader {
        inner: std::io::Cursor<Vec<u8>>,
        dropped: Rc<Cell<bool>>,
    }

    impl Read for TrackedReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl Drop for TrackedReader {
        fn drop(&mut self) {
            self.dropped.set(true);
        }
    }

    #[test]
    fn test_early_stop_releases_reader() {
        let dropped = Rc::new(Cell::new(false));
        let reader = TrackedReader {
            inner: std::io::Cursor::new(ROWS.as_bytes().to_vec()),
            dropped: Rc::clone(&dropped),
        };

        let mut source = CsvSource::records(reader, ';').unwrap();
        assert!(source.next().unwrap().is_ok());
        assert!(!dropped.get());

        drop(source);
        assert!(dropped.get());
    }
}
