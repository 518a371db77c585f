//! Row Sinks
//!
//! Rows reach a sink one at a time, in record order. The sink owns
//! durability: the extractor never retries a failed `emit`.

use crate::error::SinkError;
use crate::rules::Row;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Destination for extracted rows
pub trait RowSink {
    /// Called once with the column names before the first row
    fn begin(&mut self, _columns: &[String]) -> Result<(), SinkError> {
        Ok(())
    }

    fn emit(&mut self, row: Row) -> Result<(), SinkError>;

    /// Called once after the last row of a clean run
    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl RowSink for Vec<Row> {
    fn emit(&mut self, row: Row) -> Result<(), SinkError> {
        self.push(row);
        Ok(())
    }
}

/// CSV output: a header of column names, then one line per record
///
/// Absent values are written as empty fields.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    width: Option<usize>,
}

impl<W: Write> CsvSink<W> {
    pub fn new(writer: W) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(writer),
            width: None,
        }
    }
}

impl CsvSink<File> {
    /// Create (or truncate) a CSV file
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> RowSink for CsvSink<W> {
    fn begin(&mut self, columns: &[String]) -> Result<(), SinkError> {
        self.writer.write_record(columns)?;
        self.width = Some(columns.len());
        Ok(())
    }

    fn emit(&mut self, row: Row) -> Result<(), SinkError> {
        if let Some(expected) = self.width {
            if row.len() != expected {
                return Err(SinkError::RowWidth {
                    expected,
                    got: row.len(),
                });
            }
        }
        self.writer
            .write_record(row.values.iter().map(|v| v.as_deref().unwrap_or("")))?;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[Option<&str>]) -> Row {
        Row {
            values: values.iter().map(|v| v.map(str::to_owned)).collect(),
        }
    }

    #[test]
    fn test_csv_output() {
        let mut buf = Vec::new();
        let mut sink = CsvSink::new(&mut buf);
        sink.begin(&["id".to_string(), "name".to_string()]).unwrap();
        sink.emit(row(&[Some("1"), Some("a, \"quoted\"")])).unwrap();
        sink.emit(row(&[Some("2"), None])).unwrap();
        sink.finish().unwrap();
        drop(sink);

        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out, "id,name\n1,\"a, \"\"quoted\"\"\"\n2,\n");
    }

    #[test]
    fn test_csv_rejects_wrong_width() {
        let mut sink = CsvSink::new(Vec::new());
        sink.begin(&["id".to_string()]).unwrap();
        let err = sink.emit(row(&[Some("1"), Some("2")])).unwrap_err();
        assert!(matches!(err, SinkError::RowWidth { expected: 1, got: 2 }));
    }

    #[test]
    fn test_vec_sink_keeps_order() {
        let mut rows: Vec<Row> = Vec::new();
        rows.emit(row(&[Some("1")])).unwrap();
        rows.emit(row(&[Some("2")])).unwrap();
        assert_eq!(rows[0].get(0), Some("1"));
        assert_eq!(rows[1].get(0), Some("2"));
    }
}
