use crate::error::{Error, Result};
use comfy_table::Table;
use comfy_table::presets::ASCII_FULL;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Returns the extension of `path` the way gpctl understands it: the segment
/// of the file name between the first and second `.`.
pub fn file_extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    name.split('.').nth(1).map(str::to_string)
}

/// Fails with a validation error unless `path` names a `.csv` file.
/// `action` completes the message, e.g. "You can only load csv files".
pub fn check_csv_extension(path: &Path, action: &str) -> Result<()> {
    match file_extension(path) {
        Some(ext) if ext == "csv" => Ok(()),
        Some(ext) => Err(Error::Validation(format!("{}, you provided a {}", action, ext))),
        None => Err(Error::Validation(format!(
            "{}, {} has no extension",
            action,
            path.display()
        ))),
    }
}

/// Writes a header record followed by one record per row.
pub struct CsvSink<W: Write> {
    writer: csv::Writer<W>,
    target: String,
    rows: usize,
}

impl CsvSink<File> {
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .map_err(|e| Error::io(format!("An error occurred when opening {}", path.display()), e))?;
        Ok(CsvSink::new(file, path.display().to_string()))
    }
}

impl<W: Write> CsvSink<W> {
    pub fn new(inner: W, target: String) -> Self {
        CsvSink {
            writer: csv::Writer::from_writer(inner),
            target,
            rows: 0,
        }
    }

    pub fn write_header(&mut self, columns: &[String]) -> Result<()> {
        self.writer.write_record(columns).map_err(|e| {
            Error::io(
                "An error occurred writing the column line to the output file",
                e.into(),
            )
        })
    }

    pub fn write_row(&mut self, row: &[String]) -> Result<()> {
        self.writer.write_record(row).map_err(|e| {
            Error::io(
                format!("Error writing line {} to {}", self.rows, self.target),
                e.into(),
            )
        })?;
        self.rows += 1;
        Ok(())
    }

    /// Flushes buffered records and returns the number of data rows written.
    pub fn finish(mut self) -> Result<usize> {
        self.writer
            .flush()
            .map_err(|e| Error::io(format!("Error writing to {}", self.target), e))?;
        Ok(self.rows)
    }
}

/// Collects rows for a bordered terminal table.
pub struct TableSink {
    table: Table,
    rows: usize,
}

impl TableSink {
    pub fn new(columns: &[String]) -> Self {
        let mut table = Table::new();
        table.load_preset(ASCII_FULL);
        table.set_header(columns);
        TableSink { table, rows: 0 }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.table.add_row(row);
        self.rows += 1;
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn render(&self) -> String {
        self.table.to_string()
    }
}
