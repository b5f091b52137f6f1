//! CSV row source and sink
//!
//! The input file must carry a header row with a `CPF_CNPJ` column; every
//! other column passes through untouched. The output file repeats the input
//! columns and appends the four enrichment columns (`Prospect`,
//! `numero_negociacao`, `numero_instalacao`, `erros`), kept verbatim for
//! compatibility with the original spreadsheet flow.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use prospector_core::{RowSink, RowSource};
use prospector_domain::{InputRow, ProspectorError, Result, RowOutcome};

const TAX_ID_COLUMN: &str = "CPF_CNPJ";
const OUTPUT_COLUMNS: [&str; 4] = ["Prospect", "numero_negociacao", "numero_instalacao", "erros"];

fn io_err(context: &str, err: impl std::fmt::Display) -> ProspectorError {
    ProspectorError::Io(format!("{context}: {err}"))
}

/// CSV-backed [`RowSource`]
pub struct CsvRowSource<R: Read> {
    reader: csv::Reader<R>,
    headers: Vec<String>,
    tax_id_index: usize,
}

impl CsvRowSource<File> {
    /// Open a CSV file as a row source.
    ///
    /// # Errors
    /// Returns `ProspectorError::Io` when the file cannot be read and
    /// `ProspectorError::InvalidInput` when the `CPF_CNPJ` column is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::open(path).map_err(|e| io_err(&format!("opening {}", path.display()), e))?;
        Self::from_reader(file)
    }
}

impl<R: Read> CsvRowSource<R> {
    /// Wrap any reader producing CSV with a header row.
    ///
    /// # Errors
    /// Same conditions as [`CsvRowSource::open`].
    pub fn from_reader(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| io_err("reading CSV header", e))?
            .iter()
            .map(str::to_string)
            .collect();

        let tax_id_index =
            headers.iter().position(|h| h == TAX_ID_COLUMN).ok_or_else(|| {
                ProspectorError::InvalidInput(format!("input is missing a {TAX_ID_COLUMN} column"))
            })?;

        Ok(Self { reader, headers, tax_id_index })
    }
}

impl<R: Read + Send> RowSource for CsvRowSource<R> {
    fn headers(&self) -> &[String] {
        &self.headers
    }

    fn next_row(&mut self) -> Result<Option<InputRow>> {
        let mut record = csv::StringRecord::new();
        let more = self
            .reader
            .read_record(&mut record)
            .map_err(|e| io_err("reading CSV record", e))?;
        if !more {
            return Ok(None);
        }

        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        let tax_id = fields.get(self.tax_id_index).cloned().unwrap_or_default();
        Ok(Some(InputRow { tax_id, fields }))
    }
}

/// CSV-backed [`RowSink`]
///
/// The header row is written on construction so that even an empty run
/// produces a well-formed file.
pub struct CsvRowSink<W: Write> {
    writer: csv::Writer<W>,
}

impl CsvRowSink<File> {
    /// Create the output file and write its header row.
    ///
    /// # Errors
    /// Returns `ProspectorError::Io` when the file cannot be created or
    /// written.
    pub fn create(path: impl AsRef<Path>, input_headers: &[String]) -> Result<Self> {
        let path = path.as_ref();
        let file =
            File::create(path).map_err(|e| io_err(&format!("creating {}", path.display()), e))?;
        Self::from_writer(file, input_headers)
    }
}

impl<W: Write> CsvRowSink<W> {
    /// Wrap any writer, emitting the header row immediately.
    ///
    /// # Errors
    /// Returns `ProspectorError::Io` when the header cannot be written.
    pub fn from_writer(writer: W, input_headers: &[String]) -> Result<Self> {
        let mut writer = csv::Writer::from_writer(writer);
        let header: Vec<&str> = input_headers
            .iter()
            .map(String::as_str)
            .chain(OUTPUT_COLUMNS)
            .collect();
        writer.write_record(&header).map_err(|e| io_err("writing CSV header", e))?;
        Ok(Self { writer })
    }
}

impl<W: Write + Send> RowSink for CsvRowSink<W> {
    fn write(&mut self, row: &InputRow, outcome: &RowOutcome) -> Result<()> {
        let record: Vec<&str> = row
            .fields
            .iter()
            .map(String::as_str)
            .chain([
                outcome.prospect_code.as_str(),
                outcome.negotiation_number.as_str(),
                outcome.installation_numbers.as_str(),
                outcome.errors.as_str(),
            ])
            .collect();
        self.writer.write_record(&record).map_err(|e| io_err("writing CSV record", e))
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush().map_err(|e| io_err("flushing CSV output", e))
    }
}
