//! Spreadsheet output for report exports.
//!
//! [`XlsxWriter`] implements the core [`TabularWriter`] seam with
//! `rust_xlsxwriter`: a single sheet named `Sheet1`, a bold header row, then
//! one row per record.

use std::path::PathBuf;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use sr_core::{Artifact, Cell, Table, TabularWriter, WriterError};
use thiserror::Error;

/// Default name of the exported file.
pub const DEFAULT_FILE_NAME: &str = "data.xlsx";

/// Name of the only worksheet.
pub const SHEET_NAME: &str = "Sheet1";

/// Spreadsheet writer errors.
#[derive(Debug, Error)]
pub enum XlsxError {
    /// Could not create the output directory.
    #[error("failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The workbook could not be built or saved.
    #[error("failed to write workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
    /// More rows than a worksheet can hold.
    #[error("report has {rows} rows, more than a worksheet can hold")]
    TooManyRows { rows: usize },
}

impl From<XlsxError> for WriterError {
    fn from(e: XlsxError) -> Self {
        Self::new(e)
    }
}

/// Writes export tables to `<dir>/<file_name>`, replacing any previous file.
#[derive(Debug, Clone)]
pub struct XlsxWriter {
    dir: PathBuf,
    file_name: String,
}

impl XlsxWriter {
    pub fn new(dir: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            file_name: file_name.into(),
        }
    }

    /// Writer producing [`DEFAULT_FILE_NAME`] inside `dir`.
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self::new(dir, DEFAULT_FILE_NAME)
    }

    /// Full path of the file this writer produces.
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    fn write_table(&self, table: &Table) -> Result<Artifact, XlsxError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| XlsxError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path();
        let workbook_err = |source| XlsxError::Workbook {
            path: path.clone(),
            source,
        };

        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name(SHEET_NAME).map_err(workbook_err)?;
        fill_sheet(sheet, table).map_err(|e| match e {
            FillError::Xlsx(source) => workbook_err(source),
            FillError::TooManyRows => XlsxError::TooManyRows {
                rows: table.rows.len(),
            },
        })?;
        workbook.save(&path).map_err(workbook_err)?;

        tracing::debug!(path = %path.display(), rows = table.rows.len(), "workbook saved");
        Ok(Artifact {
            path,
            rows: table.rows.len(),
        })
    }
}

impl TabularWriter for XlsxWriter {
    fn write(&self, table: &Table) -> Result<Artifact, WriterError> {
        Ok(self.write_table(table)?)
    }
}

enum FillError {
    Xlsx(rust_xlsxwriter::XlsxError),
    TooManyRows,
}

impl From<rust_xlsxwriter::XlsxError> for FillError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(e)
    }
}

fn fill_sheet(sheet: &mut Worksheet, table: &Table) -> Result<(), FillError> {
    let bold = Format::new().set_bold();
    for (col, header) in (0u16..).zip(&table.headers) {
        sheet.write_string_with_format(0, col, header, &bold)?;
    }

    for (index, row) in table.rows.iter().enumerate() {
        let line = u32::try_from(index + 1).map_err(|_| FillError::TooManyRows)?;
        for (col, cell) in (0u16..).zip(row) {
            match cell {
                Cell::Integer(n) => {
                    #[expect(
                        clippy::cast_precision_loss,
                        reason = "serial numbers stay far below 2^52"
                    )]
                    let value = *n as f64;
                    sheet.write_number(line, col, value)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(line, col, s)?;
                }
            }
        }
    }

    sheet.autofit();
    Ok(())
}
