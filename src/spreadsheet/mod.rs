//! # Ledger Store
//!
//! The in-memory table store the ledger operates on: an ordered collection of named
//! sheets whose rows are addressed by position. Workbooks persist as JSON documents
//! and can be imported from Excel `.xlsx` files.

pub mod cell;
pub mod reference;
pub mod sheet;
pub(crate) mod xlsx;
mod excel;

use crate::error::ResultMessage;
use crate::error::RustyLedgerError;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use serde::Deserialize;
use serde::Serialize;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

/// Errors raised by the ledger store.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Cannot detect file format for '{0}'")]
    InvalidFileFormat(String),

    #[error("Workbooks can only be saved as .json, not '{0}'")]
    UnsupportedOutputFormat(String),

    #[error("Missing part '{0}' in spreadsheet")]
    FileError(String),

    #[error("Spreadsheet '{0}' contains no sheets")]
    EmptySpreadsheet(String),

    #[error("Sheet '{0}' already exists")]
    DuplicateSheet(String),

    #[error("Sheet '{0}' not found")]
    SheetNotFound(String),

    #[error("Row {row} is out of range in sheet '{sheet}'")]
    RowOutOfRange { sheet: String, row: usize },

    #[error("Invalid cell position ({row}, {col}) in sheet '{sheet}'")]
    InvalidPosition { sheet: String, row: usize, col: usize },
}

/// Ordered collection of named sheets.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Workbook {
    #[serde(default)]
    sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn with_sheets(sheets: Vec<Sheet>) -> Self {
        Self { sheets }
    }

    /// Opens a workbook from a `.json` document or imports one from an `.xlsx`/`.xlsm` file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Workbook, RustyLedgerError> {
        let path = path.as_ref();
        let name = path.to_string_lossy().to_string();
        match extension(path).as_deref() {
            Some("json") => {
                let reader = BufReader::new(File::open(path)?);
                Ok(serde_json::from_reader(reader)?)
            }
            Some("xlsx") | Some("xlsm") => {
                let mut spreadsheet = XlsxSpreadsheet::open(path).with_prefix(&name)?;
                let sheets = spreadsheet.read_sheets().with_prefix(&name)?;
                Ok(Workbook { sheets })
            }
            _ => Err(SpreadsheetError::InvalidFileFormat(name))?,
        }
    }

    /// Saves the workbook as a JSON document.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), RustyLedgerError> {
        let path = path.as_ref();
        if extension(path).as_deref() != Some("json") {
            Err(SpreadsheetError::UnsupportedOutputFormat(path.to_string_lossy().to_string()))?
        }
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|sheet| sheet.name.to_owned()).collect()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|sheet| sheet.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|sheet| sheet.name == name)
    }

    /// Adds an empty sheet at the end of the workbook.
    pub fn insert_sheet(&mut self, name: &str) -> Result<&mut Sheet, SpreadsheetError> {
        if self.sheet(name).is_some() {
            return Err(SpreadsheetError::DuplicateSheet(name.to_owned()));
        }
        let index = self.sheets.len();
        self.sheets.push(Sheet::new(name));
        Ok(&mut self.sheets[index])
    }

    /// Borrows two distinct sheets mutably at once.
    pub fn sheet_pair_mut(&mut self, first: &str, second: &str) -> Result<(&mut Sheet, &mut Sheet), SpreadsheetError> {
        let index = |name: &str| {
            self.sheets
                .iter()
                .position(|sheet| sheet.name == name)
                .ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_owned()))
        };
        let (first, second) = (index(first)?, index(second)?);
        if first == second {
            return Err(SpreadsheetError::DuplicateSheet(self.sheets[first].name.to_owned()));
        }
        if first < second {
            let (head, tail) = self.sheets.split_at_mut(second);
            Ok((&mut head[first], &mut tail[0]))
        } else {
            let (head, tail) = self.sheets.split_at_mut(first);
            Ok((&mut tail[0], &mut head[second]))
        }
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::Cell;
    use chrono::NaiveDate;

    fn workbook() -> Workbook {
        Workbook::with_sheets(vec![
            Sheet::with_rows("Tasks", vec![
                vec![Cell::from("Task"), Cell::from("Due Date"), Cell::from("Done")],
                vec![
                    Cell::from("Write report"),
                    Cell::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()),
                    Cell::Boolean(false),
                ],
            ]),
            Sheet::new("Archive"),
        ])
    }

    #[test]
    fn json_round_trip() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("ledger.json");
        let workbook = workbook();

        workbook.save(&path).unwrap();
        assert_eq!(Workbook::open(&path).unwrap(), workbook);
    }

    #[test]
    fn rejects_unknown_formats() {
        let directory = tempfile::tempdir().unwrap();
        assert!(Workbook::open(directory.path().join("ledger.csv")).is_err());
        assert!(workbook().save(directory.path().join("ledger.xlsx")).is_err());
    }

    #[test]
    fn insert_sheet_refuses_duplicates() {
        let mut workbook = workbook();
        assert!(workbook.insert_sheet("Archive").is_err());
        workbook.insert_sheet("Notes").unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Tasks", "Archive", "Notes"]);
    }

    #[test]
    fn sheet_pair_borrows_both_orders() {
        let mut workbook = workbook();
        let (tasks, archive) = workbook.sheet_pair_mut("Tasks", "Archive").unwrap();
        assert_eq!((tasks.name.as_str(), archive.name.as_str()), ("Tasks", "Archive"));
        let (archive, tasks) = workbook.sheet_pair_mut("Archive", "Tasks").unwrap();
        assert_eq!((archive.name.as_str(), tasks.name.as_str()), ("Archive", "Tasks"));
        assert!(workbook.sheet_pair_mut("Tasks", "Tasks").is_err());
        assert!(workbook.sheet_pair_mut("Tasks", "Missing").is_err());
    }
}
