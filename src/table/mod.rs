//! # Table Context
//!
//! Resolves the unpredictable layout of a task table: which row is the header,
//! and which physical column holds each logical field. A context is a snapshot
//! built fresh for every top-level operation, since the table may have been
//! restructured since the last read.

pub mod field;
pub mod header;
pub mod locator;

use crate::spreadsheet::sheet::Sheet;
use crate::table::field::Field;
use crate::table::header::find_column_loose;
use crate::table::header::HeaderMap;
use crate::table::locator::locate_header_row;
use crate::table::locator::row_labels;
use thiserror::Error;

/// Failures that stop every operation before it touches the table.
#[derive(Error, Debug)]
pub enum TableError {
    #[error("No header row with a status and a due date or task column in the first {rows} rows of sheet '{sheet}'")]
    HeaderNotFound { sheet: String, rows: usize },

    #[error("No sheet matches '{0}' and no sheet looks like a task table")]
    NoDataSheet(String),
}

/// The resolved binding between logical fields and physical columns of one sheet.
#[derive(Clone, Debug)]
pub struct TableContext {
    /// 1-based position of the header row
    pub header_row: usize,
    /// Raw header labels, one per column
    pub headers: Vec<String>,
    /// Number of columns of the table
    pub last_column: usize,
    map: HeaderMap,
}

impl TableContext {
    /// Locates the header within the first `scan_rows` rows and captures its labels.
    pub fn resolve(sheet: &Sheet, scan_rows: usize) -> Result<TableContext, TableError> {
        let header_row = locate_header_row(sheet, scan_rows)?;
        let headers = row_labels(sheet, header_row);
        Ok(TableContext {
            header_row,
            last_column: sheet.last_column(),
            map: HeaderMap::new(&headers),
            headers,
        })
    }

    /// 0-based column of the first matching candidate spelling.
    pub fn col(&self, candidates: &[&str]) -> Option<usize> {
        self.map.find(candidates)
    }

    /// 0-based column of a logical field: exact spellings first, then the
    /// field's loose stem if it has one.
    pub fn field(&self, field: Field) -> Option<usize> {
        self.col(field.candidates())
            .or_else(|| field.loose_stem().and_then(|stem| find_column_loose(&self.headers, stem)))
    }

    /// 1-based position of the first data row.
    pub fn data_start(&self) -> usize {
        self.header_row + 1
    }

    /// A column resolver bound to this snapshot's labels.
    pub fn resolver(&self) -> impl Fn(&[&str]) -> Option<usize> + '_ {
        move |candidates| self.col(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::cell::Cell;

    fn tasks() -> Sheet {
        Sheet::with_rows("Tasks", vec![
            vec![Cell::from("Team tasks")],
            vec![
                Cell::from("Task ID"),
                Cell::from("Task"),
                Cell::from("due date"),
                Cell::from("Status"),
                Cell::from("Reccuring"),
                Cell::from("Is Recurring"),
            ],
            vec![Cell::from("TASK-1"), Cell::from("Write"), Cell::Empty, Cell::from("Open")],
        ])
    }

    #[test]
    fn context_binds_fields_to_columns() {
        let context = TableContext::resolve(&tasks(), 10).unwrap();

        assert_eq!(context.header_row, 2);
        assert_eq!(context.data_start(), 3);
        assert_eq!(context.last_column, 6);
        assert_eq!(context.headers[2], "due date");
        assert_eq!(context.field(Field::TaskId), Some(0));
        assert_eq!(context.field(Field::DueDate), Some(2));
        assert_eq!(context.field(Field::Status), Some(3));
        assert_eq!(context.field(Field::Notes), None);

        let resolve = context.resolver();
        assert_eq!(resolve(&["Due"]), None);
        assert_eq!(resolve(&["Due", "Due Date"]), Some(2));
    }

    #[test]
    fn recurring_falls_back_to_stem() {
        let context = TableContext::resolve(&tasks(), 10).unwrap();
        assert_eq!(context.field(Field::Recurring), Some(5));
    }

    #[test]
    fn exact_recurring_spelling_beats_stem() {
        let sheet = Sheet::with_rows("Tasks", vec![vec![
            Cell::from("Task"),
            Cell::from("Status"),
            Cell::from("Recurrence note"),
            Cell::from("Recurring?"),
        ]]);
        let context = TableContext::resolve(&sheet, 10).unwrap();
        assert_eq!(context.field(Field::Recurring), Some(3));
    }
}
