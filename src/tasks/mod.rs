//! # Task Operations
//!
//! Every operation resolves the task sheet and a fresh [`TableContext`] on entry,
//! reads one snapshot of the data rows and then applies its writes. Wall-clock
//! time and the notification recipient are inputs carried by [`Invocation`],
//! never ambient lookups.

pub mod archive;
pub mod edit;
pub mod ids;
pub mod notify;
pub mod reminder;
pub mod status;
pub mod summary;

use crate::config::LedgerConfig;
use crate::error::RustyLedgerError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use crate::table::locator::find_data_sheet;
use crate::table::TableContext;
use chrono::NaiveDateTime;
use uuid::Uuid;

static EMPTY_CELL: Cell = Cell::Empty;

/// Inputs of one top-level operation.
pub struct Invocation {
    /// The single timestamp used for every decision and stamp of the run
    pub now: NaiveDateTime,
    /// Glob pattern naming the task sheet
    pub sheet_pattern: String,
    pub archive_sheet_name: String,
    pub header_scan_rows: usize,
    pub recipient: String,
    id_generator: Box<dyn Fn() -> String>,
}

impl Invocation {
    pub fn new(config: &LedgerConfig, now: NaiveDateTime) -> Self {
        Self {
            now,
            sheet_pattern: config.sheet_name.to_owned(),
            archive_sheet_name: config.archive_sheet_name.to_owned(),
            header_scan_rows: config.header_scan_rows,
            recipient: config.recipient.to_owned(),
            id_generator: Box::new(|| Uuid::new_v4().to_string()),
        }
    }

    /// Replaces the task identifier source, random UUIDs by default.
    pub fn with_id_generator<F: Fn() -> String + 'static>(mut self, generator: F) -> Self {
        self.id_generator = Box::new(generator);
        self
    }

    pub fn next_task_id(&self) -> String {
        (self.id_generator)()
    }
}

/// The task sheet of a workbook with its resolved context and data snapshot.
pub(crate) struct TaskTable {
    pub(crate) sheet_name: String,
    pub(crate) context: TableContext,
    /// Data rows from the first row under the header to the last row with
    /// content, each padded to the table width
    pub(crate) rows: Vec<Vec<Cell>>,
}

impl TaskTable {
    pub(crate) fn load(workbook: &Workbook, invocation: &Invocation) -> Result<TaskTable, RustyLedgerError> {
        let sheet_name = find_data_sheet(workbook, &invocation.sheet_pattern, &invocation.archive_sheet_name)?;
        let sheet = workbook
            .sheet(&sheet_name)
            .ok_or_else(|| SpreadsheetError::SheetNotFound(sheet_name.to_owned()))?;
        let context = TableContext::resolve(sheet, invocation.header_scan_rows)?;
        let count = sheet.last_row().saturating_sub(context.header_row);
        let rows = sheet.values(context.data_start(), count, context.last_column);
        Ok(TaskTable {
            sheet_name,
            context,
            rows,
        })
    }

    /// 1-based sheet position of the data row at `index`.
    pub(crate) fn position(&self, index: usize) -> usize {
        self.context.data_start() + index
    }
}

/// The cell of an optional column; absent columns read as empty.
pub(crate) fn cell_at(row: &[Cell], col: Option<usize>) -> &Cell {
    col.and_then(|col| row.get(col)).unwrap_or(&EMPTY_CELL)
}
