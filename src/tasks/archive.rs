//! # Archive & Recurrence Engine
//!
//! Moves rows with a terminal status into the archive sheet, stamping each copy
//! with the archival time, and appends a fresh open occurrence for every
//! completed recurring task.
//!
//! Classification runs over one snapshot, from the last data row up. Mutations
//! follow a fixed order: archive append, then regenerated-row append, then all
//! deletions of the originals in descending position. A failure part way
//! through therefore leaves extra copies behind rather than losing rows.

use crate::error::RustyLedgerError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use crate::table::field::Field;
use crate::table::locator::row_labels;
use crate::tasks::cell_at;
use crate::tasks::status::Status;
use crate::tasks::status::OPEN_STATUS;
use crate::tasks::Invocation;
use crate::tasks::TaskTable;
use tracing::debug;
use tracing::info;
use tracing::warn;

/// Label of the trailing archive column holding the archival timestamp.
pub const DATE_ARCHIVED: &str = "Date Archived";

/// Why an archived row produced no new occurrence.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// Cancelled or postponed
    NotComplete,
    NotRecurring,
    /// Repeat interval missing or not positive
    InvalidInterval,
    /// Due date missing or unparseable
    MissingDueDate,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ArchiveOutcome {
    Regenerated { next_due: Cell },
    ArchivedOnly(SkipReason),
}

/// What happened to one archived row.
#[derive(Clone, Debug, PartialEq)]
pub struct RowOutcome {
    /// 1-based position of the row before the run
    pub row: usize,
    pub status: Status,
    pub outcome: ArchiveOutcome,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArchiveReport {
    /// Rows moved to the archive
    pub moved: usize,
    /// New occurrences appended to the task sheet
    pub regenerated: usize,
    /// One entry per moved row, bottom row first
    pub outcomes: Vec<RowOutcome>,
}

/// Columns the engine reads or writes, resolved once per run.
struct Columns {
    status: usize,
    due_date: Option<usize>,
    recurring: Option<usize>,
    repeat_every: Option<usize>,
    task_id: Option<usize>,
    last_modified: Option<usize>,
    email_notified: Option<usize>,
}

/// Makes sure the archive sheet exists and carries a `Date Archived` column;
/// returns that column's 0-based index.
fn ensure_archive_header(workbook: &mut Workbook, name: &str, source_headers: &[String]) -> Result<usize, RustyLedgerError> {
    if workbook.sheet(name).is_none() {
        info!(sheet = name, "Creating archive sheet");
        workbook.insert_sheet(name)?;
    }
    let archive = workbook
        .sheet_mut(name)
        .ok_or_else(|| SpreadsheetError::SheetNotFound(name.to_owned()))?;

    let headers = if archive.last_column() == 0 {
        Vec::new()
    } else {
        row_labels(archive, 1)
    };
    if headers.is_empty() {
        let mut cells: Vec<Cell> = source_headers
            .iter()
            .map(|label| if label.is_empty() { Cell::Empty } else { Cell::from(label.as_str()) })
            .collect();
        cells.push(Cell::from(DATE_ARCHIVED));
        archive.append_row(cells);
        return Ok(source_headers.len());
    }

    match headers.iter().position(|label| label == DATE_ARCHIVED) {
        Some(index) => Ok(index),
        None => {
            archive.set_value(1, headers.len() + 1, Cell::from(DATE_ARCHIVED))?;
            Ok(headers.len())
        }
    }
}

/// Copy of a source row for the archive: padded up to the timestamp column,
/// which is then set to `now`.
fn archive_copy(row: &[Cell], timestamp_col: usize, now: Cell, position: usize) -> Vec<Cell> {
    let mut copy = row.to_vec();
    if copy.len() <= timestamp_col {
        copy.resize(timestamp_col + 1, Cell::Empty);
    } else if !copy[timestamp_col].is_blank() {
        warn!(row = position, column = timestamp_col + 1, "Archival timestamp overwrites a source cell");
    }
    copy[timestamp_col] = now;
    copy
}

/// Decides whether a terminal row regenerates, and the next due date if so.
fn plan_recurrence(row: &[Cell], status: &Status, columns: &Columns, position: usize) -> ArchiveOutcome {
    if let Some(col) = columns.recurring {
        debug!(row = position, raw = %cell_at(row, Some(col)), "Recurring cell raw value");
    }
    let is_recurring = columns.recurring.is_some() && cell_at(row, columns.recurring).to_flag();
    let repeat_days = cell_at(row, columns.repeat_every).to_number_or_zero();
    let due = cell_at(row, columns.due_date).to_temporal();
    info!(
        row = position,
        %status,
        recurring = is_recurring,
        repeat_days,
        due = %due.as_ref().map(|due| due.to_string()).unwrap_or_default(),
        "Archiving row"
    );

    if *status != Status::Complete {
        return ArchiveOutcome::ArchivedOnly(SkipReason::NotComplete);
    }
    if !is_recurring {
        return ArchiveOutcome::ArchivedOnly(SkipReason::NotRecurring);
    }
    if repeat_days <= 0.0 {
        return ArchiveOutcome::ArchivedOnly(SkipReason::InvalidInterval);
    }
    match due {
        None => ArchiveOutcome::ArchivedOnly(SkipReason::MissingDueDate),
        // fractional intervals advance by whole days only
        Some(due) => match due.add_days(repeat_days.trunc() as u64) {
            Some(next_due) => ArchiveOutcome::Regenerated { next_due },
            None => ArchiveOutcome::ArchivedOnly(SkipReason::InvalidInterval),
        },
    }
}

/// The new open occurrence of a completed recurring row.
fn regenerate(row: &[Cell], next_due: &Cell, columns: &Columns, invocation: &Invocation) -> Vec<Cell> {
    let mut next = row.to_vec();
    next[columns.status] = Cell::from(OPEN_STATUS);
    if let Some(col) = columns.due_date {
        next[col] = next_due.clone();
    }
    if let Some(col) = columns.task_id {
        next[col] = Cell::from(invocation.next_task_id());
    }
    if let Some(col) = columns.email_notified {
        next[col] = Cell::Empty;
    }
    if let Some(col) = columns.last_modified {
        next[col] = Cell::DateTime(invocation.now);
    }
    next
}

fn log_outcome(position: usize, outcome: &ArchiveOutcome) {
    match outcome {
        ArchiveOutcome::Regenerated { next_due } => {
            info!(row = position, next_due = %next_due, "Recurring task re-created")
        }
        ArchiveOutcome::ArchivedOnly(SkipReason::NotComplete) => {
            info!(row = position, "Non-complete status archived, no recurrence")
        }
        ArchiveOutcome::ArchivedOnly(SkipReason::NotRecurring) => {
            info!(row = position, "Not recurring, archived only")
        }
        ArchiveOutcome::ArchivedOnly(SkipReason::InvalidInterval) => {
            info!(row = position, "Repeat interval invalid or zero, skipped re-create")
        }
        ArchiveOutcome::ArchivedOnly(SkipReason::MissingDueDate) => {
            info!(row = position, "Due date missing or invalid, skipped re-create")
        }
    }
}

/// Archives every terminal row of the task sheet and regenerates completed
/// recurring tasks.
///
/// A task sheet without a status column is left untouched and yields an empty
/// report. A missing header row or task sheet fails before any mutation.
pub fn archive_completed_tasks(workbook: &mut Workbook, invocation: &Invocation) -> Result<ArchiveReport, RustyLedgerError> {
    let table = TaskTable::load(workbook, invocation)?;
    let context = &table.context;
    let columns = match context.field(Field::Status) {
        Some(status) => Columns {
            status,
            due_date: context.field(Field::DueDate),
            recurring: context.field(Field::Recurring),
            repeat_every: context.field(Field::RepeatEvery),
            task_id: context.field(Field::TaskId),
            last_modified: context.field(Field::LastModified),
            email_notified: context.field(Field::EmailNotified),
        },
        None => {
            warn!(sheet = %table.sheet_name, "Missing \"Status\" column, nothing archived");
            return Ok(ArchiveReport::default());
        }
    };
    debug!(headers = ?context.headers, recurring = ?columns.recurring, "Detected headers");

    let timestamp_col = ensure_archive_header(workbook, &invocation.archive_sheet_name, &context.headers)?;
    let (main, archive) = workbook.sheet_pair_mut(&table.sheet_name, &invocation.archive_sheet_name)?;

    let mut report = ArchiveReport::default();
    let mut rows_to_delete = Vec::<usize>::new();
    for (index, row) in table.rows.iter().enumerate().rev() {
        let position = table.position(index);
        let status = Status::classify(cell_at(row, Some(columns.status)));
        if !status.is_terminal() {
            continue;
        }

        archive.append_row(archive_copy(row, timestamp_col, Cell::DateTime(invocation.now), position));

        let outcome = plan_recurrence(row, &status, &columns, position);
        if let ArchiveOutcome::Regenerated { next_due } = &outcome {
            main.append_row(regenerate(row, next_due, &columns, invocation));
            report.regenerated += 1;
        }
        log_outcome(position, &outcome);

        rows_to_delete.push(position);
        report.outcomes.push(RowOutcome {
            row: position,
            status,
            outcome,
        });
    }

    delete_rows(main, rows_to_delete)?;
    report.moved = report.outcomes.len();
    info!(moved = report.moved, regenerated = report.regenerated, "Archived completed rows");
    Ok(report)
}

/// Deletes rows highest position first, so every position stays valid until
/// its own deletion.
fn delete_rows(sheet: &mut Sheet, mut positions: Vec<usize>) -> Result<(), RustyLedgerError> {
    positions.sort_unstable_by(|a, b| b.cmp(a));
    positions.dedup();
    for position in positions {
        sheet.delete_row(position)?;
    }
    Ok(())
}
