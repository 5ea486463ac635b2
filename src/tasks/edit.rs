use crate::error::RustyLedgerError;
use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Workbook;
use crate::table::field::Field;
use crate::tasks::Invocation;
use crate::tasks::TaskTable;
use tracing::debug;

/// What an edit stamp changed.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct EditStamp {
    /// Last Modified was set to now
    pub modified: bool,
    /// Email Notified was cleared because the due date moved
    pub notification_reset: bool,
}

/// Records a user edit of the cell at the 1-based `row` and `column` of the
/// task sheet. Edits at or above the header row are ignored.
pub fn record_edit(
    workbook: &mut Workbook,
    invocation: &Invocation,
    row: usize,
    column: usize,
) -> Result<EditStamp, RustyLedgerError> {
    let table = TaskTable::load(workbook, invocation)?;
    let mut stamp = EditStamp::default();
    if row <= table.context.header_row {
        return Ok(stamp);
    }

    let last_modified = table.context.field(Field::LastModified);
    let due_date = table.context.field(Field::DueDate);
    let email_notified = table.context.field(Field::EmailNotified);
    let sheet = workbook
        .sheet_mut(&table.sheet_name)
        .ok_or_else(|| SpreadsheetError::SheetNotFound(table.sheet_name.to_owned()))?;

    if let Some(col) = last_modified {
        sheet.set_value(row, col + 1, Cell::DateTime(invocation.now))?;
        stamp.modified = true;
    }
    if let (Some(due_col), Some(notified_col)) = (due_date, email_notified) {
        if column == due_col + 1 {
            sheet.set_value(row, notified_col + 1, Cell::Empty)?;
            stamp.notification_reset = true;
        }
    }
    debug!(row, column, ?stamp, "Recorded edit");
    Ok(stamp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::sheet::Sheet;
    use crate::tasks::fixtures::*;

    fn workbook() -> Workbook {
        Workbook::with_sheets(vec![Sheet::with_rows("Tasks", vec![
            row(&["Task", "Due Date", "Status", "Email Notified", "Last Modified"]),
            row(&["Write", "2024-03-20", "Open", "2024-03-14 08:00:00", ""]),
        ])])
    }

    #[test]
    fn due_date_edit_resets_notification() {
        let mut workbook = workbook();

        let stamp = record_edit(&mut workbook, &invocation(), 2, 2).unwrap();
        assert_eq!(stamp, EditStamp { modified: true, notification_reset: true });
        let sheet = workbook.sheet("Tasks").unwrap();
        assert_eq!(sheet.get(2, 5), &Cell::DateTime(now()));
        assert_eq!(sheet.get(2, 4), &Cell::Empty);
    }

    #[test]
    fn other_edits_only_touch_last_modified() {
        let mut workbook = workbook();

        let stamp = record_edit(&mut workbook, &invocation(), 2, 1).unwrap();
        assert_eq!(stamp, EditStamp { modified: true, notification_reset: false });
        assert_eq!(workbook.sheet("Tasks").unwrap().get(2, 4), &Cell::from("2024-03-14 08:00:00"));
    }

    #[test]
    fn header_edits_are_ignored() {
        let mut workbook = workbook();
        let snapshot = workbook.clone();

        assert_eq!(record_edit(&mut workbook, &invocation(), 1, 2).unwrap(), EditStamp::default());
        assert_eq!(workbook, snapshot);
    }
}
